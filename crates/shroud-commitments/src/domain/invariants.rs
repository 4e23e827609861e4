//! # Domain Invariants
//!
//! Preconditions checked before any external collaborator is called.

use super::entities::TokenCommitment;
use crate::error::{LifecycleError, LifecycleResult};
use shroud_types::{Address, Commitment, PartyIdentity, Salt, TokenId};

/// Invariant: token id and uri are present.
pub fn invariant_token_described(token_id: &TokenId, uri: &str) -> LifecycleResult<()> {
    if token_id.is_empty() {
        return Err(LifecycleError::validation("token id must not be empty"));
    }
    if uri.trim().is_empty() {
        return Err(LifecycleError::validation("token uri must not be empty"));
    }
    Ok(())
}

/// Invariant: the party can act on-chain and own commitments.
pub fn invariant_party_ready(party: &PartyIdentity) -> LifecycleResult<&Address> {
    if party.name.is_empty() {
        return Err(LifecycleError::validation("party name must not be empty"));
    }
    if party.public_key().is_empty() || party.secret().is_empty() {
        return Err(LifecycleError::validation(format!(
            "party {} has no commitment key pair",
            party.name
        )));
    }
    match &party.address {
        Some(address) if !address.is_empty() => Ok(address),
        _ => Err(LifecycleError::validation(format!(
            "party {} has no address",
            party.name
        ))),
    }
}

/// Invariant: the record can still be spent.
pub fn invariant_spendable(record: &TokenCommitment) -> LifecycleResult<()> {
    if record.status.is_terminal() {
        return Err(LifecycleError::validation(format!(
            "token {} is already burned",
            record.token_id
        )));
    }
    if record.transferred.is_some() {
        return Err(LifecycleError::validation(format!(
            "token {} has already been transferred by {}",
            record.token_id, record.owner
        )));
    }
    Ok(())
}

/// Invariant: caller-supplied fields describe the current commitment, and the
/// caller holds its secret.
pub fn invariant_matches_current(
    record: &TokenCommitment,
    party: &PartyIdentity,
    salt: &Salt,
    commitment: &Commitment,
    commitment_index: u64,
) -> LifecycleResult<()> {
    if record.salt != *salt
        || record.commitment != *commitment
        || record.commitment_index != commitment_index
    {
        return Err(LifecycleError::validation(format!(
            "supplied commitment does not match the current state of token {}",
            record.token_id
        )));
    }
    if record.owner_secret != *party.secret() {
        return Err(LifecycleError::validation(format!(
            "party {} does not hold the secret for token {}",
            party.name, record.token_id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CommitmentFields, TokenStatus};
    use shroud_types::{ZkpKeyPair, ZkpSecret};

    fn alice() -> PartyIdentity {
        PartyIdentity::new("alice", Address::random(20))
    }

    fn record_for(party: &PartyIdentity) -> TokenCommitment {
        TokenCommitment::minted(
            party.name.clone(),
            TokenId::new(vec![1]),
            "art1",
            CommitmentFields {
                salt: Salt::new(vec![2]),
                commitment: Commitment::new(vec![3]),
                commitment_index: 0,
            },
            party.secret().clone(),
        )
    }

    #[test]
    fn test_token_described() {
        assert!(invariant_token_described(&TokenId::new(vec![1]), "art1").is_ok());
        assert!(invariant_token_described(&TokenId::default(), "art1").is_err());
        assert!(invariant_token_described(&TokenId::new(vec![1]), "  ").is_err());
    }

    #[test]
    fn test_party_without_address() {
        let ghost = PartyIdentity::with_keys("ghost", None, ZkpKeyPair::generate());
        assert!(invariant_party_ready(&ghost).is_err());
        assert!(invariant_party_ready(&alice()).is_ok());
    }

    #[test]
    fn test_matches_current() {
        let alice = alice();
        let record = record_for(&alice);
        let salt = Salt::new(vec![2]);
        let commitment = Commitment::new(vec![3]);

        assert!(invariant_matches_current(&record, &alice, &salt, &commitment, 0).is_ok());
        assert!(invariant_matches_current(&record, &alice, &salt, &commitment, 1).is_err());
        assert!(
            invariant_matches_current(&record, &alice, &Salt::new(vec![9]), &commitment, 0)
                .is_err()
        );

        let mallory = PartyIdentity::with_keys(
            "alice",
            alice.address.clone(),
            ZkpKeyPair::from_secret(ZkpSecret::new(vec![4; 27])),
        );
        assert!(invariant_matches_current(&record, &mallory, &salt, &commitment, 0).is_err());
    }

    #[test]
    fn test_spendable() {
        let alice = alice();
        let mut record = record_for(&alice);
        assert!(invariant_spendable(&record).is_ok());
        record.status = TokenStatus::Burned;
        assert!(invariant_spendable(&record).is_err());
    }
}
