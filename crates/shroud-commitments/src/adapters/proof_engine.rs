//! In-memory proof engine.
//!
//! Keeps the commitment set, the nullifier set and the escrow in process.
//! Commitments are hashes, not zero-knowledge proofs: opening a commitment
//! means presenting the preimage and the owner secret directly.

use crate::error::{LifecycleError, LifecycleResult};
use crate::ports::outbound::{
    BurnRequest, CorrectnessQuery, CorrectnessReport, MintCommitment, MintedCommitment,
    ProofEngine, SpendRequest, SpentCommitment,
};
use crate::domain::CommitmentFields;
use async_trait::async_trait;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use shroud_types::{derive_public_key, Address, Commitment, Salt, TokenId, ZkpPublicKey, ZkpSecret};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Length of generated salts and of commitments, in bytes.
pub const COMMITMENT_LEN: usize = 27;

/// Commitment over (token id, owner public key, salt).
pub fn compute_commitment(token_id: &TokenId, owner: &ZkpPublicKey, salt: &Salt) -> Commitment {
    let mut hasher = Sha256::new();
    hasher.update(token_id.as_bytes());
    hasher.update(owner.as_bytes());
    hasher.update(salt.as_bytes());
    Commitment::new(hasher.finalize()[..COMMITMENT_LEN].to_vec())
}

fn compute_nullifier(salt: &Salt, secret: &ZkpSecret) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(secret.as_bytes());
    hasher.finalize()[..COMMITMENT_LEN].to_vec()
}

#[derive(Default)]
struct EngineState {
    /// Global commitment set; position is the commitment index.
    commitments: Vec<Commitment>,
    nullifiers: HashSet<Vec<u8>>,
    /// Shielded assets and the account that deposited them.
    escrow: HashMap<TokenId, Address>,
    /// Burned assets and the account they were paid to.
    released: HashMap<TokenId, Address>,
}

impl EngineState {
    fn append(&mut self, token_id: &TokenId, owner: &ZkpPublicKey) -> CommitmentFields {
        let salt = Salt::random(COMMITMENT_LEN);
        let commitment = compute_commitment(token_id, owner, &salt);
        let commitment_index = self.commitments.len() as u64;
        self.commitments.push(commitment.clone());
        CommitmentFields {
            salt,
            commitment,
            commitment_index,
        }
    }

    /// Check an opening and nullify it.
    fn nullify(
        &mut self,
        token_id: &TokenId,
        salt: &Salt,
        commitment: &Commitment,
        commitment_index: u64,
        secret: &ZkpSecret,
    ) -> LifecycleResult<()> {
        let stored = usize::try_from(commitment_index)
            .ok()
            .and_then(|i| self.commitments.get(i));
        if stored != Some(commitment) {
            return Err(rejected(format!(
                "commitment not found at index {commitment_index}"
            )));
        }
        if compute_commitment(token_id, &derive_public_key(secret), salt) != *commitment {
            return Err(rejected("secret does not open the commitment"));
        }
        if !self.nullifiers.insert(compute_nullifier(salt, secret)) {
            return Err(rejected(format!(
                "commitment at index {commitment_index} is already nullified"
            )));
        }
        Ok(())
    }
}

fn rejected(reason: impl Into<String>) -> LifecycleError {
    LifecycleError::ProofEngine {
        reason: reason.into(),
    }
}

/// In-process proof engine with failure injection.
#[derive(Default)]
pub struct InMemoryProofEngine {
    state: RwLock<EngineState>,
    fail: AtomicBool,
}

impl InMemoryProofEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn commitment_count(&self) -> usize {
        self.state.read().commitments.len()
    }

    pub fn is_shielded(&self, token_id: &TokenId) -> bool {
        self.state.read().escrow.contains_key(token_id)
    }

    /// Account a burned asset was paid to.
    pub fn released_to(&self, token_id: &TokenId) -> Option<Address> {
        self.state.read().released.get(token_id).cloned()
    }

    fn check_available(&self) -> LifecycleResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(rejected("proof engine unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl ProofEngine for InMemoryProofEngine {
    async fn mint(
        &self,
        owner: &Address,
        request: MintCommitment,
    ) -> LifecycleResult<MintedCommitment> {
        self.check_available()?;
        let mut state = self.state.write();
        if state.escrow.contains_key(&request.token_id) {
            return Err(rejected(format!(
                "token {} is already shielded",
                request.token_id
            )));
        }

        let minted = state.append(&request.token_id, &request.owner_public_key);
        state.escrow.insert(request.token_id.clone(), owner.clone());
        state.released.remove(&request.token_id);

        info!(
            token_id = %request.token_id,
            commitment_index = minted.commitment_index,
            "Commitment minted"
        );
        Ok(minted)
    }

    async fn spend(
        &self,
        on_behalf_of: &Address,
        request: SpendRequest,
    ) -> LifecycleResult<SpentCommitment> {
        self.check_available()?;
        let mut state = self.state.write();
        state.nullify(
            &request.token_id,
            &request.salt,
            &request.commitment,
            request.commitment_index,
            &request.owner_secret,
        )?;
        let spent = state.append(&request.token_id, &request.receiver_public_key);

        debug!(
            token_id = %request.token_id,
            from_index = request.commitment_index,
            to_index = spent.commitment_index,
            submitter = %on_behalf_of,
            receiver = %request.receiver_name,
            "Commitment spent"
        );
        Ok(spent)
    }

    async fn burn(&self, owner: &Address, request: BurnRequest) -> LifecycleResult<()> {
        self.check_available()?;
        let mut state = self.state.write();
        state.nullify(
            &request.token_id,
            &request.salt,
            &request.commitment,
            request.commitment_index,
            &request.owner_secret,
        )?;
        state.escrow.remove(&request.token_id);
        state
            .released
            .insert(request.token_id.clone(), request.pay_to.clone());

        info!(
            token_id = %request.token_id,
            commitment_index = request.commitment_index,
            submitter = %owner,
            pay_to = %request.pay_to,
            "Commitment burned"
        );
        Ok(())
    }

    async fn check_correctness(
        &self,
        query: CorrectnessQuery,
    ) -> LifecycleResult<CorrectnessReport> {
        self.check_available()?;
        let recomputes =
            compute_commitment(&query.token_id, &query.owner_public_key, &query.salt)
                == query.commitment;
        let on_chain = usize::try_from(query.commitment_index)
            .ok()
            .and_then(|i| self.state.read().commitments.get(i).cloned())
            .is_some_and(|stored| stored == query.commitment);
        Ok(CorrectnessReport {
            recomputes,
            on_chain,
        })
    }

    async fn commitment_at(&self, index: u64) -> LifecycleResult<Option<Commitment>> {
        self.check_available()?;
        Ok(usize::try_from(index)
            .ok()
            .and_then(|i| self.state.read().commitments.get(i).cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shroud_types::ZkpKeyPair;

    fn token() -> TokenId {
        TokenId::new(vec![0x71])
    }

    async fn mint_for(engine: &InMemoryProofEngine, keys: &ZkpKeyPair) -> MintedCommitment {
        engine
            .mint(
                &Address::random(20),
                MintCommitment {
                    token_id: token(),
                    owner_public_key: keys.public_key.clone(),
                },
            )
            .await
            .unwrap()
    }

    fn spend_of(minted: &MintedCommitment, keys: &ZkpKeyPair, to: &ZkpKeyPair) -> SpendRequest {
        SpendRequest {
            token_id: token(),
            salt: minted.salt.clone(),
            commitment: minted.commitment.clone(),
            commitment_index: minted.commitment_index,
            owner_secret: keys.secret.clone(),
            receiver_name: "bob".into(),
            receiver_public_key: to.public_key.clone(),
        }
    }

    #[tokio::test]
    async fn test_mint_assigns_increasing_indices() {
        let engine = InMemoryProofEngine::new();
        let alice = ZkpKeyPair::generate();
        let minted = mint_for(&engine, &alice).await;

        assert_eq!(minted.commitment_index, 0);
        assert_eq!(
            minted.commitment,
            compute_commitment(&token(), &alice.public_key, &minted.salt)
        );
        assert!(engine.is_shielded(&token()));
    }

    #[tokio::test]
    async fn test_double_mint_rejected() {
        let engine = InMemoryProofEngine::new();
        let alice = ZkpKeyPair::generate();
        mint_for(&engine, &alice).await;
        let err = engine
            .mint(
                &Address::random(20),
                MintCommitment {
                    token_id: token(),
                    owner_public_key: alice.public_key.clone(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::ProofEngine { .. }));
    }

    #[tokio::test]
    async fn test_spend_creates_receiver_commitment_once() {
        let engine = InMemoryProofEngine::new();
        let alice = ZkpKeyPair::generate();
        let bob = ZkpKeyPair::generate();
        let minted = mint_for(&engine, &alice).await;

        let spent = engine
            .spend(&Address::random(20), spend_of(&minted, &alice, &bob))
            .await
            .unwrap();
        assert_eq!(spent.commitment_index, 1);
        assert_ne!(spent.salt, minted.salt);

        let again = engine
            .spend(&Address::random(20), spend_of(&minted, &alice, &bob))
            .await;
        assert!(matches!(again, Err(LifecycleError::ProofEngine { .. })));
        assert_eq!(engine.commitment_count(), 2);
    }

    #[tokio::test]
    async fn test_spend_with_wrong_secret_rejected() {
        let engine = InMemoryProofEngine::new();
        let alice = ZkpKeyPair::generate();
        let mallory = ZkpKeyPair::generate();
        let minted = mint_for(&engine, &alice).await;

        let result = engine
            .spend(&Address::random(20), spend_of(&minted, &mallory, &mallory))
            .await;
        assert!(matches!(result, Err(LifecycleError::ProofEngine { .. })));
    }

    #[tokio::test]
    async fn test_burn_releases_asset() {
        let engine = InMemoryProofEngine::new();
        let alice = ZkpKeyPair::generate();
        let minted = mint_for(&engine, &alice).await;
        let pay_to = Address::random(20);

        engine
            .burn(
                &Address::random(20),
                BurnRequest {
                    token_id: token(),
                    salt: minted.salt.clone(),
                    commitment: minted.commitment.clone(),
                    commitment_index: minted.commitment_index,
                    owner_secret: alice.secret.clone(),
                    pay_to: pay_to.clone(),
                },
            )
            .await
            .unwrap();

        assert!(!engine.is_shielded(&token()));
        assert_eq!(engine.released_to(&token()), Some(pay_to));
    }

    #[tokio::test]
    async fn test_check_correctness_and_scan() {
        let engine = InMemoryProofEngine::new();
        let alice = ZkpKeyPair::generate();
        let minted = mint_for(&engine, &alice).await;

        let query = CorrectnessQuery {
            token_id: token(),
            owner_public_key: alice.public_key.clone(),
            salt: minted.salt.clone(),
            commitment: minted.commitment.clone(),
            commitment_index: 0,
        };
        assert!(engine.check_correctness(query.clone()).await.unwrap().is_valid());

        let wrong_index = CorrectnessQuery {
            commitment_index: 5,
            ..query
        };
        let report = engine.check_correctness(wrong_index).await.unwrap();
        assert!(report.recomputes);
        assert!(!report.on_chain);

        assert_eq!(
            engine.commitment_at(0).await.unwrap(),
            Some(minted.commitment)
        );
        assert_eq!(engine.commitment_at(1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let engine = InMemoryProofEngine::new();
        engine.set_fail(true);
        assert!(engine.commitment_at(0).await.is_err());
    }
}
