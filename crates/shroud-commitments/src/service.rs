//! Commitment Service - Core lifecycle logic
//!
//! Drives mint, transfer and burn against the outbound ports and publishes
//! peer notices on the transfer topic.
//!
//! ## Consistency
//!
//! Nothing is rolled back. A failure after the proof engine accepted an
//! operation leaves the engine ahead of the ledger and is logged at `error`
//! with the orphaned commitment index. A failure to notify after the ledger
//! write returns [`LifecycleError::NotificationFailed`] carrying the committed
//! receipt; the receiver can still recover the commitment with
//! [`CommitmentService::discover`]. A burn to self whose received asset was
//! not written returns [`LifecycleError::AssetRecordFailed`], re-applied with
//! [`CommitmentService::record_received_asset`].

use crate::adapters::{InMemoryAccountService, InMemoryDirectory, InMemoryLedger, InMemoryProofEngine};
use crate::config::LifecycleConfig;
use crate::domain::{
    invariant_matches_current, invariant_party_ready, invariant_spendable,
    invariant_token_described, CommitmentFields, PublicAsset, PublicAssetStatus, TokenCommitment,
    TokenStatus,
};
use crate::error::{CommittedReceipt, LifecycleError, LifecycleResult};
use crate::events::{Notice, PublicAssetNotice, TokenTransferNotice};
use crate::ports::inbound::{BurnReceipt, BurnToken, CommitmentLifecycleApi, TransferReceipt, TransferToken};
use crate::ports::outbound::{
    AccountService, BurnRequest, CorrectnessQuery, CorrectnessReport, Directory, Ledger,
    MintCommitment, ProofEngine, SpendRequest,
};
use crate::token_locks::TokenLocks;
use async_trait::async_trait;
use shroud_bus::{
    encode, HandlerFuture, MessageId, NotificationChannel, NotificationEnvelope,
    NotificationHandler, NotificationTransport, SubscriptionHandle,
};
use shroud_telemetry::{log_token_event, LIFECYCLE_ERRORS, TOKENS_BURNED, TOKENS_MINTED, TOKENS_TRANSFERRED};
use shroud_types::{
    Address, ChannelPublicKey, Commitment, IdentityHandle, PartyIdentity, Salt, TokenId,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Service wired to the in-process adapters.
pub type InMemoryCommitmentService = CommitmentService<
    InMemoryProofEngine,
    InMemoryLedger,
    InMemoryAccountService,
    InMemoryDirectory,
    NotificationChannel,
>;

/// Commitment lifecycle controller.
pub struct CommitmentService<P, L, A, D, N>
where
    P: ProofEngine,
    L: Ledger,
    A: AccountService,
    D: Directory,
    N: NotificationTransport,
{
    config: LifecycleConfig,
    proof_engine: Arc<P>,
    ledger: Arc<L>,
    accounts: Arc<A>,
    directory: Arc<D>,
    transport: Arc<N>,
    /// Party name -> channel identity, generated on first use.
    identities: Mutex<HashMap<String, IdentityHandle>>,
    locks: TokenLocks,
}

impl<P, L, A, D, N> CommitmentService<P, L, A, D, N>
where
    P: ProofEngine,
    L: Ledger,
    A: AccountService,
    D: Directory,
    N: NotificationTransport,
{
    pub fn new(
        config: LifecycleConfig,
        proof_engine: Arc<P>,
        ledger: Arc<L>,
        accounts: Arc<A>,
        directory: Arc<D>,
        transport: Arc<N>,
    ) -> Self {
        Self {
            config,
            proof_engine,
            ledger,
            accounts,
            directory,
            transport,
            identities: Mutex::new(HashMap::new()),
            locks: TokenLocks::new(),
        }
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    pub fn proof_engine(&self) -> &Arc<P> {
        &self.proof_engine
    }

    pub fn transport(&self) -> &Arc<N> {
        &self.transport
    }

    /// Channel identity for `party`, generated and published to the directory
    /// on first use.
    ///
    /// A handle already carried by the party is adopted instead of generating
    /// a new one.
    pub async fn channel_identity(&self, party: &PartyIdentity) -> LifecycleResult<IdentityHandle> {
        // Held across the directory write so no caller sees a handle whose
        // key was never published.
        let mut identities = self.identities.lock().await;
        if let Some(handle) = identities.get(&party.name) {
            return Ok(handle.clone());
        }

        let (handle, public_key) = match &party.channel_identity {
            Some(handle) => (handle.clone(), self.transport.public_key_of(handle)?),
            None => self.transport.generate_identity(party)?,
        };
        self.directory.set_channel_key(&party.name, public_key).await?;

        identities.insert(party.name.clone(), handle.clone());
        debug!(party = %party.name, "Channel identity bound");
        Ok(handle)
    }

    /// Re-publish the notice for a committed transfer.
    pub async fn resend_transfer_notice(
        &self,
        sender: &PartyIdentity,
        receipt: &TransferReceipt,
    ) -> LifecycleResult<MessageId> {
        let result: LifecycleResult<MessageId> = async {
            let committed = self.ledger.tokens(&sender.name).await?.into_iter().any(|record| {
                record.token_id == receipt.token_id
                    && record
                        .transferred
                        .as_ref()
                        .is_some_and(|next| next.commitment == receipt.commitment)
            });
            if !committed {
                return Err(LifecycleError::validation(format!(
                    "{} has no committed transfer of token {} matching the receipt",
                    sender.name, receipt.token_id
                )));
            }
            self.send_transfer_notice(sender, receipt).await
        }
        .instrument(info_span!("resend", sender = %sender.name, token_id = %receipt.token_id))
        .await;
        observe("resend", result)
    }

    /// Record the public asset released by a committed burn to `owner`.
    ///
    /// Safe to repeat: an asset already marked received is left alone.
    pub async fn record_received_asset(
        &self,
        owner: &PartyIdentity,
        receipt: &BurnReceipt,
    ) -> LifecycleResult<()> {
        let span = info_span!("record_asset", owner = %owner.name, token_id = %receipt.token_id);
        let result: LifecycleResult<()> = async {
            let burned = self
                .ledger
                .get_token_by_id(&owner.name, &receipt.token_id)
                .await?
                .filter(|record| {
                    record.status == TokenStatus::Burned
                        && record.receiver.as_deref() == Some(owner.name.as_str())
                });
            if receipt.pay_to != owner.name || burned.is_none() {
                return Err(LifecycleError::validation(format!(
                    "{} has no committed burn of token {} paid to itself",
                    owner.name, receipt.token_id
                )));
            }
            self.store_received_asset(owner, receipt).await
        }
        .instrument(span)
        .await;
        observe("record_asset", result)
    }

    /// Rebuild a receiver-side record from the commitment set.
    ///
    /// Used when a transfer notice never arrived: the receiver names the
    /// token, the salt and the index it expects, and the record is created if
    /// the commitment stored at that index opens to the party's key.
    pub async fn discover(
        &self,
        party: &PartyIdentity,
        token_id: TokenId,
        uri: &str,
        salt: Salt,
        commitment_index: u64,
    ) -> LifecycleResult<TokenCommitment> {
        let span = info_span!("discover", party = %party.name, token_id = %token_id, commitment_index);
        let result: LifecycleResult<TokenCommitment> = async {
            invariant_token_described(&token_id, uri)?;
            let commitment = self
                .proof_engine
                .commitment_at(commitment_index)
                .await?
                .ok_or_else(|| {
                    LifecycleError::validation(format!("no commitment at index {commitment_index}"))
                })?;

            let report = self
                .proof_engine
                .check_correctness(CorrectnessQuery {
                    token_id: token_id.clone(),
                    owner_public_key: party.public_key().clone(),
                    salt: salt.clone(),
                    commitment: commitment.clone(),
                    commitment_index,
                })
                .await?;
            if !report.is_valid() {
                return Err(LifecycleError::validation(format!(
                    "commitment at index {commitment_index} does not open to token {token_id} for {}",
                    party.name
                )));
            }

            self.receive_token(
                party,
                TokenTransferNotice {
                    token_uri: uri.to_string(),
                    token_id,
                    salt,
                    commitment,
                    commitment_index,
                    receiver: party.name.clone(),
                    receiver_public_key: party.public_key().clone(),
                },
            )
            .await
        }
        .instrument(span)
        .await;
        observe("discover", result)
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    async fn mint_inner(
        &self,
        owner: &PartyIdentity,
        token_id: TokenId,
        uri: &str,
    ) -> LifecycleResult<TokenCommitment> {
        let address = invariant_party_ready(owner)?.clone();
        invariant_token_described(&token_id, uri)?;

        let _guard = self.locks.acquire(&token_id).await;

        if let Some(existing) = self.ledger.get_token_by_id(&owner.name, &token_id).await? {
            if existing.is_spendable() {
                return Err(LifecycleError::validation(format!(
                    "token {token_id} is already held as a commitment by {}",
                    owner.name
                )));
            }
        }

        let minted = self
            .proof_engine
            .mint(
                &address,
                MintCommitment {
                    token_id: token_id.clone(),
                    owner_public_key: owner.public_key().clone(),
                },
            )
            .await?;

        let record = TokenCommitment::minted(
            owner.name.clone(),
            token_id.clone(),
            uri,
            minted,
            owner.secret().clone(),
        );
        if let Err(e) = self.ledger.add_token(record.clone()).await {
            error!(
                token_id = %token_id,
                commitment_index = record.commitment_index,
                error = %e,
                "Minted commitment was not recorded; reconcile out of band"
            );
            return Err(e);
        }

        self.shield_public_asset(&record).await?;

        TOKENS_MINTED.inc();
        log_token_event!(
            info,
            "mint",
            "Token commitment minted",
            token_id,
            commitment_index = record.commitment_index
        );
        Ok(record)
    }

    async fn transfer_inner(
        &self,
        sender: &PartyIdentity,
        request: TransferToken,
    ) -> LifecycleResult<TransferReceipt> {
        let address = invariant_party_ready(sender)?.clone();
        if request.receiver.trim().is_empty() {
            return Err(LifecycleError::validation("receiver name must not be empty"));
        }

        let _guard = self.locks.acquire(&request.token_id).await;

        let current = self.current_record(sender, &request.token_id).await?;
        invariant_spendable(&current)?;
        invariant_matches_current(
            &current,
            sender,
            &request.salt,
            &request.commitment,
            request.commitment_index,
        )?;

        let one_time_address = self.issue_one_time_account(sender, &address).await?;

        let receiver_public_key = self
            .directory
            .resolve_public_key_by_name(&request.receiver)
            .await?;

        let spent = self
            .proof_engine
            .spend(
                &one_time_address,
                SpendRequest {
                    token_id: request.token_id.clone(),
                    salt: request.salt.clone(),
                    commitment: request.commitment.clone(),
                    commitment_index: request.commitment_index,
                    owner_secret: sender.secret().clone(),
                    receiver_name: request.receiver.clone(),
                    receiver_public_key: receiver_public_key.clone(),
                },
            )
            .await?;

        let updated = current.transfer_to(request.receiver.clone(), spent.clone())?;
        if let Err(e) = self.ledger.update_token(updated).await {
            error!(
                token_id = %request.token_id,
                commitment_index = spent.commitment_index,
                error = %e,
                "Spent commitment was not recorded; reconcile out of band"
            );
            return Err(e);
        }

        TOKENS_TRANSFERRED.inc();
        log_token_event!(
            info,
            "transfer",
            "Token commitment transferred",
            request.token_id,
            receiver = %request.receiver,
            commitment_index = spent.commitment_index
        );

        let receipt = TransferReceipt {
            token_id: request.token_id,
            uri: current.uri,
            salt: spent.salt,
            commitment: spent.commitment,
            commitment_index: spent.commitment_index,
            receiver: request.receiver,
            receiver_public_key,
            one_time_address,
        };

        let notified = self.send_transfer_notice(sender, &receipt).await;
        if let Err(e) = notified {
            return Err(LifecycleError::NotificationFailed {
                receipt: Box::new(CommittedReceipt::Transfer(receipt)),
                source: Box::new(e),
            });
        }
        Ok(receipt)
    }

    async fn burn_inner(
        &self,
        owner: &PartyIdentity,
        request: BurnToken,
    ) -> LifecycleResult<BurnReceipt> {
        let address = invariant_party_ready(owner)?.clone();

        let _guard = self.locks.acquire(&request.token_id).await;

        let current = self.current_record(owner, &request.token_id).await?;
        invariant_spendable(&current)?;
        invariant_matches_current(
            &current,
            owner,
            &request.salt,
            &request.commitment,
            request.commitment_index,
        )?;

        let pay_to = request
            .pay_to
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| owner.name.clone());
        let third_party = pay_to != owner.name;
        let pay_to_address = self.directory.resolve_address_by_name(&pay_to).await?;

        self.proof_engine
            .burn(
                &address,
                BurnRequest {
                    token_id: request.token_id.clone(),
                    salt: request.salt,
                    commitment: request.commitment,
                    commitment_index: request.commitment_index,
                    owner_secret: owner.secret().clone(),
                    pay_to: pay_to_address.clone(),
                },
            )
            .await?;

        let updated = current.burn_to(pay_to.clone())?;
        if let Err(e) = self.ledger.update_token(updated).await {
            error!(
                token_id = %request.token_id,
                commitment_index = request.commitment_index,
                error = %e,
                "Burn was not recorded; reconcile out of band"
            );
            return Err(e);
        }

        TOKENS_BURNED.inc();
        log_token_event!(info, "burn", "Token commitment burned", request.token_id, pay_to = %pay_to);

        let mut receipt = BurnReceipt {
            token_id: request.token_id,
            uri: current.uri,
            pay_to,
            pay_to_address,
            payee_notified: false,
        };

        if third_party {
            let notified = self.send_release_notice(owner, &address, &receipt).await;
            if let Err(e) = notified {
                return Err(LifecycleError::NotificationFailed {
                    receipt: Box::new(CommittedReceipt::Burn(receipt)),
                    source: Box::new(e),
                });
            }
            receipt.payee_notified = true;
        } else {
            let recorded = self.store_received_asset(owner, &receipt).await;
            if let Err(e) = recorded {
                error!(
                    token_id = %receipt.token_id,
                    error = %e,
                    "Burn committed but received asset was not recorded"
                );
                return Err(LifecycleError::AssetRecordFailed {
                    receipt: Box::new(CommittedReceipt::Burn(receipt)),
                    source: Box::new(e),
                });
            }
        }
        Ok(receipt)
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    async fn current_record(
        &self,
        party: &PartyIdentity,
        token_id: &TokenId,
    ) -> LifecycleResult<TokenCommitment> {
        self.ledger
            .get_token_by_id(&party.name, token_id)
            .await?
            .ok_or_else(|| {
                LifecycleError::validation(format!(
                    "{} holds no commitment for token {token_id}",
                    party.name
                ))
            })
    }

    async fn shield_public_asset(&self, record: &TokenCommitment) -> LifecycleResult<()> {
        let existing = self
            .ledger
            .get_public_asset(&record.owner, &record.token_id)
            .await?;
        match existing {
            Some(_) => {
                self.ledger
                    .update_public_asset(&record.owner, &record.token_id, PublicAssetStatus::Shielded)
                    .await
            }
            None => {
                self.ledger
                    .add_public_asset(PublicAsset {
                        owner: record.owner.clone(),
                        token_id: record.token_id.clone(),
                        uri: record.uri.clone(),
                        status: PublicAssetStatus::Shielded,
                        shield_contract: self.config.escrow_contract.clone(),
                        sender: None,
                    })
                    .await
            }
        }
    }

    async fn store_received_asset(
        &self,
        owner: &PartyIdentity,
        receipt: &BurnReceipt,
    ) -> LifecycleResult<()> {
        let existing = self
            .ledger
            .get_public_asset(&owner.name, &receipt.token_id)
            .await?;
        match existing {
            Some(asset) if asset.status == PublicAssetStatus::Received => Ok(()),
            Some(_) => {
                self.ledger
                    .update_public_asset(&owner.name, &receipt.token_id, PublicAssetStatus::Received)
                    .await
            }
            None => {
                self.ledger
                    .add_public_asset(PublicAsset {
                        owner: owner.name.clone(),
                        token_id: receipt.token_id.clone(),
                        uri: receipt.uri.clone(),
                        status: PublicAssetStatus::Received,
                        shield_contract: self.config.escrow_contract.clone(),
                        sender: Some(owner.name.clone()),
                    })
                    .await
            }
        }
    }

    /// Create and unlock a fresh account for `party` and record it against
    /// the party's channel identity.
    async fn issue_one_time_account(
        &self,
        party: &PartyIdentity,
        address: &Address,
    ) -> LifecycleResult<Address> {
        let password = format!("{}{}", address.to_hex(), unix_millis());
        let one_time = self.accounts.create_account(&password).await?;
        self.accounts.unlock_account(&one_time, &password).await?;

        let identity = self.channel_identity(party).await?;
        self.transport
            .record_one_time_address(&identity, one_time.clone())?;

        debug!(party = %party.name, address = %one_time, "One-time account issued");
        Ok(one_time)
    }

    async fn send_transfer_notice(
        &self,
        sender: &PartyIdentity,
        receipt: &TransferReceipt,
    ) -> LifecycleResult<MessageId> {
        let identity = self.channel_identity(sender).await?;
        let recipient = self
            .directory
            .resolve_channel_key_by_name(&receipt.receiver)
            .await?;
        let notice = Notice::Token(TokenTransferNotice {
            token_uri: receipt.uri.clone(),
            token_id: receipt.token_id.clone(),
            salt: receipt.salt.clone(),
            commitment: receipt.commitment.clone(),
            commitment_index: receipt.commitment_index,
            receiver: receipt.receiver.clone(),
            receiver_public_key: receipt.receiver_public_key.clone(),
        });
        self.publish_notice(&identity, &recipient, &notice).await
    }

    async fn send_release_notice(
        &self,
        sender: &PartyIdentity,
        sender_address: &Address,
        receipt: &BurnReceipt,
    ) -> LifecycleResult<MessageId> {
        let identity = self.channel_identity(sender).await?;
        let recipient = self
            .directory
            .resolve_channel_key_by_name(&receipt.pay_to)
            .await?;
        let notice = Notice::PublicAsset(PublicAssetNotice {
            uri: receipt.uri.clone(),
            token_id: receipt.token_id.clone(),
            shield_contract_address: self.config.escrow_contract.clone(),
            receiver: receipt.pay_to.clone(),
            sender: sender.name.clone(),
            sender_address: sender_address.clone(),
        });
        self.publish_notice(&identity, &recipient, &notice).await
    }

    async fn publish_notice(
        &self,
        sender: &IdentityHandle,
        recipient: &ChannelPublicKey,
        notice: &Notice,
    ) -> LifecycleResult<MessageId> {
        let payload = encode(notice)?;
        let message_id = self
            .transport
            .publish(payload, sender, recipient, self.config.transfer_topic.as_bytes())
            .await?;
        debug!(%message_id, receiver = notice.receiver(), token_id = %notice.token_id(), "Notice published");
        Ok(message_id)
    }

    // =========================================================================
    // RECEIVING
    // =========================================================================

    /// Apply a notice delivered to `party`.
    pub async fn accept_notice(
        &self,
        party: &PartyIdentity,
        envelope: &NotificationEnvelope,
    ) -> LifecycleResult<()> {
        let notice: Notice = envelope.decode()?;
        if notice.receiver() != party.name {
            return Err(LifecycleError::validation(format!(
                "notice for {} delivered to {}",
                notice.receiver(),
                party.name
            )));
        }
        match notice {
            Notice::Token(notice) => self.receive_token(party, notice).await.map(|_| ()),
            Notice::PublicAsset(notice) => self.receive_public_asset(party, notice).await,
        }
    }

    /// Create the receiver-side record for a transferred commitment.
    /// Idempotent: a notice seen twice yields the existing record.
    async fn receive_token(
        &self,
        party: &PartyIdentity,
        notice: TokenTransferNotice,
    ) -> LifecycleResult<TokenCommitment> {
        if notice.receiver_public_key != *party.public_key() {
            return Err(LifecycleError::validation(format!(
                "commitment for token {} was made for a different key than {}'s",
                notice.token_id, party.name
            )));
        }

        let _guard = self.locks.acquire(&notice.token_id).await;

        if let Some(existing) = self
            .find_record(&party.name, &notice.token_id, &notice.commitment)
            .await?
        {
            debug!(party = %party.name, token_id = %notice.token_id, "Commitment already recorded");
            return Ok(existing);
        }

        let record = TokenCommitment::received(
            party.name.clone(),
            notice.token_id,
            notice.token_uri,
            CommitmentFields {
                salt: notice.salt,
                commitment: notice.commitment,
                commitment_index: notice.commitment_index,
            },
            party.secret().clone(),
        );
        self.ledger.add_token(record.clone()).await?;

        log_token_event!(
            info,
            "receive",
            "Transferred commitment received",
            record.token_id,
            owner = %record.owner,
            commitment_index = record.commitment_index
        );
        Ok(record)
    }

    async fn receive_public_asset(
        &self,
        party: &PartyIdentity,
        notice: PublicAssetNotice,
    ) -> LifecycleResult<()> {
        log_token_event!(
            info,
            "receive",
            "Public asset received",
            notice.token_id,
            owner = %party.name,
            sender = %notice.sender
        );
        self.ledger
            .add_public_asset(PublicAsset {
                owner: party.name.clone(),
                token_id: notice.token_id,
                uri: notice.uri,
                status: PublicAssetStatus::Received,
                shield_contract: notice.shield_contract_address,
                sender: Some(notice.sender),
            })
            .await
    }

    async fn find_record(
        &self,
        owner: &str,
        token_id: &TokenId,
        commitment: &Commitment,
    ) -> LifecycleResult<Option<TokenCommitment>> {
        Ok(self
            .ledger
            .tokens(owner)
            .await?
            .into_iter()
            .find(|record| record.token_id == *token_id && record.commitment == *commitment))
    }
}

impl<P, L, A, D, N> CommitmentService<P, L, A, D, N>
where
    P: ProofEngine + 'static,
    L: Ledger + 'static,
    A: AccountService + 'static,
    D: Directory + 'static,
    N: NotificationTransport + 'static,
{
    /// Subscribe `party` to the transfer topic.
    ///
    /// Token notices become spendable receiver-side records; release notices
    /// become received public asset records. Notices that cannot be applied
    /// are logged and dropped.
    pub async fn listen(self: &Arc<Self>, party: &PartyIdentity) -> LifecycleResult<SubscriptionHandle> {
        let identity = self.channel_identity(party).await?;

        let service = Arc::clone(self);
        let listener = party.clone();
        let handler: NotificationHandler =
            Arc::new(move |envelope: NotificationEnvelope| -> HandlerFuture {
                let service = Arc::clone(&service);
                let listener = listener.clone();
                Box::pin(async move {
                    if let Err(e) = service.accept_notice(&listener, &envelope).await {
                        warn!(
                            party = %listener.name,
                            message_id = %envelope.id,
                            error = %e,
                            "Notice not applied"
                        );
                    }
                })
            });

        let handle = self.transport.subscribe_handler(
            &identity,
            self.config.transfer_topic.as_bytes(),
            handler,
        )?;
        info!(party = %party.name, subscription = %handle.id, "Listening for notices");
        Ok(handle)
    }

    /// Stop a listener started with [`CommitmentService::listen`].
    pub fn stop_listening(&self, handle: &SubscriptionHandle) -> bool {
        self.transport.unsubscribe(handle.id)
    }
}

#[async_trait]
impl<P, L, A, D, N> CommitmentLifecycleApi for CommitmentService<P, L, A, D, N>
where
    P: ProofEngine,
    L: Ledger,
    A: AccountService,
    D: Directory,
    N: NotificationTransport,
{
    async fn mint(
        &self,
        owner: &PartyIdentity,
        token_id: TokenId,
        uri: &str,
    ) -> LifecycleResult<TokenCommitment> {
        let span = info_span!("mint", owner = %owner.name, token_id = %token_id);
        observe("mint", self.mint_inner(owner, token_id, uri).instrument(span).await)
    }

    async fn transfer(
        &self,
        sender: &PartyIdentity,
        request: TransferToken,
    ) -> LifecycleResult<TransferReceipt> {
        let span = info_span!(
            "transfer",
            sender = %sender.name,
            receiver = %request.receiver,
            token_id = %request.token_id
        );
        observe("transfer", self.transfer_inner(sender, request).instrument(span).await)
    }

    async fn burn(&self, owner: &PartyIdentity, request: BurnToken) -> LifecycleResult<BurnReceipt> {
        let span = info_span!("burn", owner = %owner.name, token_id = %request.token_id);
        observe("burn", self.burn_inner(owner, request).instrument(span).await)
    }

    async fn check_correctness(
        &self,
        query: CorrectnessQuery,
    ) -> LifecycleResult<CorrectnessReport> {
        observe("check_correctness", self.proof_engine.check_correctness(query).await)
    }
}

fn observe<T>(operation: &'static str, result: LifecycleResult<T>) -> LifecycleResult<T> {
    if let Err(e) = &result {
        LIFECYCLE_ERRORS
            .with_label_values(&[operation, e.kind().as_str()])
            .inc();
        warn!(operation, kind = %e.kind(), error = %e, "Lifecycle operation failed");
    }
    result
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}
