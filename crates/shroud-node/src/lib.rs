//! # Shroud Node
//!
//! Wires the notification channel, the identity registry and the in-process
//! collaborators into one [`InMemoryCommitmentService`].
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from the environment
//! 2. Initialize telemetry
//! 3. Build the identity registry and notification channel
//! 4. Build the in-process proof engine, ledger, account service, directory
//! 5. Register parties and start their listeners

use std::sync::Arc;

use anyhow::{Context, Result};
use shroud_bus::{ChannelConfig, IdentityRegistry, NotificationChannel};
use shroud_commitments::{
    BurnReceipt, BurnToken, CommitmentLifecycleApi, CommitmentService, InMemoryAccountService,
    InMemoryCommitmentService, InMemoryDirectory, InMemoryLedger, InMemoryProofEngine, Ledger,
    LifecycleConfig, TokenCommitment, TransferToken,
};
use shroud_telemetry::TelemetryConfig;
use shroud_types::{Address, PartyIdentity, TokenId};
use tracing::info;

/// Node configuration.
#[derive(Clone, Debug, Default)]
pub struct NodeConfig {
    pub channel: ChannelConfig,
    pub lifecycle: LifecycleConfig,
    pub telemetry: TelemetryConfig,
}

impl NodeConfig {
    pub fn from_env() -> Self {
        Self {
            channel: ChannelConfig::from_env(),
            lifecycle: LifecycleConfig::from_env(),
            telemetry: TelemetryConfig::for_component("node"),
        }
    }
}

/// Outcome of [`ShroudNode::walkthrough`].
#[derive(Debug)]
pub struct Walkthrough {
    pub minted: TokenCommitment,
    pub sender_record: TokenCommitment,
    pub receiver_record: TokenCommitment,
    pub burned: BurnReceipt,
}

/// A running node.
pub struct ShroudNode {
    config: NodeConfig,
    service: Arc<InMemoryCommitmentService>,
    channel: Arc<NotificationChannel>,
    directory: Arc<InMemoryDirectory>,
    ledger: Arc<InMemoryLedger>,
}

impl ShroudNode {
    pub fn new(config: NodeConfig) -> Self {
        info!(
            delivery_delay_ms = config.channel.delivery_delay().as_millis() as u64,
            transfer_topic = %config.lifecycle.transfer_topic,
            "Creating Shroud node"
        );

        let registry = Arc::new(IdentityRegistry::new());
        let channel = Arc::new(NotificationChannel::new(registry, config.channel.clone()));
        let directory = Arc::new(InMemoryDirectory::new());
        let ledger = Arc::new(InMemoryLedger::new());

        let service = Arc::new(CommitmentService::new(
            config.lifecycle.clone(),
            Arc::new(InMemoryProofEngine::new()),
            Arc::clone(&ledger),
            Arc::new(InMemoryAccountService::new()),
            Arc::clone(&directory),
            Arc::clone(&channel),
        ));

        Self {
            config,
            service,
            channel,
            directory,
            ledger,
        }
    }

    pub fn service(&self) -> &Arc<InMemoryCommitmentService> {
        &self.service
    }

    pub fn channel(&self) -> &Arc<NotificationChannel> {
        &self.channel
    }

    /// Create a party, publish it in the directory and start its listener.
    pub async fn register_party(&self, name: &str) -> Result<PartyIdentity> {
        let party = PartyIdentity::new(name, Address::random(20));
        self.directory.register_party(&party);
        self.service
            .listen(&party)
            .await
            .with_context(|| format!("failed to start listener for {name}"))?;
        info!(party = name, address = ?party.address, "Party registered");
        Ok(party)
    }

    /// Mint a token for `alice`, transfer it to `bob`, wait for the notice,
    /// then burn it from `bob` back to `bob`.
    pub async fn walkthrough(
        &self,
        alice: &PartyIdentity,
        bob: &PartyIdentity,
        token_id: TokenId,
        uri: &str,
    ) -> Result<Walkthrough> {
        let minted = self
            .service
            .mint(alice, token_id.clone(), uri)
            .await
            .context("mint failed")?;

        self.service
            .transfer(alice, TransferToken::of(&minted, bob.name.clone()))
            .await
            .context("transfer failed")?;

        tokio::time::sleep(self.config.channel.delivery_delay() * 2).await;

        let sender_record = self
            .ledger_record(&alice.name, &token_id)
            .await
            .context("sender record missing")?;
        let receiver_record = self
            .ledger_record(&bob.name, &token_id)
            .await
            .context("transfer notice was not applied")?;

        let burned = self
            .service
            .burn(bob, BurnToken::of(&receiver_record, None))
            .await
            .context("burn failed")?;

        Ok(Walkthrough {
            minted,
            sender_record,
            receiver_record,
            burned,
        })
    }

    async fn ledger_record(&self, owner: &str, token_id: &TokenId) -> Result<TokenCommitment> {
        self.ledger
            .get_token_by_id(owner, token_id)
            .await?
            .with_context(|| format!("{owner} holds no record for token {token_id}"))
    }

    /// Cancel pending deliveries.
    pub fn shutdown(&self) {
        info!("Initiating shutdown...");
        self.channel.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shroud_commitments::TokenStatus;

    #[tokio::test(start_paused = true)]
    async fn test_walkthrough() {
        let node = ShroudNode::new(NodeConfig::default());
        let alice = node.register_party("alice").await.unwrap();
        let bob = node.register_party("bob").await.unwrap();

        let outcome = node
            .walkthrough(&alice, &bob, TokenId::new(vec![0x01]), "art1")
            .await
            .unwrap();

        assert_eq!(outcome.minted.commitment_index, 0);
        assert_eq!(outcome.sender_record.status, TokenStatus::Transferred);
        assert_eq!(outcome.receiver_record.commitment_index, 1);
        assert_eq!(outcome.burned.pay_to, "bob");
        node.shutdown();
    }
}
