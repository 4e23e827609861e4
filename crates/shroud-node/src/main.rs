//! # Shroud Node
//!
//! Runs a two-party mint, transfer and burn walkthrough over the in-process
//! notification channel and prints the resulting metrics.

use anyhow::{Context, Result};
use shroud_node::{NodeConfig, ShroudNode};
use shroud_telemetry::{gather_metrics, init_telemetry};
use shroud_types::TokenId;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::from_env();
    let _telemetry = init_telemetry(config.telemetry.clone()).context("telemetry init failed")?;

    let node = ShroudNode::new(config);
    let alice = node.register_party("alice").await?;
    let bob = node.register_party("bob").await?;

    let token_id = TokenId::random(32);
    let outcome = node.walkthrough(&alice, &bob, token_id, "art1").await?;

    info!(
        minted_index = outcome.minted.commitment_index,
        transferred_index = outcome.receiver_record.commitment_index,
        paid_to = %outcome.burned.pay_to,
        "Walkthrough complete"
    );
    println!("{}", gather_metrics().context("metrics export failed")?);

    node.shutdown();
    Ok(())
}
