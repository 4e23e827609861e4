//! Lifecycle configuration.

use shroud_bus::{Topic, TRANSFER_TOPIC};
use shroud_types::Address;
use std::env;
use tracing::warn;

/// Commitment lifecycle configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// Topic transfer and release notices are published on.
    pub transfer_topic: Topic,
    /// Escrow contract holding shielded assets, reported in release notices.
    pub escrow_contract: Option<Address>,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            transfer_topic: TRANSFER_TOPIC,
            escrow_contract: None,
        }
    }
}

impl LifecycleConfig {
    /// Create configuration from environment variables.
    ///
    /// - `SHROUD_TRANSFER_TOPIC`: 4-byte hex topic (default: 0xeca7945f)
    /// - `SHROUD_ESCROW_CONTRACT`: hex address of the escrow contract
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            transfer_topic: env_hex("SHROUD_TRANSFER_TOPIC", |raw| raw.parse::<Topic>().ok())
                .unwrap_or(defaults.transfer_topic),
            escrow_contract: env_hex("SHROUD_ESCROW_CONTRACT", |raw| Address::from_hex(raw).ok())
                .or(defaults.escrow_contract),
        }
    }

    pub fn with_escrow_contract(mut self, contract: Address) -> Self {
        self.escrow_contract = Some(contract);
        self
    }
}

fn env_hex<T>(name: &str, parse: impl FnOnce(&str) -> Option<T>) -> Option<T> {
    let raw = env::var(name).ok()?;
    let parsed = parse(&raw);
    if parsed.is_none() {
        warn!(variable = name, value = %raw, "Ignoring unparsable setting");
    }
    parsed
}
