//! Channel configuration.

use crate::error::BusError;
use std::env;
use std::time::Duration;
use tracing::warn;

/// Default delay between publish and dispatch.
pub const DEFAULT_DELIVERY_DELAY: Duration = Duration::from_secs(3);

/// Default message time-to-live, in seconds.
pub const DEFAULT_TTL_SECS: u32 = 10;

/// Notification channel configuration.
///
/// The delivery delay is always non-zero and shorter than the TTL, so a
/// message dispatched on time is never already expired.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelConfig {
    /// How long a published message waits before dispatch. Gives a party that
    /// is messaging itself time to switch from sending to listening.
    delivery_delay: Duration,
    /// Time-to-live stamped on each envelope.
    ttl_secs: u32,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            delivery_delay: DEFAULT_DELIVERY_DELAY,
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }
}

impl ChannelConfig {
    /// Build a configuration, rejecting a zero delay or a delay that reaches
    /// the TTL.
    pub fn new(delivery_delay: Duration, ttl_secs: u32) -> Result<Self, BusError> {
        if delivery_delay.is_zero() {
            return Err(BusError::InvalidConfig {
                reason: "delivery delay must be greater than zero".to_string(),
            });
        }
        let ttl = Duration::from_secs(u64::from(ttl_secs));
        if delivery_delay >= ttl {
            return Err(BusError::InvalidConfig {
                reason: format!(
                    "delivery delay of {}ms must be shorter than the {ttl_secs}s TTL",
                    delivery_delay.as_millis()
                ),
            });
        }
        Ok(Self {
            delivery_delay,
            ttl_secs,
        })
    }

    /// Create configuration from environment variables.
    ///
    /// - `SHROUD_DELIVERY_DELAY_MS`: Delivery delay in milliseconds (default: 3000)
    /// - `SHROUD_MESSAGE_TTL_SECS`: Envelope TTL in seconds (default: 10)
    ///
    /// An unparsable value, or a combination [`ChannelConfig::new`] rejects,
    /// falls back to the defaults.
    pub fn from_env() -> Self {
        Self::from_values(
            env_parse("SHROUD_DELIVERY_DELAY_MS"),
            env_parse("SHROUD_MESSAGE_TTL_SECS"),
        )
    }

    fn from_values(delay_ms: Option<u64>, ttl_secs: Option<u32>) -> Self {
        let defaults = Self::default();
        let delivery_delay = delay_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.delivery_delay);
        let ttl_secs = ttl_secs.unwrap_or(defaults.ttl_secs);

        match Self::new(delivery_delay, ttl_secs) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Ignoring channel settings, using defaults");
                defaults
            }
        }
    }

    pub fn delivery_delay(&self) -> Duration {
        self.delivery_delay
    }

    pub fn ttl_secs(&self) -> u32 {
        self.ttl_secs
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.ttl_secs))
    }

    pub fn with_delivery_delay(self, delay: Duration) -> Result<Self, BusError> {
        Self::new(delay, self.ttl_secs)
    }

    pub fn with_ttl_secs(self, ttl_secs: u32) -> Result<Self, BusError> {
        Self::new(self.delivery_delay, ttl_secs)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = name, value = %raw, "Ignoring unparsable setting");
            None
        }
    }
}
