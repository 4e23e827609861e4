//! Prometheus metrics for Shroud components.
//!
//! All metrics follow the naming convention: `shroud_<area>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // COMMITMENT LIFECYCLE
    // =========================================================================

    /// Token commitments minted
    pub static ref TOKENS_MINTED: Counter = Counter::new(
        "shroud_tokens_minted_total",
        "Total number of token commitments minted"
    ).expect("metric creation failed");

    /// Token commitments transferred
    pub static ref TOKENS_TRANSFERRED: Counter = Counter::new(
        "shroud_tokens_transferred_total",
        "Total number of token commitments transferred"
    ).expect("metric creation failed");

    /// Token commitments burned
    pub static ref TOKENS_BURNED: Counter = Counter::new(
        "shroud_tokens_burned_total",
        "Total number of token commitments burned"
    ).expect("metric creation failed");

    /// Lifecycle failures by error kind
    pub static ref LIFECYCLE_ERRORS: CounterVec = CounterVec::new(
        Opts::new("shroud_lifecycle_errors_total", "Lifecycle operation failures"),
        &["operation", "kind"]
    ).expect("metric creation failed");

    // =========================================================================
    // NOTIFICATION CHANNEL
    // =========================================================================

    /// Messages accepted for delayed delivery
    pub static ref NOTIFICATIONS_PUBLISHED: Counter = Counter::new(
        "shroud_notifications_published_total",
        "Total notifications accepted for delivery"
    ).expect("metric creation failed");

    /// Per-subscriber deliveries
    pub static ref NOTIFICATIONS_DELIVERED: Counter = Counter::new(
        "shroud_notifications_delivered_total",
        "Total notifications handed to subscribers"
    ).expect("metric creation failed");

    /// Messages dispatched with no live subscriber
    pub static ref NOTIFICATIONS_UNDELIVERED: Counter = Counter::new(
        "shroud_notifications_undelivered_total",
        "Total notifications dropped with no matching subscriber"
    ).expect("metric creation failed");
}

/// Outcome of the first registration attempt.
static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();

/// Handle to the registered metrics.
#[derive(Clone)]
pub struct MetricsHandle {
    registry: Registry,
}

impl MetricsHandle {
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

/// Register all metrics with the global registry.
///
/// Registration runs once. Later calls report the outcome of that first
/// attempt, including its failure.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    register_once(&REGISTERED, &REGISTRY)?;
    Ok(MetricsHandle {
        registry: REGISTRY.clone(),
    })
}

fn register_once(
    outcome: &OnceLock<Result<(), String>>,
    registry: &Registry,
) -> Result<(), TelemetryError> {
    outcome
        .get_or_init(|| register_all(registry).map_err(|e| e.to_string()))
        .clone()
        .map_err(TelemetryError::MetricsInit)
}

fn register_all(registry: &Registry) -> prometheus::Result<()> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(TOKENS_MINTED.clone()),
        Box::new(TOKENS_TRANSFERRED.clone()),
        Box::new(TOKENS_BURNED.clone()),
        Box::new(LIFECYCLE_ERRORS.clone()),
        Box::new(NOTIFICATIONS_PUBLISHED.clone()),
        Box::new(NOTIFICATIONS_DELIVERED.clone()),
        Box::new(NOTIFICATIONS_UNDELIVERED.clone()),
    ];
    for metric in metrics {
        registry.register(metric)?;
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_idempotent() {
        assert!(register_metrics().is_ok());
        assert!(register_metrics().is_ok());
    }

    #[test]
    fn test_gather_contains_lifecycle_counters() {
        register_metrics().unwrap();
        TOKENS_MINTED.inc();
        LIFECYCLE_ERRORS.with_label_values(&["mint", "validation"]).inc();

        let text = gather_metrics().unwrap();
        assert!(text.contains("shroud_tokens_minted_total"));
        assert!(text.contains("shroud_lifecycle_errors_total"));
    }

    #[test]
    fn test_failed_registration_is_remembered() {
        let registry = Registry::new();
        registry.register(Box::new(TOKENS_MINTED.clone())).unwrap();
        let outcome = OnceLock::new();

        let first = register_once(&outcome, &registry);
        assert!(matches!(first, Err(TelemetryError::MetricsInit(_))));
        let second = register_once(&outcome, &registry);
        assert!(matches!(second, Err(TelemetryError::MetricsInit(_))));
    }

    #[test]
    fn test_fresh_registry_registers_every_counter() {
        let registry = Registry::new();
        let outcome = OnceLock::new();
        register_once(&outcome, &registry).unwrap();
        register_once(&outcome, &registry).unwrap();
        TOKENS_BURNED.inc();
        assert!(registry
            .gather()
            .iter()
            .any(|family| family.get_name() == "shroud_tokens_burned_total"));
    }
}
