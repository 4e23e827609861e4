//! # Integration Tests
//!
//! Flows that cross the commitment service, the notification channel and the
//! identity registry.

pub mod lifecycle_flows;
pub mod notification_flows;
