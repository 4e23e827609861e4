//! Error types for the commitment lifecycle.

use crate::domain::TokenStatus;
use crate::ports::inbound::{BurnReceipt, TransferReceipt};
use shroud_bus::BusError;
use std::fmt;
use thiserror::Error;

/// Lifecycle errors.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Malformed input or a precondition on the current record failed.
    #[error("Validation failed: {reason}")]
    Validation { reason: String },

    /// Status change not allowed by the state machine.
    #[error("Invalid status transition: cannot go from {from} to {to}")]
    InvalidTransition { from: TokenStatus, to: TokenStatus },

    /// The proof engine rejected or failed the commitment operation.
    #[error("Proof engine error: {reason}")]
    ProofEngine { reason: String },

    /// Ledger read or write failed.
    #[error("Persistence error: {reason}")]
    Persistence { reason: String, transient: bool },

    /// A party name did not resolve.
    #[error("Directory lookup for {name:?} failed: {reason}")]
    Directory { name: String, reason: String },

    /// One-time account issuance or unlock failed.
    #[error("Account service error: {reason}")]
    AccountService { reason: String },

    /// Malformed channel parameters.
    #[error("Channel error: {0}")]
    Channel(BusError),

    /// The operation was committed but the peer notification was not sent.
    /// Carries the committed result so the caller can retry the notice.
    #[error("Operation committed but notification failed: {source}")]
    NotificationFailed {
        receipt: Box<CommittedReceipt>,
        source: Box<LifecycleError>,
    },

    /// A burn to self was committed but the received public asset was not
    /// recorded. Re-apply with `CommitmentService::record_received_asset`.
    #[error("Burn committed but received asset was not recorded: {source}")]
    AssetRecordFailed {
        receipt: Box<CommittedReceipt>,
        source: Box<LifecycleError>,
    },
}

/// Result of an operation whose follow-up step failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommittedReceipt {
    Transfer(TransferReceipt),
    Burn(BurnReceipt),
}

/// Coarse error classification, used for retry decisions and metric labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    ProofEngine,
    Persistence,
    Directory,
    Channel,
    AccountService,
    Notification,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::ProofEngine => "proof_engine",
            Self::Persistence => "persistence",
            Self::Directory => "directory",
            Self::Channel => "channel",
            Self::AccountService => "account_service",
            Self::Notification => "notification",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl LifecycleError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } | Self::InvalidTransition { .. } => ErrorKind::Validation,
            Self::ProofEngine { .. } => ErrorKind::ProofEngine,
            Self::Persistence { .. } => ErrorKind::Persistence,
            Self::Directory { .. } => ErrorKind::Directory,
            Self::Channel(_) => ErrorKind::Channel,
            Self::AccountService { .. } => ErrorKind::AccountService,
            Self::NotificationFailed { .. } => ErrorKind::Notification,
            Self::AssetRecordFailed { .. } => ErrorKind::Persistence,
        }
    }

    /// True when retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Directory { .. } | Self::AccountService { .. } => true,
            Self::Persistence { transient, .. } => *transient,
            Self::NotificationFailed { .. } | Self::AssetRecordFailed { .. } => true,
            _ => false,
        }
    }

    /// Committed result carried by an error raised after the commit point.
    pub fn committed_receipt(&self) -> Option<&CommittedReceipt> {
        match self {
            Self::NotificationFailed { receipt, .. } | Self::AssetRecordFailed { receipt, .. } => {
                Some(receipt)
            }
            _ => None,
        }
    }
}

impl From<BusError> for LifecycleError {
    fn from(err: BusError) -> Self {
        match err {
            BusError::InvalidIdentity { party } => Self::Validation {
                reason: format!("party {party} has no address"),
            },
            other => Self::Channel(other),
        }
    }
}

/// Result type for lifecycle operations
pub type LifecycleResult<T> = Result<T, LifecycleError>;
