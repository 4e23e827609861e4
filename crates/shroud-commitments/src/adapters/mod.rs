//! # Adapters Layer (Hexagonal Architecture)
//!
//! In-process implementations of the outbound ports.

mod accounts;
mod directory;
mod ledger;
mod proof_engine;

pub use accounts::{InMemoryAccountService, ACCOUNT_ADDRESS_LEN};
pub use directory::InMemoryDirectory;
pub use ledger::InMemoryLedger;
pub use proof_engine::{compute_commitment, InMemoryProofEngine, COMMITMENT_LEN};
