//! # Shroud Commitments - Commitment Lifecycle Controller
//!
//! Mint, transfer and burn of confidential token commitments, with
//! out-of-band notification of the receiving party.
//!
//! ## State Machine
//!
//! ```text
//!            mint                transfer               burn
//! (public) ───────→ Minted ─────────────→ Transferred ─────────→ Burned
//!                     │                      ↺ (receiver side)      ↑
//!                     └─────────────────────────────────────────────┘
//! ```
//!
//! Every record moves forward only. A transfer leaves the sender's record in
//! `Transferred` with its successor attached and creates a new spendable
//! record on the receiver's side once the transfer notice arrives.
//!
//! ## Architecture
//!
//! - `domain/` - Records, statuses, invariants
//! - `ports/` - Inbound API and outbound collaborator traits
//! - `adapters/` - In-process proof engine, ledger, account service, directory
//! - `service.rs` - [`CommitmentService`], generic over the outbound ports
//!
//! ## Concurrency
//!
//! At most one lifecycle operation runs per token id. Operations on different
//! tokens run concurrently.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shroud_commitments::{CommitmentLifecycleApi, TransferToken};
//!
//! let minted = service.mint(&alice, token_id, "art1").await?;
//! service.listen(&bob).await?;
//! let receipt = service.transfer(&alice, TransferToken::of(&minted, "bob")).await?;
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod ports;
pub mod service;
pub mod token_locks;

pub use adapters::{
    compute_commitment, InMemoryAccountService, InMemoryDirectory, InMemoryLedger,
    InMemoryProofEngine,
};
pub use config::LifecycleConfig;
pub use domain::{
    CommitmentFields, PublicAsset, PublicAssetStatus, TokenCommitment, TokenStatus,
    TransferredCommitment,
};
pub use error::{CommittedReceipt, ErrorKind, LifecycleError, LifecycleResult};
pub use events::{Notice, PublicAssetNotice, TokenTransferNotice};
pub use ports::inbound::{BurnReceipt, BurnToken, CommitmentLifecycleApi, TransferReceipt, TransferToken};
pub use ports::outbound::{
    AccountService, BurnRequest, CorrectnessQuery, CorrectnessReport, Directory, Ledger,
    MintCommitment, MintedCommitment, ProofEngine, SpendRequest, SpentCommitment,
};
pub use service::{CommitmentService, InMemoryCommitmentService};
pub use token_locks::TokenLocks;
