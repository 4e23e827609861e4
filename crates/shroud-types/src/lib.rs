//! # Shroud Types Crate
//!
//! Opaque values shared across the Shroud workspace.
//!
//! ## Design Principles
//!
//! - **Opaque material**: Commitments, salts, keys and addresses are byte
//!   strings. Nothing in this crate interprets them beyond equality and hex
//!   rendering; cryptographic strength belongs to the proof engine.
//! - **Distinct types**: Every kind of value gets its own newtype so a salt can
//!   never be handed to an API expecting a commitment.
//! - **Hex on the wire**: Serde renders all values as `0x`-prefixed hex strings.

pub mod bytes;
pub mod errors;
pub mod party;

pub use bytes::{
    Address, ChannelPublicKey, Commitment, IdentityHandle, Salt, TokenId, ZkpPublicKey, ZkpSecret,
};
pub use errors::TypesError;
pub use party::{derive_public_key, PartyIdentity, ZkpKeyPair};
