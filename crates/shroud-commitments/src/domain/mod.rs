//! # Domain Module
//!
//! Token commitments, public asset records and the rules they obey.

pub mod entities;
pub mod invariants;

pub use entities::*;
pub use invariants::*;
