//! # Shroud Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # criterion benchmarks
//! └── src/integration/  # cross-crate flows
//!     ├── lifecycle_flows.rs
//!     └── notification_flows.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p shroud-tests
//! cargo test -p shroud-tests integration::lifecycle_flows
//! cargo bench -p shroud-tests
//! ```

#![allow(dead_code)]

pub mod integration;
