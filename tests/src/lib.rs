//! # Witness Hub Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── harness.rs        # Deterministic in-memory federation
//! └── integration/      # Multi-server consensus scenarios
//!     ├── e2e_consensus.rs
//!     └── flows.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p wh-tests
//! cargo test -p wh-tests integration::flows::
//! ```

pub mod harness;
pub mod integration;
