//! # Klaxon Test Suite
//!
//! Unified test crate for cross-crate alert flows.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── flows.rs      # Multi-node dissemination and convergence
//!     └── lifecycle.rs  # Time-driven window, expiry, and replay behavior
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p klaxon-tests
//!
//! # By category
//! cargo test -p klaxon-tests integration::flows
//! cargo test -p klaxon-tests integration::lifecycle
//! ```

#![allow(dead_code)]

pub mod integration;
