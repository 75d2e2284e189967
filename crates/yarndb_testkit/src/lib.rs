//! # YarnDB Testkit
//!
//! Test utilities for YarnDB.
//!
//! This crate provides:
//! - Test fixtures and datastore helpers
//! - Property-based test generators using proptest
//! - An integration harness that checks a datastore against a model
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust
//! use yarndb_testkit::prelude::*;
//!
//! with_temp_store(|store| {
//!     scenarios::seed_users(store, 10);
//!     assert_eq!(store.status().record_count, 10);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
pub use stress::*;
