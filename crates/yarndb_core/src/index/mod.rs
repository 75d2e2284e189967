//! Field indexes.
//!
//! An index maps the value found at one field path to the records holding
//! it. Indexes are:
//! - Created explicitly, by path, and built from a full scan
//! - Maintained on every put and delete, including committed transactions
//! - Rebuilt from the records at every open (they are never persisted)
//!
//! Queries consult an index when one exists on the queried path and
//! produce the same result a full scan would.

mod field;
mod manager;

pub use field::FieldIndex;
pub use manager::IndexManager;
