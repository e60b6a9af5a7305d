//! Repository layer for persisted location state.
//!
//! # Responsibility
//! - Define the store contract consumed by acquisition and screen services.
//! - Isolate SQLite query details behind that contract.
//!
//! # Invariants
//! - Store writes validate the coordinate before any SQL mutation.
//! - Store failures are returned as values, never panics.

pub mod location_store;
