//! Domain model for location snapshots.
//!
//! # Responsibility
//! - Define the coordinate shape shared by acquisition, storage and screen.
//!
//! # Invariants
//! - A `Coordinate` handed to storage has passed `Coordinate::validate()`.

pub mod coordinate;
