//! Flutter bridge for the LocSnap core.

pub mod api;
