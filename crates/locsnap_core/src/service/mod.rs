//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate provider, store and gateway calls into screen-level actions.
//! - Keep UI/FFI layers decoupled from storage and platform details.

pub mod acquirer;
pub mod screen;
