//! Outbound gateways to remote services.
//!
//! # Responsibility
//! - Hide HTTP/provider details behind traits the services depend on.

pub mod geocoding;
