//! Core logic for the LocSnap location screen.
//! Acquisition, caching and geocoding live here; UI shells only render state.

pub mod config;
pub mod db;
pub mod gateway;
pub mod logging;
pub mod model;
pub mod platform;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use gateway::geocoding::{
    parse_geocode_body, GeocodeError, OpenCageClient, ReverseGeocoder,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::coordinate::{Coordinate, CoordinateValidationError};
pub use platform::{
    LocationProvider, PermissionStatus, Position, ProviderError, PushLocationProvider,
    RequestId,
};
pub use repo::location_store::{LocationStore, SqliteLocationStore, StoreError, StoreResult};
pub use service::acquirer::{
    AcquireOutcome, FallbackReason, LocationAcquirer, DEFAULT_ACQUIRE_TIMEOUT,
};
pub use service::screen::{LocationScreen, LocationView};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
