//! Coordinate domain model.
//!
//! # Responsibility
//! - Define the latitude/longitude pair used for live and cached readings.
//! - Enforce WGS84 range checks at construction and before persistence.
//!
//! # Invariants
//! - `latitude` is finite and within `[-90, 90]`.
//! - `longitude` is finite and within `[-180, 180]`.
//! - `timestamp` is only set for readings that came out of the store.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const LATITUDE_LIMIT: f64 = 90.0;
const LONGITUDE_LIMIT: f64 = 180.0;

/// Range violation for a coordinate component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoordinateValidationError {
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
}

impl Display for CoordinateValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LatitudeOutOfRange(value) => {
                write!(f, "latitude {value} is outside [-90, 90]")
            }
            Self::LongitudeOutOfRange(value) => {
                write!(f, "longitude {value} is outside [-180, 180]")
            }
        }
    }
}

impl Error for CoordinateValidationError {}

/// A latitude/longitude pair, optionally stamped with its persistence time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
    /// SQLite `CURRENT_TIMESTAMP` text (`YYYY-MM-DD HH:MM:SS`, UTC).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Coordinate {
    /// Creates a validated coordinate without a timestamp.
    ///
    /// # Errors
    /// - Returns a validation error when either component is out of range
    ///   or not finite.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateValidationError> {
        let coordinate = Self {
            latitude,
            longitude,
            timestamp: None,
        };
        coordinate.validate()?;
        Ok(coordinate)
    }

    /// Attaches the persisted timestamp to this reading.
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Checks both components against their WGS84 ranges.
    pub fn validate(&self) -> Result<(), CoordinateValidationError> {
        if !self.latitude.is_finite() || self.latitude.abs() > LATITUDE_LIMIT {
            return Err(CoordinateValidationError::LatitudeOutOfRange(self.latitude));
        }
        if !self.longitude.is_finite() || self.longitude.abs() > LONGITUDE_LIMIT {
            return Err(CoordinateValidationError::LongitudeOutOfRange(
                self.longitude,
            ));
        }
        Ok(())
    }
}
