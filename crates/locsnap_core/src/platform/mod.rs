//! Device location provider seam.
//!
//! # Responsibility
//! - Describe what core needs from the OS location service: a foreground
//!   permission answer and one live position reading.
//! - Keep platform plumbing (Flutter channels, simulators) outside services.
//!
//! # Invariants
//! - Provider futures are `Send`, so services can run on any tokio runtime.
//! - Dropping a `current_position` future is the cancellation signal.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;

mod push;

pub use push::{PushLocationProvider, RequestId};

/// Raw position reading as reported by the platform, not yet validated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Foreground location permission state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// The user has not answered the prompt yet.
    Undetermined,
}

impl PermissionStatus {
    pub fn is_granted(self) -> bool {
        self == Self::Granted
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Undetermined => "undetermined",
        }
    }
}

/// Live position request failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The platform reported a failure (service off, no fix, ...).
    Unavailable(String),
    /// The provider went away before answering.
    Disconnected,
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "location unavailable: {message}"),
            Self::Disconnected => write!(f, "location provider disconnected"),
        }
    }
}

impl Error for ProviderError {}

/// OS-level location service used by the acquirer.
pub trait LocationProvider: Send + Sync {
    /// Asks for foreground location permission and returns the answer.
    fn request_foreground_permission(&self) -> impl Future<Output = PermissionStatus> + Send;

    /// Requests one live position reading.
    fn current_position(&self) -> impl Future<Output = Result<Position, ProviderError>> + Send;
}
