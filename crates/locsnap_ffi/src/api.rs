//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the location screen actions to Dart via FRB.
//! - Accept permission answers and position fixes from the platform side.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - One screen instance exists per process, created by `location_init`.
//! - Screen actions are serialized; platform reports never wait on them.

use locsnap_core::service::screen::LocationScreen;
use locsnap_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    CoreConfig, LocationView, OpenCageClient, Position, PushLocationProvider,
    SqliteLocationStore,
};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tokio::sync::Mutex;

const NOT_INITIALIZED_MESSAGE: &str = "location_init has not been called";

type Screen = LocationScreen<PushLocationProvider, SqliteLocationStore, OpenCageClient>;

struct LocationApp {
    db_path: PathBuf,
    provider: Arc<PushLocationProvider>,
    screen: Mutex<Screen>,
}

static LOCATION_APP: OnceLock<LocationApp> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// What the location screen should display after an action.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSnapshot {
    /// Whether a coordinate is available.
    pub ok: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Persistence time, set for cached readings only.
    pub timestamp: Option<String>,
    pub address: Option<String>,
    /// Human-readable error text when `ok` is false.
    pub message: Option<String>,
}

impl LocationSnapshot {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            latitude: None,
            longitude: None,
            timestamp: None,
            address: None,
            message: Some(message.into()),
        }
    }
}

impl From<&LocationView> for LocationSnapshot {
    fn from(view: &LocationView) -> Self {
        let coordinate = view.coordinate.as_ref();
        Self {
            ok: coordinate.is_some(),
            latitude: coordinate.map(|c| c.latitude),
            longitude: coordinate.map(|c| c.longitude),
            timestamp: coordinate.and_then(|c| c.timestamp.clone()),
            address: view.address.clone(),
            message: view.error.clone(),
        }
    }
}

/// Creates the process-wide location screen and opens its cache.
///
/// Input semantics:
/// - `db_path`: cache file path; `None` uses `LOCSNAP_DB_PATH` or the default.
/// - `api_key`: OpenCage key; `None` uses `OPENCAGE_API_KEY`.
///
/// # FFI contract
/// - Idempotent for the same database path; a different path is rejected.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn location_init(db_path: Option<String>, api_key: Option<String>) -> String {
    let mut config = match CoreConfig::from_env() {
        Ok(config) => config,
        Err(err) => return format!("location_init failed: {err}"),
    };
    if let Some(path) = db_path.map(|raw| raw.trim().to_string()) {
        if !path.is_empty() {
            config.db_path = PathBuf::from(path);
        }
    }
    if let Some(key) = api_key {
        config.opencage_api_key = Some(key);
    }

    if let Some(app) = LOCATION_APP.get() {
        return ensure_same_db(app, &config.db_path);
    }

    let provider = Arc::new(PushLocationProvider::new());
    let screen = LocationScreen::from_config(&config, Arc::clone(&provider));
    if let Err(err) = screen.mount() {
        return format!("location_init failed: {err}");
    }

    let app = LocationApp {
        db_path: config.db_path.clone(),
        provider,
        screen: Mutex::new(screen),
    };
    match LOCATION_APP.set(app) {
        Ok(()) => {
            info!("event=location_init module=ffi status=ok");
            String::new()
        }
        Err(unused) => {
            if let Err(err) = unused.screen.into_inner().unmount() {
                warn!("event=location_init module=ffi status=close_error error={err}");
            }
            match LOCATION_APP.get() {
                Some(app) => ensure_same_db(app, &config.db_path),
                None => NOT_INITIALIZED_MESSAGE.to_string(),
            }
        }
    }
}

/// Records the OS answer to the foreground location permission prompt.
///
/// Returns `false` when `location_init` has not been called.
#[flutter_rust_bridge::frb(sync)]
pub fn location_set_permission(granted: bool) -> bool {
    with_provider(|provider| provider.set_permission(granted)).is_some()
}

/// Returns the id of the position request the "get current" action is
/// waiting on, or `None` when no request is parked.
///
/// The platform side passes this id back with its answer.
#[flutter_rust_bridge::frb(sync)]
pub fn location_pending_request() -> Option<u64> {
    with_provider(|provider| provider.pending_request()).flatten()
}

/// Delivers a platform position fix to request `request_id`.
///
/// Returns `false` when that request is no longer waiting (for example after
/// the timeout), in which case the fix is discarded.
#[flutter_rust_bridge::frb(sync)]
pub fn location_report_fix(request_id: u64, latitude: f64, longitude: f64) -> bool {
    with_provider(|provider| provider.report_fix(request_id, Position::new(latitude, longitude)))
        .unwrap_or(false)
}

/// Delivers a platform position failure to request `request_id`.
///
/// Returns `false` when that request is no longer waiting and the failure was
/// discarded.
#[flutter_rust_bridge::frb(sync)]
pub fn location_report_failure(request_id: u64, message: String) -> bool {
    with_provider(|provider| provider.report_failure(request_id, message)).unwrap_or(false)
}

/// "Get current location" button.
///
/// # FFI contract
/// - Async; resolves within the acquire timeout plus one geocoding call.
/// - The Dart side must answer the parked position request, read with
///   `location_pending_request`, through `location_report_fix` /
///   `location_report_failure`.
/// - Never panics.
pub async fn location_get_current() -> LocationSnapshot {
    let Some(app) = LOCATION_APP.get() else {
        warn!("event=location_get_current module=ffi status=not_initialized");
        return LocationSnapshot::failure(NOT_INITIALIZED_MESSAGE);
    };
    let mut screen = app.screen.lock().await;
    LocationSnapshot::from(screen.get_current().await)
}

/// "Get saved location" button.
pub async fn location_get_saved() -> LocationSnapshot {
    let Some(app) = LOCATION_APP.get() else {
        warn!("event=location_get_saved module=ffi status=not_initialized");
        return LocationSnapshot::failure(NOT_INITIALIZED_MESSAGE);
    };
    let mut screen = app.screen.lock().await;
    LocationSnapshot::from(screen.get_saved().await)
}

fn with_provider<T>(f: impl FnOnce(&PushLocationProvider) -> T) -> Option<T> {
    match LOCATION_APP.get() {
        Some(app) => Some(f(&app.provider)),
        None => {
            warn!("event=platform_report module=ffi status=not_initialized");
            None
        }
    }
}

fn ensure_same_db(app: &LocationApp, db_path: &Path) -> String {
    if app.db_path.as_path() == db_path {
        String::new()
    } else {
        format!(
            "location already initialized at `{}`; refusing to switch to `{}`",
            app.db_path.display(),
            db_path.display()
        )
    }
}
