#![allow(dead_code)]

use locsnap_core::{
    Coordinate, GeocodeError, LocationProvider, LocationStore, PermissionStatus, Position,
    ProviderError, ReverseGeocoder, SqliteLocationStore, StoreError, StoreResult,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// How the scripted provider answers a live request.
#[derive(Debug, Clone, Copy)]
pub enum Script {
    Fix { after: Duration, position: Position },
    Fail { after: Duration },
    Hang,
}

pub struct ScriptedProvider {
    permission: PermissionStatus,
    script: Script,
    fetches: AtomicUsize,
    abandoned: AtomicBool,
}

impl ScriptedProvider {
    pub fn new(permission: PermissionStatus, script: Script) -> Self {
        Self {
            permission,
            script,
            fetches: AtomicUsize::new(0),
            abandoned: AtomicBool::new(false),
        }
    }

    pub fn granted(script: Script) -> Self {
        Self::new(PermissionStatus::Granted, script)
    }

    pub fn fix_after(ms: u64, latitude: f64, longitude: f64) -> Self {
        Self::granted(Script::Fix {
            after: Duration::from_millis(ms),
            position: Position::new(latitude, longitude),
        })
    }

    pub fn fail_after(ms: u64) -> Self {
        Self::granted(Script::Fail {
            after: Duration::from_millis(ms),
        })
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Whether a live request was dropped before it produced an answer.
    pub fn was_abandoned(&self) -> bool {
        self.abandoned.load(Ordering::SeqCst)
    }
}

struct AbandonGuard<'a> {
    flag: &'a AtomicBool,
    finished: bool,
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.flag.store(true, Ordering::SeqCst);
        }
    }
}

impl LocationProvider for ScriptedProvider {
    async fn request_foreground_permission(&self) -> PermissionStatus {
        self.permission
    }

    async fn current_position(&self) -> Result<Position, ProviderError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let mut guard = AbandonGuard {
            flag: &self.abandoned,
            finished: false,
        };
        let answer = match self.script {
            Script::Fix { after, position } => {
                tokio::time::sleep(after).await;
                Ok(position)
            }
            Script::Fail { after } => {
                tokio::time::sleep(after).await;
                Err(ProviderError::Unavailable("no satellite fix".to_string()))
            }
            Script::Hang => std::future::pending().await,
        };
        guard.finished = true;
        answer
    }
}

/// In-memory store that counts calls and can simulate read failures.
pub struct RecordingStore {
    inner: SqliteLocationStore,
    saves: AtomicUsize,
    reads: AtomicUsize,
    fail_reads: AtomicBool,
}

impl RecordingStore {
    pub fn initialized() -> Self {
        let inner = SqliteLocationStore::in_memory();
        inner.initialize().unwrap();
        Self {
            inner,
            saves: AtomicUsize::new(0),
            reads: AtomicUsize::new(0),
            fail_reads: AtomicBool::new(false),
        }
    }

    pub fn seeded(latitude: f64, longitude: f64) -> Self {
        let store = Self::initialized();
        store
            .inner
            .save(&Coordinate::new(latitude, longitude).unwrap())
            .unwrap();
        store
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Reads the persisted pair without counting it as a store access.
    pub fn peek(&self) -> Option<(f64, f64)> {
        self.inner
            .get_saved()
            .unwrap()
            .map(|coordinate| (coordinate.latitude, coordinate.longitude))
    }
}

impl LocationStore for RecordingStore {
    fn initialize(&self) -> StoreResult<()> {
        self.inner.initialize()
    }

    fn save(&self, coordinate: &Coordinate) -> StoreResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(coordinate)
    }

    fn get_saved(&self) -> StoreResult<Option<Coordinate>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::InvalidData("simulated read failure".to_string()));
        }
        self.inner.get_saved()
    }

    fn close(&self) -> StoreResult<()> {
        self.inner.close()
    }
}

/// Geocoder answering every lookup with the same address (or failure).
pub struct FixedGeocoder {
    address: Option<String>,
    fail: bool,
    calls: AtomicUsize,
}

impl FixedGeocoder {
    pub fn address(address: &str) -> Self {
        Self {
            address: Some(address.to_string()),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            address: None,
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ReverseGeocoder for FixedGeocoder {
    async fn try_reverse_geocode(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> Result<Option<String>, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(GeocodeError::Status(503));
        }
        Ok(self.address.clone())
    }
}
