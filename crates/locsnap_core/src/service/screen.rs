//! Location screen state and its two user actions.
//!
//! # Responsibility
//! - Run "get current" through the acquirer and "get saved" straight
//!   against the store.
//! - Enrich any resulting coordinate with a reverse-geocoded address.
//! - Expose the displayed state as a plain snapshot for UI layers.
//!
//! # Invariants
//! - A successful action clears the previous error; a failed one clears the
//!   previous coordinate and address, so the view never mixes two results.
//! - Actions never fail: every lower-level error ends up as view state.
//! - `get_saved` calls the store inline; store calls block and are expected
//!   to be short.

use crate::config::CoreConfig;
use crate::gateway::geocoding::{OpenCageClient, ReverseGeocoder};
use crate::model::coordinate::Coordinate;
use crate::platform::LocationProvider;
use crate::repo::location_store::{LocationStore, SqliteLocationStore, StoreResult};
use crate::service::acquirer::LocationAcquirer;
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;

pub const SCREEN_TITLE: &str = "Location";
pub const CURRENT_UNAVAILABLE_MESSAGE: &str =
    "Could not obtain the current location or use the last saved one.";
pub const SAVED_MISSING_MESSAGE: &str = "No saved location found.";

/// Snapshot of everything the location screen displays.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LocationView {
    pub coordinate: Option<Coordinate>,
    pub address: Option<String>,
    pub error: Option<String>,
}

impl LocationView {
    /// Text lines in display order.
    pub fn render_lines(&self) -> Vec<String> {
        let mut lines = vec![SCREEN_TITLE.to_string()];
        if let Some(error) = &self.error {
            lines.push(format!("Error: {error}"));
        }
        if let Some(coordinate) = &self.coordinate {
            lines.push(format!("Latitude: {}", coordinate.latitude));
            lines.push(format!("Longitude: {}", coordinate.longitude));
            if let Some(timestamp) = &coordinate.timestamp {
                lines.push(format!("Timestamp: {timestamp}"));
            }
            if let Some(address) = &self.address {
                lines.push(format!("Address: {address}"));
            }
        }
        lines
    }
}

/// Location screen backed by an acquirer, the shared store and a geocoder.
pub struct LocationScreen<P, S, G> {
    acquirer: LocationAcquirer<P, S>,
    store: Arc<S>,
    geocoder: G,
    view: LocationView,
}

impl<P> LocationScreen<P, SqliteLocationStore, OpenCageClient>
where
    P: LocationProvider,
{
    /// Wires a screen from configuration: file-backed store and OpenCage.
    ///
    /// The store is created closed; call `mount` before the first action.
    pub fn from_config(config: &CoreConfig, provider: Arc<P>) -> Self {
        let store = Arc::new(SqliteLocationStore::file(&config.db_path));
        let acquirer =
            LocationAcquirer::with_timeout(provider, Arc::clone(&store), config.acquire_timeout);
        let geocoder = OpenCageClient::with_base_url(
            config.opencage_api_key.clone(),
            config.geocoding_url.clone(),
        );
        Self::new(acquirer, store, geocoder)
    }
}

impl<P, S, G> LocationScreen<P, S, G>
where
    P: LocationProvider,
    S: LocationStore,
    G: ReverseGeocoder,
{
    /// `store` must be the same store the acquirer writes to.
    pub fn new(acquirer: LocationAcquirer<P, S>, store: Arc<S>, geocoder: G) -> Self {
        Self {
            acquirer,
            store,
            geocoder,
            view: LocationView::default(),
        }
    }

    /// Prepares the backing store. Safe to call on every screen mount.
    pub fn mount(&self) -> StoreResult<()> {
        self.store.initialize()
    }

    /// Releases the backing store.
    pub fn unmount(&self) -> StoreResult<()> {
        self.store.close()
    }

    pub fn view(&self) -> &LocationView {
        &self.view
    }

    /// "Get current location": live fix with cached fallback.
    pub async fn get_current(&mut self) -> &LocationView {
        let coordinate = self.acquirer.acquire().await.into_coordinate();
        self.show(coordinate, CURRENT_UNAVAILABLE_MESSAGE, "current")
            .await;
        &self.view
    }

    /// "Get saved location": reads the cache without permission or race.
    pub async fn get_saved(&mut self) -> &LocationView {
        let coordinate = match self.store.get_saved() {
            Ok(found) => found,
            Err(err) => {
                warn!("event=screen_action module=screen action=saved status=store_error error={err}");
                None
            }
        };
        self.show(coordinate, SAVED_MISSING_MESSAGE, "saved").await;
        &self.view
    }

    async fn show(
        &mut self,
        coordinate: Option<Coordinate>,
        missing_message: &str,
        action: &'static str,
    ) {
        match coordinate {
            Some(coordinate) => {
                let address = self
                    .geocoder
                    .reverse_geocode(coordinate.latitude, coordinate.longitude)
                    .await;
                info!(
                    "event=screen_action module=screen action={action} status=ok has_address={}",
                    address.is_some()
                );
                self.view = LocationView {
                    coordinate: Some(coordinate),
                    address,
                    error: None,
                };
            }
            None => {
                info!("event=screen_action module=screen action={action} status=empty");
                self.view = LocationView {
                    coordinate: None,
                    address: None,
                    error: Some(missing_message.to_string()),
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LocationView, SCREEN_TITLE};
    use crate::model::coordinate::Coordinate;

    #[test]
    fn empty_view_renders_title_only() {
        assert_eq!(LocationView::default().render_lines(), vec![SCREEN_TITLE]);
    }

    #[test]
    fn full_view_renders_fields_in_order() {
        let view = LocationView {
            coordinate: Some(
                Coordinate::new(-23.5, -46.6)
                    .unwrap()
                    .with_timestamp("2024-05-01 10:00:00"),
            ),
            address: Some("Praça da Sé, São Paulo".to_string()),
            error: None,
        };
        assert_eq!(
            view.render_lines(),
            vec![
                "Location",
                "Latitude: -23.5",
                "Longitude: -46.6",
                "Timestamp: 2024-05-01 10:00:00",
                "Address: Praça da Sé, São Paulo",
            ]
        );
    }

    #[test]
    fn error_view_renders_message() {
        let view = LocationView {
            error: Some("No saved location found.".to_string()),
            ..LocationView::default()
        };
        assert_eq!(
            view.render_lines(),
            vec!["Location", "Error: No saved location found."]
        );
    }
}
