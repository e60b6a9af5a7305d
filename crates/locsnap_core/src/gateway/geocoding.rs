//! Reverse geocoding through the OpenCage API.
//!
//! # Responsibility
//! - Translate a coordinate pair into a formatted address string.
//! - Keep provider URL and API key handling in one place.
//!
//! # Invariants
//! - No retries and no local caching: every lookup is one HTTP request.
//! - The API key never appears in log lines.

use log::{debug, warn};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::sync::Arc;

pub const DEFAULT_OPENCAGE_BASE_URL: &str = "https://api.opencagedata.com";

#[derive(Debug)]
pub enum GeocodeError {
    MissingApiKey,
    Http(reqwest::Error),
    Status(u16),
    Parse(serde_json::Error),
}

impl Display for GeocodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "no geocoding API key configured"),
            Self::Http(err) => write!(f, "geocoding request failed: {err}"),
            Self::Status(code) => write!(f, "geocoding provider answered with HTTP {code}"),
            Self::Parse(err) => write!(f, "invalid geocoding response: {err}"),
        }
    }
}

impl Error for GeocodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::MissingApiKey | Self::Status(_) => None,
        }
    }
}

impl From<reqwest::Error> for GeocodeError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

/// Coordinate-to-address lookup.
pub trait ReverseGeocoder: Send + Sync {
    /// Looks up the address for a coordinate pair.
    ///
    /// Returns `Ok(None)` when the provider knows no address for it.
    fn try_reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> impl Future<Output = Result<Option<String>, GeocodeError>> + Send;

    /// Looks up the address, logging and swallowing any failure.
    fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> impl Future<Output = Option<String>> + Send {
        async move {
            match self.try_reverse_geocode(latitude, longitude).await {
                Ok(Some(address)) => {
                    debug!("event=reverse_geocode module=geocoding status=ok");
                    Some(address)
                }
                Ok(None) => {
                    debug!("event=reverse_geocode module=geocoding status=no_result");
                    None
                }
                Err(err) => {
                    warn!("event=reverse_geocode module=geocoding status=error error={err}");
                    None
                }
            }
        }
    }
}

impl<G: ReverseGeocoder> ReverseGeocoder for Arc<G> {
    fn try_reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> impl Future<Output = Result<Option<String>, GeocodeError>> + Send {
        (**self).try_reverse_geocode(latitude, longitude)
    }
}

#[derive(Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Deserialize)]
struct GeocodeResult {
    formatted: Option<String>,
}

/// Extracts `results[0].formatted` from an OpenCage JSON body.
pub fn parse_geocode_body(body: &str) -> Result<Option<String>, GeocodeError> {
    let response: GeocodeResponse = serde_json::from_str(body).map_err(GeocodeError::Parse)?;
    Ok(response
        .results
        .into_iter()
        .next()
        .and_then(|result| result.formatted))
}

/// OpenCage reverse geocoding client.
pub struct OpenCageClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenCageClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_OPENCAGE_BASE_URL)
    }

    pub fn with_base_url(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        let api_key = api_key.filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            warn!("event=geocoding_config module=geocoding status=missing_api_key");
        }
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn request_url(&self, api_key: &str, latitude: f64, longitude: f64) -> String {
        format!(
            "{}/geocode/v1/json?q={latitude}+{longitude}&key={api_key}",
            self.base_url.trim_end_matches('/')
        )
    }
}

impl ReverseGeocoder for OpenCageClient {
    async fn try_reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<String>, GeocodeError> {
        let api_key = self.api_key.as_deref().ok_or(GeocodeError::MissingApiKey)?;
        let url = self.request_url(api_key, latitude, longitude);

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        parse_geocode_body(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_geocode_body, GeocodeError, OpenCageClient, ReverseGeocoder};

    #[test]
    fn empty_results_yield_none() {
        assert_eq!(parse_geocode_body(r#"{"results": []}"#).unwrap(), None);
        assert_eq!(parse_geocode_body(r#"{"status": {"code": 200}}"#).unwrap(), None);
    }

    #[test]
    fn first_formatted_result_wins() {
        let body = r#"{
            "results": [
                {"formatted": "X", "confidence": 9},
                {"formatted": "Y"}
            ],
            "total_results": 2
        }"#;
        assert_eq!(parse_geocode_body(body).unwrap().as_deref(), Some("X"));
    }

    #[test]
    fn malformed_body_is_parse_error() {
        let err = parse_geocode_body("<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, GeocodeError::Parse(_)));
    }

    #[test]
    fn request_url_follows_provider_format() {
        let client =
            OpenCageClient::with_base_url(Some("KEY".to_string()), "https://geo.test/");
        assert_eq!(
            client.request_url("KEY", -23.5, -46.625),
            "https://geo.test/geocode/v1/json?q=-23.5+-46.625&key=KEY"
        );
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_network() {
        let client = OpenCageClient::new(Some("  ".to_string()));
        assert!(!client.has_api_key());

        let err = client.try_reverse_geocode(1.0, 2.0).await.unwrap_err();
        assert!(matches!(err, GeocodeError::MissingApiKey));
        assert_eq!(client.reverse_geocode(1.0, 2.0).await, None);
    }
}
