/// Reverse geocoding client
///
/// Looks up a human-readable address for a coordinate pair through a
/// Nominatim-compatible HTTP API. Lookups are bounded by the configured
/// timeout; a timeout or any upstream failure yields `None` and is logged at
/// warn level, never surfaced to the caller.
use crate::config::GeocoderConfig;
use resilience::{with_timeout_result, TimeoutError};
use serde::Deserialize;
use std::time::Duration;

#[async_trait::async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Address for the coordinates, or `None` when unknown
    async fn reverse(&self, latitude: f64, longitude: f64) -> Option<String>;
}

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned status {0}")]
    Status(u16),
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    error: Option<String>,
}

/// Client for the Nominatim `/reverse` endpoint
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self, GeocodeError> {
        let timeout = Duration::from_millis(config.timeout_ms);
        // The lookup deadline is enforced by `with_timeout_result`
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    async fn lookup(&self, latitude: f64, longitude: f64) -> Result<Option<String>, GeocodeError> {
        let response = self
            .client
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeocodeError::Status(response.status().as_u16()));
        }

        let body: ReverseResponse = response.json().await?;
        if let Some(error) = body.error {
            tracing::debug!(latitude, longitude, error = %error, "no address for coordinates");
        }
        Ok(body.display_name.filter(|name| !name.is_empty()))
    }

    async fn guarded_lookup(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<String>, TimeoutError> {
        with_timeout_result(self.timeout, self.lookup(latitude, longitude)).await
    }
}

#[async_trait::async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse(&self, latitude: f64, longitude: f64) -> Option<String> {
        match self.guarded_lookup(latitude, longitude).await {
            Ok(address) => address,
            Err(TimeoutError::Elapsed(after)) => {
                tracing::warn!(
                    latitude,
                    longitude,
                    timeout_ms = after.as_millis() as u64,
                    "reverse geocoding timed out"
                );
                None
            }
            Err(e) => {
                tracing::warn!(latitude, longitude, error = %e, "reverse geocoding failed");
                None
            }
        }
    }
}

/// Used when `GEOCODER_ENABLED=false`: every address is unknown
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGeocoder;

#[async_trait::async_trait]
impl ReverseGeocoder for DisabledGeocoder {
    async fn reverse(&self, _latitude: f64, _longitude: f64) -> Option<String> {
        None
    }
}
