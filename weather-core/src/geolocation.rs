//! Position sources for "use my location".
//!
//! A missing capability is an absent geolocator (`Option::None`), not a
//! failing one, so callers can tell the two apart before going to loading.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::{fmt::Debug, time::Duration};
use tracing::debug;

use crate::{error::WidgetError, model::Coordinates};

/// Upper bound on how long a position request may take.
pub const GEOLOCATION_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_IP_LOOKUP_URL: &str = "http://ip-api.com/json";

/// Why a position could not be produced.
///
/// `Other` carries the lookup service's status code when it refused for a
/// reason that is neither a permission problem nor an outage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoFailure {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
    Other(u16),
}

impl From<GeoFailure> for WidgetError {
    fn from(failure: GeoFailure) -> Self {
        match failure {
            GeoFailure::PermissionDenied => WidgetError::PermissionDenied,
            GeoFailure::PositionUnavailable => WidgetError::PositionUnavailable,
            GeoFailure::Timeout => WidgetError::Timeout,
            GeoFailure::Other(_) => WidgetError::LocationDenied,
        }
    }
}

#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    async fn locate(&self) -> Result<Coordinates, GeoFailure>;
}

/// Run `locate` with a hard deadline; an expired deadline is [`GeoFailure::Timeout`].
pub async fn locate_within(
    geolocator: &dyn Geolocator,
    limit: Duration,
) -> Result<Coordinates, GeoFailure> {
    tokio::time::timeout(limit, geolocator.locate())
        .await
        .unwrap_or(Err(GeoFailure::Timeout))
}

/// Always answers with the same position.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator {
    coord: Coordinates,
}

impl FixedGeolocator {
    pub fn new(coord: Coordinates) -> Self {
        Self { coord }
    }
}

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn locate(&self) -> Result<Coordinates, GeoFailure> {
        Ok(self.coord)
    }
}

/// Approximate position from the public IP address.
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    message: Option<String>,
}

impl IpGeolocator {
    pub fn new() -> Self {
        Self::with_url(DEFAULT_IP_LOOKUP_URL)
    }

    pub fn with_url(url: &str) -> Self {
        Self {
            url: url.to_string(),
            http: Client::new(),
        }
    }
}

impl Default for IpGeolocator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn locate(&self) -> Result<Coordinates, GeoFailure> {
        let res = self.http.get(&self.url).send().await.map_err(|e| {
            debug!(error = %e, "IP lookup request failed");
            GeoFailure::PositionUnavailable
        })?;

        match res.status() {
            StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => {
                return Err(GeoFailure::PermissionDenied);
            }
            status if status.is_client_error() => {
                debug!(%status, "IP lookup rejected the request");
                return Err(GeoFailure::Other(status.as_u16()));
            }
            status if !status.is_success() => {
                debug!(%status, "IP lookup returned an error status");
                return Err(GeoFailure::PositionUnavailable);
            }
            _ => {}
        }

        let body: IpLookupResponse =
            res.json().await.map_err(|_| GeoFailure::PositionUnavailable)?;

        match (body.status.as_str(), body.lat, body.lon) {
            ("success", Some(lat), Some(lon)) => Ok(Coordinates { lat, lon }),
            _ => {
                debug!(message = ?body.message, "IP lookup did not resolve a position");
                Err(GeoFailure::PositionUnavailable)
            }
        }
    }
}
