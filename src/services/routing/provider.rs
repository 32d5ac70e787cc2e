use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::models::station::GeoPoint;

use super::{Route, RouteQuality};

const PROVIDER_DEADLINE: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider not configured")]
    Unavailable,
    #[error("provider request failed: {0}")]
    Request(String),
    #[error("provider response had no route")]
    NoRoute,
    #[error("provider deadline exceeded")]
    Timeout,
}

/// One routing vendor. Implementations wrap a `reqwest::Client` the way the
/// teacher's typed clients wrap a JSON-RPC endpoint — a narrow trait over an
/// HTTP call rather than a generic "fetch" abstraction.
#[async_trait]
pub trait RouteProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// The provider-specific multiplier applied to duration when
    /// `emergency=true` (0.7 / 0.75 / 0.8 across the three shipped vendors).
    fn emergency_factor(&self) -> f64;

    async fn route(&self, origin: GeoPoint, dest: GeoPoint) -> Result<RawRoute, ProviderError>;

    /// Resolves a free-text address to coordinates. Vendors with no
    /// geocoding endpoint (OSRM) keep the default `Unavailable`.
    async fn geocode(&self, _address: &str) -> Result<GeoPoint, ProviderError> {
        Err(ProviderError::Unavailable)
    }

    /// Calls `geocode` under the per-provider deadline.
    async fn geocode_with_deadline(&self, address: &str) -> Result<GeoPoint, ProviderError> {
        tokio::time::timeout(PROVIDER_DEADLINE, self.geocode(address))
            .await
            .map_err(|_| ProviderError::Timeout)?
    }

    /// Calls `route` under the per-provider deadline.
    async fn route_with_deadline(&self, origin: GeoPoint, dest: GeoPoint) -> Result<Route, ProviderError> {
        let raw = tokio::time::timeout(PROVIDER_DEADLINE, self.route(origin, dest))
            .await
            .map_err(|_| ProviderError::Timeout)??;

        let duration_min = if raw.emergency {
            raw.duration_min * self.emergency_factor()
        } else {
            raw.duration_min
        };
        let traffic_factor = raw
            .duration_in_traffic_min
            .map(|t| t / raw.duration_min)
            .unwrap_or(1.0);
        let speed = raw.distance_km / (duration_min / 60.0);

        Ok(Route {
            distance_km: raw.distance_km,
            duration_min,
            duration_in_traffic_min: raw.duration_in_traffic_min,
            quality: classify_quality(speed, traffic_factor),
            is_emergency_optimized: raw.emergency,
            provider: self.name().to_string(),
            confidence: 85,
        })
    }
}

pub fn classify_quality(speed_kmh: f64, traffic_factor: f64) -> RouteQuality {
    if speed_kmh > 50.0 && traffic_factor < 1.2 {
        RouteQuality::Excellent
    } else if speed_kmh > 35.0 && traffic_factor < 1.5 {
        RouteQuality::Good
    } else if speed_kmh > 20.0 && traffic_factor < 2.0 {
        RouteQuality::Fair
    } else {
        RouteQuality::Poor
    }
}

pub struct RawRoute {
    pub distance_km: f64,
    pub duration_min: f64,
    pub duration_in_traffic_min: Option<f64>,
    pub emergency: bool,
}

pub struct GoogleMapsProvider {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl GoogleMapsProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoogleDirectionsResponse {
    routes: Vec<GoogleRoute>,
}

#[derive(Debug, Deserialize)]
struct GoogleRoute {
    legs: Vec<GoogleLeg>,
}

#[derive(Debug, Deserialize)]
struct GoogleLeg {
    distance: GoogleValue,
    duration: GoogleValue,
    duration_in_traffic: Option<GoogleValue>,
}

#[derive(Debug, Deserialize)]
struct GoogleValue {
    value: f64,
}

#[async_trait]
impl RouteProvider for GoogleMapsProvider {
    fn name(&self) -> &'static str {
        "google_maps"
    }

    fn emergency_factor(&self) -> f64 {
        0.7
    }

    async fn route(&self, origin: GeoPoint, dest: GeoPoint) -> Result<RawRoute, ProviderError> {
        let api_key = self.api_key.as_ref().ok_or(ProviderError::Unavailable)?;
        let url = "https://maps.googleapis.com/maps/api/directions/json";
        let response = self
            .client
            .get(url)
            .query(&[
                ("origin", format!("{},{}", origin.lat, origin.lng)),
                ("destination", format!("{},{}", dest.lat, dest.lng)),
                ("departure_time", "now".to_string()),
                ("key", api_key.clone()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?
            .json::<GoogleDirectionsResponse>()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let leg = response
            .routes
            .first()
            .and_then(|r| r.legs.first())
            .ok_or(ProviderError::NoRoute)?;

        Ok(RawRoute {
            distance_km: leg.distance.value / 1000.0,
            duration_min: leg.duration.value / 60.0,
            duration_in_traffic_min: leg.duration_in_traffic.as_ref().map(|d| d.value / 60.0),
            emergency: true,
        })
    }

    async fn geocode(&self, address: &str) -> Result<GeoPoint, ProviderError> {
        let api_key = self.api_key.as_ref().ok_or(ProviderError::Unavailable)?;
        let url = "https://maps.googleapis.com/maps/api/geocode/json";
        let response = self
            .client
            .get(url)
            .query(&[("address", address), ("key", api_key.as_str())])
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?
            .json::<GoogleGeocodeResponse>()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let location = response
            .results
            .first()
            .map(|r| r.geometry.location)
            .ok_or(ProviderError::NoRoute)?;
        Ok(GeoPoint { lat: location.lat, lng: location.lng })
    }
}

#[derive(Debug, Deserialize)]
struct GoogleGeocodeResponse {
    results: Vec<GoogleGeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GoogleGeocodeResult {
    geometry: GoogleGeocodeGeometry,
}

#[derive(Debug, Deserialize)]
struct GoogleGeocodeGeometry {
    location: GoogleGeocodeLocation,
}

#[derive(Debug, Deserialize)]
struct GoogleGeocodeLocation {
    lat: f64,
    lng: f64,
}

pub struct OsrmProvider {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl OsrmProvider {
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
}

#[async_trait]
impl RouteProvider for OsrmProvider {
    fn name(&self) -> &'static str {
        "osrm"
    }

    fn emergency_factor(&self) -> f64 {
        0.75
    }

    async fn route(&self, origin: GeoPoint, dest: GeoPoint) -> Result<RawRoute, ProviderError> {
        let base_url = self.base_url.as_ref().ok_or(ProviderError::Unavailable)?;
        let url = format!(
            "{}/route/v1/driving/{},{};{},{}",
            base_url, origin.lng, origin.lat, dest.lng, dest.lat
        );
        let response = self
            .client
            .get(&url)
            .query(&[("overview", "false")])
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?
            .json::<OsrmResponse>()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let route = response.routes.first().ok_or(ProviderError::NoRoute)?;
        Ok(RawRoute {
            distance_km: route.distance / 1000.0,
            duration_min: route.duration / 60.0,
            duration_in_traffic_min: None,
            emergency: true,
        })
    }
}

pub struct MapboxProvider {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl MapboxProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MapboxResponse {
    routes: Vec<MapboxRoute>,
}

#[derive(Debug, Deserialize)]
struct MapboxRoute {
    distance: f64,
    duration: f64,
    duration_typical: Option<f64>,
}

#[async_trait]
impl RouteProvider for MapboxProvider {
    fn name(&self) -> &'static str {
        "mapbox"
    }

    fn emergency_factor(&self) -> f64 {
        0.8
    }

    async fn route(&self, origin: GeoPoint, dest: GeoPoint) -> Result<RawRoute, ProviderError> {
        let api_key = self.api_key.as_ref().ok_or(ProviderError::Unavailable)?;
        let url = format!(
            "https://api.mapbox.com/directions/v5/mapbox/driving-traffic/{},{};{},{}",
            origin.lng, origin.lat, dest.lng, dest.lat
        );
        let response = self
            .client
            .get(&url)
            .query(&[("access_token", api_key.as_str())])
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?
            .json::<MapboxResponse>()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let route = response.routes.first().ok_or(ProviderError::NoRoute)?;
        Ok(RawRoute {
            distance_km: route.distance / 1000.0,
            duration_min: route.duration / 60.0,
            duration_in_traffic_min: route.duration_typical.map(|d| d / 60.0),
            emergency: true,
        })
    }

    async fn geocode(&self, address: &str) -> Result<GeoPoint, ProviderError> {
        let api_key = self.api_key.as_ref().ok_or(ProviderError::Unavailable)?;
        let url = format!(
            "https://api.mapbox.com/geocoding/v5/mapbox.places/{}.json",
            urlencoding_path(address)
        );
        let response = self
            .client
            .get(&url)
            .query(&[("access_token", api_key.as_str())])
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?
            .json::<MapboxGeocodeResponse>()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let center = response.features.first().map(|f| f.center).ok_or(ProviderError::NoRoute)?;
        Ok(GeoPoint { lat: center[1], lng: center[0] })
    }
}

fn urlencoding_path(s: &str) -> String {
    s.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => (b as char).to_string(),
            _ => format!("%{:02X}", b),
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct MapboxGeocodeResponse {
    features: Vec<MapboxGeocodeFeature>,
}

#[derive(Debug, Deserialize)]
struct MapboxGeocodeFeature {
    center: [f64; 2],
}
