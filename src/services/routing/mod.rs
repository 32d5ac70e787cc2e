pub mod provider;

use futures::future::join_all;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;
use thiserror::Error;

use crate::models::incident::Priority;
use crate::models::station::GeoPoint;
use crate::store::StationWithOrg;

pub use provider::{classify_quality, GoogleMapsProvider, MapboxProvider, OsrmProvider, ProviderError, RouteProvider};

const TOTAL_SELECTION_BUDGET: Duration = Duration::from_secs(8);
const ROAD_FACTOR: f64 = 1.4;
const EMERGENCY_SPEED_KMH: f64 = 60.0;
const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteQuality {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl RouteQuality {
    /// Additive bonus folded into the station priority score; lower is
    /// better, so better quality subtracts.
    fn priority_bonus(self) -> f64 {
        match self {
            RouteQuality::Excellent => -2.0,
            RouteQuality::Good => -1.0,
            RouteQuality::Fair => 0.0,
            RouteQuality::Poor => 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Route {
    pub distance_km: f64,
    pub duration_min: f64,
    pub duration_in_traffic_min: Option<f64>,
    pub quality: RouteQuality,
    pub is_emergency_optimized: bool,
    pub provider: String,
    pub confidence: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct StationRoute {
    pub station_id: Uuid,
    pub station_name: String,
    pub route: Route,
    pub emergency_eta_min: f64,
    pub priority_score: f64,
}

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("no active stations available for this category")]
    NoStationsAvailable,
    #[error("all routing providers failed for every candidate station")]
    AllRoutesFailed,
}

/// Computes distance/ETA between two points via a provider chain with a
/// named great-circle fallback, and selects the optimal responding station
/// for a classified incident. Providers are read-mostly and initialized
/// once at boot.
pub struct RoutingEngine {
    providers: Vec<Box<dyn RouteProvider>>,
}

impl RoutingEngine {
    pub fn new(providers: Vec<Box<dyn RouteProvider>>) -> Self {
        Self { providers }
    }

    /// Resolves a free-text address to coordinates by trying each provider
    /// in order, stopping at the first success. Returns `None` if every
    /// provider is unconfigured or fails (OSRM carries no geocoding
    /// endpoint and always declines).
    pub async fn geocode(&self, address: &str) -> Option<GeoPoint> {
        for provider in &self.providers {
            match provider.geocode_with_deadline(address).await {
                Ok(point) => return Some(point),
                Err(err) => {
                    tracing::warn!(provider = provider.name(), error = %err, "geocoding provider failed");
                }
            }
        }
        None
    }

    pub async fn compute_route(&self, origin: GeoPoint, dest: GeoPoint, emergency: bool) -> Route {
        for provider in &self.providers {
            match provider.route_with_deadline(origin, dest).await {
                Ok(mut route) => {
                    route.is_emergency_optimized = emergency && route.is_emergency_optimized;
                    return route;
                }
                Err(err) => {
                    tracing::warn!(provider = provider.name(), error = %err, "routing provider failed");
                }
            }
        }
        great_circle_fallback(origin, dest)
    }

    pub async fn select_optimal_station(
        &self,
        candidates: Vec<StationWithOrg>,
        incident_location: GeoPoint,
        priority: Priority,
    ) -> Result<StationRoute, RoutingError> {
        if candidates.is_empty() {
            return Err(RoutingError::NoStationsAvailable);
        }

        let urgency_multiplier = priority.urgency_multiplier();

        let compute_all = async {
            join_all(candidates.iter().map(|c| async {
                let station_location = c.station.location;
                let route = self.compute_route(incident_location, station_location, true).await;
                (c.clone(), route)
            }))
            .await
        };

        let results = tokio::time::timeout(TOTAL_SELECTION_BUDGET, compute_all)
            .await
            .unwrap_or_else(|_| Vec::new());

        let mut scored: Vec<StationRoute> = results
            .into_iter()
            .map(|(candidate, route)| {
                let duration_for_eta = route.duration_in_traffic_min.unwrap_or(route.duration_min);
                let emergency_eta_min = duration_for_eta * urgency_multiplier;
                let priority_score =
                    0.4 * route.distance_km + 0.6 * emergency_eta_min + route.quality.priority_bonus();
                StationRoute {
                    station_id: candidate.station.id,
                    station_name: candidate.station.name.clone(),
                    route,
                    emergency_eta_min,
                    priority_score,
                }
            })
            .collect();

        if scored.is_empty() {
            return Err(RoutingError::AllRoutesFailed);
        }

        scored.sort_by(|a, b| {
            a.priority_score
                .partial_cmp(&b.priority_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.station_id.cmp(&b.station_id))
        });

        Ok(scored.remove(0))
    }
}

fn great_circle_fallback(origin: GeoPoint, dest: GeoPoint) -> Route {
    let distance_km = haversine_km(origin, dest) * ROAD_FACTOR;
    let duration_min = (distance_km / EMERGENCY_SPEED_KMH) * 60.0;
    Route {
        distance_km,
        duration_min,
        duration_in_traffic_min: None,
        quality: RouteQuality::Fair,
        is_emergency_optimized: true,
        provider: "great_circle_fallback".to_string(),
        confidence: 60,
    }
}

fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_excellent_for_fast_free_flowing_route() {
        assert_eq!(classify_quality(60.0, 1.0), RouteQuality::Excellent);
    }

    #[test]
    fn quality_poor_for_slow_congested_route() {
        assert_eq!(classify_quality(10.0, 2.5), RouteQuality::Poor);
    }

    #[test]
    fn haversine_zero_distance_for_identical_points() {
        let p = GeoPoint { lat: -1.95, lng: 30.06 };
        assert!(haversine_km(p, p) < 1e-9);
    }

    #[test]
    fn urgency_multiplier_ordering() {
        assert!(Priority::Critical.urgency_multiplier() < Priority::High.urgency_multiplier());
        assert!(Priority::High.urgency_multiplier() < Priority::Medium.urgency_multiplier());
        assert!(Priority::Medium.urgency_multiplier() < Priority::Low.urgency_multiplier());
    }
}
