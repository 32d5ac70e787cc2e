use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::_entities::stations;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub name: String,
    pub location: GeoPoint,
    pub is_active: bool,
}

impl From<stations::Model> for Station {
    fn from(m: stations::Model) -> Self {
        Self {
            id: m.id,
            organisation_id: m.organisation_id,
            name: m.name,
            location: GeoPoint { lat: m.lat, lng: m.lng },
            is_active: m.is_active,
        }
    }
}
