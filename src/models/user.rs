use bcrypt::{hash, verify, DEFAULT_COST};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::_entities::users;
use crate::models::principal::{Principal, Role};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub organisation_id: Option<Uuid>,
    pub station_id: Option<Uuid>,
    pub is_active: bool,
}

impl From<users::Model> for User {
    fn from(m: users::Model) -> Self {
        let role = Role::parse(&m.role).unwrap_or(Role::Citizen);
        Self {
            id: m.id,
            email: m.email,
            first_name: m.first_name,
            last_name: m.last_name,
            role,
            organisation_id: m.organisation_id,
            station_id: m.station_id,
            is_active: m.is_active,
        }
    }
}

impl User {
    pub fn to_principal(&self) -> Principal {
        Principal {
            user_id: self.id,
            role: self.role,
            organisation_id: self.organisation_id,
            station_id: self.station_id,
        }
    }
}

pub fn hash_password(password: &str) -> AppResult<String> {
    hash(password, DEFAULT_COST).map_err(|e| AppError::internal(anyhow::anyhow!(e)))
}

pub fn verify_password(password: &str, hashed: &str) -> AppResult<bool> {
    verify(password, hashed).map_err(|e| AppError::internal(anyhow::anyhow!(e)))
}
