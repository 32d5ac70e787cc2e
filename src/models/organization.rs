use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::_entities::organizations;

/// The three categories the Classifier can emit, doubling as the
/// organization-type discriminator stations/organizations are matched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryTag {
    Health,
    Investigation,
    Police,
}

impl CategoryTag {
    pub fn as_str(self) -> &'static str {
        match self {
            CategoryTag::Health => "health",
            CategoryTag::Investigation => "investigation",
            CategoryTag::Police => "police",
        }
    }

    pub const ALL: [CategoryTag; 3] = [CategoryTag::Health, CategoryTag::Investigation, CategoryTag::Police];
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub org_type: String,
    pub is_active: bool,
}

impl From<organizations::Model> for Organization {
    fn from(m: organizations::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            org_type: m.org_type,
            is_active: m.is_active,
        }
    }
}
