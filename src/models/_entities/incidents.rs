use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "incidents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub incident_type: String,
    pub priority: String,
    pub status: String,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub location_address: Option<String>,
    pub station_id: Option<Uuid>,
    pub organisation_id: Option<Uuid>,
    pub reported_by_id: Uuid,
    pub reporter_email: Option<String>,
    pub reporter_phone: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub assigned_by: Option<Uuid>,
    pub assigned_at: Option<DateTime>,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime>,
    pub resolution: Option<String>,
    pub escalation_level: i32,
    pub escalated_by: Option<Uuid>,
    pub escalated_at: Option<DateTime>,
    pub escalation_reason: Option<String>,
    pub status_updated_at: Option<DateTime>,
    pub upvote_count: i32,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::stations::Entity",
        from = "Column::StationId",
        to = "super::stations::Column::Id"
    )]
    Station,
    #[sea_orm(
        belongs_to = "super::organizations::Entity",
        from = "Column::OrganisationId",
        to = "super::organizations::Column::Id"
    )]
    Organization,
    #[sea_orm(has_many = "super::upvotes::Entity")]
    Upvotes,
    #[sea_orm(has_many = "super::citizen_subscriptions::Entity")]
    CitizenSubscriptions,
}

impl Related<super::stations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Station.def()
    }
}

impl Related<super::organizations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl Related<super::upvotes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Upvotes.def()
    }
}

impl Related<super::citizen_subscriptions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CitizenSubscriptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
