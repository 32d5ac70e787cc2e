use loco_rs::prelude::*;
use sea_orm::*;
use uuid::Uuid;

use crate::models::_entities::{organizations, stations, users};

pub struct DatabaseSeeder;

impl DatabaseSeeder {
    /// Seed the database with the minimum fixture a development instance
    /// needs: one organization per category, one station each, and a
    /// main_admin account to sign in with.
    pub async fn seed_development(db: &DatabaseConnection) -> Result<()> {
        tracing::info!("Starting development database seeding...");

        let orgs = Self::create_organizations(db).await?;
        tracing::info!("Created {} organizations", orgs.len());

        let stations = Self::create_stations(db, &orgs).await?;
        tracing::info!("Created {} stations", stations.len());

        let admin = Self::create_main_admin(db).await?;
        tracing::info!("Created main_admin user: {}", admin.email);

        tracing::info!("Development database seeding completed successfully");
        Ok(())
    }

    async fn create_organizations(db: &DatabaseConnection) -> Result<Vec<organizations::Model>> {
        let seed = [("City General Hospital", "health"), ("County Investigation Bureau", "investigation"), ("Metro Police Department", "police")];

        let mut created = Vec::new();
        for (name, org_type) in seed {
            let org = organizations::ActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set(name.to_string()),
                org_type: Set(org_type.to_string()),
                is_active: Set(true),
                created_at: Set(chrono::Utc::now().naive_utc()),
                updated_at: Set(chrono::Utc::now().naive_utc()),
            };
            created.push(org.insert(db).await?);
        }
        Ok(created)
    }

    async fn create_stations(db: &DatabaseConnection, orgs: &[organizations::Model]) -> Result<Vec<stations::Model>> {
        let mut created = Vec::new();
        for org in orgs {
            let station = stations::ActiveModel {
                id: Set(Uuid::new_v4()),
                organisation_id: Set(org.id),
                name: Set(format!("{} - Main Station", org.name)),
                lat: Set(40.7128),
                lng: Set(-74.0060),
                is_active: Set(true),
                created_at: Set(chrono::Utc::now().naive_utc()),
                updated_at: Set(chrono::Utc::now().naive_utc()),
            };
            created.push(station.insert(db).await?);
        }
        Ok(created)
    }

    async fn create_main_admin(db: &DatabaseConnection) -> Result<users::Model> {
        let password_hash =
            crate::models::user::hash_password("admin123").map_err(|e| Error::string(&e.to_string()))?;

        let admin = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set("admin@dispatch.dev".to_string()),
            password: Set(password_hash),
            first_name: Set(Some("Main".to_string())),
            last_name: Set(Some("Admin".to_string())),
            role: Set("main_admin".to_string()),
            organisation_id: Set(None),
            station_id: Set(None),
            is_active: Set(true),
            created_at: Set(chrono::Utc::now().naive_utc()),
            updated_at: Set(chrono::Utc::now().naive_utc()),
        };
        Ok(admin.insert(db).await?)
    }

    pub async fn is_seeded(db: &DatabaseConnection) -> Result<bool> {
        let org_count = organizations::Entity::find().count(db).await?;
        Ok(org_count > 0)
    }

    pub async fn clear_all(db: &DatabaseConnection) -> Result<()> {
        tracing::warn!("Clearing all database data...");

        crate::models::_entities::audit_logs::Entity::delete_many().exec(db).await?;
        crate::models::_entities::upvotes::Entity::delete_many().exec(db).await?;
        crate::models::_entities::notifications::Entity::delete_many().exec(db).await?;
        crate::models::_entities::citizen_subscriptions::Entity::delete_many().exec(db).await?;
        crate::models::_entities::invitations::Entity::delete_many().exec(db).await?;
        crate::models::_entities::incidents::Entity::delete_many().exec(db).await?;
        users::Entity::delete_many().exec(db).await?;
        stations::Entity::delete_many().exec(db).await?;
        organizations::Entity::delete_many().exec(db).await?;

        tracing::info!("All database data cleared");
        Ok(())
    }
}
