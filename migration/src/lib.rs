pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_organizations;
mod m20240101_000002_create_stations;
mod m20240101_000003_create_users;
mod m20240101_000004_create_incidents;
mod m20240101_000005_create_invitations;
mod m20240101_000006_create_notifications;
mod m20240101_000007_create_upvotes;
mod m20240101_000008_create_citizen_subscriptions;
mod m20240101_000009_create_audit_logs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_organizations::Migration),
            Box::new(m20240101_000002_create_stations::Migration),
            Box::new(m20240101_000003_create_users::Migration),
            Box::new(m20240101_000004_create_incidents::Migration),
            Box::new(m20240101_000005_create_invitations::Migration),
            Box::new(m20240101_000006_create_notifications::Migration),
            Box::new(m20240101_000007_create_upvotes::Migration),
            Box::new(m20240101_000008_create_citizen_subscriptions::Migration),
            Box::new(m20240101_000009_create_audit_logs::Migration),
        ]
    }
}
