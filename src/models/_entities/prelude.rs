pub use super::organizations::Entity as Organizations;
pub use super::stations::Entity as Stations;
pub use super::users::Entity as Users;
pub use super::incidents::Entity as Incidents;
pub use super::invitations::Entity as Invitations;
pub use super::notifications::Entity as Notifications;
pub use super::upvotes::Entity as Upvotes;
pub use super::citizen_subscriptions::Entity as CitizenSubscriptions;
pub use super::audit_logs::Entity as AuditLogs;
