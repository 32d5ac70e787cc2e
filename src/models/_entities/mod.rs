pub mod prelude;

pub mod organizations;
pub mod stations;
pub mod users;
pub mod incidents;
pub mod invitations;
pub mod notifications;
pub mod upvotes;
pub mod citizen_subscriptions;
pub mod audit_logs;
