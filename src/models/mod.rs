pub mod _entities;
pub mod citizen_subscription;
pub mod incident;
pub mod invitation;
pub mod notification;
pub mod organization;
pub mod principal;
pub mod station;
pub mod user;
