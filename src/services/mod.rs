pub mod authorization;
pub mod classifier;
pub mod incident_service;
pub mod message_sender;
pub mod notification_bus;
pub mod routing;
pub mod subscription_registry;
