use std::sync::Arc;

use async_trait::async_trait;
use loco_rs::{
    app::{AppContext, Hooks},
    boot::{create_app, BootResult, StartMode},
    controller::AppRoutes,
    environment::Environment,
    task::Tasks,
    worker::Processor,
    Result,
};
use migration::Migrator;
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;

use crate::config::{load_auth_config, EscalationConfig, RoutingProviderConfig};
use crate::controllers;
use crate::middleware::RateLimiter;
use crate::services::incident_service::IncidentService;
use crate::services::message_sender::LoggingMessageSender;
use crate::services::notification_bus::NotificationBus;
use crate::services::routing::{GoogleMapsProvider, MapboxProvider, OsrmProvider, RouteProvider, RoutingEngine};
use crate::services::subscription_registry::SubscriptionRegistry;
use crate::state::AppState;
use crate::store::sea_orm_store::SeaOrmStore;
use crate::store::Store;
use crate::workers::escalation_scheduler::EscalationScheduler;

pub struct App;

/// Builds the shared service graph once per boot. Every controller route
/// reaches these through `AppState`, attached per-route by
/// `controllers::with_state`/`rate_limited` rather than through loco's own
/// context.
fn build_state(db: DatabaseConnection) -> Arc<AppState> {
    let store: Arc<dyn Store> = Arc::new(SeaOrmStore::new(db));

    let routing_config = RoutingProviderConfig::from_env();
    let providers: Vec<Box<dyn RouteProvider>> = vec![
        Box::new(GoogleMapsProvider::new(routing_config.google_maps_api_key)),
        Box::new(OsrmProvider::new(routing_config.osrm_base_url)),
        Box::new(MapboxProvider::new(routing_config.mapbox_api_key)),
    ];
    let routing = Arc::new(RoutingEngine::new(providers));

    let notifications = Arc::new(NotificationBus::new(store.clone(), Arc::new(LoggingMessageSender)));
    let incidents = Arc::new(IncidentService::new(store.clone(), routing, notifications.clone()));
    let subscriptions = Arc::new(SubscriptionRegistry::new(store.clone()));

    Arc::new(AppState {
        store,
        incidents,
        notifications,
        subscriptions,
        auth_config: load_auth_config(),
        rate_limiter: RateLimiter::new(),
    })
}

#[async_trait]
impl Hooks for App {
    fn app_name() -> &'static str {
        env!("CARGO_CRATE_NAME")
    }

    fn app_version() -> String {
        format!(
            "{} ({})",
            env!("CARGO_PKG_VERSION"),
            option_env!("BUILD_SHA")
                .or(option_env!("GITHUB_SHA"))
                .unwrap_or("dev")
        )
    }

    async fn boot(mode: StartMode, environment: &Environment) -> Result<BootResult> {
        create_app::<Self, Migrator>(mode, environment).await
    }

    async fn truncate(db: &DatabaseConnection) -> Result<()> {
        use crate::seeders::DatabaseSeeder;

        DatabaseSeeder::clear_all(db).await?;
        Ok(())
    }

    async fn seed(db: &DatabaseConnection, _base: &std::path::Path) -> Result<()> {
        use crate::seeders::DatabaseSeeder;

        if std::env::var("LOCO_ENV").unwrap_or_else(|_| "development".to_string()) == "development" {
            if !DatabaseSeeder::is_seeded(db).await? {
                tracing::info!("Seeding development database...");
                DatabaseSeeder::seed_development(db).await?;
                tracing::info!("Database seeding completed");
            } else {
                tracing::info!("Database already seeded, skipping");
            }
        }

        Ok(())
    }

    fn routes(ctx: &AppContext) -> AppRoutes {
        let state = build_state(ctx.db.clone());

        // loco applies one global prefix to every route registered here, so
        // `/ws` lands under `/api/ws` rather than bare `/ws` — there is no
        // demonstrated way to opt a route group out of the prefix
        // `with_default_routes` carries.
        AppRoutes::with_default_routes()
            .prefix("/api")
            .add_route(controllers::auth::routes(state.clone()))
            .add_route(controllers::incidents::routes(state.clone()))
            .add_route(controllers::invitations::routes(state.clone()))
            .add_route(controllers::system::routes())
            .add_route(controllers::ws::routes(state))
    }

    fn connect_workers<'a>(_p: &'a mut Processor, ctx: &'a AppContext) {
        let state = build_state(ctx.db.clone());
        let escalation_config = EscalationConfig::from_env();
        let scheduler = Arc::new(EscalationScheduler::new(
            state.store.clone(),
            state.incidents.clone(),
            std::time::Duration::from_secs(escalation_config.tick_interval_secs),
        ));
        scheduler.spawn(CancellationToken::new());
    }

    fn register_tasks(_tasks: &mut Tasks) {
        // Database management commands are handled through CLI:
        // cargo loco task database --help
    }
}
