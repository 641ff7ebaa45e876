use axum_helpers::{ShutdownCoordinator, serve};
use core_config::AppConfig;
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_users::{DynUserRepository, InMemoryUserRepository, PostgresUserRepository, UserService};
use migration::{Migrator, MigratorTrait};
use observability::{UserMetrics, init_metrics, metrics_router, spawn_upkeep};
use pipeline_api::server::bind_listeners;
use pipeline_api::{AppState, api};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const METRICS_SERVICE: &str = "pipeline-arch";

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    let config = AppConfig::load()?;

    init_tracing(&config.environment(), &config.log_level);
    info!(environment = %config.environment, "Starting application");

    let metrics_handle = init_metrics(METRICS_SERVICE)
        .map_err(|e| eyre::eyre!("Failed to install metrics recorder: {}", e))?;
    spawn_upkeep(metrics_handle.clone(), Duration::from_secs(5));

    let repository = connect_repository(&config).await?;
    let users = UserService::new(repository.clone(), UserMetrics::new());

    let state = AppState::new(config, users);
    let app = api::routes(&state);
    let metrics_app = metrics_router(metrics_handle.clone());

    let (api_listener, metrics_listener) = bind_listeners(&state.config).await?;

    let coordinator = ShutdownCoordinator::new();
    let signals = coordinator.clone();
    tokio::spawn(async move { signals.wait_for_signal().await });

    let grace = state.config.shutdown_timeout();
    info!("Serving with {:?} graceful shutdown timeout", grace);

    tokio::try_join!(
        serve(api_listener, app, coordinator.clone(), grace),
        serve(metrics_listener, metrics_app, coordinator, grace),
    )
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Shutting down: closing repository");
    match repository.close().await {
        Ok(()) => info!("Repository closed successfully"),
        Err(e) => tracing::error!("Error closing repository: {}", e),
    }

    info!("Servers stopped");
    Ok(())
}

/// PostgreSQL when `database_url` is set (migrations run first), otherwise in-memory.
async fn connect_repository(config: &AppConfig) -> eyre::Result<DynUserRepository> {
    match config.database_url.as_deref() {
        Some(url) => {
            let postgres = PostgresUserRepository::connect(url)
                .await
                .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))?;

            Migrator::up(postgres.connection(), None)
                .await
                .map_err(|e| eyre::eyre!("Database migration failed: {}", e))?;
            info!("Database migrations applied");

            Ok(Arc::new(postgres))
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory user repository");
            Ok(Arc::new(InMemoryUserRepository::new()))
        }
    }
}
