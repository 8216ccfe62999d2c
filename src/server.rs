//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, migrations, background tasks, and the Axum
//! server lifecycle.

use crate::application::services::run_sweep_scheduler;
use crate::config::Config;
use crate::domain::repositories::{AliasRepository, CounterRepository, MappingRepository};
use crate::domain::visit_worker::run_visit_worker;
use crate::infrastructure::persistence::{
    PgAliasRepository, PgCounterRepository, PgMappingRepository,
};
use crate::routes::app_router;
use crate::state::{AppState, Repositories};

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Opens the connection pool using the pool settings from `config`.
///
/// # Errors
///
/// Returns an error if the database cannot be reached.
pub async fn connect_pool(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");
    Ok(pool)
}

/// Builds the PostgreSQL repositories on one shared pool.
pub fn pg_repositories(pool: PgPool) -> Repositories {
    let pool = Arc::new(pool);
    let mappings: Arc<dyn MappingRepository> = Arc::new(PgMappingRepository::new(pool.clone()));
    let counter: Arc<dyn CounterRepository> = Arc::new(PgCounterRepository::new(pool.clone()));
    let aliases: Arc<dyn AliasRepository> = Arc::new(PgAliasRepository::new(pool));

    Repositories {
        mappings,
        counter,
        aliases,
    }
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Background visit worker
/// - Periodic expiration sweep (unless disabled)
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_pool(&config).await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let settings = config.service_settings()?;
    let repositories = pg_repositories(pool);

    let (visit_tx, visit_rx) = mpsc::channel(config.visit_queue_capacity);
    let visit_worker = tokio::spawn(run_visit_worker(
        visit_rx,
        repositories.mappings.clone(),
        config.visit_worker_concurrency,
    ));
    tracing::info!("Visit worker started");

    let state = AppState::new(repositories, settings, visit_tx);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweep_task = config.sweep_interval().map(|period| {
        tracing::info!(period_secs = period.as_secs(), "Expiration sweeper started");
        tokio::spawn(run_sweep_scheduler(
            state.sweeper.clone(),
            period,
            shutdown_rx,
        ))
    });

    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid LISTEN address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router, and with it the last visit sender, is gone: the worker
    // drains what is queued and exits.
    let _ = shutdown_tx.send(true);
    if let Some(task) = sweep_task {
        let _ = task.await;
    }
    let _ = visit_worker.await;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
