//! Server initialization and startup logic for jobplane.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use jobplane_api::{spawn_sweep, ApiConfig, ApiServer, AppState, JobLifecycleService};
use jobplane_catalog::{MemoryJobCatalog, SqliteJobCatalog};
use jobplane_config::{CatalogConfig, Config, LoggingConfig, SchedulerConfig};
use jobplane_core::JobTypeRegistry;
use jobplane_engine::{CronEngine, EngineConfig};
use jobplane_protocols::catalog::JobCatalog;
use jobplane_protocols::engine::SchedulerEngine;

/// Initialize tracing with console and optional rolling file output.
///
/// `RUST_LOG` takes precedence over the configured level.
pub(crate) fn init_tracing(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let file_layer = if config.file {
        let log_dir = config.resolved_dir();
        std::fs::create_dir_all(&log_dir)?;

        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("jobplane")
            .filename_suffix("log")
            .max_log_files(30)
            .build(&log_dir)?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // Keep the writer alive for the program duration
        static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
            std::sync::OnceLock::new();
        let _ = GUARD.set(guard);

        Some(fmt::layer().with_writer(non_blocking).with_ansi(false).boxed())
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(file_layer)
        .init();

    Ok(())
}

/// Open the configured catalog backend.
pub(crate) async fn open_catalog(
    config: &CatalogConfig,
) -> Result<Arc<dyn JobCatalog>, Box<dyn std::error::Error>> {
    match config.backend.as_str() {
        "memory" => {
            warn!("Using in-memory catalog; jobs will not survive a restart");
            Ok(Arc::new(MemoryJobCatalog::new()))
        }
        "sqlite" => {
            let path = config
                .resolved_path()
                .ok_or("catalog.path is required for the sqlite backend")?;
            let catalog = SqliteJobCatalog::open(&path).await?;
            info!("Catalog opened at {}", path.display());
            Ok(Arc::new(catalog))
        }
        other => Err(format!("Unknown catalog backend: {}", other).into()),
    }
}

pub(crate) fn engine_config(config: &SchedulerConfig) -> EngineConfig {
    EngineConfig::default()
        .with_tick_interval(Duration::from_millis(config.tick_interval_ms))
        .with_shutdown_timeout(Duration::from_secs(config.shutdown_timeout_secs))
}

async fn shutdown_signal(mut shutdown: watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Run the scheduler and HTTP API in foreground until Ctrl-C.
pub(crate) async fn run_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting jobplane v{}", env!("CARGO_PKG_VERSION"));

    let catalog = open_catalog(&config.catalog).await?;

    let registry = Arc::new(JobTypeRegistry::discover());
    info!("Discovered {} job types: {:?}", registry.len(), registry.list_types());

    let engine: Arc<dyn SchedulerEngine> =
        Arc::new(CronEngine::new(engine_config(&config.scheduler)));

    let service = Arc::new(JobLifecycleService::new(catalog, engine.clone(), registry));

    // Register the catalog; this starts the engine last
    let report = service.load_catalog().await?;
    info!(
        "Catalog loaded: {} registered, {} failed",
        report.registered.len(),
        report.failed.len()
    );
    for (key, reason) in &report.failed {
        warn!(job = %key, "Job not scheduled: {}", reason);
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);

    let sweep_handle = if config.scheduler.sweep_interval_secs > 0 {
        let interval = Duration::from_secs(config.scheduler.sweep_interval_secs);
        info!("Reconciliation sweep every {:?}", interval);
        Some(spawn_sweep(service.clone(), interval, shutdown_rx.clone()))
    } else {
        None
    };

    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl-C, shutting down..."),
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
        let _ = signal_tx.send(true);
    });

    let api_config = ApiConfig::new(config.server.host.clone(), config.server.port);
    let server = ApiServer::new(api_config, Arc::new(AppState::new(service)));
    let served = server.run_with_shutdown(shutdown_signal(shutdown_rx)).await;
    // The server may also stop on a bind error; release the sweep either way
    let _ = shutdown_tx.send(true);

    if let Some(handle) = sweep_handle {
        let _ = handle.await;
    }

    info!("Shutting down scheduler engine...");
    if let Err(e) = engine.shutdown().await {
        error!("Engine shutdown failed: {}", e);
    }
    info!("jobplane stopped");

    served
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;

    #[tokio::test]
    async fn test_open_memory_catalog() {
        let config = CatalogConfig {
            backend: "memory".to_string(),
            path: None,
        };
        let catalog = open_catalog(&config).await.unwrap();
        assert!(catalog.get_active().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_sqlite_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let config = CatalogConfig {
            backend: "sqlite".to_string(),
            path: Some(dir.path().join("nested").join("jobs.db")),
        };
        open_catalog(&config).await.unwrap();
        assert!(dir.path().join("nested").join("jobs.db").exists());
    }

    #[tokio::test]
    async fn test_open_catalog_rejects_unknown_backend() {
        let config = CatalogConfig {
            backend: "postgres".to_string(),
            path: Some(PathBuf::from("/tmp/jobs.db")),
        };
        assert!(open_catalog(&config).await.is_err());
    }

    #[test]
    fn test_engine_config_from_scheduler_config() {
        let config = SchedulerConfig {
            tick_interval_ms: 250,
            sweep_interval_secs: 0,
            shutdown_timeout_secs: 3,
        };
        let engine = engine_config(&config);
        assert_eq!(engine.tick_interval, Duration::from_millis(250));
        assert_eq!(engine.shutdown_timeout, Duration::from_secs(3));
    }
}
