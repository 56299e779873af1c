use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use k1s0_completion_import_server::adapter::handler::{self, AppState};
use k1s0_completion_import_server::adapter::repository::{
    CompletionPostgresRepository, InMemoryCompletionStore,
};
use k1s0_completion_import_server::domain::repository::{
    CompletionRepository, CourseRepository, UserRepository,
};
use k1s0_completion_import_server::infrastructure::config::Config;
use k1s0_completion_import_server::infrastructure::file_storage::{
    FileStorage, InMemoryFileStorage, LocalFsFileStorage,
};
use k1s0_completion_import_server::infrastructure::telemetry::{init_telemetry, TelemetryConfig};
use k1s0_completion_import_server::usecase::UpdateCompletionDateUseCase;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Config
    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/config.yaml".to_string());
    let cfg = Config::load(&config_path)?;

    // Telemetry
    let telemetry_cfg = TelemetryConfig {
        service_name: cfg.app.name.clone(),
        version: cfg.app.version.clone(),
        environment: cfg.app.environment.clone(),
        log_level: cfg.logging.level.clone(),
        log_format: cfg.logging.format.clone(),
    };
    init_telemetry(&telemetry_cfg)?;

    info!(
        app_name = %cfg.app.name,
        version = %cfg.app.version,
        environment = %cfg.app.environment,
        "starting completion import server"
    );

    // Database pool (optional)
    let db_pool = if let Some(ref db_config) = cfg.database {
        let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| db_config.connection_url());
        info!("connecting to database");
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(db_config.max_open_conns)
            .connect(&url)
            .await?;
        info!("database connection pool established");
        Some(pool)
    } else if let Ok(url) = std::env::var("DATABASE_URL") {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&url)
            .await?;
        info!("database connection pool established from DATABASE_URL");
        Some(pool)
    } else {
        info!("no database configured, using in-memory repositories");
        None
    };

    // Repositories
    let (course_repo, user_repo, completion_repo): (
        Arc<dyn CourseRepository>,
        Arc<dyn UserRepository>,
        Arc<dyn CompletionRepository>,
    ) = if let Some(pool) = db_pool {
        let repo = Arc::new(CompletionPostgresRepository::new(pool));
        (repo.clone(), repo.clone(), repo)
    } else {
        let store = Arc::new(InMemoryCompletionStore::new());
        (store.clone(), store.clone(), store)
    };

    // File storage
    let file_storage: Arc<dyn FileStorage> = match cfg.storage.backend.as_str() {
        "local" => {
            info!(root_dir = %cfg.storage.root_dir, "using local file storage");
            Arc::new(LocalFsFileStorage::new(&cfg.storage.root_dir))
        }
        "memory" => {
            info!("using in-memory file storage");
            Arc::new(InMemoryFileStorage::new())
        }
        other => anyhow::bail!("unsupported storage backend: {}", other),
    };

    // Use cases
    let update_completion_uc = Arc::new(
        UpdateCompletionDateUseCase::new(course_repo, user_repo, completion_repo)
            .with_lookup_fields(
                cfg.import.course_lookup_field,
                cfg.import.user_lookup_field,
            ),
    );

    let state = AppState {
        update_completion_uc,
        file_storage,
        import_config: Arc::new(cfg.import.clone()),
    };

    // Router
    let app = handler::router(state);

    let host: std::net::IpAddr = cfg.server.host.parse()?;
    let rest_addr = SocketAddr::new(host, cfg.server.port);
    info!("REST server starting on {}", rest_addr);

    let listener = tokio::net::TcpListener::bind(rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("completion import server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
