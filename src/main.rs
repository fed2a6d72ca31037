//! Loan Risk Server entry point

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use loan_risk_server::{
    audit::{PersistenceNotifier, PgPredictionStore},
    config::Config,
    create_router, db,
    model::ModelHandle,
    registry::{mlflow::MlflowConfig, MlflowClient},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    // Initialize logging
    init_tracing(&config);

    tracing::info!("Loan Risk Server starting...");
    tracing::info!("Tracking server: {}", config.tracking_uri);
    tracing::info!("Database: {}", config.database_url.split('@').last().unwrap_or("***"));

    // Resolve and load the latest registered model
    let registry = Arc::new(
        MlflowClient::new(MlflowConfig::from(&config)).context("Failed to create registry client")?,
    );
    let model = ModelHandle::load(registry.as_ref(), &config)
        .await
        .with_context(|| format!("Failed to resolve latest version of {}", config.model_name))?;

    if !model.is_ready() {
        tracing::warn!("Model is not fully loaded, /predict will answer in degraded mode");
    }

    // Initialize database pool
    let pool = db::create_pool(&config.database_url).context("Failed to create database pool")?;

    tracing::info!("Running database migrations...");
    if let Err(e) = db::run_migrations(&pool).await {
        tracing::error!("Database migrations failed, predictions will not be stored: {}", e);
    }

    // Background audit writers
    let notifier = PersistenceNotifier::start(
        Arc::new(PgPredictionStore::new(pool)),
        registry,
        config.audit_queue_capacity,
        config.audit_workers,
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = create_router(AppState::new(config, model, notifier));

    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "loan_risk_server=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);

    if config.json_logs() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
