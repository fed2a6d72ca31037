//! Loan Risk Server
//!
//! Scores loan applications with the latest registered default classifier.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       LOAN RISK SERVER                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  POST /predict                                               │
//! │     │                                                        │
//! │     ▼                                                        │
//! │  ┌──────────┐   ┌──────────┐   ┌────────────┐                │
//! │  │ Encoder  │──▶│  Scaler  │──▶│ Classifier │──▶ response    │
//! │  └──────────┘   └──────────┘   └─────┬──────┘                │
//! │                                      │ AuditRecord           │
//! │                                      ▼                       │
//! │                          ┌───────────────────────┐           │
//! │                          │ Audit queue + workers │           │
//! │                          └───────────┬───────────┘           │
//! │                                      ▼                       │
//! │            ┌─────────────┐    ┌─────────────┐                │
//! │            │   MLflow    │    │ PostgreSQL  │                │
//! │            └─────────────┘    └─────────────┘                │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod audit;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod handlers;
pub mod model;
pub mod models;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};

pub use error::{AppError, AppResult};

use audit::PersistenceNotifier;
use config::Config;
use model::ModelHandle;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub model: Arc<ModelHandle>,
    pub notifier: PersistenceNotifier,
}

impl AppState {
    pub fn new(config: Config, model: ModelHandle, notifier: PersistenceNotifier) -> Self {
        Self {
            config: Arc::new(config),
            model: Arc::new(model),
            notifier,
        }
    }
}

/// Create the router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::form::index))
        .route("/health", get(handlers::health::check))
        .route("/predict", post(handlers::predict::predict))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
