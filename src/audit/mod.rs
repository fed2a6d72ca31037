//! Audit persistence - where served predictions are recorded

pub mod notifier;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::PersistenceError;
use crate::models::AuditRecord;

pub use notifier::PersistenceNotifier;

/// Relational store for prediction audit records
#[async_trait]
pub trait PredictionStore: Send + Sync {
    async fn store_prediction(&self, record: &AuditRecord) -> Result<(), PersistenceError>;
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgPredictionStore {
    pool: PgPool,
}

impl PgPredictionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PredictionStore for PgPredictionStore {
    async fn store_prediction(&self, record: &AuditRecord) -> Result<(), PersistenceError> {
        let stored = record.insert(&self.pool).await?;
        tracing::debug!(id = %stored.id, client_id = %stored.client_id, "Prediction row inserted");
        Ok(())
    }
}
