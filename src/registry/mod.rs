//! Model registry - where classifier and scaler artifacts come from

pub mod mlflow;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

pub use mlflow::MlflowClient;

/// A registered model version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelVersion {
    pub name: String,
    pub version: u64,
    pub run_id: String,
}

/// Remote model registry / tracking service
#[async_trait]
pub trait ModelRegistry: Send + Sync {
    /// Highest registered version for `model_name`
    async fn latest_version(&self, model_name: &str) -> Result<ModelVersion, RegistryError>;

    /// Raw bytes of an artifact logged under `run_id`
    async fn download_artifact(&self, run_id: &str, path: &str) -> Result<Vec<u8>, RegistryError>;

    /// Most recently started run, if any
    async fn latest_run_id(&self) -> Result<Option<String>, RegistryError>;
}
