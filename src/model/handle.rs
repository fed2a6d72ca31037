//! Model Handle - classifier + scaler loaded once at startup

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::error::{LoadError, ModelUnavailableError, RegistryError};
use crate::features::{FeatureVector, LayoutInfo};
use crate::registry::{ModelRegistry, ModelVersion};
use super::classifier::{Classifier, LogisticRegression};
use super::dispatcher::{dispatch, PredictionResult};
use super::scaler::{scale_vector, StandardScaler};

/// Immutable after construction; shared behind an `Arc`
pub struct ModelHandle {
    version: ModelVersion,
    classifier: Option<Box<dyn Classifier>>,
    scaler: Option<StandardScaler>,
    loaded_at: DateTime<Utc>,
}

/// Model state for `/health`
#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub model_loaded: bool,
    pub scaler_loaded: bool,
    pub model_name: String,
    pub model_version: u64,
    pub run_id: String,
    pub layout: LayoutInfo,
    pub loaded_at: DateTime<Utc>,
}

impl ModelHandle {
    pub fn new(
        version: ModelVersion,
        classifier: Option<Box<dyn Classifier>>,
        scaler: Option<StandardScaler>,
    ) -> Self {
        Self {
            version,
            classifier,
            scaler,
            loaded_at: Utc::now(),
        }
    }

    /// Resolve the latest registered version and load its artifacts.
    ///
    /// Only a failed version lookup is an error. A classifier or scaler that
    /// cannot be downloaded or parsed is logged and left out, and requests
    /// are answered in degraded mode.
    pub async fn load(registry: &dyn ModelRegistry, config: &Config) -> Result<Self, RegistryError> {
        let version = registry.latest_version(&config.model_name).await?;
        tracing::info!(
            "Latest Model Version: {} | Run ID: {}",
            version.version,
            version.run_id
        );

        let classifier = match fetch(registry, &version.run_id, &config.model_artifact_path, LogisticRegression::from_json).await {
            Ok(model) => {
                tracing::info!("Classifier ({}) loaded from {}", model.name(), config.model_artifact_path);
                Some(Box::new(model) as Box<dyn Classifier>)
            }
            Err(e) => {
                tracing::error!("Error loading classifier from registry: {}", e);
                None
            }
        };

        let scaler = match fetch(registry, &version.run_id, &config.scaler_artifact_path, StandardScaler::from_json).await {
            Ok(scaler) => {
                tracing::info!("Scaler loaded from {}", config.scaler_artifact_path);
                Some(scaler)
            }
            Err(e) => {
                tracing::error!("Error loading scaler from registry: {}", e);
                None
            }
        };

        Ok(Self::new(version, classifier, scaler))
    }

    pub fn version(&self) -> &ModelVersion {
        &self.version
    }

    pub fn classifier(&self) -> Option<&dyn Classifier> {
        self.classifier.as_deref()
    }

    pub fn scaler(&self) -> Option<&StandardScaler> {
        self.scaler.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.classifier.is_some() && self.scaler.is_some()
    }

    /// Scale `features` in place and run the classifier
    pub fn predict(&self, features: &mut FeatureVector) -> Result<PredictionResult, ModelUnavailableError> {
        scale_vector(self.scaler(), features)?;
        dispatch(self.classifier(), features)
    }

    pub fn status(&self) -> ModelStatus {
        ModelStatus {
            model_loaded: self.classifier.is_some(),
            scaler_loaded: self.scaler.is_some(),
            model_name: self.version.name.clone(),
            model_version: self.version.version,
            run_id: self.version.run_id.clone(),
            layout: LayoutInfo::current(),
            loaded_at: self.loaded_at,
        }
    }
}

async fn fetch<T, E>(
    registry: &dyn ModelRegistry,
    run_id: &str,
    path: &str,
    parse: fn(&[u8]) -> Result<T, E>,
) -> Result<T, LoadError>
where
    LoadError: From<E>,
{
    let bytes = registry.download_artifact(run_id, path).await?;
    Ok(parse(&bytes)?)
}
