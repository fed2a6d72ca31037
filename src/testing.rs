//! Test doubles shared by unit tests

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::audit::PredictionStore;
use crate::config::Config;
use crate::error::{PersistenceError, RegistryError};
use crate::features::{FEATURE_COUNT, NUMERIC_FEATURE_COUNT};
use crate::models::AuditRecord;
use crate::registry::{ModelRegistry, ModelVersion};

/// The reference application used across tests
pub fn sample_form() -> BTreeMap<String, String> {
    [
        ("credit_amount", "100000"),
        ("age_years", "40"),
        ("loan_annuity", "5000"),
        ("client_income", "20000"),
        ("employed_years", "5"),
        ("score_source_2", "0.5"),
        ("score_source_3", "0.6"),
        ("car_owned", "1"),
        ("house_own", "1"),
        ("phone_change", "2"),
        ("ID_Years", "3"),
        ("client_income_type", "Service"),
        ("client_education", "Secondary"),
        ("client_marital_status", "M"),
        ("client_gender", "Male"),
        ("loan_contract_type", "RL"),
        ("client_housing_type", "Home"),
        ("client_permanent_match_tag", "1"),
        ("id", "C1"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

pub fn sample_version() -> ModelVersion {
    ModelVersion {
        name: Config::default().model_name,
        version: 3,
        run_id: "run-3".to_string(),
    }
}

/// Classifier with zero weights and intercept ln(3): P(default) = 0.75
pub fn classifier_artifact() -> Vec<u8> {
    serde_json::json!({
        "coef": vec![0.0; FEATURE_COUNT],
        "intercept": 3f64.ln(),
    })
    .to_string()
    .into_bytes()
}

/// Identity scaler
pub fn scaler_artifact() -> Vec<u8> {
    serde_json::json!({
        "mean": vec![0.0; NUMERIC_FEATURE_COUNT],
        "scale": vec![1.0; NUMERIC_FEATURE_COUNT],
    })
    .to_string()
    .into_bytes()
}

/// In-memory registry
pub struct StubRegistry {
    versions: Vec<ModelVersion>,
    artifacts: HashMap<String, Vec<u8>>,
    run_id: Option<String>,
    fail_run_lookup: bool,
}

impl StubRegistry {
    pub fn empty() -> Self {
        Self {
            versions: Vec::new(),
            artifacts: HashMap::new(),
            run_id: None,
            fail_run_lookup: false,
        }
    }

    /// One registered version with a working classifier and scaler
    pub fn with_artifacts() -> Self {
        let config = Config::default();
        let mut registry = Self::empty();
        registry.versions.push(sample_version());
        registry.set_artifact(&config.model_artifact_path, classifier_artifact());
        registry.set_artifact(&config.scaler_artifact_path, scaler_artifact());
        registry.run_id = Some("run-3".to_string());
        registry
    }

    pub fn with_run(mut self, run_id: &str) -> Self {
        self.run_id = Some(run_id.to_string());
        self
    }

    pub fn failing_run_lookup(mut self) -> Self {
        self.fail_run_lookup = true;
        self
    }

    pub fn set_artifact(&mut self, path: &str, bytes: Vec<u8>) {
        self.artifacts.insert(path.to_string(), bytes);
    }

    pub fn remove_artifact(&mut self, path: &str) {
        self.artifacts.remove(path);
    }
}

#[async_trait]
impl ModelRegistry for StubRegistry {
    async fn latest_version(&self, model_name: &str) -> Result<ModelVersion, RegistryError> {
        self.versions
            .iter()
            .filter(|v| v.name == model_name)
            .max_by_key(|v| v.version)
            .cloned()
            .ok_or_else(|| RegistryError::ModelNotFound(model_name.to_string()))
    }

    async fn download_artifact(&self, _run_id: &str, path: &str) -> Result<Vec<u8>, RegistryError> {
        self.artifacts.get(path).cloned().ok_or_else(|| RegistryError::Status {
            status: 404,
            body: format!("artifact {} not found", path),
        })
    }

    async fn latest_run_id(&self) -> Result<Option<String>, RegistryError> {
        if self.fail_run_lookup {
            return Err(RegistryError::Network("connection refused".to_string()));
        }
        Ok(self.run_id.clone())
    }
}

/// In-memory audit store. A gated store parks every write until released.
#[derive(Clone)]
pub struct MemoryStore {
    records: Arc<Mutex<Vec<AuditRecord>>>,
    gate: Option<Arc<Semaphore>>,
    fail: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            gate: None,
            fail: false,
        }
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::new()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Let one parked write through
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PredictionStore for MemoryStore {
    async fn store_prediction(&self, record: &AuditRecord) -> Result<(), PersistenceError> {
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        if self.fail {
            return Err(PersistenceError::Database(sqlx::Error::PoolTimedOut));
        }
        if let Ok(mut records) = self.records.lock() {
            records.push(record.clone());
        }
        Ok(())
    }
}

/// Poll `condition` until it holds or `timeout` passes
pub async fn wait_for(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
