//! MLflow REST client
//!
//! Talks to an MLflow tracking server (`/api/2.0/mlflow/...` and the
//! `/get-artifact` download endpoint).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::RegistryError;
use super::{ModelRegistry, ModelVersion};

const SEARCH_PAGE_SIZE: u32 = 200;

/// MLflow client configuration
#[derive(Debug, Clone)]
pub struct MlflowConfig {
    pub tracking_uri: String,
    pub token: Option<String>,
    pub experiment_id: String,
    pub timeout_seconds: u64,
}

impl From<&Config> for MlflowConfig {
    fn from(config: &Config) -> Self {
        Self {
            tracking_uri: config.tracking_uri.clone(),
            token: config.tracking_token.clone(),
            experiment_id: config.experiment_id.clone(),
            timeout_seconds: config.registry_timeout_seconds,
        }
    }
}

/// MLflow API client
pub struct MlflowClient {
    config: MlflowConfig,
    http_client: reqwest::Client,
}

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct SearchModelVersionsResponse {
    #[serde(default)]
    pub model_versions: Vec<RegisteredVersion>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisteredVersion {
    pub name: String,
    /// MLflow reports versions as strings
    pub version: String,
    #[serde(default)]
    pub run_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct SearchRunsRequest<'a> {
    experiment_ids: [&'a str; 1],
    order_by: [&'a str; 1],
    max_results: u32,
}

#[derive(Debug, Deserialize)]
pub struct SearchRunsResponse {
    #[serde(default)]
    pub runs: Vec<Run>,
}

#[derive(Debug, Deserialize)]
pub struct Run {
    pub info: RunInfo,
}

/// Older servers only send `run_uuid`, newer ones send both
#[derive(Debug, Deserialize)]
pub struct RunInfo {
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub run_uuid: Option<String>,
}

impl RunInfo {
    pub fn id(self) -> Option<String> {
        self.run_id.or(self.run_uuid).filter(|id| !id.is_empty())
    }
}

impl MlflowClient {
    pub fn new(config: MlflowConfig) -> Result<Self, RegistryError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| RegistryError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http_client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.tracking_uri, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, RegistryError> {
        let response = self.authorize(request).send().await?;

        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("MLflow request failed ({}): {}", status, body);
            Err(RegistryError::Status { status, body })
        }
    }

    async fn search_model_versions(&self, model_name: &str) -> Result<Vec<RegisteredVersion>, RegistryError> {
        let url = self.url("/api/2.0/mlflow/model-versions/search");
        let filter = format!("name='{}'", model_name.replace('\'', "\\'"));
        let page_size = SEARCH_PAGE_SIZE.to_string();

        let mut versions = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("filter", filter.as_str()), ("max_results", page_size.as_str())];
            if let Some(token) = page_token.as_deref() {
                query.push(("page_token", token));
            }

            let page: SearchModelVersionsResponse = self
                .send(self.http_client.get(&url).query(&query))
                .await?
                .json()
                .await?;

            versions.extend(page.model_versions);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(versions)
    }
}

#[async_trait]
impl ModelRegistry for MlflowClient {
    async fn latest_version(&self, model_name: &str) -> Result<ModelVersion, RegistryError> {
        let versions = self.search_model_versions(model_name).await?;
        tracing::debug!("Found {} registered versions of {}", versions.len(), model_name);

        pick_latest(model_name, versions)
    }

    async fn download_artifact(&self, run_id: &str, path: &str) -> Result<Vec<u8>, RegistryError> {
        tracing::info!(run_id = %run_id, path = %path, "Downloading artifact");

        let request = self
            .http_client
            .get(self.url("/get-artifact"))
            .query(&[("path", path), ("run_uuid", run_id)]);

        let bytes = self.send(request).await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn latest_run_id(&self) -> Result<Option<String>, RegistryError> {
        let body = SearchRunsRequest {
            experiment_ids: [self.config.experiment_id.as_str()],
            order_by: ["attributes.start_time DESC"],
            max_results: 1,
        };

        let response: SearchRunsResponse = self
            .send(self.http_client.post(self.url("/api/2.0/mlflow/runs/search")).json(&body))
            .await?
            .json()
            .await?;

        Ok(response.runs.into_iter().next().and_then(|run| run.info.id()))
    }
}

/// Highest integer version. Versions without a run id or with a
/// non-numeric version string are skipped.
pub fn pick_latest(model_name: &str, versions: Vec<RegisteredVersion>) -> Result<ModelVersion, RegistryError> {
    versions
        .into_iter()
        .filter_map(|v| {
            let number = v.version.trim().parse::<u64>().ok()?;
            let run_id = v.run_id.filter(|r| !r.is_empty())?;
            Some(ModelVersion {
                name: v.name,
                version: number,
                run_id,
            })
        })
        .max_by_key(|v| v.version)
        .ok_or_else(|| RegistryError::ModelNotFound(model_name.to_string()))
}
