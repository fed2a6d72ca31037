//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;
use crate::model::ModelStatus;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    environment: String,
    timestamp: i64,
    /// Audit records lost to a full or closed queue
    audit_dropped: u64,
    #[serde(flatten)]
    model: ModelStatus,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.model.is_ready() { "healthy" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
        timestamp: chrono::Utc::now().timestamp(),
        audit_dropped: state.notifier.dropped(),
        model: state.model.status(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use crate::audit::PersistenceNotifier;
    use crate::config::Config;
    use crate::model::ModelHandle;
    use crate::testing::{MemoryStore, StubRegistry};
    use crate::{create_router, AppState};

    #[tokio::test]
    async fn test_health_reports_degraded_model() {
        let mut registry = StubRegistry::with_artifacts();
        registry.remove_artifact(&Config::default().scaler_artifact_path);

        let config = Config::default();
        let model = ModelHandle::load(&registry, &config).await.unwrap();
        let notifier = PersistenceNotifier::start(Arc::new(MemoryStore::new()), Arc::new(registry), 4, 1);
        let app = create_router(AppState::new(config, model, notifier));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["model_loaded"], true);
        assert_eq!(body["scaler_loaded"], false);
        assert_eq!(body["model_version"], 3);
        assert_eq!(body["environment"], "development");
        assert_eq!(body["audit_dropped"], 0);
        assert_eq!(body["layout"]["feature_count"], 29);
        assert_eq!(body["layout"]["feature_names"][0], "Score_Source_2");
    }
}
