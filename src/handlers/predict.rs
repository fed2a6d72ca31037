//! Prediction handler

use std::collections::BTreeMap;

use axum::{
    extract::{rejection::FormRejection, State},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{AppResult, AppState};
use crate::features::encode_form;
use crate::models::AuditRecord;

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: String,
}

/// Score a loan application submitted as a form.
///
/// The audit record is queued for the background writers and the response
/// is returned without waiting for it.
pub async fn predict(
    State(state): State<AppState>,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> AppResult<Json<PredictResponse>> {
    let Form(pairs) = form?;
    let (raw, form) = first_values(pairs);
    let raw_input = Value::Object(raw).to_string();

    let (application, mut features) = encode_form(&form)?;
    let result = state.model.predict(&mut features)?;

    tracing::info!(
        client_id = %application.client_id,
        predicted_class = result.predicted_class,
        "Returning result: {}",
        result.message
    );

    let record = AuditRecord::new(application.client_id, raw_input, features.to_records(), &result);
    if let Err(e) = state.notifier.notify(record) {
        tracing::debug!("Audit write not scheduled: {}", e);
    }

    Ok(Json(PredictResponse {
        prediction: result.message,
    }))
}

/// Keep the first value of each field, in submission order
fn first_values(pairs: Vec<(String, String)>) -> (Map<String, Value>, BTreeMap<String, String>) {
    let mut raw = Map::new();
    let mut form = BTreeMap::new();

    for (key, value) in pairs {
        if form.contains_key(&key) {
            continue;
        }
        raw.insert(key.clone(), Value::String(value.clone()));
        form.insert(key, value);
    }

    (raw, form)
}
