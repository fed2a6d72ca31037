//! Prediction audit model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::model::PredictionResult;

/// One served prediction, written once and never updated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Latest tracking run at write time, `None` if it could not be resolved
    pub run_id: Option<String>,
    pub client_id: String,
    /// Form payload as received, serialized to JSON
    pub raw_input: String,
    /// Encoded and scaled features as JSON records
    pub processed_input: serde_json::Value,
    /// Probability of default, percent
    pub prediction_prob: f64,
    pub predicted_class: i16,
}

/// Stored row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StoredPrediction {
    pub id: Uuid,
    pub run_id: Option<String>,
    pub client_id: String,
    pub raw_input: String,
    pub processed_input: serde_json::Value,
    pub prediction_prob: f64,
    pub predicted_class: i16,
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Record for a successful prediction; the run id is filled in by the writer
    pub fn new(
        client_id: impl Into<String>,
        raw_input: impl Into<String>,
        processed_input: serde_json::Value,
        result: &PredictionResult,
    ) -> Self {
        Self {
            run_id: None,
            client_id: client_id.into(),
            raw_input: raw_input.into(),
            processed_input,
            prediction_prob: result.probability_of_default,
            predicted_class: i16::from(result.predicted_class),
        }
    }

    pub async fn insert(&self, pool: &PgPool) -> Result<StoredPrediction, sqlx::Error> {
        sqlx::query_as::<_, StoredPrediction>(
            r#"
            INSERT INTO predictions (id, run_id, client_id, raw_input, processed_input, prediction_prob, predicted_class)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#
        )
        .bind(Uuid::new_v4())
        .bind(&self.run_id)
        .bind(&self.client_id)
        .bind(&self.raw_input)
        .bind(&self.processed_input)
        .bind(self.prediction_prob)
        .bind(self.predicted_class)
        .fetch_one(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_from_result() {
        let result = PredictionResult::from_probabilities([0.25, 0.75]);
        let record = AuditRecord::new("C1", "{\"id\":\"C1\"}", serde_json::json!([{}]), &result);

        assert_eq!(record.run_id, None);
        assert_eq!(record.client_id, "C1");
        assert_eq!(record.prediction_prob, 75.0);
        assert_eq!(record.predicted_class, 1);
    }
}
