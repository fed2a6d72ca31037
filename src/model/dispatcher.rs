//! Prediction Dispatcher - probabilities → risk class and message

use serde::{Deserialize, Serialize};

use crate::error::ModelUnavailableError;
use crate::features::FeatureVector;
use super::classifier::Classifier;

/// Default probability (percent) above which an applicant is high risk.
/// Exactly 50.00 stays low risk.
pub const DEFAULT_THRESHOLD_PERCENT: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Percent in [0, 100], 2 decimals
    pub probability_of_default: f64,
    /// Percent in [0, 100], 2 decimals
    pub probability_of_no_default: f64,
    /// 1 = default expected
    pub predicted_class: u8,
    pub message: String,
}

impl PredictionResult {
    /// Build from `[P(no-default), P(default)]` in [0, 1]
    pub fn from_probabilities(proba: [f64; 2]) -> Self {
        let probability_of_no_default = to_percent(proba[0]);
        let probability_of_default = to_percent(proba[1]);

        let predicted_class = u8::from(probability_of_default > DEFAULT_THRESHOLD_PERCENT);
        let message = if predicted_class == 1 {
            format!("🚨 High Risk: {}% probability of loan default.", display_percent(probability_of_default))
        } else {
            format!("✅ Low Risk: {}% probability of timely repayment.", display_percent(probability_of_no_default))
        };

        Self {
            probability_of_default,
            probability_of_no_default,
            predicted_class,
            message,
        }
    }
}

/// Run the classifier on an encoded, scaled vector
pub fn dispatch(
    classifier: Option<&dyn Classifier>,
    features: &FeatureVector,
) -> Result<PredictionResult, ModelUnavailableError> {
    let classifier = classifier.ok_or(ModelUnavailableError::Classifier)?;
    let proba = classifier.predict_proba(features);
    Ok(PredictionResult::from_probabilities(proba))
}

fn to_percent(p: f64) -> f64 {
    (p * 100.0 * 100.0).round() / 100.0
}

/// Shortest form that round-trips, always with a fractional part:
/// 90.0, 73.5, 73.46
fn display_percent(value: f64) -> String {
    let mut text = value.to_string();
    if !text.contains('.') {
        text.push_str(".0");
    }
    text
}
