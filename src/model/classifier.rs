//! Classifier - probability model behind the dispatcher

use serde::Deserialize;

use crate::error::ArtifactError;
use crate::features::{validate_feature_names, FeatureVector, FEATURE_COUNT};

/// Binary probability model
pub trait Classifier: Send + Sync {
    /// `[P(no-default), P(default)]`
    fn predict_proba(&self, features: &FeatureVector) -> [f64; 2];

    fn name(&self) -> &str;
}

/// Logistic regression exported from the training pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegression {
    coef: Vec<f64>,
    intercept: f64,
}

/// scikit-learn exports `coef_` as one row per class and `intercept_` as an array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Coefficients {
    Flat(Vec<f64>),
    Rows(Vec<Vec<f64>>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Intercept {
    Scalar(f64),
    Array(Vec<f64>),
}

#[derive(Debug, Deserialize)]
struct LogisticArtifact {
    #[serde(alias = "coef_")]
    coef: Coefficients,
    #[serde(alias = "intercept_")]
    intercept: Intercept,
    #[serde(default, alias = "feature_names_in_")]
    feature_names: Option<Vec<String>>,
}

impl LogisticRegression {
    pub fn new(coef: Vec<f64>, intercept: f64) -> Result<Self, ArtifactError> {
        if coef.len() != FEATURE_COUNT {
            return Err(ArtifactError::Shape {
                artifact: "classifier coef",
                expected: FEATURE_COUNT,
                actual: coef.len(),
            });
        }
        if !intercept.is_finite() || coef.iter().any(|c| !c.is_finite()) {
            return Err(ArtifactError::InvalidParameter(
                "classifier parameters must be finite".to_string(),
            ));
        }
        Ok(Self { coef, intercept })
    }

    /// Parse a JSON classifier artifact. Declared training columns must
    /// match the feature layout.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ArtifactError> {
        let artifact: LogisticArtifact = serde_json::from_slice(bytes)?;

        if let Some(names) = &artifact.feature_names {
            validate_feature_names(names.as_slice())?;
        }

        let coef = match artifact.coef {
            Coefficients::Flat(c) => c,
            Coefficients::Rows(mut rows) => {
                if rows.len() != 1 {
                    return Err(ArtifactError::Shape {
                        artifact: "classifier coef rows",
                        expected: 1,
                        actual: rows.len(),
                    });
                }
                rows.remove(0)
            }
        };

        let intercept = match artifact.intercept {
            Intercept::Scalar(v) => v,
            Intercept::Array(v) if v.len() == 1 => v[0],
            Intercept::Array(v) => {
                return Err(ArtifactError::Shape {
                    artifact: "classifier intercept",
                    expected: 1,
                    actual: v.len(),
                })
            }
        };

        Self::new(coef, intercept)
    }

    fn decision_function(&self, features: &FeatureVector) -> f64 {
        self.coef
            .iter()
            .zip(features.as_slice())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept
    }
}

impl Classifier for LogisticRegression {
    fn predict_proba(&self, features: &FeatureVector) -> [f64; 2] {
        let p_default = sigmoid(self.decision_function(features));
        [1.0 - p_default, p_default]
    }

    fn name(&self) -> &str {
        "logistic_regression"
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
