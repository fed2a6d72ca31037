//! Scaler Adapter - standardization fitted at training time

use serde::{Deserialize, Serialize};

use crate::error::{ArtifactError, ModelUnavailableError};
use crate::features::{FeatureVector, NUMERIC_FEATURE_COUNT};

/// `(x - mean) / scale` per numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    #[serde(alias = "mean_")]
    pub mean: Vec<f64>,
    #[serde(alias = "scale_")]
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, ArtifactError> {
        let scaler = Self { mean, scale };
        scaler.validate()?;
        Ok(scaler)
    }

    /// Parse a JSON scaler artifact
    pub fn from_json(bytes: &[u8]) -> Result<Self, ArtifactError> {
        let scaler: Self = serde_json::from_slice(bytes)?;
        scaler.validate()?;
        Ok(scaler)
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        for (artifact, values) in [("scaler mean", &self.mean), ("scaler scale", &self.scale)] {
            if values.len() != NUMERIC_FEATURE_COUNT {
                return Err(ArtifactError::Shape {
                    artifact,
                    expected: NUMERIC_FEATURE_COUNT,
                    actual: values.len(),
                });
            }
            if values.iter().any(|v| !v.is_finite()) {
                return Err(ArtifactError::InvalidParameter(format!(
                    "{} contains a non-finite value",
                    artifact
                )));
            }
        }
        Ok(())
    }

    /// Scale the numeric prefix in place. Zero scale means a constant
    /// training column and is treated as 1.
    pub fn transform(&self, values: &mut [f64]) {
        for ((x, mean), scale) in values.iter_mut().zip(&self.mean).zip(&self.scale) {
            let divisor = if *scale == 0.0 { 1.0 } else { *scale };
            *x = (*x - mean) / divisor;
        }
    }
}

/// Apply the loaded scaler to a vector's numeric columns
pub fn scale_vector(
    scaler: Option<&StandardScaler>,
    vector: &mut FeatureVector,
) -> Result<(), ModelUnavailableError> {
    let scaler = scaler.ok_or(ModelUnavailableError::Scaler)?;
    scaler.transform(vector.numeric_mut());
    Ok(())
}
