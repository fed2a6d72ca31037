//! Feature Layout - Centralized Feature Definition
//!
//! **This file controls the feature schema the classifier was trained on.**
//!
//! ## Rules:
//! 1. Add feature → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove feature → increment FEATURE_VERSION
//!
//! Numeric (scaled) columns come first, one-hot indicators after.

use crc32fast::Hasher;
use serde::Serialize;

use crate::error::ArtifactError;

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Feature names in exact order they appear in the vector
pub const FEATURE_LAYOUT: &[&str] = &[
    // === Numeric, scaled (0-10) ===
    "Score_Source_2",
    "Score_Source_3",
    "Employed_Years",
    "Car_Owned",
    "Annuity_Income_Ratio",
    "ID_Years",
    "Credit_to_Age_Ratio",
    "Phone_Change",
    "Age_Years",
    "Loan_Duration",
    "House_Own",

    // === One-hot indicators (11-28) ===
    "Client_Gender_Male",
    "Client_Education_Graduation dropout",
    "Client_Education_Junior secondary",
    "Client_Education_Secondary",
    "Loan_Contract_Type_RL",
    "Client_Permanent_Match_Tag_Yes",
    "Client_Income_Type_Govt Job",
    "Client_Income_Type_Other",
    "Client_Income_Type_Retired",
    "Client_Income_Type_Service",
    "Client_Housing_Type_Home",
    "Client_Housing_Type_Municipal",
    "Client_Housing_Type_Office",
    "Client_Housing_Type_Rental",
    "Client_Housing_Type_Shared",
    "Client_Marital_Status_M",
    "Client_Marital_Status_S",
    "Client_Marital_Status_W",
];

/// Total number of features
/// IMPORTANT: Must match FEATURE_LAYOUT.len()!
pub const FEATURE_COUNT: usize = 29;

/// Leading columns passed through the scaler
pub const NUMERIC_FEATURE_COUNT: usize = 11;

/// Categorical form fields and the indicator labels they expand into.
/// A value outside the list is the group's baseline (all indicators off).
pub const CATEGORICAL_GROUPS: &[(&str, &[&str])] = &[
    ("Client_Income_Type", &["Govt Job", "Other", "Retired", "Service"]),
    ("Client_Education", &["Graduation dropout", "Junior secondary", "Secondary"]),
    ("Client_Marital_Status", &["M", "S", "W"]),
    ("Client_Gender", &["Male"]),
    ("Loan_Contract_Type", &["RL"]),
    ("Client_Housing_Type", &["Home", "Municipal", "Office", "Rental", "Shared"]),
    ("Client_Permanent_Match_Tag", &["Yes"]),
];

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// Compute CRC32 hash of the feature layout
pub fn compute_layout_hash() -> u32 {
    let mut hasher = Hasher::new();

    hasher.update(&[FEATURE_VERSION]);

    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }

    hasher.finalize()
}

pub fn layout_hash() -> u32 {
    compute_layout_hash()
}

/// Layout summary reported by `/health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub numeric_count: usize,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_count: FEATURE_COUNT,
            numeric_count: NUMERIC_FEATURE_COUNT,
            feature_names: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for LayoutInfo {
    fn default() -> Self {
        Self::current()
    }
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

/// Check that a model artifact was trained on exactly this layout
pub fn validate_feature_names<S: AsRef<str>>(names: &[S]) -> Result<(), ArtifactError> {
    if names.len() != FEATURE_COUNT {
        return Err(ArtifactError::Shape {
            artifact: "feature_names",
            expected: FEATURE_COUNT,
            actual: names.len(),
        });
    }

    for (i, (got, want)) in names.iter().zip(FEATURE_LAYOUT).enumerate() {
        if got.as_ref() != *want {
            return Err(ArtifactError::LayoutMismatch(format!(
                "column {} is '{}', expected '{}'",
                i,
                got.as_ref(),
                want
            )));
        }
    }

    Ok(())
}

// ============================================================================
// FEATURE INDEX LOOKUP
// ============================================================================

/// Get feature index by name
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|&n| n == name)
}

/// Get feature name by index
pub fn feature_name(index: usize) -> Option<&'static str> {
    FEATURE_LAYOUT.get(index).copied()
}

/// Whether the column at `index` is a one-hot indicator
pub fn is_indicator(index: usize) -> bool {
    (NUMERIC_FEATURE_COUNT..FEATURE_COUNT).contains(&index)
}

// ============================================================================
// TESTS
// ============================================================================
