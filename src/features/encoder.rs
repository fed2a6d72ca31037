//! Feature Encoder - form payload → FeatureVector
//!
//! Parses the raw form fields, derives the three ratio features and expands
//! categorical fields into their one-hot groups. Unknown categories fall back
//! to the group's baseline (all indicators off) instead of failing.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::ValidationError;
use super::layout::CATEGORICAL_GROUPS;
use super::vector::FeatureVector;

/// Form field names
pub mod fields {
    pub const ID: &str = "id";
    pub const ID_YEARS: &str = "ID_Years";
    pub const CREDIT_AMOUNT: &str = "credit_amount";
    pub const AGE_YEARS: &str = "age_years";
    pub const CAR_OWNED: &str = "car_owned";
    pub const HOUSE_OWN: &str = "house_own";
    pub const SCORE_SOURCE_2: &str = "score_source_2";
    pub const SCORE_SOURCE_3: &str = "score_source_3";
    pub const PHONE_CHANGE: &str = "phone_change";
    pub const LOAN_ANNUITY: &str = "loan_annuity";
    pub const CLIENT_INCOME: &str = "client_income";
    pub const EMPLOYED_YEARS: &str = "employed_years";
    pub const CLIENT_INCOME_TYPE: &str = "client_income_type";
    pub const CLIENT_EDUCATION: &str = "client_education";
    pub const CLIENT_MARITAL_STATUS: &str = "client_marital_status";
    pub const CLIENT_GENDER: &str = "client_gender";
    pub const LOAN_CONTRACT_TYPE: &str = "loan_contract_type";
    pub const CLIENT_HOUSING_TYPE: &str = "client_housing_type";
    pub const CLIENT_PERMANENT_MATCH_TAG: &str = "client_permanent_match_tag";
}

/// Parsed loan application
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawApplication {
    pub client_id: String,
    pub id_years: i64,
    pub credit_amount: f64,
    pub age_years: i64,
    pub car_owned: i64,
    pub house_own: i64,
    pub score_source_2: f64,
    pub score_source_3: f64,
    pub phone_change: i64,
    pub loan_annuity: f64,
    pub client_income: f64,
    pub employed_years: i64,
    pub client_income_type: String,
    pub client_education: String,
    pub client_marital_status: String,
    pub client_gender: String,
    pub loan_contract_type: String,
    pub client_housing_type: String,
    pub client_permanent_match_tag: String,
}

impl RawApplication {
    /// Parse the form map. Fails on the first missing or malformed field.
    pub fn from_form(form: &BTreeMap<String, String>) -> Result<Self, ValidationError> {
        let client_id = text(form, fields::ID)?;
        if client_id.is_empty() {
            return Err(ValidationError::new(fields::ID, "must not be empty"));
        }

        Ok(Self {
            client_id,
            id_years: int(form, fields::ID_YEARS)?,
            credit_amount: float(form, fields::CREDIT_AMOUNT)?,
            age_years: int(form, fields::AGE_YEARS)?,
            car_owned: int(form, fields::CAR_OWNED)?,
            house_own: int(form, fields::HOUSE_OWN)?,
            score_source_2: float(form, fields::SCORE_SOURCE_2)?,
            score_source_3: float(form, fields::SCORE_SOURCE_3)?,
            phone_change: int(form, fields::PHONE_CHANGE)?,
            loan_annuity: float(form, fields::LOAN_ANNUITY)?,
            client_income: float(form, fields::CLIENT_INCOME)?,
            employed_years: int(form, fields::EMPLOYED_YEARS)?,
            client_income_type: text(form, fields::CLIENT_INCOME_TYPE)?,
            client_education: text(form, fields::CLIENT_EDUCATION)?,
            client_marital_status: text(form, fields::CLIENT_MARITAL_STATUS)?,
            client_gender: text(form, fields::CLIENT_GENDER)?,
            loan_contract_type: text(form, fields::LOAN_CONTRACT_TYPE)?,
            client_housing_type: text(form, fields::CLIENT_HOUSING_TYPE)?,
            client_permanent_match_tag: text(form, fields::CLIENT_PERMANENT_MATCH_TAG)?,
        })
    }

    /// Credit amount per year of age
    pub fn credit_to_age_ratio(&self) -> Result<f64, ValidationError> {
        ratio(self.credit_amount, self.age_years as f64, fields::AGE_YEARS)
    }

    pub fn annuity_income_ratio(&self) -> Result<f64, ValidationError> {
        ratio(self.loan_annuity, self.client_income, fields::CLIENT_INCOME)
    }

    /// Number of annuity payments covering the credit
    pub fn loan_duration(&self) -> Result<f64, ValidationError> {
        ratio(self.credit_amount, self.loan_annuity, fields::LOAN_ANNUITY)
    }

    /// Category label per one-hot group, in `CATEGORICAL_GROUPS` order
    fn category_values(&self) -> [&str; 7] {
        [
            self.client_income_type.as_str(),
            self.client_education.as_str(),
            self.client_marital_status.as_str(),
            self.client_gender.as_str(),
            self.loan_contract_type.as_str(),
            self.client_housing_type.as_str(),
            permanent_match_label(&self.client_permanent_match_tag),
        ]
    }
}

/// Encode an application into the classifier's schema (unscaled)
pub fn encode(app: &RawApplication) -> Result<FeatureVector, ValidationError> {
    let mut vector = FeatureVector::new();

    let numeric = [
        ("Score_Source_2", app.score_source_2),
        ("Score_Source_3", app.score_source_3),
        ("Employed_Years", app.employed_years as f64),
        ("Car_Owned", app.car_owned as f64),
        ("Annuity_Income_Ratio", app.annuity_income_ratio()?),
        ("ID_Years", app.id_years as f64),
        ("Credit_to_Age_Ratio", app.credit_to_age_ratio()?),
        ("Phone_Change", app.phone_change as f64),
        ("Age_Years", app.age_years as f64),
        ("Loan_Duration", app.loan_duration()?),
        ("House_Own", app.house_own as f64),
    ];
    for (name, value) in numeric {
        vector.set_by_name(name, value);
    }

    for ((prefix, labels), value) in CATEGORICAL_GROUPS.iter().zip(app.category_values()) {
        if labels.contains(&value) {
            vector.set_flag(&format!("{}_{}", prefix, value));
        } else {
            tracing::debug!(group = %prefix, value = %value, "Unseen category, using baseline");
        }
    }

    Ok(vector)
}

/// Parse and encode in one step
pub fn encode_form(form: &BTreeMap<String, String>) -> Result<(RawApplication, FeatureVector), ValidationError> {
    let app = RawApplication::from_form(form)?;
    let vector = encode(&app)?;
    Ok((app, vector))
}

// Helper functions

/// The form sends the permanent-address match as 1/0
fn permanent_match_label(raw: &str) -> &str {
    match raw {
        "1" | "Yes" => "Yes",
        other => other,
    }
}

fn text(form: &BTreeMap<String, String>, field: &str) -> Result<String, ValidationError> {
    form.get(field)
        .map(|v| v.trim().to_string())
        .ok_or_else(|| ValidationError::missing(field))
}

fn int(form: &BTreeMap<String, String>, field: &str) -> Result<i64, ValidationError> {
    let raw = text(form, field)?;
    raw.parse::<i64>()
        .map_err(|_| ValidationError::new(field, format!("expected an integer, got '{}'", raw)))
}

fn float(form: &BTreeMap<String, String>, field: &str) -> Result<f64, ValidationError> {
    let raw = text(form, field)?;
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ValidationError::new(field, format!("expected a finite number, got '{}'", raw))),
    }
}

fn ratio(numerator: f64, denominator: f64, field: &str) -> Result<f64, ValidationError> {
    if denominator == 0.0 {
        return Err(ValidationError::new(field, "must not be zero"));
    }
    let value = numerator / denominator;
    if !value.is_finite() {
        return Err(ValidationError::new(field, "ratio is not a finite number"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::layout::{FEATURE_COUNT, FEATURE_LAYOUT, NUMERIC_FEATURE_COUNT};
    use crate::testing::sample_form;

    #[test]
    fn test_reference_application() {
        let (app, vector) = encode_form(&sample_form()).unwrap();
        assert_eq!(app.client_id, "C1");

        assert_eq!(vector.get_by_name("Credit_to_Age_Ratio"), Some(2500.0));
        assert_eq!(vector.get_by_name("Annuity_Income_Ratio"), Some(0.25));
        assert_eq!(vector.get_by_name("Loan_Duration"), Some(20.0));
        assert_eq!(vector.get_by_name("Age_Years"), Some(40.0));
        assert_eq!(vector.get_by_name("Score_Source_3"), Some(0.6));

        let mut active = vector.active_flags();
        active.sort();
        assert_eq!(
            active,
            vec![
                "Client_Education_Secondary",
                "Client_Gender_Male",
                "Client_Housing_Type_Home",
                "Client_Income_Type_Service",
                "Client_Marital_Status_M",
                "Client_Permanent_Match_Tag_Yes",
                "Loan_Contract_Type_RL",
            ]
        );
    }

    #[test]
    fn test_vector_matches_schema() {
        let (_, vector) = encode_form(&sample_form()).unwrap();
        let record = vector.to_record();
        let obj = record.as_object().unwrap();
        assert_eq!(obj.len(), FEATURE_COUNT);
        for name in FEATURE_LAYOUT {
            assert!(obj.contains_key(*name), "missing column {}", name);
        }
    }

    #[test]
    fn test_unseen_categories_use_baseline() {
        let mut form = sample_form();
        form.insert("client_income_type".into(), "Commercial".into());
        form.insert("client_education".into(), "Post Grad".into());
        form.insert("client_marital_status".into(), "D".into());
        form.insert("client_gender".into(), "Female".into());
        form.insert("loan_contract_type".into(), "CL".into());
        form.insert("client_housing_type".into(), "Family".into());
        form.insert("client_permanent_match_tag".into(), "0".into());

        let (_, vector) = encode_form(&form).unwrap();
        assert!(vector.active_flags().is_empty());
        assert!(vector.as_slice()[NUMERIC_FEATURE_COUNT..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_category_match_is_case_sensitive() {
        let mut form = sample_form();
        form.insert("client_gender".into(), "male".into());
        let (_, vector) = encode_form(&form).unwrap();
        assert_eq!(vector.flag("Client_Gender_Male"), Some(false));
    }

    #[test]
    fn test_zero_denominators_rejected() {
        for (field, blamed) in [
            ("age_years", "age_years"),
            ("client_income", "client_income"),
            ("loan_annuity", "loan_annuity"),
        ] {
            let mut form = sample_form();
            form.insert(field.into(), "0".into());
            let err = encode_form(&form).unwrap_err();
            assert_eq!(err.field, blamed);
        }
    }

    #[test]
    fn test_non_numeric_rejected() {
        let mut form = sample_form();
        form.insert("credit_amount".into(), "lots".into());
        assert_eq!(encode_form(&form).unwrap_err().field, "credit_amount");

        let mut form = sample_form();
        form.insert("age_years".into(), "40.5".into());
        assert_eq!(encode_form(&form).unwrap_err().field, "age_years");

        let mut form = sample_form();
        form.insert("score_source_2".into(), "NaN".into());
        assert_eq!(encode_form(&form).unwrap_err().field, "score_source_2");
    }

    #[test]
    fn test_missing_field_rejected() {
        let mut form = sample_form();
        form.remove("client_housing_type");
        let err = encode_form(&form).unwrap_err();
        assert_eq!(err, ValidationError::missing("client_housing_type"));

        let mut form = sample_form();
        form.insert("id".into(), "  ".into());
        assert_eq!(encode_form(&form).unwrap_err().field, "id");
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let form = sample_form();
        let (_, first) = encode_form(&form).unwrap();
        let (_, second) = encode_form(&form).unwrap();
        assert_eq!(first, second);
    }
}
