//! Feature Vector - classifier input in schema order

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use super::layout::{
    FEATURE_COUNT, FEATURE_LAYOUT, NUMERIC_FEATURE_COUNT,
    feature_index, is_indicator,
};

/// Feature vector in `FEATURE_LAYOUT` order. Indicators are stored as 0.0 / 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Zeroed vector: every numeric column 0, every indicator off
    pub fn new() -> Self {
        Self {
            values: [0.0; FEATURE_COUNT],
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// The scaled prefix
    pub fn numeric_mut(&mut self) -> &mut [f64] {
        &mut self.values[..NUMERIC_FEATURE_COUNT]
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn get_by_name(&self, name: &str) -> Option<f64> {
        feature_index(name).and_then(|i| self.get(i))
    }

    /// Indicator state, `None` for unknown or numeric columns
    pub fn flag(&self, name: &str) -> Option<bool> {
        feature_index(name)
            .filter(|&i| is_indicator(i))
            .map(|i| self.values[i] != 0.0)
    }

    /// Set feature by name
    pub fn set_by_name(&mut self, name: &str, value: f64) -> bool {
        match feature_index(name) {
            Some(index) => {
                self.values[index] = value;
                true
            }
            None => false,
        }
    }

    /// Turn an indicator on. Returns false for names outside the layout.
    pub fn set_flag(&mut self, name: &str) -> bool {
        match feature_index(name).filter(|&i| is_indicator(i)) {
            Some(index) => {
                self.values[index] = 1.0;
                true
            }
            None => false,
        }
    }

    /// Names of indicators that are on
    pub fn active_flags(&self) -> Vec<&'static str> {
        (NUMERIC_FEATURE_COUNT..FEATURE_COUNT)
            .filter(|&i| self.values[i] != 0.0)
            .map(|i| FEATURE_LAYOUT[i])
            .collect()
    }

    /// Single-row record (`column -> value`) with indicators as booleans
    pub fn to_record(&self) -> Value {
        let mut row = Map::with_capacity(FEATURE_COUNT);
        for (i, name) in FEATURE_LAYOUT.iter().enumerate() {
            let value = if is_indicator(i) {
                Value::Bool(self.values[i] != 0.0)
            } else {
                Number::from_f64(self.values[i])
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            };
            row.insert((*name).to_string(), value);
        }
        Value::Object(row)
    }

    /// Records in the shape stored as `processed_input`
    pub fn to_records(&self) -> Value {
        Value::Array(vec![self.to_record()])
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::new()
    }
}
