//! Feature encoding for the loan default classifier

pub mod layout;
pub mod vector;
pub mod encoder;

pub use layout::{
    FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION, NUMERIC_FEATURE_COUNT,
    LayoutInfo, layout_hash, validate_feature_names,
};
pub use vector::FeatureVector;
pub use encoder::{encode, encode_form, RawApplication};
