//! Model - scaler, classifier and prediction dispatch

pub mod classifier;
pub mod dispatcher;
pub mod handle;
pub mod scaler;

pub use classifier::{Classifier, LogisticRegression};
pub use dispatcher::{dispatch, PredictionResult};
pub use handle::{ModelHandle, ModelStatus};
pub use scaler::StandardScaler;
