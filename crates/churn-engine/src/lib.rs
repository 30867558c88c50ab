//! churn-engine: deployment scoring API for a pre-trained churn classifier.

mod health;
mod version;

pub mod codec;
pub mod deployment;
pub mod model;
pub mod openapi;
pub mod predictor;
pub mod service;
pub mod transport;
pub mod validation;

pub use codec::{
    Frame, LABELS, PredictionRow, PredictionTable, Predictions, Scalar, ScoringRequest,
    ScoringResponse, ScoringTable,
};
pub use deployment::{DEPLOYMENT_ID, Deployment, DeploymentError, DeploymentRegistry};
pub use health::{Health, ModelLoad};
pub use model::{LogisticModel, ModelError};
pub use predictor::{PredictionError, Predictor};
pub use service::{ScoreError, ScoringService};
pub use validation::ValidationError;
pub use version::{ENGINE_VERSION, VersionInfo};
