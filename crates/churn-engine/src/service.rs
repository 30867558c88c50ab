//! ScoringService: transport-agnostic scoring for the hosted deployment.
//!
//! The service owns the deployment registry and the loaded predictor. Both
//! are read-only after construction, so one `Arc<ScoringService>` is shared
//! by every request without locking. Transports delegate to it and only
//! translate its errors into their own status codes.

use std::sync::Arc;
use std::time::Instant;

use crate::codec::{self, ScoringRequest, ScoringResponse};
use crate::deployment::{Deployment, DeploymentError, DeploymentRegistry};
use crate::health::ModelLoad;
use crate::predictor::{PredictionError, Predictor};
use crate::validation::ValidationError;
use crate::version::VersionInfo;

#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    #[error(transparent)]
    NotFound(#[from] DeploymentError),

    #[error("Malformed scoring request ({} errors)", .0.len())]
    Malformed(Vec<ValidationError>),

    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

pub struct ScoringService {
    registry: DeploymentRegistry,
    predictor: Arc<dyn Predictor>,
    model_load: Option<ModelLoad>,
    version: VersionInfo,
}

impl ScoringService {
    pub fn new(registry: DeploymentRegistry, predictor: Arc<dyn Predictor>) -> Self {
        Self {
            registry,
            predictor,
            model_load: None,
            version: VersionInfo::new(),
        }
    }

    /// Builder-style method to record how the model was loaded.
    pub fn with_model_load(mut self, load: ModelLoad) -> Self {
        self.model_load = Some(load);
        self
    }

    /// Builder-style method to set version info.
    pub fn with_version(mut self, version: VersionInfo) -> Self {
        self.version = version;
        self
    }

    pub fn deployments(&self) -> &[Deployment] {
        self.registry.list()
    }

    pub fn deployment(&self, id: &str) -> Result<&Deployment, DeploymentError> {
        self.registry.get(id)
    }

    pub fn model_load(&self) -> Option<&ModelLoad> {
        self.model_load.as_ref()
    }

    pub fn version(&self) -> &VersionInfo {
        &self.version
    }

    /// Score the first table of a request against a deployment.
    ///
    /// The predictor runs on the blocking pool so slow models do not stall
    /// the async workers.
    pub async fn score(
        &self,
        deployment_id: &str,
        request: ScoringRequest,
    ) -> Result<ScoringResponse, ScoreError> {
        self.registry.get(deployment_id)?;

        let frame = codec::decode(request).map_err(ScoreError::Malformed)?;
        let rows = frame.len();

        let start = Instant::now();
        let predictor = Arc::clone(&self.predictor);
        let (frame, predictions) = tokio::task::spawn_blocking(move || {
            let predictions = codec::predict_table(predictor.as_ref(), &frame);
            (frame, predictions)
        })
        .await
        .map_err(|_| PredictionError::Failed("prediction task lost".to_string()))?;

        let predictions = predictions.inspect_err(|e| {
            tracing::error!(deployment_id, rows, error = %e, "Prediction failed");
        })?;

        tracing::info!(
            deployment_id,
            rows,
            predict_time_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Scored request"
        );

        Ok(ScoringResponse {
            predictions: vec![codec::encode(frame, predictions)],
        })
    }
}
