//! Deployment registry.
//!
//! The service exposes exactly one deployment. Its descriptor is built once
//! at startup and never changes afterwards.

use serde::Serialize;

/// Identifier of the only deployment this service hosts.
pub const DEPLOYMENT_ID: &str = "churn-classifier";

/// Route template the scoring handler is mounted at.
pub const SCORING_PATH: &str = "/v1/deployments/{id}/online";

/// Concrete scoring path for a deployment id.
pub fn scoring_endpoint(id: &str) -> String {
    SCORING_PATH.replace("{id}", id)
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DeploymentError {
    #[error("Deployment not found")]
    NotFound(String),
}

/// Full deployment descriptor, as returned by the detail route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deployment {
    pub id: String,
    pub name: String,
    pub description: String,
    pub model_type: String,
    pub scoring_endpoint: String,
}

impl Deployment {
    pub fn churn_classifier() -> Self {
        Self {
            id: DEPLOYMENT_ID.to_string(),
            name: "Churn Classifier".to_string(),
            description: "Customer churn prediction model".to_string(),
            model_type: "binary-classification".to_string(),
            scoring_endpoint: scoring_endpoint(DEPLOYMENT_ID),
        }
    }

    pub fn summary(&self) -> DeploymentSummary<'_> {
        DeploymentSummary {
            id: &self.id,
            name: &self.name,
            scoring_endpoint: &self.scoring_endpoint,
        }
    }
}

/// List-view projection of a [`Deployment`].
#[derive(Debug, Serialize)]
pub struct DeploymentSummary<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub scoring_endpoint: &'a str,
}

#[derive(Debug, Clone)]
pub struct DeploymentRegistry {
    deployment: Deployment,
}

impl DeploymentRegistry {
    pub fn new(deployment: Deployment) -> Self {
        Self { deployment }
    }

    pub fn list(&self) -> &[Deployment] {
        std::slice::from_ref(&self.deployment)
    }

    pub fn get(&self, id: &str) -> Result<&Deployment, DeploymentError> {
        if id == self.deployment.id {
            Ok(&self.deployment)
        } else {
            Err(DeploymentError::NotFound(id.to_string()))
        }
    }
}

impl Default for DeploymentRegistry {
    fn default() -> Self {
        Self::new(Deployment::churn_classifier())
    }
}
