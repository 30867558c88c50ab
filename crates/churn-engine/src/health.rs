//! Health status types.

use serde::Serialize;

/// Health of the scoring service.
///
/// The server only starts listening once the model has loaded, so a running
/// instance always reports `READY`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Health {
    #[default]
    Ready,
}

/// Record of the startup model load.
#[derive(Debug, Clone, Serialize)]
pub struct ModelLoad {
    /// Artifact location the model was read from.
    pub path: String,
    /// Name declared by the artifact.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// When loading started (ISO 8601 format).
    pub started_at: String,
    /// When loading completed (ISO 8601 format), if finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl ModelLoad {
    /// Create a new ModelLoad with the current time as started_at.
    pub fn starting(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: None,
            started_at: chrono::Utc::now().to_rfc3339(),
            completed_at: None,
        }
    }

    /// Mark the load as completed.
    pub fn completed(mut self, name: Option<String>) -> Self {
        self.completed_at = Some(chrono::Utc::now().to_rfc3339());
        self.name = name;
        self
    }
}
