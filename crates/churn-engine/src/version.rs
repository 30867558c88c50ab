//! Version information for the scoring service.

/// Engine version from Cargo.toml
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version information reported by the health check.
#[derive(Debug, Clone, serde::Serialize)]
pub struct VersionInfo {
    /// churn-engine version.
    pub engine: &'static str,
    /// Version declared by the model artifact (if any).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Default for VersionInfo {
    fn default() -> Self {
        Self {
            engine: ENGINE_VERSION,
            model: None,
        }
    }
}

impl VersionInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set model artifact version.
    pub fn with_model(mut self, version: String) -> Self {
        self.model = Some(version);
        self
    }
}
