//! Logistic-regression churn model loaded from a JSON artifact.
//!
//! The artifact lists an intercept, a decision threshold and one entry per
//! input column:
//!
//! ```json
//! {
//!   "name": "churn-logreg",
//!   "version": "3",
//!   "intercept": -1.2,
//!   "threshold": 0.5,
//!   "features": [
//!     {"kind": "numeric", "name": "tenure", "coef": -0.8, "mean": 32.4, "scale": 24.6},
//!     {"kind": "categorical", "name": "Contract", "levels": {"Month-to-month": 0.9}}
//!   ]
//! }
//! ```
//!
//! Columns the artifact does not mention are ignored, so callers may send
//! extra fields (customer ids and the like) alongside the model inputs.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::codec::{Frame, Scalar};
use crate::predictor::{PredictionError, Predictor};

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid model artifact: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Feature {
    Numeric {
        name: String,
        coef: f64,
        #[serde(default)]
        mean: f64,
        #[serde(default = "default_scale")]
        scale: f64,
    },
    Categorical {
        name: String,
        levels: HashMap<String, f64>,
    },
}

fn default_scale() -> f64 {
    1.0
}

fn default_threshold() -> f64 {
    0.5
}

impl Feature {
    pub fn name(&self) -> &str {
        match self {
            Feature::Numeric { name, .. } | Feature::Categorical { name, .. } => name,
        }
    }

    /// Contribution of one cell to the linear score.
    fn contribution(&self, value: &Scalar, row: usize) -> Result<f64, PredictionError> {
        let invalid = |reason: String| PredictionError::InvalidValue {
            column: self.name().to_string(),
            row,
            reason,
        };

        match self {
            Feature::Numeric {
                coef, mean, scale, ..
            } => {
                let x = value.as_f64().ok_or_else(|| match value {
                    Scalar::Null => invalid("missing value".to_string()),
                    other => invalid(format!("expected a number, found {}", describe(other))),
                })?;
                Ok(coef * (x - mean) / scale)
            }
            Feature::Categorical { levels, .. } => {
                let key = value
                    .as_key()
                    .ok_or_else(|| invalid("missing value".to_string()))?;
                // Unseen levels contribute nothing, like a one-hot encoder
                // that ignores unknown categories.
                Ok(levels.get(&key).copied().unwrap_or(0.0))
            }
        }
    }
}

fn describe(value: &Scalar) -> String {
    match value {
        Scalar::String(s) => format!("string {s:?}"),
        Scalar::Bool(b) => format!("boolean {b}"),
        Scalar::Number(n) => format!("number {n}"),
        Scalar::Null => "null".to_string(),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogisticModel {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    intercept: f64,
    #[serde(default = "default_threshold")]
    threshold: f64,
    features: Vec<Feature>,
}

impl LogisticModel {
    /// Read and validate an artifact from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ModelError> {
        let model: LogisticModel = serde_json::from_str(raw)?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ModelError::Invalid(format!(
                "threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }
        if self.features.is_empty() {
            return Err(ModelError::Invalid("no features defined".to_string()));
        }
        for feature in &self.features {
            if let Feature::Numeric { name, scale, .. } = feature
                && (*scale == 0.0 || !scale.is_finite())
            {
                return Err(ModelError::Invalid(format!(
                    "feature '{name}' has unusable scale {scale}"
                )));
            }
        }
        Ok(())
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Probability of the positive class for every row.
    fn positive_probabilities(&self, frame: &Frame) -> Result<Vec<f64>, PredictionError> {
        let columns = self
            .features
            .iter()
            .map(|feature| {
                frame
                    .column_index(feature.name())
                    .map(|idx| (idx, feature))
                    .ok_or_else(|| PredictionError::MissingColumn(feature.name().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        frame
            .rows()
            .iter()
            .enumerate()
            .map(|(row, values)| {
                let mut z = self.intercept;
                for &(idx, feature) in &columns {
                    z += feature.contribution(&values[idx], row)?;
                }
                Ok(sigmoid(z))
            })
            .collect()
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl Predictor for LogisticModel {
    fn predict(&self, frame: &Frame) -> Result<Vec<usize>, PredictionError> {
        Ok(self
            .positive_probabilities(frame)?
            .into_iter()
            .map(|p| usize::from(p >= self.threshold))
            .collect())
    }

    fn predict_proba(&self, frame: &Frame) -> Result<Vec<Vec<f64>>, PredictionError> {
        Ok(self
            .positive_probabilities(frame)?
            .into_iter()
            .map(|p| vec![1.0 - p, p])
            .collect())
    }
}
