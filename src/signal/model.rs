//! Classifier boundary
//!
//! The engine only ever sees `predict -> p in [0, 1]` behind [`SignalModel`],
//! so the trained artifact stays a black box and tests can script the model.

use crate::features::FeatureVector;
use serde::Deserialize;
use std::path::Path;

/// Capability interface for the pretrained classifier
pub trait SignalModel: Send + Sync {
    /// Scalar prediction in [0, 1]; larger means up
    fn predict(&self, features: &FeatureVector) -> anyhow::Result<f64>;

    /// Model name for logging
    fn name(&self) -> &'static str;
}

/// Explicit "no model configured" implementation
///
/// Keeps the engine alive with neutral signals when no artifact is present.
pub struct NullModel;

impl SignalModel for NullModel {
    fn predict(&self, _features: &FeatureVector) -> anyhow::Result<f64> {
        // Dead-center of the predictor's dead zone: always neutral
        Ok(0.5)
    }

    fn name(&self) -> &'static str {
        "null"
    }
}

/// Logistic classifier loaded from a JSON weights artifact
///
/// Artifact shape: `{"weights": [w1..w5], "bias": b}` over the feature vector
/// in training order.
pub struct LogisticModel {
    weights: [f64; 5],
    bias: f64,
}

#[derive(Debug, Deserialize)]
struct ModelArtifact {
    weights: Vec<f64>,
    #[serde(default)]
    bias: f64,
}

impl LogisticModel {
    /// Load the artifact from disk
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let artifact: ModelArtifact = serde_json::from_str(&content)?;

        let weights: [f64; 5] = artifact
            .weights
            .as_slice()
            .try_into()
            .map_err(|_| anyhow::anyhow!("model artifact must have exactly 5 weights"))?;

        Ok(Self {
            weights,
            bias: artifact.bias,
        })
    }
}

impl SignalModel for LogisticModel {
    fn predict(&self, features: &FeatureVector) -> anyhow::Result<f64> {
        let x = features.as_array();
        let z: f64 = self
            .weights
            .iter()
            .zip(x.iter())
            .map(|(w, v)| w * v)
            .sum::<f64>()
            + self.bias;
        Ok(1.0 / (1.0 + (-z).exp()))
    }

    fn name(&self) -> &'static str {
        "logistic"
    }
}

/// Load the configured model, degrading to [`NullModel`] when absent
pub fn load_model(path: &str) -> Box<dyn SignalModel> {
    if Path::new(path).exists() {
        match LogisticModel::load(path) {
            Ok(model) => {
                tracing::info!(path, "Loaded scalping model");
                return Box::new(model);
            }
            Err(e) => {
                tracing::error!(path, error = %e, "Failed to load model");
            }
        }
    } else {
        tracing::warn!(
            path,
            "Model not found; trading disabled until an artifact is placed there"
        );
    }
    Box::new(NullModel)
}
