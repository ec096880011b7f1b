use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::{
    error::PredictError,
    features::{FEATURE_COUNT, FEATURE_ORDER, WeatherFeatureVector},
    model::RiskLevel,
};

use super::RiskPredictor;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Lower score bounds for each level. Scores below `low` are `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBuckets {
    pub low: f64,
    pub moderate: f64,
    pub high: f64,
    pub severe: f64,
}

/// On-disk form of a trained linear scoring model.
///
/// Example JSON:
/// {"version": "2024-06", "feature_names": [...], "scaler": {"mean": [...], "scale": [...]},
///  "weights": [...], "bias": -1.2, "buckets": {"low": 0.0, "moderate": 1.0, "high": 2.0, "severe": 3.0}}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: String,
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub scaler: Option<StandardScaler>,
    pub weights: Vec<f64>,
    pub bias: f64,
    pub buckets: ScoreBuckets,
}

#[derive(Debug, Clone)]
pub struct TrainedModelPredictor {
    version: String,
    mean: [f64; FEATURE_COUNT],
    scale: [f64; FEATURE_COUNT],
    weights: [f64; FEATURE_COUNT],
    bias: f64,
    buckets: ScoreBuckets,
}

fn fixed(name: &str, values: &[f64]) -> Result<[f64; FEATURE_COUNT]> {
    let array: [f64; FEATURE_COUNT] = values.try_into().map_err(|_| {
        anyhow!("Artifact {name} has {} entries, expected {FEATURE_COUNT}", values.len())
    })?;
    if array.iter().any(|v| !v.is_finite()) {
        return Err(anyhow!("Artifact {name} contains non-finite values"));
    }
    Ok(array)
}

impl TrainedModelPredictor {
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self> {
        if artifact.feature_names.len() != FEATURE_COUNT
            || artifact.feature_names.iter().zip(FEATURE_ORDER).any(|(a, b)| a != b)
        {
            return Err(anyhow!(
                "Artifact feature order {:?} does not match expected {:?}",
                artifact.feature_names,
                FEATURE_ORDER
            ));
        }

        let weights = fixed("weights", &artifact.weights)?;
        let (mean, scale) = match &artifact.scaler {
            Some(scaler) => (fixed("scaler.mean", &scaler.mean)?, fixed("scaler.scale", &scaler.scale)?),
            None => ([0.0; FEATURE_COUNT], [1.0; FEATURE_COUNT]),
        };
        if scale.contains(&0.0) {
            return Err(anyhow!("Artifact scaler.scale contains zero"));
        }

        let b = &artifact.buckets;
        let bounds = [b.low, b.moderate, b.high, b.severe];
        if bounds.iter().any(|v| !v.is_finite()) || bounds.windows(2).any(|w| w[0] > w[1]) {
            return Err(anyhow!("Artifact buckets must be finite and ascending"));
        }
        if !artifact.bias.is_finite() {
            return Err(anyhow!("Artifact bias is not finite"));
        }

        Ok(Self {
            version: artifact.version,
            mean,
            scale,
            weights,
            bias: artifact.bias,
            buckets: artifact.buckets,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read model artifact: {}", path.display()))?;

        let artifact: ModelArtifact = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse model artifact: {}", path.display()))?;

        Self::from_artifact(artifact)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    fn score(&self, features: &WeatherFeatureVector) -> f64 {
        features
            .values()
            .iter()
            .enumerate()
            .map(|(i, x)| self.weights[i] * (x - self.mean[i]) / self.scale[i])
            .sum::<f64>()
            + self.bias
    }

    fn bucket(&self, score: f64) -> RiskLevel {
        let b = &self.buckets;
        if score >= b.severe {
            RiskLevel::Severe
        } else if score >= b.high {
            RiskLevel::High
        } else if score >= b.moderate {
            RiskLevel::Moderate
        } else if score >= b.low {
            RiskLevel::Low
        } else {
            RiskLevel::None
        }
    }
}

impl RiskPredictor for TrainedModelPredictor {
    fn predict(&self, features: &WeatherFeatureVector) -> Result<RiskLevel, PredictError> {
        let score = self.score(features);
        if !score.is_finite() {
            return Err(PredictError::InvalidFeatureVector(format!(
                "model {} produced non-finite score",
                self.version
            )));
        }
        Ok(self.bucket(score))
    }
}
