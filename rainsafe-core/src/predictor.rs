use crate::{
    config::PredictorConfig,
    error::PredictError,
    features::WeatherFeatureVector,
    model::RiskLevel,
    predictor::{rules::RuleBasedPredictor, trained::TrainedModelPredictor},
};
use std::{convert::TryFrom, fmt::Debug, sync::Arc};

pub mod rules;
pub mod trained;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredictorKind {
    Model,
    Rules,
}

impl PredictorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictorKind::Model => "model",
            PredictorKind::Rules => "rules",
        }
    }

    pub const fn all() -> &'static [PredictorKind] {
        &[PredictorKind::Model, PredictorKind::Rules]
    }
}

impl std::fmt::Display for PredictorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for PredictorKind {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "model" => Ok(PredictorKind::Model),
            "rules" => Ok(PredictorKind::Rules),
            _ => Err(anyhow::anyhow!(
                "Unknown predictor '{value}'. Supported predictors: model, rules."
            )),
        }
    }
}

/// Weather-based risk classifier.
///
/// Implementations must be pure and non-blocking: the engine calls `predict`
/// inline on the async task and shares one instance across concurrent
/// assessments.
pub trait RiskPredictor: Send + Sync + Debug {
    fn predict(&self, features: &WeatherFeatureVector) -> Result<RiskLevel, PredictError>;
}

/// The predictor chosen at start-up together with what it actually is.
#[derive(Debug, Clone)]
pub struct SelectedPredictor {
    pub kind: PredictorKind,
    pub predictor: Arc<dyn RiskPredictor>,
}

fn rules_from_config(config: &PredictorConfig) -> SelectedPredictor {
    SelectedPredictor {
        kind: PredictorKind::Rules,
        predictor: Arc::new(RuleBasedPredictor::new(
            config.heavy_rain_mm,
            config.humidity_high_pct,
        )),
    }
}

/// Construct the configured predictor.
///
/// A `model` predictor whose artifact is missing or invalid falls back to the
/// rule-based predictor so assessments keep working.
pub fn predictor_from_config(config: &PredictorConfig) -> anyhow::Result<SelectedPredictor> {
    let kind = config.kind_id()?;

    match kind {
        PredictorKind::Rules => Ok(rules_from_config(config)),
        PredictorKind::Model => {
            let Some(path) = config.model_path.as_ref() else {
                tracing::warn!("Predictor 'model' selected but no model_path configured, using rules");
                return Ok(rules_from_config(config));
            };

            match TrainedModelPredictor::load(path) {
                Ok(model) => {
                    tracing::info!(path = %path.display(), version = %model.version(), "Loaded model artifact");
                    Ok(SelectedPredictor { kind, predictor: Arc::new(model) })
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), "Model artifact unusable, using rules: {err:#}");
                    Ok(rules_from_config(config))
                }
            }
        }
    }
}
