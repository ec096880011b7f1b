//! Core library for RainSafe flood risk assessment.
//!
//! This crate defines:
//! - The hybrid risk engine (report thresholds + weather prediction)
//! - Store abstractions for reports and weather, with in-memory and OpenWeather readers
//! - Swappable predictors (rule-based and trained-model)
//! - Configuration handling
//!
//! It is used by `rainsafe-cli`, but can also be embedded in services.

pub mod combiner;
pub mod config;
pub mod description;
pub mod engine;
pub mod error;
pub mod features;
pub mod model;
pub mod predictor;
pub mod store;
pub mod threshold;

pub use combiner::combine;
pub use config::Config;
pub use description::{DescriptionAnalysis, analyze_description};
pub use engine::{EngineSettings, RiskEngine};
pub use error::{AssessError, PredictError, StoreError};
pub use features::{FEATURE_CONTRACT_VERSION, FEATURE_ORDER, WeatherFeatureVector};
pub use model::{
    AssessmentDetails, Degradation, GeoPoint, Report, ReportSeverity, RiskAssessment, RiskLevel,
    Severity, WeatherObservation,
};
pub use predictor::{PredictorKind, RiskPredictor, SelectedPredictor, predictor_from_config};
pub use store::{ReportStore, WeatherStore};
pub use threshold::{SEVERITY_MAPPING_VERSION, ThresholdEvaluator};
