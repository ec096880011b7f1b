//! Hybrid risk assessment: ground reports and weather prediction, combined.

use chrono::{DateTime, Utc};
use std::{sync::Arc, time::Duration as StdDuration};
use tokio::time::timeout;

use crate::{
    combiner::combine,
    config::EngineConfig,
    error::AssessError,
    features::WeatherFeatureVector,
    model::{AssessmentDetails, Degradation, GeoPoint, Report, RiskAssessment, RiskLevel, WeatherObservation},
    predictor::{RiskPredictor, SelectedPredictor},
    store::{ReportStore, WeatherStore},
    threshold::ThresholdEvaluator,
};

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub radius_km: f64,
    pub report_window: chrono::Duration,
    pub weather_freshness: chrono::Duration,
    /// Maximum wait for each store read; a slower read counts as absent.
    pub fetch_timeout: StdDuration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineConfig::default().settings()
    }
}

/// Cheap to clone; all collaborators are shared and immutable.
#[derive(Debug, Clone)]
pub struct RiskEngine {
    reports: Arc<dyn ReportStore>,
    weather: Arc<dyn WeatherStore>,
    predictor: Arc<dyn RiskPredictor>,
    predictor_label: String,
    threshold: ThresholdEvaluator,
    settings: EngineSettings,
}

impl RiskEngine {
    pub fn new(
        reports: Arc<dyn ReportStore>,
        weather: Arc<dyn WeatherStore>,
        predictor: Arc<dyn RiskPredictor>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            reports,
            weather,
            predictor,
            predictor_label: "custom".to_string(),
            threshold: ThresholdEvaluator::new(settings.report_window),
            settings,
        }
    }

    pub fn from_selected(
        reports: Arc<dyn ReportStore>,
        weather: Arc<dyn WeatherStore>,
        selected: SelectedPredictor,
        settings: EngineSettings,
    ) -> Self {
        Self::new(reports, weather, selected.predictor, settings)
            .with_predictor_label(selected.kind.as_str())
    }

    /// Name recorded in assessment details as the source of `predicted_level`.
    pub fn with_predictor_label(mut self, label: impl Into<String>) -> Self {
        self.predictor_label = label.into();
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub async fn assess(&self, point: GeoPoint) -> Result<RiskAssessment, AssessError> {
        self.assess_at(point, Utc::now()).await
    }

    /// Assess `point` as of `now`.
    ///
    /// Store windows and report eligibility are both anchored at `now`, so a
    /// past instant replays the assessment as it would have been made then.
    ///
    /// Only an invalid location is an error. Missing, failed or slow inputs
    /// lower the quality of the answer and are listed in
    /// `details.degradations`.
    #[tracing::instrument(name = "assess", level = "debug", skip(self))]
    pub async fn assess_at(
        &self,
        point: GeoPoint,
        now: DateTime<Utc>,
    ) -> Result<RiskAssessment, AssessError> {
        if !point.is_valid() {
            tracing::warn!("Rejecting assessment for invalid location {:?}", point);
            return Err(AssessError::InvalidLocation {
                latitude: point.latitude,
                longitude: point.longitude,
            });
        }

        let (reports, weather) =
            tokio::join!(self.fetch_reports(point, now), self.fetch_weather(point, now));

        let mut degradations = Vec::new();

        let reports = reports.unwrap_or_else(|| {
            degradations.push(Degradation::ReportsUnavailable);
            Vec::new()
        });

        let threshold_level = self.threshold.evaluate(&reports, now);
        let predicted_level = match &weather {
            Some(obs) => self.predict(obs, &mut degradations),
            None => {
                degradations.push(Degradation::NoWeatherData);
                RiskLevel::None
            }
        };
        let final_level = combine(threshold_level, predicted_level);

        tracing::debug!(
            %threshold_level,
            %predicted_level,
            %final_level,
            degraded = !degradations.is_empty(),
            "Assessment complete"
        );

        Ok(RiskAssessment {
            location: point,
            threshold_level,
            predicted_level,
            final_level,
            evaluated_at: now,
            details: AssessmentDetails {
                reports_considered: self.threshold.count_eligible(&reports, now),
                weather_observed_at: weather.as_ref().map(|w| w.observed_at),
                predictor: self.predictor_label.clone(),
                degradations,
            },
        })
    }

    fn predict(&self, obs: &WeatherObservation, degradations: &mut Vec<Degradation>) -> RiskLevel {
        let prediction = WeatherFeatureVector::from_observation(obs)
            .and_then(|features| self.predictor.predict(&features));

        match prediction {
            Ok(level) => level,
            Err(err) => {
                tracing::warn!("Prediction skipped: {err}");
                degradations.push(Degradation::InvalidFeatureVector);
                RiskLevel::None
            }
        }
    }

    async fn fetch_reports(&self, point: GeoPoint, now: DateTime<Utc>) -> Option<Vec<Report>> {
        let read = self.reports.find_recent(
            point,
            self.settings.radius_km,
            self.settings.report_window,
            now,
        );

        match timeout(self.settings.fetch_timeout, read).await {
            Ok(Ok(reports)) => Some(reports),
            Ok(Err(err)) => {
                tracing::warn!("Report store failed, continuing without reports: {err}");
                None
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.settings.fetch_timeout.as_millis() as u64,
                    "Report store timed out, continuing without reports"
                );
                None
            }
        }
    }

    async fn fetch_weather(&self, point: GeoPoint, now: DateTime<Utc>) -> Option<WeatherObservation> {
        let read = self.weather.latest_for(point, self.settings.weather_freshness, now);

        match timeout(self.settings.fetch_timeout, read).await {
            Ok(Ok(Some(obs))) => Some(obs),
            Ok(Ok(None)) => {
                tracing::warn!("No fresh weather data near {}", point);
                None
            }
            Ok(Err(err)) => {
                tracing::warn!("Weather store failed, continuing without weather: {err}");
                None
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.settings.fetch_timeout.as_millis() as u64,
                    "Weather store timed out, continuing without weather"
                );
                None
            }
        }
    }
}
