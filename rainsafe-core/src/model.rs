use chrono::{DateTime, Utc};
use haversine::{Location as HaversineLocation, Units, distance};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A query or report location in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Finite and inside [-90, 90] x [-180, 180].
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance in kilometres.
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let from = HaversineLocation { latitude: self.latitude, longitude: self.longitude };
        let to = HaversineLocation { latitude: other.latitude, longitude: other.longitude };
        distance(from, to, Units::Kilometers)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Severity a submitter attached to a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Moderate,
    High,
    Severe,
}

/// Either an explicit severity or the free-text water level the submitter typed.
///
/// Text is resolved through [`crate::threshold::severity_from_descriptor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportSeverity {
    Level(Severity),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub location: GeoPoint,
    pub description: String,
    pub severity: ReportSeverity,
    pub submitted_at: DateTime<Utc>,
}

/// Latest conditions at a tracked weather location.
///
/// Measurements are optional because upstream feeds omit fields; the feature
/// builder decides whether a gap is acceptable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub location: GeoPoint,
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    /// Accumulated precipitation over the last hour, in mm.
    pub precipitation_mm: Option<f64>,
    pub pressure_hpa: Option<f64>,
    pub wind_speed_mps: Option<f64>,
    pub observed_at: DateTime<Utc>,
}

/// Flood risk, ordered from `None` to `Severe`.
///
/// Variant order is the severity order; the combiner relies on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    None,
    Low,
    Moderate,
    High,
    Severe,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::None => "None",
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
            RiskLevel::Severe => "Severe",
        }
    }

    pub const fn all() -> &'static [RiskLevel] {
        &[
            RiskLevel::None,
            RiskLevel::Low,
            RiskLevel::Moderate,
            RiskLevel::High,
            RiskLevel::Severe,
        ]
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Severity> for RiskLevel {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Low => RiskLevel::Low,
            Severity::Moderate => RiskLevel::Moderate,
            Severity::High => RiskLevel::High,
            Severity::Severe => RiskLevel::Severe,
        }
    }
}

/// Something the engine had to work around while producing an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Degradation {
    /// Weather read was absent, stale, failed or timed out.
    NoWeatherData,
    /// Report read failed or timed out; treated as no reports.
    ReportsUnavailable,
    /// Weather was present but could not be turned into a valid feature vector.
    InvalidFeatureVector,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentDetails {
    pub reports_considered: usize,
    pub weather_observed_at: Option<DateTime<Utc>>,
    /// Name of the predictor that produced `predicted_level`.
    pub predictor: String,
    pub degradations: Vec<Degradation>,
}

/// Result of one `assess` call. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub location: GeoPoint,
    pub threshold_level: RiskLevel,
    pub predicted_level: RiskLevel,
    pub final_level: RiskLevel,
    pub evaluated_at: DateTime<Utc>,
    pub details: AssessmentDetails,
}

impl RiskAssessment {
    pub fn is_degraded(&self) -> bool {
        !self.details.degradations.is_empty()
    }
}
