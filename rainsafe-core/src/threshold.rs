//! Rule-based risk from recent ground reports.

use chrono::{DateTime, Duration, Utc};

use crate::model::{Report, ReportSeverity, RiskLevel, Severity};

/// Bumped whenever the descriptor table below changes meaning.
pub const SEVERITY_MAPPING_VERSION: u32 = 2;

/// Reports dated this far past the evaluation instant are still accepted.
pub(crate) fn max_clock_skew() -> Duration {
    Duration::minutes(5)
}

/// Water-level descriptors as submitted from the report form, normalised.
const DESCRIPTOR_TABLE: &[(&str, Severity)] = &[
    ("ankle deep", Severity::Low),
    ("knee deep", Severity::Moderate),
    ("thigh deep", Severity::High),
    ("waist deep", Severity::Severe),
    ("waist deep or higher", Severity::Severe),
    ("chest deep", Severity::Severe),
    ("above head", Severity::Severe),
    // Level names typed as free text, in any case.
    ("low", Severity::Low),
    ("moderate", Severity::Moderate),
    ("high", Severity::High),
    ("severe", Severity::Severe),
];

fn normalize_descriptor(text: &str) -> String {
    text.to_lowercase()
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Map a free-text water level to a severity. Unknown text is `Low`.
pub fn severity_from_descriptor(text: &str) -> Severity {
    let normalized = normalize_descriptor(text);
    DESCRIPTOR_TABLE
        .iter()
        .find(|(descriptor, _)| *descriptor == normalized)
        .map(|(_, severity)| *severity)
        .unwrap_or(Severity::Low)
}

pub fn level_for(report: &Report) -> RiskLevel {
    match &report.severity {
        ReportSeverity::Level(severity) => (*severity).into(),
        ReportSeverity::Text(text) => severity_from_descriptor(text).into(),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ThresholdEvaluator {
    window: Duration,
}

impl ThresholdEvaluator {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    fn is_eligible(&self, report: &Report, now: DateTime<Utc>) -> bool {
        let oldest = now.checked_sub_signed(self.window).unwrap_or(DateTime::<Utc>::MIN_UTC);
        let newest = now.checked_add_signed(max_clock_skew()).unwrap_or(DateTime::<Utc>::MAX_UTC);
        report.submitted_at >= oldest && report.submitted_at <= newest
    }

    /// Highest level among reports inside the recency window at `now`.
    ///
    /// Stale or implausibly future-dated reports are skipped, so an empty or
    /// fully ineligible input yields `RiskLevel::None`.
    pub fn evaluate(&self, reports: &[Report], now: DateTime<Utc>) -> RiskLevel {
        reports
            .iter()
            .filter(|r| self.is_eligible(r, now))
            .map(level_for)
            .max()
            .unwrap_or(RiskLevel::None)
    }

    pub fn count_eligible(&self, reports: &[Report], now: DateTime<Utc>) -> usize {
        reports.iter().filter(|r| self.is_eligible(r, now)).count()
    }
}
