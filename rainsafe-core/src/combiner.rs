use crate::model::RiskLevel;

/// Final verdict from the report-based and weather-based levels.
///
/// Either signal can raise the result; neither can lower the other.
pub fn combine(threshold_level: RiskLevel, predicted_level: RiskLevel) -> RiskLevel {
    threshold_level.max(predicted_level)
}
