use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::fmt::Debug;

use crate::{
    error::StoreError,
    model::{GeoPoint, Report, WeatherObservation},
};

pub mod memory;
pub mod openweather;

/// Start of a lookback window ending at `now`, clamped to the earliest
/// representable instant.
pub(crate) fn window_start(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    now.checked_sub_signed(window).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Source of user-submitted flood reports.
#[async_trait]
pub trait ReportStore: Send + Sync + Debug {
    /// Reports within `radius_km` of `point` submitted in the `window` before
    /// `now`, most recent first.
    async fn find_recent(
        &self,
        point: GeoPoint,
        radius_km: f64,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<Report>, StoreError>;
}

/// Source of weather observations.
#[async_trait]
pub trait WeatherStore: Send + Sync + Debug {
    /// Latest observation for the tracked location nearest to `point`, or
    /// `None` if nothing was observed within `freshness` before `now`.
    async fn latest_for(
        &self,
        point: GeoPoint,
        freshness: Duration,
        now: DateTime<Utc>,
    ) -> Result<Option<WeatherObservation>, StoreError>;
}
