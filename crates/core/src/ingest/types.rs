use crate::domain::metrics::{AdsPlatform, MetricsSnapshot};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One platform's aggregated metrics for one requested window, as returned
/// by the aggregation gateway. The gateway echoes the window so the caller
/// can verify it got the period it asked for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayMetricsResponse {
    pub platform: AdsPlatform,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub metrics: MetricsSnapshot,
}
