pub mod format;
pub mod whatsapp;

use crate::domain::health::{calculate_client_health, ClientHealth, StrategyType};
use crate::domain::metrics::MetricsSnapshot;
use crate::domain::permissions::MetricVisibility;
use crate::time::periods::PeriodPair;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One client's report for one comparison window: the classified health
/// plus the rendered WhatsApp summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientReport {
    pub client_id: Uuid,
    pub client_name: String,
    pub strategy: StrategyType,
    pub report_date: NaiveDate,
    pub periods: PeriodPair,
    pub current: MetricsSnapshot,
    pub previous: MetricsSnapshot,
    pub health: ClientHealth,
    pub summary: String,
    pub generated_at: DateTime<Utc>,
}

/// Assemble a report from already-aggregated snapshots. Pure except for
/// the `generated_at` stamp supplied by the caller.
#[allow(clippy::too_many_arguments)]
pub fn build_report(
    client_id: Uuid,
    client_name: &str,
    strategy: StrategyType,
    report_date: NaiveDate,
    periods: PeriodPair,
    current: MetricsSnapshot,
    previous: MetricsSnapshot,
    visibility: &MetricVisibility,
    generated_at: DateTime<Utc>,
) -> ClientReport {
    let health = calculate_client_health(strategy, &current, &previous);
    let summary = whatsapp::render_summary(client_name, &periods, &current, &health, visibility);

    ClientReport {
        client_id,
        client_name: client_name.to_string(),
        strategy,
        report_date,
        periods,
        current,
        previous,
        health,
        summary,
        generated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::health::HealthStatus;
    use crate::time::periods::{comparison_periods, DateRange, RangePreset};
    use chrono::TimeZone;

    #[test]
    fn build_report_classifies_and_renders() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 16).unwrap();
        let periods = comparison_periods(DateRange::Preset(RangePreset::Last7Days), today);
        let current = MetricsSnapshot {
            spend: 800.0,
            revenue: None,
            roas: None,
            cpa: Some(10.0),
            conversions: 120.0,
        };
        let previous = MetricsSnapshot {
            spend: 800.0,
            revenue: None,
            roas: None,
            cpa: Some(10.0),
            conversions: 100.0,
        };

        let report = build_report(
            Uuid::nil(),
            "Corner Cafe",
            StrategyType::Message,
            today,
            periods,
            current,
            previous,
            &MetricVisibility::default(),
            Utc.with_ymd_and_hms(2026, 2, 16, 7, 0, 0).unwrap(),
        );

        assert_eq!(report.health.status, HealthStatus::Growing);
        assert_eq!(report.health.variation, 20.0);
        assert!(report.summary.contains("Corner Cafe"));
        assert_eq!(report.periods.current.end, today);
    }
}
