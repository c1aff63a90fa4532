use crate::domain::health::ClientHealth;
use crate::domain::metrics::MetricsSnapshot;
use crate::domain::permissions::{MetricKey, MetricVisibility};
use crate::report::format::{format_count, format_money, format_percent, format_ratio, Trend};
use crate::time::periods::PeriodPair;

/// Render the plain-text performance summary sent to a client over
/// WhatsApp. Uses WhatsApp markup (`*bold*`, `_italic_`); KPI lines are
/// filtered by the client's metric visibility. Delivery is someone else's
/// job; this only builds the text.
pub fn render_summary(
    client_name: &str,
    periods: &PeriodPair,
    current: &MetricsSnapshot,
    health: &ClientHealth,
    visibility: &MetricVisibility,
) -> String {
    let mut lines = Vec::new();

    lines.push(format!("*Performance Report: {client_name}*"));
    lines.push(format!(
        "_{} to {}_",
        periods.current.start, periods.current.end
    ));
    lines.push(String::new());

    if visibility.is_visible(MetricKey::Spend) {
        lines.push(format!("*Spend:* {}", format_money(current.spend)));
    }
    if visibility.is_visible(MetricKey::Revenue) {
        lines.push(format!(
            "*Revenue:* {}",
            format_money(current.revenue_or_zero())
        ));
    }
    if visibility.is_visible(MetricKey::Roas) {
        lines.push(format!("*ROAS:* {}", format_ratio(current.roas_or_zero())));
    }
    if visibility.is_visible(MetricKey::Cpa) {
        lines.push(format!("*CPA:* {}", format_money(current.cpa_or_zero())));
    }
    if visibility.is_visible(MetricKey::Conversions) {
        lines.push(format!(
            "*Conversions:* {}",
            format_count(current.conversions)
        ));
    }

    lines.push(String::new());
    let trend = Trend::from_variation(health.variation);
    lines.push(format!(
        "Status: *{}* ({} {})",
        health.status.as_str().to_uppercase(),
        trend.arrow(),
        format_percent(health.variation)
    ));
    lines.push(health.recommendation.clone());

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::health::{calculate_client_health, StrategyType};
    use crate::time::periods::{comparison_periods, DateRange, RangePreset};
    use chrono::NaiveDate;

    fn fixture() -> (PeriodPair, MetricsSnapshot, ClientHealth) {
        let today = NaiveDate::from_ymd_opt(2026, 2, 16).unwrap();
        let periods = comparison_periods(DateRange::Preset(RangePreset::Last7Days), today);
        let current = MetricsSnapshot {
            spend: 1000.0,
            revenue: Some(3500.0),
            roas: Some(3.5),
            cpa: Some(10.0),
            conversions: 100.0,
        };
        let previous = MetricsSnapshot {
            spend: 1000.0,
            revenue: Some(5000.0),
            roas: Some(5.0),
            cpa: Some(10.0),
            conversions: 100.0,
        };
        let health = calculate_client_health(StrategyType::Revenue, &current, &previous);
        (periods, current, health)
    }

    #[test]
    fn summary_contains_header_kpis_and_status() {
        let (periods, current, health) = fixture();
        let text = render_summary(
            "Acme Shoes",
            &periods,
            &current,
            &health,
            &MetricVisibility::default(),
        );

        assert!(text.starts_with("*Performance Report: Acme Shoes*"));
        assert!(text.contains("_2026-02-09 to 2026-02-16_"));
        assert!(text.contains("*Spend:* $1,000.00"));
        assert!(text.contains("*Revenue:* $3,500.00"));
        assert!(text.contains("*ROAS:* 3.50"));
        assert!(text.contains("*Conversions:* 100"));
        assert!(text.contains("Status: *CRITICAL* (↓ -30.0%)"));
        assert!(text.contains(health.recommendation.as_str()));
    }

    #[test]
    fn hidden_metrics_are_omitted() {
        let (periods, current, health) = fixture();
        let vis = MetricVisibility::from_keys(["spend", "conversions"]).unwrap();
        let text = render_summary("Acme Shoes", &periods, &current, &health, &vis);

        assert!(text.contains("*Spend:*"));
        assert!(text.contains("*Conversions:*"));
        assert!(!text.contains("*Revenue:*"));
        assert!(!text.contains("*ROAS:*"));
        assert!(!text.contains("*CPA:*"));
    }
}
