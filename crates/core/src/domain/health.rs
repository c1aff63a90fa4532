use crate::domain::metrics::MetricsSnapshot;
use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which metric drives a client's health formula. Closed enumeration;
/// unknown strings are rejected at the parse boundary so every match in
/// here stays total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    /// E-commerce style accounts, judged on ROAS.
    Revenue,
    /// Lead-gen accounts, judged on CPA and conversion volume.
    Demand,
    /// Conversation-driven accounts (click-to-message campaigns).
    Message,
}

impl StrategyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyType::Revenue => "revenue",
            StrategyType::Demand => "demand",
            StrategyType::Message => "message",
        }
    }
}

impl FromStr for StrategyType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "revenue" => Ok(StrategyType::Revenue),
            "demand" => Ok(StrategyType::Demand),
            "message" => Ok(StrategyType::Message),
            other => bail!("unsupported strategy type: {other}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Critical,
    Attention,
    Stable,
    Growing,
}

impl HealthStatus {
    /// Fixed priority rank: 1 = most urgent.
    pub fn priority(&self) -> i32 {
        match self {
            HealthStatus::Critical => 1,
            HealthStatus::Attention => 2,
            HealthStatus::Stable => 3,
            HealthStatus::Growing => 4,
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            HealthStatus::Critical => {
                "Performance dropped sharply. Review campaigns, creatives and budgets today."
            }
            HealthStatus::Attention => {
                "Results are slipping. Schedule an optimization pass this week."
            }
            HealthStatus::Stable => "Performance is steady. Keep the current setup and monitor.",
            HealthStatus::Growing => {
                "Results are trending up. Consider scaling budget on the winners."
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Critical => "critical",
            HealthStatus::Attention => "attention",
            HealthStatus::Stable => "stable",
            HealthStatus::Growing => "growing",
        }
    }
}

impl FromStr for HealthStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical" => Ok(HealthStatus::Critical),
            "attention" => Ok(HealthStatus::Attention),
            "stable" => Ok(HealthStatus::Stable),
            "growing" => Ok(HealthStatus::Growing),
            other => bail!("unknown health status: {other}"),
        }
    }
}

/// Classification result for one client over one comparison window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientHealth {
    pub status: HealthStatus,
    /// 0..=100, rounded to 2 decimal places.
    pub score: f64,
    /// Headline period-over-period variation in percent, 2 decimal places.
    /// For Demand/Message this is the conversion variation even though the
    /// critical/attention thresholds run on the CPA variation; the dashboard
    /// has always shown it that way.
    pub variation: f64,
    pub recommendation: String,
    pub priority: i32,
}

/// Period-over-period change in percent. A metric appearing from zero
/// counts as +100%; staying at zero is 0%.
pub fn calculate_variation(curr: f64, prev: f64) -> f64 {
    if prev == 0.0 {
        if curr == 0.0 {
            0.0
        } else {
            100.0
        }
    } else {
        ((curr - prev) / prev) * 100.0
    }
}

/// Classify a client's campaign performance trend.
///
/// Pure function of its three inputs: no clock, no I/O. Missing optional
/// snapshot fields are treated as 0 before any variation is computed.
pub fn calculate_client_health(
    strategy: StrategyType,
    current: &MetricsSnapshot,
    previous: &MetricsSnapshot,
) -> ClientHealth {
    let roas_variation = calculate_variation(current.roas_or_zero(), previous.roas_or_zero());
    let cpa_variation = calculate_variation(current.cpa_or_zero(), previous.cpa_or_zero());
    let conversion_variation = calculate_variation(current.conversions, previous.conversions);

    let (status, score, variation) = match strategy {
        StrategyType::Revenue => {
            let status = if roas_variation < -20.0 {
                HealthStatus::Critical
            } else if roas_variation < -10.0 {
                HealthStatus::Attention
            } else if roas_variation > 10.0 {
                HealthStatus::Growing
            } else {
                HealthStatus::Stable
            };

            let mut score = 50.0 + roas_variation * 0.8;
            if status == HealthStatus::Critical {
                score -= 10.0;
            }
            (status, score, roas_variation)
        }
        StrategyType::Demand => {
            let status = if cpa_variation > 25.0 {
                HealthStatus::Critical
            } else if cpa_variation > 15.0 {
                HealthStatus::Attention
            } else if conversion_variation > 15.0 {
                HealthStatus::Growing
            } else {
                HealthStatus::Stable
            };

            let score = 50.0 - cpa_variation * 0.5 + conversion_variation * 0.3;
            (status, score, conversion_variation)
        }
        StrategyType::Message => {
            let status = if cpa_variation > 30.0 {
                HealthStatus::Critical
            } else if conversion_variation < -25.0 {
                HealthStatus::Attention
            } else if conversion_variation > 15.0 {
                HealthStatus::Growing
            } else {
                HealthStatus::Stable
            };

            let mut score = 50.0 - cpa_variation * 0.5 + conversion_variation * 0.3;
            match status {
                HealthStatus::Critical => score -= 8.0,
                HealthStatus::Attention => score -= 5.0,
                _ => {}
            }
            (status, score, conversion_variation)
        }
    };

    ClientHealth {
        status,
        score: round2(score.clamp(0.0, 100.0)),
        variation: round2(variation),
        recommendation: status.recommendation().to_string(),
        priority: status.priority(),
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(spend: f64, revenue: f64, roas: f64, cpa: f64, conversions: f64) -> MetricsSnapshot {
        MetricsSnapshot {
            spend,
            revenue: Some(revenue),
            roas: Some(roas),
            cpa: Some(cpa),
            conversions,
        }
    }

    #[test]
    fn variation_handles_zero_previous() {
        assert_eq!(calculate_variation(0.0, 0.0), 0.0);
        assert_eq!(calculate_variation(12.0, 0.0), 100.0);
    }

    #[test]
    fn variation_is_percent_change() {
        assert!((calculate_variation(120.0, 100.0) - 20.0).abs() < 1e-9);
        assert!((calculate_variation(80.0, 100.0) + 20.0).abs() < 1e-9);
    }

    #[test]
    fn revenue_roas_drop_is_critical() {
        let current = snapshot(1000.0, 3500.0, 3.5, 10.0, 100.0);
        let previous = snapshot(1000.0, 5000.0, 5.0, 10.0, 100.0);

        let health = calculate_client_health(StrategyType::Revenue, &current, &previous);
        assert_eq!(health.status, HealthStatus::Critical);
        assert_eq!(health.variation, -30.0);
        assert_eq!(health.priority, 1);
        // 50 + (-30 * 0.8) - 10
        assert_eq!(health.score, 16.0);
    }

    #[test]
    fn demand_cpa_spike_is_critical_but_reports_conversion_variation() {
        let current = snapshot(1000.0, 0.0, 0.0, 28.0, 100.0);
        let previous = snapshot(1000.0, 0.0, 0.0, 20.0, 100.0);

        let health = calculate_client_health(StrategyType::Demand, &current, &previous);
        assert_eq!(health.status, HealthStatus::Critical);
        assert_eq!(health.priority, 1);
        // Classified on cpa_variation = +40, but the headline stays the
        // conversion variation, which is flat here.
        assert_eq!(health.variation, 0.0);
        assert_eq!(health.score, 30.0);
    }

    #[test]
    fn message_conversion_growth_is_growing() {
        let current = snapshot(800.0, 0.0, 0.0, 10.0, 120.0);
        let previous = snapshot(800.0, 0.0, 0.0, 10.0, 100.0);

        let health = calculate_client_health(StrategyType::Message, &current, &previous);
        assert_eq!(health.status, HealthStatus::Growing);
        assert_eq!(health.variation, 20.0);
        assert_eq!(health.priority, 4);
        assert_eq!(health.score, 56.0);
    }

    #[test]
    fn message_penalties_apply_after_classification() {
        // cpa doubles: cpa_variation = 100 > 30 -> Critical, -8 penalty.
        let current = snapshot(1000.0, 0.0, 0.0, 20.0, 100.0);
        let previous = snapshot(1000.0, 0.0, 0.0, 10.0, 100.0);

        let health = calculate_client_health(StrategyType::Message, &current, &previous);
        assert_eq!(health.status, HealthStatus::Critical);
        // 50 - 100*0.5 + 0 - 8 = -8 -> clamped to 0.
        assert_eq!(health.score, 0.0);
    }

    #[test]
    fn score_is_clamped_to_0_100() {
        // Huge ROAS jump pushes the raw score far above 100.
        let current = snapshot(1000.0, 90000.0, 90.0, 10.0, 100.0);
        let previous = snapshot(1000.0, 1000.0, 1.0, 10.0, 100.0);
        let up = calculate_client_health(StrategyType::Revenue, &current, &previous);
        assert_eq!(up.score, 100.0);

        let down = calculate_client_health(StrategyType::Revenue, &previous, &current);
        assert!(down.score >= 0.0);
    }

    #[test]
    fn missing_optional_fields_default_to_zero() {
        let current = MetricsSnapshot {
            spend: 500.0,
            revenue: None,
            roas: None,
            cpa: None,
            conversions: 10.0,
        };
        let previous = snapshot(500.0, 2000.0, 4.0, 50.0, 10.0);

        // roas 4 -> 0 is a -100% variation: critical territory.
        let health = calculate_client_health(StrategyType::Revenue, &current, &previous);
        assert_eq!(health.status, HealthStatus::Critical);
        assert_eq!(health.variation, -100.0);
    }

    #[test]
    fn status_maps_are_total_bijections() {
        let statuses = [
            HealthStatus::Critical,
            HealthStatus::Attention,
            HealthStatus::Stable,
            HealthStatus::Growing,
        ];

        let mut priorities: Vec<i32> = statuses.iter().map(|s| s.priority()).collect();
        priorities.sort_unstable();
        assert_eq!(priorities, vec![1, 2, 3, 4]);

        let recommendations: std::collections::BTreeSet<&str> =
            statuses.iter().map(|s| s.recommendation()).collect();
        assert_eq!(recommendations.len(), statuses.len());
    }

    #[test]
    fn strategy_parse_boundary_rejects_unknown() {
        assert!("revenue".parse::<StrategyType>().is_ok());
        assert!("branding".parse::<StrategyType>().is_err());
    }

    #[test]
    fn identical_inputs_yield_identical_output() {
        let current = snapshot(1000.0, 3500.0, 3.5, 10.0, 100.0);
        let previous = snapshot(1000.0, 5000.0, 5.0, 10.0, 100.0);

        let a = calculate_client_health(StrategyType::Revenue, &current, &previous);
        let b = calculate_client_health(StrategyType::Revenue, &current, &previous);
        assert_eq!(a, b);
    }
}
