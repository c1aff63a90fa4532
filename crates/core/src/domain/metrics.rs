use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Advertising platform the aggregation gateway can report on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdsPlatform {
    GoogleAds,
    MetaAds,
    Ga4,
}

impl AdsPlatform {
    pub const ALL: [AdsPlatform; 3] = [AdsPlatform::GoogleAds, AdsPlatform::MetaAds, AdsPlatform::Ga4];

    pub fn as_str(&self) -> &'static str {
        match self {
            AdsPlatform::GoogleAds => "google_ads",
            AdsPlatform::MetaAds => "meta_ads",
            AdsPlatform::Ga4 => "ga4",
        }
    }
}

impl FromStr for AdsPlatform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google_ads" => Ok(AdsPlatform::GoogleAds),
            "meta_ads" => Ok(AdsPlatform::MetaAds),
            "ga4" => Ok(AdsPlatform::Ga4),
            other => bail!("unknown ads platform: {other}"),
        }
    }
}

/// Aggregate ad performance for one inclusive calendar period.
///
/// `revenue`, `roas` and `cpa` are optional upstream; the health classifier
/// treats a missing value as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub spend: f64,
    #[serde(default)]
    pub revenue: Option<f64>,
    #[serde(default)]
    pub roas: Option<f64>,
    #[serde(default)]
    pub cpa: Option<f64>,
    pub conversions: f64,
}

impl MetricsSnapshot {
    pub fn revenue_or_zero(&self) -> f64 {
        self.revenue.unwrap_or(0.0)
    }

    pub fn roas_or_zero(&self) -> f64 {
        self.roas.unwrap_or(0.0)
    }

    pub fn cpa_or_zero(&self) -> f64 {
        self.cpa.unwrap_or(0.0)
    }

    /// Sum per-platform snapshots into a single cross-platform snapshot.
    /// ROAS and CPA are recomputed from the summed totals rather than
    /// averaged, so platforms with zero spend don't skew the ratios.
    pub fn aggregate<'a, I>(parts: I) -> MetricsSnapshot
    where
        I: IntoIterator<Item = &'a MetricsSnapshot>,
    {
        let mut spend = 0.0;
        let mut revenue = 0.0;
        let mut conversions = 0.0;

        for part in parts {
            spend += part.spend;
            revenue += part.revenue_or_zero();
            conversions += part.conversions;
        }

        MetricsSnapshot {
            spend,
            revenue: Some(revenue),
            roas: Some(derive_roas(revenue, spend)),
            cpa: Some(derive_cpa(spend, conversions)),
            conversions,
        }
    }
}

/// Return on ad spend. 0 when there was no spend.
pub fn derive_roas(revenue: f64, spend: f64) -> f64 {
    if spend == 0.0 {
        0.0
    } else {
        revenue / spend
    }
}

/// Cost per conversion. 0 when there were no conversions.
pub fn derive_cpa(spend: f64, conversions: f64) -> f64 {
    if conversions == 0.0 {
        0.0
    } else {
        spend / conversions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_sums_and_rederives_ratios() {
        let google = MetricsSnapshot {
            spend: 600.0,
            revenue: Some(1800.0),
            roas: Some(3.0),
            cpa: Some(12.0),
            conversions: 50.0,
        };
        let meta = MetricsSnapshot {
            spend: 400.0,
            revenue: Some(1200.0),
            roas: Some(3.0),
            cpa: Some(8.0),
            conversions: 50.0,
        };

        let total = MetricsSnapshot::aggregate([&google, &meta]);
        assert_eq!(total.spend, 1000.0);
        assert_eq!(total.revenue, Some(3000.0));
        assert_eq!(total.conversions, 100.0);
        assert_eq!(total.roas, Some(3.0));
        assert_eq!(total.cpa, Some(10.0));
    }

    #[test]
    fn aggregate_guards_zero_denominators() {
        let empty = MetricsSnapshot::default();
        let total = MetricsSnapshot::aggregate([&empty]);
        assert_eq!(total.roas, Some(0.0));
        assert_eq!(total.cpa, Some(0.0));
    }

    #[test]
    fn missing_optional_fields_deserialize_as_none() {
        let v = serde_json::json!({"spend": 100.0, "conversions": 4.0});
        let snap: MetricsSnapshot = serde_json::from_value(v).unwrap();
        assert_eq!(snap.revenue, None);
        assert_eq!(snap.roas, None);
        assert_eq!(snap.cpa, None);
        assert_eq!(snap.cpa_or_zero(), 0.0);
    }

    #[test]
    fn platform_round_trips_through_str() {
        for p in AdsPlatform::ALL {
            assert_eq!(p.as_str().parse::<AdsPlatform>().unwrap(), p);
        }
        assert!("tiktok_ads".parse::<AdsPlatform>().is_err());
    }
}
