use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Dashboard metric a manager can show or hide per client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    Spend,
    Revenue,
    Roas,
    Cpa,
    Conversions,
}

impl MetricKey {
    pub const ALL: [MetricKey; 5] = [
        MetricKey::Spend,
        MetricKey::Revenue,
        MetricKey::Roas,
        MetricKey::Cpa,
        MetricKey::Conversions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::Spend => "spend",
            MetricKey::Revenue => "revenue",
            MetricKey::Roas => "roas",
            MetricKey::Cpa => "cpa",
            MetricKey::Conversions => "conversions",
        }
    }
}

impl FromStr for MetricKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spend" => Ok(MetricKey::Spend),
            "revenue" => Ok(MetricKey::Revenue),
            "roas" => Ok(MetricKey::Roas),
            "cpa" => Ok(MetricKey::Cpa),
            "conversions" => Ok(MetricKey::Conversions),
            other => bail!("unknown metric key: {other}"),
        }
    }
}

/// Per-client set of visible metrics. A client without a stored row sees
/// everything; an explicitly empty set hides every KPI line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricVisibility(BTreeSet<MetricKey>);

impl Default for MetricVisibility {
    fn default() -> Self {
        Self(MetricKey::ALL.into_iter().collect())
    }
}

impl MetricVisibility {
    pub fn from_keys<I, S>(keys: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = BTreeSet::new();
        for key in keys {
            out.insert(key.as_ref().parse::<MetricKey>()?);
        }
        Ok(Self(out))
    }

    pub fn is_visible(&self, key: MetricKey) -> bool {
        self.0.contains(&key)
    }

    pub fn keys(&self) -> impl Iterator<Item = MetricKey> + '_ {
        self.0.iter().copied()
    }

    pub fn as_strings(&self) -> Vec<String> {
        self.0.iter().map(|k| k.as_str().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_shows_all_metrics() {
        let vis = MetricVisibility::default();
        for key in MetricKey::ALL {
            assert!(vis.is_visible(key));
        }
    }

    #[test]
    fn from_keys_rejects_unknown_names() {
        assert!(MetricVisibility::from_keys(["spend", "ctr"]).is_err());
    }

    #[test]
    fn empty_set_hides_everything() {
        let vis = MetricVisibility::from_keys(Vec::<String>::new()).unwrap();
        for key in MetricKey::ALL {
            assert!(!vis.is_visible(key));
        }
    }

    #[test]
    fn duplicate_keys_collapse() {
        let vis = MetricVisibility::from_keys(["roas", "roas", "spend"]).unwrap();
        assert_eq!(vis.as_strings(), vec!["spend", "roas"]);
    }
}
