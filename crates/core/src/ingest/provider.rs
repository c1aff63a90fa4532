use crate::config::Settings;
use crate::domain::metrics::{AdsPlatform, MetricsSnapshot};
use crate::ingest::types::GatewayMetricsResponse;
use crate::time::periods::Period;
use anyhow::{Context, Result};
use chrono::Datelike;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PATH: &str = "/v1/metrics";
const DEFAULT_RETRIES: u32 = 3;

/// Client for the hosted aggregation gateway that fronts Google Ads, Meta
/// Ads and GA4. OAuth against the platforms happens inside the gateway;
/// this side only passes an account reference and a window.
#[async_trait::async_trait]
pub trait AdsPlatformClient: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_snapshot(
        &self,
        platform: AdsPlatform,
        account_ref: &str,
        period: Period,
    ) -> Result<(GatewayMetricsResponse, Value)>;
}

#[derive(Debug, Clone)]
pub struct HttpMetricsProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    path: String,
    retries: u32,
}

impl HttpMetricsProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_metrics_gateway_base_url()?.to_string();
        let api_key = settings.metrics_gateway_api_key.clone();

        let timeout_secs = std::env::var("METRICS_GATEWAY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("METRICS_GATEWAY_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES);

        let path = std::env::var("METRICS_GATEWAY_METRICS_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PATH.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build metrics gateway http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            path,
            retries,
        })
    }

    fn url(&self) -> String {
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };

        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    async fn fetch_once(
        &self,
        platform: AdsPlatform,
        account_ref: &str,
        period: Period,
    ) -> Result<(GatewayMetricsResponse, Value)> {
        let url = self.url();
        let headers = self.headers()?;

        let res = self
            .http
            .get(url)
            .headers(headers)
            .query(&[
                ("platform", platform.as_str().to_string()),
                ("account", account_ref.to_string()),
                ("start", period.start.to_string()),
                ("end", period.end.to_string()),
            ])
            .send()
            .await
            .context("metrics gateway request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read metrics gateway response")?;
        let raw_json = serde_json::from_str::<Value>(&text)
            .with_context(|| format!("metrics gateway response is not valid JSON: {text}"))?;

        if !status.is_success() {
            anyhow::bail!("metrics gateway HTTP {status}: {raw_json}");
        }

        let parsed = serde_json::from_value::<GatewayMetricsResponse>(raw_json.clone())
            .context("failed to parse gateway response into GatewayMetricsResponse")?;
        Ok((parsed, raw_json))
    }
}

fn validate(resp: &GatewayMetricsResponse, platform: AdsPlatform, period: Period) -> Result<()> {
    anyhow::ensure!(
        resp.platform == platform,
        "gateway platform mismatch: expected {}, got {}",
        platform.as_str(),
        resp.platform.as_str()
    );
    anyhow::ensure!(
        resp.start == period.start && resp.end == period.end,
        "gateway window mismatch: expected {}..{}, got {}..{}",
        period.start,
        period.end,
        resp.start,
        resp.end
    );
    anyhow::ensure!(
        resp.metrics.spend >= 0.0 && resp.metrics.conversions >= 0.0,
        "gateway metrics must be non-negative"
    );
    Ok(())
}

#[async_trait::async_trait]
impl AdsPlatformClient for HttpMetricsProvider {
    fn provider_name(&self) -> &'static str {
        "metrics_gateway_http"
    }

    async fn fetch_snapshot(
        &self,
        platform: AdsPlatform,
        account_ref: &str,
        period: Period,
    ) -> Result<(GatewayMetricsResponse, Value)> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let res = self.fetch_once(platform, account_ref, period).await;
            match res {
                Ok((parsed, raw)) => {
                    validate(&parsed, platform, period)?;
                    return Ok((parsed, raw));
                }
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    tracing::warn!(
                        attempt,
                        platform = platform.as_str(),
                        ?backoff,
                        error = %err,
                        "metrics gateway fetch failed; retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

/// Deterministic offline provider for dry runs and local development.
/// Metrics derive from the platform, account and window only, so two runs
/// over the same inputs agree.
#[derive(Debug, Clone, Default)]
pub struct StubMetricsProvider;

#[async_trait::async_trait]
impl AdsPlatformClient for StubMetricsProvider {
    fn provider_name(&self) -> &'static str {
        "stub"
    }

    async fn fetch_snapshot(
        &self,
        platform: AdsPlatform,
        account_ref: &str,
        period: Period,
    ) -> Result<(GatewayMetricsResponse, Value)> {
        let seed = (period.start.num_days_from_ce() % 997) as f64
            + account_ref.len() as f64
            + platform.as_str().len() as f64;

        let spend = 100.0 + seed;
        let conversions = 10.0 + (seed % 50.0);
        let revenue = spend * 3.0;

        let metrics = MetricsSnapshot {
            spend,
            revenue: Some(revenue),
            roas: Some(crate::domain::metrics::derive_roas(revenue, spend)),
            cpa: Some(crate::domain::metrics::derive_cpa(spend, conversions)),
            conversions,
        };

        let resp = GatewayMetricsResponse {
            platform,
            start: period.start,
            end: period.end,
            metrics,
        };
        let raw = serde_json::to_value(&resp).context("serialize stub response")?;
        Ok((resp, raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn period() -> Period {
        Period {
            start: NaiveDate::from_ymd_opt(2026, 2, 9).unwrap(),
            end: NaiveDate::from_ymd_opt(2026, 2, 16).unwrap(),
        }
    }

    #[test]
    fn parses_expected_gateway_shape() {
        let v = json!({
            "platform": "google_ads",
            "start": "2026-02-09",
            "end": "2026-02-16",
            "metrics": {"spend": 1000.0, "revenue": 3500.0, "conversions": 100.0}
        });

        let parsed: GatewayMetricsResponse = serde_json::from_value(v).unwrap();
        assert_eq!(parsed.platform, AdsPlatform::GoogleAds);
        assert_eq!(parsed.metrics.spend, 1000.0);
        assert_eq!(parsed.metrics.roas, None);
    }

    #[test]
    fn rejects_non_numeric_metrics_via_deserialize() {
        let v = json!({
            "platform": "ga4",
            "start": "2026-02-09",
            "end": "2026-02-16",
            "metrics": {"spend": "1000", "conversions": 100.0}
        });
        assert!(serde_json::from_value::<GatewayMetricsResponse>(v).is_err());
    }

    #[test]
    fn validate_rejects_window_mismatch() {
        let resp = GatewayMetricsResponse {
            platform: AdsPlatform::MetaAds,
            start: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2026, 2, 8).unwrap(),
            metrics: MetricsSnapshot::default(),
        };
        assert!(validate(&resp, AdsPlatform::MetaAds, period()).is_err());
    }

    #[test]
    fn validate_rejects_platform_mismatch() {
        let resp = GatewayMetricsResponse {
            platform: AdsPlatform::Ga4,
            start: period().start,
            end: period().end,
            metrics: MetricsSnapshot::default(),
        };
        assert!(validate(&resp, AdsPlatform::MetaAds, period()).is_err());
    }

    #[tokio::test]
    async fn stub_provider_is_deterministic() {
        let stub = StubMetricsProvider;
        let (a, _) = stub
            .fetch_snapshot(AdsPlatform::GoogleAds, "acct-1", period())
            .await
            .unwrap();
        let (b, _) = stub
            .fetch_snapshot(AdsPlatform::GoogleAds, "acct-1", period())
            .await
            .unwrap();
        assert_eq!(a.metrics, b.metrics);
        assert_eq!(a.start, period().start);
    }
}
