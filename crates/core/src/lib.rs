pub mod domain;
pub mod ingest;
pub mod report;
pub mod storage;
pub mod time;

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub sentry_dsn: Option<String>,
        pub metrics_gateway_base_url: Option<String>,
        pub metrics_gateway_api_key: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                database_url: std::env::var("DATABASE_URL").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                metrics_gateway_base_url: std::env::var("METRICS_GATEWAY_BASE_URL").ok(),
                metrics_gateway_api_key: std::env::var("METRICS_GATEWAY_API_KEY").ok(),
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub fn require_metrics_gateway_base_url(&self) -> anyhow::Result<&str> {
            self.metrics_gateway_base_url
                .as_deref()
                .context("METRICS_GATEWAY_BASE_URL is required")
        }
    }
}
