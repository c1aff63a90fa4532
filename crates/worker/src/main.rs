use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adpulse_core::domain::metrics::MetricsSnapshot;
use adpulse_core::domain::permissions::MetricVisibility;
use adpulse_core::ingest::provider::{AdsPlatformClient, HttpMetricsProvider, StubMetricsProvider};
use adpulse_core::report::{build_report, ClientReport};
use adpulse_core::storage::clients::Client;
use adpulse_core::time::periods::{comparison_periods, DateRange, Period, RangePreset};

#[derive(Debug, Parser)]
#[command(name = "adpulse_worker")]
struct Args {
    /// Report date (YYYY-MM-DD). Defaults to today's UTC date.
    #[arg(long)]
    report_date: Option<String>,

    /// Range preset resolved against the report date.
    #[arg(long, default_value = "last_7_days")]
    range: String,

    /// Compute and log reports without touching the database.
    #[arg(long)]
    dry_run: bool,

    /// Use the deterministic stub provider instead of the metrics gateway.
    #[arg(long)]
    stub: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = adpulse_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let report_date = resolve_report_date(args.report_date.as_deref())?;
    let preset = args
        .range
        .parse::<RangePreset>()
        .context("invalid --range")?;
    let periods = comparison_periods(DateRange::Preset(preset), report_date);

    let provider: Box<dyn AdsPlatformClient> = if args.stub || args.dry_run {
        Box::new(StubMetricsProvider)
    } else {
        Box::new(HttpMetricsProvider::from_settings(&settings)?)
    };

    if args.dry_run {
        // Offline pipeline exercise: synthetic clients, stub metrics, no DB.
        for client in demo_clients() {
            let report = run_client(provider.as_ref(), &client, report_date, periods).await?;
            tracing::info!(
                %report_date,
                dry_run = true,
                client = %client.name,
                status = report.health.status.as_str(),
                score = report.health.score,
                "dry-run report\n{}",
                report.summary
            );
        }
        return Ok(());
    }

    let db_url = settings.require_database_url()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;

    adpulse_core::storage::migrate(&pool).await?;

    let acquired =
        adpulse_core::storage::lock::try_acquire_report_date_lock(&pool, report_date).await?;
    if !acquired {
        tracing::warn!(%report_date, "report date lock not acquired; another run in progress");
        return Ok(());
    }

    let clients = adpulse_core::storage::clients::list_active(&pool).await?;
    tracing::info!(%report_date, range = preset.as_str(), clients_len = clients.len(), "report run starting");

    for client in &clients {
        match run_client_with_db(&pool, provider.as_ref(), client, report_date, periods).await {
            Ok(report_id) => {
                tracing::info!(%report_date, %report_id, client = %client.name, "persisted client report");
            }
            Err(err) => {
                sentry_anyhow::capture_anyhow(&err);
                let report_id = adpulse_core::storage::reports::persist_failure(
                    &pool,
                    client.id,
                    report_date,
                    Utc::now(),
                    &format!("{:#}", err),
                    None,
                )
                .await?;
                tracing::error!(%report_date, %report_id, client = %client.name, error = %err, "client report failed");
            }
        }
    }

    let _ = adpulse_core::storage::lock::release_report_date_lock(&pool, report_date).await;
    Ok(())
}

async fn run_client_with_db(
    pool: &sqlx::PgPool,
    provider: &dyn AdsPlatformClient,
    client: &Client,
    report_date: NaiveDate,
    periods: adpulse_core::time::periods::PeriodPair,
) -> anyhow::Result<uuid::Uuid> {
    let visibility = adpulse_core::storage::permissions::visible_metrics(pool, client.id).await?;
    let (report, raw_payload) =
        assemble_report(provider, client, report_date, periods, &visibility).await?;
    adpulse_core::storage::reports::persist_success(pool, &report, Some(raw_payload)).await
}

async fn run_client(
    provider: &dyn AdsPlatformClient,
    client: &Client,
    report_date: NaiveDate,
    periods: adpulse_core::time::periods::PeriodPair,
) -> anyhow::Result<ClientReport> {
    let (report, _) = assemble_report(
        provider,
        client,
        report_date,
        periods,
        &MetricVisibility::default(),
    )
    .await?;
    Ok(report)
}

/// Fetch both windows from every connected platform, aggregate, classify.
async fn assemble_report(
    provider: &dyn AdsPlatformClient,
    client: &Client,
    report_date: NaiveDate,
    periods: adpulse_core::time::periods::PeriodPair,
    visibility: &MetricVisibility,
) -> anyhow::Result<(ClientReport, serde_json::Value)> {
    let accounts = client.accounts();
    anyhow::ensure!(
        !accounts.is_empty(),
        "client {} has no connected ad platforms",
        client.name
    );

    let (current, raw_current) = fetch_window(provider, &accounts, periods.current).await?;
    let (previous, raw_previous) = fetch_window(provider, &accounts, periods.previous).await?;

    let report = build_report(
        client.id,
        &client.name,
        client.strategy,
        report_date,
        periods,
        current,
        previous,
        visibility,
        Utc::now(),
    );

    let raw_payload = serde_json::json!({
        "provider": provider.provider_name(),
        "current": raw_current,
        "previous": raw_previous,
    });

    Ok((report, raw_payload))
}

async fn fetch_window(
    provider: &dyn AdsPlatformClient,
    accounts: &[(adpulse_core::domain::metrics::AdsPlatform, &str)],
    period: Period,
) -> anyhow::Result<(MetricsSnapshot, Vec<serde_json::Value>)> {
    let mut parts = Vec::with_capacity(accounts.len());
    let mut raws = Vec::with_capacity(accounts.len());

    for (platform, account_ref) in accounts {
        let (resp, raw) = provider
            .fetch_snapshot(*platform, account_ref, period)
            .await
            .with_context(|| {
                format!(
                    "fetch {} metrics for {}..{} failed",
                    platform.as_str(),
                    period.start,
                    period.end
                )
            })?;
        parts.push(resp.metrics);
        raws.push(raw);
    }

    Ok((MetricsSnapshot::aggregate(parts.iter()), raws))
}

fn demo_clients() -> Vec<Client> {
    use adpulse_core::domain::health::StrategyType;

    let demo = |name: &str, strategy: StrategyType| Client {
        id: uuid::Uuid::new_v4(),
        name: name.to_string(),
        strategy,
        google_ads_ref: Some("demo-google".to_string()),
        meta_ads_ref: Some("demo-meta".to_string()),
        ga4_ref: None,
    };

    vec![
        demo("Demo Store", StrategyType::Revenue),
        demo("Demo Leads", StrategyType::Demand),
        demo("Demo Chat", StrategyType::Message),
    ]
}

fn resolve_report_date(arg: Option<&str>) -> anyhow::Result<NaiveDate> {
    if let Some(s) = arg {
        return Ok(NaiveDate::parse_from_str(s, "%Y-%m-%d")?);
    }
    Ok(Utc::now().date_naive())
}

fn init_sentry(settings: &adpulse_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
