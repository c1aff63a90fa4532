use crate::domain::health::{ClientHealth, HealthStatus, StrategyType};
use crate::domain::metrics::MetricsSnapshot;
use crate::report::ClientReport;
use crate::time::periods::{Period, PeriodPair};
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct StoredReport {
    pub id: Uuid,
    pub report: ClientReport,
}

pub async fn persist_success(
    pool: &sqlx::PgPool,
    report: &ClientReport,
    raw_payload: Option<serde_json::Value>,
) -> anyhow::Result<Uuid> {
    anyhow::ensure!(
        report.periods.current.days() == report.periods.previous.days(),
        "report windows must be equal length"
    );

    let current_metrics =
        serde_json::to_value(&report.current).context("serialize current metrics")?;
    let previous_metrics =
        serde_json::to_value(&report.previous).context("serialize previous metrics")?;

    let report_id: Uuid = sqlx::query_scalar(
        "INSERT INTO client_reports \
         (client_id, report_date, status, error, health_status, score, variation, priority, \
          recommendation, summary, current_metrics, previous_metrics, \
          current_start, current_end, previous_start, previous_end, raw_payload, generated_at) \
         VALUES ($1, $2, 'success', NULL, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
         RETURNING id",
    )
    .bind(report.client_id)
    .bind(report.report_date)
    .bind(report.health.status.as_str())
    .bind(report.health.score)
    .bind(report.health.variation)
    .bind(report.health.priority)
    .bind(&report.health.recommendation)
    .bind(&report.summary)
    .bind(current_metrics)
    .bind(previous_metrics)
    .bind(report.periods.current.start)
    .bind(report.periods.current.end)
    .bind(report.periods.previous.start)
    .bind(report.periods.previous.end)
    .bind(raw_payload)
    .bind(report.generated_at)
    .fetch_one(pool)
    .await
    .context("insert client_reports failed")?;

    Ok(report_id)
}

pub async fn persist_failure(
    pool: &sqlx::PgPool,
    client_id: Uuid,
    report_date: NaiveDate,
    generated_at: DateTime<Utc>,
    error: &str,
    raw_payload: Option<serde_json::Value>,
) -> anyhow::Result<Uuid> {
    let report_id: Uuid = sqlx::query_scalar(
        "INSERT INTO client_reports (client_id, report_date, status, error, raw_payload, generated_at) \
         VALUES ($1, $2, 'error', $3, $4, $5) \
         RETURNING id",
    )
    .bind(client_id)
    .bind(report_date)
    .bind(error)
    .bind(raw_payload)
    .bind(generated_at)
    .fetch_one(pool)
    .await
    .context("insert error client_reports failed")?;

    Ok(report_id)
}

#[derive(Debug, sqlx::FromRow)]
struct ReportRow {
    id: Uuid,
    client_id: Uuid,
    client_name: String,
    client_strategy: String,
    report_date: NaiveDate,
    health_status: String,
    score: f64,
    variation: f64,
    priority: i32,
    recommendation: String,
    summary: String,
    current_metrics: serde_json::Value,
    previous_metrics: serde_json::Value,
    current_start: NaiveDate,
    current_end: NaiveDate,
    previous_start: NaiveDate,
    previous_end: NaiveDate,
    generated_at: DateTime<Utc>,
}

const REPORT_COLUMNS: &str = "r.id, r.client_id, c.name AS client_name, \
     c.strategy AS client_strategy, r.report_date, r.health_status, r.score, r.variation, \
     r.priority, r.recommendation, r.summary, r.current_metrics, r.previous_metrics, \
     r.current_start, r.current_end, r.previous_start, r.previous_end, r.generated_at";

impl ReportRow {
    fn into_stored(self) -> anyhow::Result<StoredReport> {
        let status = self
            .health_status
            .parse::<HealthStatus>()
            .with_context(|| format!("invalid health status stored for report {}", self.id))?;
        let strategy = self
            .client_strategy
            .parse::<StrategyType>()
            .with_context(|| format!("invalid strategy stored for report {}", self.id))?;

        let current: MetricsSnapshot = serde_json::from_value(self.current_metrics)
            .context("invalid current_metrics JSON in DB")?;
        let previous: MetricsSnapshot = serde_json::from_value(self.previous_metrics)
            .context("invalid previous_metrics JSON in DB")?;

        Ok(StoredReport {
            id: self.id,
            report: ClientReport {
                client_id: self.client_id,
                client_name: self.client_name,
                strategy,
                report_date: self.report_date,
                periods: PeriodPair {
                    current: Period {
                        start: self.current_start,
                        end: self.current_end,
                    },
                    previous: Period {
                        start: self.previous_start,
                        end: self.previous_end,
                    },
                },
                current,
                previous,
                health: ClientHealth {
                    status,
                    score: self.score,
                    variation: self.variation,
                    recommendation: self.recommendation,
                    priority: self.priority,
                },
                summary: self.summary,
                generated_at: self.generated_at,
            },
        })
    }
}

pub async fn fetch_latest(
    pool: &sqlx::PgPool,
    client_id: Uuid,
) -> anyhow::Result<Option<StoredReport>> {
    let sql = format!(
        "SELECT {REPORT_COLUMNS} \
         FROM client_reports r JOIN clients c ON c.id = r.client_id \
         WHERE r.status = 'success' AND r.client_id = $1 \
         ORDER BY r.report_date DESC, r.generated_at DESC \
         LIMIT 1"
    );
    let row = sqlx::query_as::<_, ReportRow>(&sql)
        .bind(client_id)
        .fetch_optional(pool)
        .await
        .context("select latest client report failed")?;

    row.map(ReportRow::into_stored).transpose()
}

pub async fn fetch_by_date(
    pool: &sqlx::PgPool,
    client_id: Uuid,
    report_date: NaiveDate,
) -> anyhow::Result<Option<StoredReport>> {
    let sql = format!(
        "SELECT {REPORT_COLUMNS} \
         FROM client_reports r JOIN clients c ON c.id = r.client_id \
         WHERE r.status = 'success' AND r.client_id = $1 AND r.report_date = $2 \
         ORDER BY r.generated_at DESC \
         LIMIT 1"
    );
    let row = sqlx::query_as::<_, ReportRow>(&sql)
        .bind(client_id)
        .bind(report_date)
        .fetch_optional(pool)
        .await
        .context("select client report by date failed")?;

    row.map(ReportRow::into_stored).transpose()
}
