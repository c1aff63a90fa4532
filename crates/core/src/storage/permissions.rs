use crate::domain::permissions::MetricVisibility;
use anyhow::Context;
use uuid::Uuid;

/// Effective visibility for a client. No stored row means the default
/// all-visible set.
pub async fn visible_metrics(
    pool: &sqlx::PgPool,
    client_id: Uuid,
) -> anyhow::Result<MetricVisibility> {
    let row: Option<(Vec<String>,)> =
        sqlx::query_as("SELECT visible_metrics FROM metric_permissions WHERE client_id = $1")
            .bind(client_id)
            .fetch_optional(pool)
            .await
            .context("select metric_permissions failed")?;

    match row {
        None => Ok(MetricVisibility::default()),
        Some((keys,)) => MetricVisibility::from_keys(keys)
            .with_context(|| format!("invalid metric keys stored for client {client_id}")),
    }
}

pub async fn replace(
    pool: &sqlx::PgPool,
    client_id: Uuid,
    visibility: &MetricVisibility,
) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO metric_permissions (client_id, visible_metrics, updated_at) \
         VALUES ($1, $2, now()) \
         ON CONFLICT (client_id) \
         DO UPDATE SET visible_metrics = EXCLUDED.visible_metrics, updated_at = now()",
    )
    .bind(client_id)
    .bind(visibility.as_strings())
    .execute(pool)
    .await
    .context("upsert metric_permissions failed")?;

    Ok(())
}
