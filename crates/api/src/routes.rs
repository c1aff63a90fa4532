use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use adpulse_core::domain::permissions::MetricVisibility;
use adpulse_core::domain::tasks::{NewTask, OptimizationTask, TaskMove};
use adpulse_core::report::ClientReport;
use adpulse_core::storage;
use adpulse_core::time::periods::{comparison_periods, DateRange, PeriodPair, RangePreset};

#[derive(Debug, Clone)]
pub struct AppState {
    pub pool: Option<PgPool>,
}

pub async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
pub struct PeriodsQuery {
    range: Option<String>,
    start: Option<String>,
    end: Option<String>,
}

/// Resolve a requested range into current/previous comparison windows.
/// Presets resolve against today's UTC date; explicit ranges are pure.
pub async fn get_periods(
    Query(query): Query<PeriodsQuery>,
) -> Result<Json<PeriodPair>, StatusCode> {
    let range = parse_range(&query)?;
    let today = Utc::now().date_naive();
    Ok(Json(comparison_periods(range, today)))
}

fn parse_range(query: &PeriodsQuery) -> Result<DateRange, StatusCode> {
    if let Some(preset) = query.range.as_deref() {
        let preset = preset
            .parse::<RangePreset>()
            .map_err(|_| StatusCode::BAD_REQUEST)?;
        return Ok(DateRange::Preset(preset));
    }

    let (Some(start), Some(end)) = (query.start.as_deref(), query.end.as_deref()) else {
        return Err(StatusCode::BAD_REQUEST);
    };
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    if end < start {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(DateRange::Explicit { start, end })
}

fn parse_date(s: &str) -> Result<NaiveDate, StatusCode> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| StatusCode::BAD_REQUEST)
}

#[derive(Debug, Serialize)]
pub struct ApiClient {
    id: Uuid,
    name: String,
    strategy: &'static str,
}

pub async fn list_clients(State(state): State<AppState>) -> Result<Json<Vec<ApiClient>>, StatusCode> {
    let Some(pool) = &state.pool else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let clients = storage::clients::list_active(pool).await.map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(
        clients
            .into_iter()
            .map(|c| ApiClient {
                id: c.id,
                name: c.name,
                strategy: c.strategy.as_str(),
            })
            .collect(),
    ))
}

#[derive(Debug, Serialize)]
pub struct ApiReport {
    report_id: Uuid,
    report: ClientReport,
}

pub async fn get_latest_report(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
) -> Result<Json<ApiReport>, StatusCode> {
    let Some(pool) = &state.pool else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let stored = storage::reports::fetch_latest(pool, client_id)
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(ApiReport {
        report_id: stored.id,
        report: stored.report,
    }))
}

pub async fn get_report_by_date(
    State(state): State<AppState>,
    Path((client_id, report_date)): Path<(Uuid, String)>,
) -> Result<Json<ApiReport>, StatusCode> {
    let Some(pool) = &state.pool else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let report_date = parse_date(&report_date)?;

    let stored = storage::reports::fetch_by_date(pool, client_id, report_date)
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(ApiReport {
        report_id: stored.id,
        report: stored.report,
    }))
}

/// Latest WhatsApp summary as plain text, ready to paste or forward.
pub async fn get_summary(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
) -> Result<String, StatusCode> {
    let Some(pool) = &state.pool else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let stored = storage::reports::fetch_latest(pool, client_id)
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(stored.report.summary)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PermissionsBody {
    visible_metrics: Vec<String>,
}

pub async fn get_permissions(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
) -> Result<Json<PermissionsBody>, StatusCode> {
    let Some(pool) = &state.pool else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    require_client(pool, client_id).await?;

    let visibility = storage::permissions::visible_metrics(pool, client_id)
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(PermissionsBody {
        visible_metrics: visibility.as_strings(),
    }))
}

pub async fn put_permissions(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
    Json(body): Json<PermissionsBody>,
) -> Result<StatusCode, StatusCode> {
    let Some(pool) = &state.pool else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    // Unknown metric keys are a caller bug, not a server error.
    let visibility =
        MetricVisibility::from_keys(&body.visible_metrics).map_err(|_| StatusCode::BAD_REQUEST)?;

    require_client(pool, client_id).await?;

    storage::permissions::replace(pool, client_id, &visibility)
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
) -> Result<Json<Vec<OptimizationTask>>, StatusCode> {
    let Some(pool) = &state.pool else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    require_client(pool, client_id).await?;

    let tasks = storage::tasks::list_for_client(pool, client_id)
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(tasks))
}

pub async fn create_task(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
    Json(body): Json<NewTask>,
) -> Result<(StatusCode, Json<OptimizationTask>), StatusCode> {
    let Some(pool) = &state.pool else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    // Title validation failures are the caller's problem.
    let body = body.validate().map_err(|_| StatusCode::BAD_REQUEST)?;

    require_client(pool, client_id).await?;

    let task = storage::tasks::create(pool, client_id, body)
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn move_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Json(body): Json<TaskMove>,
) -> Result<Json<OptimizationTask>, StatusCode> {
    let Some(pool) = &state.pool else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    if body.validate().is_err() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let task = storage::tasks::move_task(pool, task_id, &body)
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(task))
}

async fn require_client(pool: &PgPool, client_id: Uuid) -> Result<(), StatusCode> {
    let client = storage::clients::fetch(pool, client_id).await.map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    if client.is_none() {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(())
}
