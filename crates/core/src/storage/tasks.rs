use crate::domain::tasks::{NewTask, OptimizationTask, TaskMove, TaskStatus};
use anyhow::Context;
use chrono::{DateTime, Utc};
use uuid::Uuid;

type TaskRow = (
    Uuid,
    Uuid,
    String,
    Option<String>,
    String,
    i32,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn into_task(row: TaskRow) -> anyhow::Result<OptimizationTask> {
    let (id, client_id, title, notes, status, position, created_at, updated_at) = row;
    let status = status
        .parse::<TaskStatus>()
        .with_context(|| format!("invalid status stored for task {id}"))?;
    Ok(OptimizationTask {
        id,
        client_id,
        title,
        notes,
        status,
        position,
        created_at,
        updated_at,
    })
}

/// Board listing: columns left to right, tasks top to bottom.
pub async fn list_for_client(
    pool: &sqlx::PgPool,
    client_id: Uuid,
) -> anyhow::Result<Vec<OptimizationTask>> {
    let rows = sqlx::query_as::<_, TaskRow>(
        "SELECT id, client_id, title, notes, status, position, created_at, updated_at \
         FROM optimization_tasks \
         WHERE client_id = $1 \
         ORDER BY CASE status \
            WHEN 'backlog' THEN 0 \
            WHEN 'in_progress' THEN 1 \
            ELSE 2 END, \
          position ASC, created_at ASC",
    )
    .bind(client_id)
    .fetch_all(pool)
    .await
    .context("select optimization_tasks failed")?;

    rows.into_iter().map(into_task).collect()
}

/// Create a task at the end of the client's Backlog column.
pub async fn create(
    pool: &sqlx::PgPool,
    client_id: Uuid,
    task: NewTask,
) -> anyhow::Result<OptimizationTask> {
    let task = task.validate()?;

    let mut tx = pool.begin().await.context("begin transaction failed")?;

    let position: i32 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(position) + 1, 0) \
         FROM optimization_tasks \
         WHERE client_id = $1 AND status = 'backlog'",
    )
    .bind(client_id)
    .fetch_one(&mut *tx)
    .await
    .context("select next backlog position failed")?;

    let row = sqlx::query_as::<_, TaskRow>(
        "INSERT INTO optimization_tasks (client_id, title, notes, status, position) \
         VALUES ($1, $2, $3, 'backlog', $4) \
         RETURNING id, client_id, title, notes, status, position, created_at, updated_at",
    )
    .bind(client_id)
    .bind(&task.title)
    .bind(&task.notes)
    .bind(position)
    .fetch_one(&mut *tx)
    .await
    .context("insert optimization_tasks failed")?;

    tx.commit().await.context("commit transaction failed")?;
    into_task(row)
}

/// Move a task between columns and/or repositions it. When the column
/// changes and no explicit position is given, the task appends to the end
/// of the target column.
pub async fn move_task(
    pool: &sqlx::PgPool,
    task_id: Uuid,
    mv: &TaskMove,
) -> anyhow::Result<Option<OptimizationTask>> {
    mv.validate()?;

    let mut tx = pool.begin().await.context("begin transaction failed")?;

    let existing = sqlx::query_as::<_, (Uuid, String)>(
        "SELECT client_id, status FROM optimization_tasks WHERE id = $1 FOR UPDATE",
    )
    .bind(task_id)
    .fetch_optional(&mut *tx)
    .await
    .context("select task for move failed")?;

    let Some((client_id, current_status)) = existing else {
        return Ok(None);
    };
    let current_status = current_status
        .parse::<TaskStatus>()
        .with_context(|| format!("invalid status stored for task {task_id}"))?;

    let new_status = mv.status.unwrap_or(current_status);
    let new_position = match mv.position {
        Some(p) => p,
        None if new_status != current_status => {
            sqlx::query_scalar(
                "SELECT COALESCE(MAX(position) + 1, 0) \
                 FROM optimization_tasks \
                 WHERE client_id = $1 AND status = $2",
            )
            .bind(client_id)
            .bind(new_status.as_str())
            .fetch_one(&mut *tx)
            .await
            .context("select next column position failed")?
        }
        None => {
            // Position untouched on a same-column no-position move.
            sqlx::query_scalar("SELECT position FROM optimization_tasks WHERE id = $1")
                .bind(task_id)
                .fetch_one(&mut *tx)
                .await
                .context("select current position failed")?
        }
    };

    let row = sqlx::query_as::<_, TaskRow>(
        "UPDATE optimization_tasks \
         SET status = $2, position = $3, updated_at = now() \
         WHERE id = $1 \
         RETURNING id, client_id, title, notes, status, position, created_at, updated_at",
    )
    .bind(task_id)
    .bind(new_status.as_str())
    .bind(new_position)
    .fetch_one(&mut *tx)
    .await
    .context("update optimization_tasks failed")?;

    tx.commit().await.context("commit transaction failed")?;
    into_task(row).map(Some)
}
