use anyhow::Context;

pub mod clients;
pub mod lock;
pub mod permissions;
pub mod reports;
pub mod tasks;

pub async fn migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("sqlx migrations failed")?;
    Ok(())
}
