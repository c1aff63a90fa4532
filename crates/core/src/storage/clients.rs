use crate::domain::health::StrategyType;
use crate::domain::metrics::AdsPlatform;
use anyhow::Context;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub strategy: StrategyType,
    pub google_ads_ref: Option<String>,
    pub meta_ads_ref: Option<String>,
    pub ga4_ref: Option<String>,
}

impl Client {
    /// Platform account references this client actually has connected.
    pub fn accounts(&self) -> Vec<(AdsPlatform, &str)> {
        let mut out = Vec::new();
        if let Some(r) = self.google_ads_ref.as_deref() {
            out.push((AdsPlatform::GoogleAds, r));
        }
        if let Some(r) = self.meta_ads_ref.as_deref() {
            out.push((AdsPlatform::MetaAds, r));
        }
        if let Some(r) = self.ga4_ref.as_deref() {
            out.push((AdsPlatform::Ga4, r));
        }
        out
    }
}

type ClientRow = (
    Uuid,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
);

fn into_client(row: ClientRow) -> anyhow::Result<Client> {
    let (id, name, strategy, google_ads_ref, meta_ads_ref, ga4_ref) = row;
    let strategy = strategy
        .parse::<StrategyType>()
        .with_context(|| format!("invalid strategy stored for client {id}"))?;
    Ok(Client {
        id,
        name,
        strategy,
        google_ads_ref,
        meta_ads_ref,
        ga4_ref,
    })
}

pub async fn list_active(pool: &sqlx::PgPool) -> anyhow::Result<Vec<Client>> {
    let rows = sqlx::query_as::<_, ClientRow>(
        "SELECT id, name, strategy, google_ads_ref, meta_ads_ref, ga4_ref \
         FROM clients \
         WHERE active \
         ORDER BY name ASC",
    )
    .fetch_all(pool)
    .await
    .context("select active clients failed")?;

    rows.into_iter().map(into_client).collect()
}

pub async fn fetch(pool: &sqlx::PgPool, client_id: Uuid) -> anyhow::Result<Option<Client>> {
    let row = sqlx::query_as::<_, ClientRow>(
        "SELECT id, name, strategy, google_ads_ref, meta_ads_ref, ga4_ref \
         FROM clients \
         WHERE id = $1",
    )
    .bind(client_id)
    .fetch_optional(pool)
    .await
    .context("select client failed")?;

    row.map(into_client).transpose()
}
