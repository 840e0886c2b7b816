use super::types::{
    Brief, Campaign, Metric, Patch, PatchFilter, StrategyVersion, parse_timestamp,
};
use super::{ProjectSeeder, ProjectStore, StoreFuture, seeded_metric};
use crate::error::QueryError;
use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use uuid::Uuid;

/// Query Interface over the workflow's SQLite database.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(url: &str) -> Result<Self, QueryError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect(url)
            .await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self, QueryError> {
        ensure_schema(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// ── Schema ──────────────────────────────────────────────────────────────────

const SCHEMA: [&str; 6] = [
    "CREATE TABLE IF NOT EXISTS projects (
        project_id TEXT PRIMARY KEY,
        name       TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS strategy_patches (
        patch_id      TEXT PRIMARY KEY,
        project_id    TEXT NOT NULL,
        source        TEXT NOT NULL,
        status        TEXT NOT NULL DEFAULT 'proposed',
        justification TEXT,
        patch_data    TEXT,
        created_at    TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS strategy_versions (
        strategy_id   TEXT PRIMARY KEY,
        project_id    TEXT NOT NULL,
        version       INTEGER NOT NULL,
        strategy_json TEXT,
        created_at    TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS briefs (
        brief_id    TEXT PRIMARY KEY,
        strategy_id TEXT NOT NULL,
        brief_json  TEXT,
        created_at  TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS campaigns (
        campaign_id TEXT PRIMARY KEY,
        project_id  TEXT NOT NULL,
        strategy_id TEXT NOT NULL,
        status      TEXT NOT NULL DEFAULT 'running',
        policy_json TEXT,
        created_at  TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS metrics (
        metric_id   TEXT PRIMARY KEY,
        campaign_id TEXT NOT NULL,
        ts          TEXT NOT NULL,
        impressions INTEGER NOT NULL DEFAULT 0,
        clicks      INTEGER NOT NULL DEFAULT 0,
        spend       REAL NOT NULL DEFAULT 0,
        conversions INTEGER NOT NULL DEFAULT 0,
        revenue     REAL NOT NULL DEFAULT 0,
        ctr         REAL,
        cpa         REAL,
        roas        REAL,
        extra_json  TEXT
    )",
];

async fn ensure_schema(pool: &SqlitePool) -> Result<(), QueryError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

// ── Row decoding ────────────────────────────────────────────────────────────

fn row_to_patch(row: &SqliteRow) -> Result<Patch, QueryError> {
    let source: String = row.try_get("source")?;
    let status: String = row.try_get("status")?;
    let created_at: String = row.try_get("created_at")?;
    Ok(Patch {
        id: row.try_get("patch_id")?,
        project_id: row.try_get("project_id")?,
        source: source.parse()?,
        status: status.parse()?,
        justification: row.try_get("justification")?,
        created_at: parse_timestamp("patch", &created_at)?,
    })
}

fn row_to_strategy(row: &SqliteRow) -> Result<StrategyVersion, QueryError> {
    let created_at: String = row.try_get("created_at")?;
    Ok(StrategyVersion {
        id: row.try_get("strategy_id")?,
        project_id: row.try_get("project_id")?,
        version: row.try_get("version")?,
        created_at: parse_timestamp("strategy_version", &created_at)?,
    })
}

fn row_to_campaign(row: &SqliteRow) -> Result<Campaign, QueryError> {
    let created_at: String = row.try_get("created_at")?;
    Ok(Campaign {
        id: row.try_get("campaign_id")?,
        project_id: row.try_get("project_id")?,
        strategy_id: row.try_get("strategy_id")?,
        status: row.try_get("status")?,
        created_at: parse_timestamp("campaign", &created_at)?,
    })
}

fn row_to_metric(row: &SqliteRow) -> Result<Metric, QueryError> {
    let ts: String = row.try_get("ts")?;
    Ok(Metric {
        id: row.try_get("metric_id")?,
        campaign_id: row.try_get("campaign_id")?,
        impressions: row.try_get("impressions")?,
        clicks: row.try_get("clicks")?,
        spend: row.try_get("spend")?,
        conversions: row.try_get("conversions")?,
        revenue: row.try_get("revenue")?,
        ctr: row.try_get("ctr")?,
        cpa: row.try_get("cpa")?,
        roas: row.try_get("roas")?,
        recorded_at: parse_timestamp("metric", &ts)?,
    })
}

fn row_to_brief(row: &SqliteRow) -> Result<Brief, QueryError> {
    let created_at: String = row.try_get("created_at")?;
    Ok(Brief {
        id: row.try_get("brief_id")?,
        strategy_id: row.try_get("strategy_id")?,
        created_at: parse_timestamp("brief", &created_at)?,
    })
}

fn decode_all<T>(
    rows: &[SqliteRow],
    decode: fn(&SqliteRow) -> Result<T, QueryError>,
) -> Result<Vec<T>, QueryError> {
    rows.iter().map(decode).collect()
}

// ── Query Interface ─────────────────────────────────────────────────────────

impl ProjectStore for SqliteStore {
    fn get_patches<'a>(
        &'a self,
        project_id: &'a str,
        filter: PatchFilter,
    ) -> StoreFuture<'a, Vec<Patch>> {
        Box::pin(async move {
            let rows = sqlx::query(
                "SELECT patch_id, project_id, source, status, justification, created_at
                 FROM strategy_patches
                 WHERE project_id = ?
                   AND (? IS NULL OR source = ?)
                   AND (? IS NULL OR status = ?)
                 ORDER BY created_at DESC",
            )
            .bind(project_id)
            .bind(filter.source.map(|s| s.as_db()))
            .bind(filter.source.map(|s| s.as_db()))
            .bind(filter.status.map(|s| s.as_db()))
            .bind(filter.status.map(|s| s.as_db()))
            .fetch_all(&self.pool)
            .await?;
            decode_all(&rows, row_to_patch)
        })
    }

    fn get_strategy_versions<'a>(
        &'a self,
        project_id: &'a str,
    ) -> StoreFuture<'a, Vec<StrategyVersion>> {
        Box::pin(async move {
            let rows = sqlx::query(
                "SELECT strategy_id, project_id, version, created_at
                 FROM strategy_versions
                 WHERE project_id = ?
                 ORDER BY version ASC",
            )
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;
            decode_all(&rows, row_to_strategy)
        })
    }

    fn get_campaigns<'a>(&'a self, project_id: &'a str) -> StoreFuture<'a, Vec<Campaign>> {
        Box::pin(async move {
            let rows = sqlx::query(
                "SELECT campaign_id, project_id, strategy_id, status, created_at
                 FROM campaigns
                 WHERE project_id = ?
                 ORDER BY created_at DESC",
            )
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;
            decode_all(&rows, row_to_campaign)
        })
    }

    fn get_metrics<'a>(&'a self, project_id: &'a str) -> StoreFuture<'a, Vec<Metric>> {
        Box::pin(async move {
            let rows = sqlx::query(
                "SELECT m.metric_id, m.campaign_id, m.ts, m.impressions, m.clicks, m.spend,
                        m.conversions, m.revenue, m.ctr, m.cpa, m.roas
                 FROM metrics m
                 JOIN campaigns c ON c.campaign_id = m.campaign_id
                 WHERE c.project_id = ?
                 ORDER BY m.ts DESC",
            )
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;
            decode_all(&rows, row_to_metric)
        })
    }

    fn get_briefs<'a>(&'a self, project_id: &'a str) -> StoreFuture<'a, Vec<Brief>> {
        Box::pin(async move {
            let rows = sqlx::query(
                "SELECT b.brief_id, b.strategy_id, b.created_at
                 FROM briefs b
                 JOIN strategy_versions s ON s.strategy_id = b.strategy_id
                 WHERE s.project_id = ?
                 ORDER BY b.created_at ASC",
            )
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;
            decode_all(&rows, row_to_brief)
        })
    }

    fn get_patch<'a>(
        &'a self,
        project_id: &'a str,
        patch_id: &'a str,
    ) -> StoreFuture<'a, Option<Patch>> {
        Box::pin(async move {
            let row = sqlx::query(
                "SELECT patch_id, project_id, source, status, justification, created_at
                 FROM strategy_patches
                 WHERE project_id = ? AND patch_id = ?",
            )
            .bind(project_id)
            .bind(patch_id)
            .fetch_optional(&self.pool)
            .await?;
            row.as_ref().map(row_to_patch).transpose()
        })
    }
}

// ── Seeding ─────────────────────────────────────────────────────────────────

impl ProjectSeeder for SqliteStore {
    fn ensure_project<'a>(&'a self, name: &'a str) -> StoreFuture<'a, String> {
        Box::pin(async move {
            let existing: Option<(String,)> = sqlx::query_as(
                "SELECT project_id FROM projects WHERE name = ? ORDER BY created_at ASC LIMIT 1",
            )
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
            if let Some((id,)) = existing {
                return Ok(id);
            }

            let id = Uuid::new_v4().to_string();
            sqlx::query("INSERT INTO projects (project_id, name, created_at) VALUES (?, ?, ?)")
                .bind(&id)
                .bind(name)
                .bind(Utc::now().to_rfc3339())
                .execute(&self.pool)
                .await?;
            Ok(id)
        })
    }

    fn seed_metrics<'a>(&'a self, project_id: &'a str, count: u32) -> StoreFuture<'a, Vec<Metric>> {
        Box::pin(async move {
            let campaign: Option<(String,)> = sqlx::query_as(
                "SELECT campaign_id FROM campaigns
                 WHERE project_id = ?
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT 1",
            )
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await?;
            let Some((campaign_id,)) = campaign else {
                return Err(QueryError::Backend(format!(
                    "project {project_id} has no campaign to seed"
                )));
            };

            let mut tx = self.pool.begin().await?;
            let mut seeded = Vec::with_capacity(count as usize);
            for index in 0..count {
                let metric = seeded_metric(&campaign_id, index);
                sqlx::query(
                    "INSERT INTO metrics (
                        metric_id, campaign_id, ts, impressions, clicks, spend,
                        conversions, revenue, ctr, cpa, roas, extra_json
                     ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&metric.id)
                .bind(&metric.campaign_id)
                .bind(metric.recorded_at.to_rfc3339())
                .bind(metric.impressions)
                .bind(metric.clicks)
                .bind(metric.spend)
                .bind(metric.conversions)
                .bind(metric.revenue)
                .bind(metric.ctr)
                .bind(metric.cpa)
                .bind(metric.roas)
                .bind(r#"{"seeded_by":"hitl-harness"}"#)
                .execute(&mut *tx)
                .await?;
                seeded.push(metric);
            }
            tx.commit().await?;
            Ok(seeded)
        })
    }
}
