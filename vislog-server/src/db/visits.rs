//! Visitor record store
//!
//! Rows are only ever inserted or deleted. The retrieval cap applies to
//! reads; nothing is expired automatically.

use sqlx::SqlitePool;
use vislog_common::models::{NewVisitorRecord, VisitorRecord};
use vislog_common::time::{format_timestamp, now, parse_timestamp};
use vislog_common::Result;

/// Number of records served to a fresh viewer
pub const RECENT_LIMIT: i64 = 100;

#[derive(Debug, sqlx::FromRow)]
struct VisitRow {
    id: i64,
    ip: String,
    device: String,
    os: String,
    browser: String,
    city: String,
    region: String,
    country: String,
    timestamp: String,
}

impl TryFrom<VisitRow> for VisitorRecord {
    type Error = vislog_common::Error;

    fn try_from(row: VisitRow) -> Result<Self> {
        Ok(VisitorRecord {
            id: row.id,
            ip: row.ip,
            device: row.device,
            os: row.os,
            browser: row.browser,
            city: row.city,
            region: row.region,
            country: row.country,
            timestamp: parse_timestamp(&row.timestamp)?,
        })
    }
}

/// Handle over the `visits` table
#[derive(Clone)]
pub struct VisitStore {
    pool: SqlitePool,
}

impl VisitStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Persist a record, assigning id and timestamp
    ///
    /// The timestamp is never earlier than the newest stored one, so
    /// insertion order and timestamp order agree even if the wall clock
    /// steps backwards.
    pub async fn insert(&self, record: NewVisitorRecord) -> Result<VisitorRecord> {
        let candidate = format_timestamp(&now());

        let (id, timestamp): (i64, String) = sqlx::query_as(
            r#"
            INSERT INTO visits (ip, device, os, browser, city, region, country, timestamp)
            SELECT ?, ?, ?, ?, ?, ?, ?,
                   MAX(?, COALESCE((SELECT MAX(timestamp) FROM visits), ''))
            RETURNING id, timestamp
            "#,
        )
        .bind(&record.ip)
        .bind(&record.device)
        .bind(&record.os)
        .bind(&record.browser)
        .bind(&record.city)
        .bind(&record.region)
        .bind(&record.country)
        .bind(&candidate)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(id, ip = %record.ip, "Visit stored");

        Ok(record.into_stored(id, parse_timestamp(&timestamp)?))
    }

    /// Most recent records, newest first, at most `limit`
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<VisitorRecord>> {
        let rows: Vec<VisitRow> = sqlx::query_as(
            r#"
            SELECT id, ip, device, os, browser, city, region, country, timestamp
            FROM visits
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(VisitorRecord::try_from).collect()
    }

    /// Delete one record; returns whether a row was removed
    ///
    /// An absent id is not an error.
    pub async fn delete_by_id(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM visits WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every record; returns the number removed
    pub async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM visits")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Total stored rows (not capped)
    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM visits")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
