//! Postgres source reader.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use film_sync_shared::{DirectoryRecord, EnrichedWork, NamedRef, PersonWithRole};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use super::queries;
use crate::errors::SourceError;
use crate::interfaces::SourceReader;
use crate::types::{ChangeQuery, ChangeRow, DirectoryQuery, SourceTable};

#[derive(sqlx::FromRow)]
struct ChangeRecord {
    work_id: Uuid,
    entity_id: Uuid,
    modified: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct EnrichedWorkRecord {
    id: Uuid,
    title: String,
    description: Option<String>,
    rating: Option<f64>,
    work_type: String,
    modified: DateTime<Utc>,
    persons: Json<Vec<PersonWithRole>>,
    genres: Json<Vec<NamedRef>>,
}

impl From<EnrichedWorkRecord> for EnrichedWork {
    fn from(record: EnrichedWorkRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            rating: record.rating,
            work_type: record.work_type,
            modified: record.modified,
            persons: record.persons.0,
            genres: record.genres.0,
        }
    }
}

#[derive(sqlx::FromRow)]
struct DirectoryRow {
    id: Uuid,
    name: String,
    modified: DateTime<Utc>,
}

/// PostgreSQL-backed reader for the film catalog.
///
/// Every page is its own bounded query, so at most one page of rows is held in
/// memory at a time. The pool needs at least two connections: the enrichment
/// query runs while a change feed is being paged.
pub struct PostgresSourceReader {
    /// PostgreSQL connection pool
    pool: PgPool,
}

impl PostgresSourceReader {
    /// Creates a reader over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a reader with a lazily connecting pool.
    ///
    /// No connection is opened until the first query, so an unreachable database
    /// surfaces in `ping` during the pre-check rather than here.
    ///
    /// # Arguments
    ///
    /// * `url` - Postgres DSN
    /// * `max_connections` - Pool size
    /// * `acquire_timeout` - How long a query waits for a free connection
    pub fn connect_lazy(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, SourceError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_lazy(url)
            .map_err(SourceError::from)?;

        info!(max_connections, "Created Postgres source pool");
        Ok(Self { pool })
    }
}

#[async_trait]
impl SourceReader for PostgresSourceReader {
    async fn ping(&self) -> Result<(), SourceError> {
        sqlx::query_scalar::<_, i32>(queries::PING_SQL)
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    async fn fetch_changes(&self, query: &ChangeQuery) -> Result<Vec<ChangeRow>, SourceError> {
        let mut builder = queries::change_page(query);
        let records: Vec<ChangeRecord> = builder
            .build_query_as::<ChangeRecord>()
            .fetch_all(&self.pool)
            .await?;

        debug!(feed = ?query.feed, rows = records.len(), "Fetched change page");

        Ok(records
            .into_iter()
            .map(|r| ChangeRow {
                work_id: r.work_id,
                entity_id: r.entity_id,
                modified: r.modified,
            })
            .collect())
    }

    async fn max_modified(&self, table: SourceTable) -> Result<Option<DateTime<Utc>>, SourceError> {
        let sql = queries::max_modified_sql(table);
        let max = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(&sql)
            .fetch_one(&self.pool)
            .await?;
        Ok(max)
    }

    async fn enrich_works(&self, ids: &[Uuid]) -> Result<Vec<EnrichedWork>, SourceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let records = sqlx::query_as::<_, EnrichedWorkRecord>(queries::ENRICH_SQL)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        debug!(
            requested = ids.len(),
            found = records.len(),
            "Enriched film works"
        );

        Ok(records.into_iter().map(EnrichedWork::from).collect())
    }

    async fn fetch_directory(
        &self,
        query: &DirectoryQuery,
    ) -> Result<Vec<DirectoryRecord>, SourceError> {
        let mut builder = queries::directory_page(query);
        let rows: Vec<DirectoryRow> = builder
            .build_query_as::<DirectoryRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| DirectoryRecord {
                id: r.id,
                name: r.name,
                modified: r.modified,
            })
            .collect())
    }
}
