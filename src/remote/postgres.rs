use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use tracing::debug;

use super::query::{insert_sql, Query};
use super::RemoteClient;
use crate::error::RemoteError;
use crate::schema::Table;

/// [`RemoteClient`] over a Postgres pool.
#[derive(Clone)]
pub struct PgRemote {
    pool: PgPool,
}

impl PgRemote {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RemoteClient for PgRemote {
    async fn select(&self, query: &Query) -> Result<Vec<JsonValue>, RemoteError> {
        let mut qb = query.select_sql()?;
        debug!(table = query.table.name(), sql = qb.sql(), "remote select");
        let rows = qb
            .build_query_scalar::<JsonValue>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn count(&self, query: &Query) -> Result<i64, RemoteError> {
        let mut qb = query.count_sql()?;
        debug!(table = query.table.name(), sql = qb.sql(), "remote count");
        let n = qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(n)
    }

    async fn insert(&self, table: Table, row: JsonValue) -> Result<JsonValue, RemoteError> {
        let mut qb = insert_sql(table, row)?;
        debug!(table = table.name(), "remote insert");
        let stored = qb
            .build_query_scalar::<JsonValue>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| insert_error(table, e))?;
        Ok(stored)
    }
}

fn insert_error(table: Table, e: sqlx::Error) -> RemoteError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            let constraint = db.constraint().unwrap_or(table.name());
            return RemoteError::Duplicate(constraint.to_string());
        }
    }
    RemoteError::Query(e)
}
