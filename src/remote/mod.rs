//! Remote data access.
//!
//! Every page reads through [`RemoteClient`]: one scoped query in, JSON rows
//! out, decoded into the schema mirror by [`fetch_rows`].

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value as JsonValue;

use crate::error::RemoteError;
use crate::schema::Table;

#[cfg(test)]
pub mod memory;
pub mod postgres;
pub mod query;

pub use query::{Query, Scope, SortOrder};

#[async_trait]
pub trait RemoteClient: Send + Sync {
    async fn select(&self, query: &Query) -> Result<Vec<JsonValue>, RemoteError>;
    async fn count(&self, query: &Query) -> Result<i64, RemoteError>;
    async fn insert(&self, table: Table, row: JsonValue) -> Result<JsonValue, RemoteError>;
}

pub async fn fetch_rows<T: DeserializeOwned>(
    client: &dyn RemoteClient,
    query: &Query,
) -> Result<Vec<T>, RemoteError> {
    client
        .select(query)
        .await?
        .into_iter()
        .map(|row| serde_json::from_value(row).map_err(RemoteError::from))
        .collect()
}

pub async fn fetch_first<T: DeserializeOwned>(
    client: &dyn RemoteClient,
    query: &Query,
) -> Result<Option<T>, RemoteError> {
    Ok(fetch_rows(client, query).await?.into_iter().next())
}

pub async fn fetch_count(client: &dyn RemoteClient, query: &Query) -> Result<u64, RemoteError> {
    let n = client.count(query).await?;
    Ok(u64::try_from(n).unwrap_or(0))
}

pub async fn insert_row<T: Serialize, R: DeserializeOwned>(
    client: &dyn RemoteClient,
    table: Table,
    row: &T,
) -> Result<R, RemoteError> {
    let stored = client.insert(table, serde_json::to_value(row)?).await?;
    Ok(serde_json::from_value(stored)?)
}
