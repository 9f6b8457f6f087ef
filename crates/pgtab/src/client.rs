//! Connection traits.
//!
//! [`GenericClient`] unifies clients and transactions; every parameter is a
//! storage text and every row comes back as text, so table code never touches
//! driver-level types. [`ConnectionSource`] hands out one connection per
//! statement.

use crate::error::{TabError, TabResult};
use std::future::Future;
use std::sync::Arc;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// One result row, every column read as text (`None` is SQL NULL).
pub type TextRow = Vec<Option<String>>;

/// A trait that unifies database clients and transactions.
///
/// This allows table operations to run on a direct client connection, a pooled
/// client or a transaction.
pub trait GenericClient: Send + Sync {
    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[Option<String>],
    ) -> impl Future<Output = TabResult<Vec<TextRow>>> + Send;

    /// Execute a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[Option<String>],
    ) -> impl Future<Output = TabResult<u64>> + Send;
}

fn bind_refs(params: &[Option<String>]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

fn text_row(row: &Row) -> TabResult<TextRow> {
    (0..row.len())
        .map(|i| {
            row.try_get::<_, Option<String>>(i).map_err(|e| {
                TabError::decode(format!("column {} is not readable as text: {}", i, e))
            })
        })
        .collect()
}

impl GenericClient for tokio_postgres::Client {
    async fn query(&self, sql: &str, params: &[Option<String>]) -> TabResult<Vec<TextRow>> {
        let rows = tokio_postgres::Client::query(self, sql, &bind_refs(params))
            .await
            .map_err(TabError::from_db_error)?;
        rows.iter().map(text_row).collect()
    }

    async fn execute(&self, sql: &str, params: &[Option<String>]) -> TabResult<u64> {
        tokio_postgres::Client::execute(self, sql, &bind_refs(params))
            .await
            .map_err(TabError::from_db_error)
    }
}

impl GenericClient for tokio_postgres::Transaction<'_> {
    async fn query(&self, sql: &str, params: &[Option<String>]) -> TabResult<Vec<TextRow>> {
        let rows = tokio_postgres::Transaction::query(self, sql, &bind_refs(params))
            .await
            .map_err(TabError::from_db_error)?;
        rows.iter().map(text_row).collect()
    }

    async fn execute(&self, sql: &str, params: &[Option<String>]) -> TabResult<u64> {
        tokio_postgres::Transaction::execute(self, sql, &bind_refs(params))
            .await
            .map_err(TabError::from_db_error)
    }
}

// ===== deadpool-postgres support =====

#[cfg(feature = "pool")]
impl GenericClient for deadpool_postgres::ClientWrapper {
    async fn query(&self, sql: &str, params: &[Option<String>]) -> TabResult<Vec<TextRow>> {
        GenericClient::query(&**self, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Option<String>]) -> TabResult<u64> {
        GenericClient::execute(&**self, sql, params).await
    }
}

#[cfg(feature = "pool")]
impl GenericClient for deadpool_postgres::Client {
    async fn query(&self, sql: &str, params: &[Option<String>]) -> TabResult<Vec<TextRow>> {
        // Delegate to the deref target (ClientWrapper / tokio_postgres::Client).
        GenericClient::query(&**self, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Option<String>]) -> TabResult<u64> {
        GenericClient::execute(&**self, sql, params).await
    }
}

impl<C: GenericClient> GenericClient for &C {
    async fn query(&self, sql: &str, params: &[Option<String>]) -> TabResult<Vec<TextRow>> {
        (*self).query(sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Option<String>]) -> TabResult<u64> {
        (*self).execute(sql, params).await
    }
}

/// Hands out connections, one per statement.
///
/// The connection is released when the value returned by
/// [`acquire`](Self::acquire) is dropped.
pub trait ConnectionSource: Send + Sync {
    type Connection: GenericClient;

    /// Whether the source can hand out connections at all.
    fn is_available(&self) -> bool;

    fn acquire(&self) -> impl Future<Output = TabResult<Self::Connection>> + Send;
}

impl<S: ConnectionSource> ConnectionSource for Arc<S> {
    type Connection = S::Connection;

    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn acquire(&self) -> impl Future<Output = TabResult<Self::Connection>> + Send {
        (**self).acquire()
    }
}
