//! Warehouse client trait definition

use std::future::Future;

use crate::connection::ConnectionConfig;
use crate::error::ConnectorError;
use crate::sql::Statement;

/// Rows returned by a statement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    /// Column names in result order
    pub columns: Vec<String>,
    /// Row values as text; `None` is SQL NULL
    pub rows: Vec<Vec<Option<String>>>,
    /// Rows inserted, updated or deleted, when the warehouse reports it
    pub rows_affected: Option<u64>,
}

impl QueryResult {
    /// Result of a statement that returned no rows
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by case-insensitive name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.eq_ignore_ascii_case(name))
    }

    /// Non-null values of one column, in row order
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .filter_map(move |row| row.get(index).and_then(|v| v.as_deref()))
    }
}

/// Executes statements against a warehouse
///
/// Implementations own session lifecycle: a session is opened lazily per
/// connection and reused until [`close`](WarehouseClient::close).
pub trait WarehouseClient: Send + Sync {
    /// Execute one statement with its bound parameters
    fn execute(
        &self,
        connection: &ConnectionConfig,
        statement: &Statement,
    ) -> impl Future<Output = Result<QueryResult, ConnectorError>> + Send;

    /// Close every open session
    fn close(&self) -> impl Future<Output = Result<(), ConnectorError>> + Send;
}
