//! Shared test doubles

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::client::{QueryResult, WarehouseClient};
use crate::connection::{ConnectionConfig, keys};
use crate::error::ConnectorError;
use crate::host::AuthenticationMap;
use crate::sql::Statement;
use crate::value::Record;

/// In-memory warehouse that records every statement it accepts
#[derive(Default)]
pub struct RecordingClient {
    executed: parking_lot::Mutex<Vec<(ConnectionConfig, Statement)>>,
    failing: parking_lot::Mutex<HashSet<String>>,
    failing_columns: parking_lot::Mutex<HashSet<String>>,
    pub fail_all: AtomicBool,
    pub closed: AtomicBool,
}

impl RecordingClient {
    /// Fail every statement targeting `container`
    pub fn fail_container(&self, container: &str) {
        self.failing.lock().insert(container.to_string());
    }

    /// Fail every statement that binds `column`
    pub fn fail_column(&self, column: &str) {
        self.failing_columns.lock().insert(column.to_string());
    }

    pub fn recover(&self) {
        self.failing.lock().clear();
        self.failing_columns.lock().clear();
        self.fail_all.store(false, Ordering::SeqCst);
    }

    fn binds_failing_column(&self, statement: &Statement) -> bool {
        let failing = self.failing_columns.lock();
        statement.params.iter().any(|p| failing.contains(&p.column))
    }

    /// Accepted statements in execution order
    pub fn statements(&self) -> Vec<(ConnectionConfig, Statement)> {
        self.executed.lock().clone()
    }
}

impl WarehouseClient for RecordingClient {
    async fn execute(
        &self,
        connection: &ConnectionConfig,
        statement: &Statement,
    ) -> Result<QueryResult, ConnectorError> {
        if self.fail_all.load(Ordering::SeqCst)
            || self.failing.lock().contains(connection.container())
            || self.binds_failing_column(statement)
        {
            return Err(ConnectorError::execution("000603", "warehouse unavailable"));
        }
        self.executed
            .lock()
            .push((connection.clone(), statement.clone()));

        let result = if statement.text.starts_with("SELECT TABLE_NAME") {
            QueryResult {
                columns: vec!["TABLE_NAME".to_string()],
                rows: vec![vec![Some("CUSTOMERS".into())], vec![Some("ORDERS".into())]],
                rows_affected: None,
            }
        } else if statement.text.starts_with("SELECT COLUMN_NAME") {
            QueryResult {
                columns: vec!["COLUMN_NAME".to_string(), "DATA_TYPE".to_string()],
                rows: vec![
                    vec![Some("ID".into()), Some("NUMBER".into())],
                    vec![Some("NAME".into()), Some("TEXT".into())],
                ],
                rows_affected: None,
            }
        } else {
            QueryResult::empty()
        };
        Ok(result)
    }

    async fn close(&self) -> Result<(), ConnectorError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// A complete authentication map
pub fn details() -> AuthenticationMap {
    [
        (keys::ACCOUNT, "acme"),
        (keys::HOST, "acme.snowflakecomputing.com"),
        (keys::USERNAME, "exporter"),
        (keys::PASSWORD, "s3cret"),
        (keys::DATABASE_NAME, "ANALYTICS"),
        (keys::SCHEMA, "PUBLIC"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// A two-column record keyed by origin code
pub fn order(code: &str, name: &str) -> Record {
    Record::new()
        .with("OriginEntityCode", code)
        .with("Name", name)
}
