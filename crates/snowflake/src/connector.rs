//! Snowflake export connector
//!
//! Host-facing operations: container lifecycle, buffered writes and the
//! flush that turns buffered records into `MERGE` upserts.
//!
//! # Flush
//!
//! Records are buffered in a [`WriteCache`] behind a single async mutex.
//! A flush holds that mutex for its whole pass, so at most one flush runs
//! at a time and `store_data` callers wait while it does. Each destination
//! is written with one `MERGE` per distinct column set. Rows are removed
//! only after their statement succeeds; rows whose statement failed stay
//! buffered for the next pass.
//!
//! # Errors
//!
//! Mutating operations log and return their error. `get_containers` and
//! `get_data_types` log and return an empty list. `store_data` fails only
//! when the record cannot be buffered.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::cache::WriteCache;
use crate::client::{QueryResult, WarehouseClient};
use crate::connection::ConnectionConfig;
use crate::error::ConnectorError;
use crate::host::{AuthenticationProvider, ExecutionContext};
use crate::metrics::ConnectorMetrics;
use crate::model::{ColumnDataType, Container, ContainerModel, DataType};
use crate::sanitize::valid_container_name;
use crate::sql::{self, ORIGIN_ENTITY_CODE, Statement};
use crate::value::Record;

/// Outcome of one flush pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Partitions written and cleared
    pub partitions_flushed: usize,
    /// Records written by successful statements
    pub records_flushed: usize,
    /// Records discarded because no statement could be built for them
    pub records_dropped: usize,
    /// Partitions left buffered after a failure
    pub partitions_failed: usize,
    /// Records still buffered when the pass ended
    pub records_retained: usize,
}

impl FlushReport {
    pub fn is_clean(&self) -> bool {
        self.partitions_failed == 0
    }
}

/// Buffered Snowflake connector
pub struct SnowflakeConnector<C, A> {
    client: C,
    auth: A,
    cache: Mutex<WriteCache>,
    flush_threshold: usize,
    metrics: Arc<ConnectorMetrics>,
}

impl<C, A> SnowflakeConnector<C, A>
where
    C: WarehouseClient,
    A: AuthenticationProvider,
{
    /// Create a connector that flushes once `flush_threshold` records are
    /// buffered (a threshold of zero behaves as one)
    pub fn new(client: C, auth: A, flush_threshold: usize) -> Self {
        Self {
            client,
            auth,
            cache: Mutex::new(WriteCache::new()),
            flush_threshold: flush_threshold.max(1),
            metrics: Arc::new(ConnectorMetrics::new()),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn flush_threshold(&self) -> usize {
        self.flush_threshold
    }

    /// Shared metrics handle
    pub fn metrics(&self) -> Arc<ConnectorMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Number of buffered records
    pub async fn count(&self) -> usize {
        self.cache.lock().await.count()
    }

    // =========================================================================
    // Container lifecycle
    // =========================================================================

    /// Create the table described by `model` if it does not exist
    pub async fn create_container(
        &self,
        ctx: &ExecutionContext,
        connection_id: Uuid,
        model: &ContainerModel,
    ) -> Result<(), ConnectorError> {
        if model.columns.is_empty() {
            let e = ConnectorError::invalid_model(format!(
                "container '{}' has no columns",
                model.name
            ));
            error!(container = %model.name, error = %e, "refusing to create container");
            return Err(e);
        }

        let statement = sql::build_create_table_sql(model);
        self.run_mutation(ctx, connection_id, &model.name, &statement, "create container")
            .await?;
        info!(container = %model.name, columns = model.columns.len(), "created container");
        Ok(())
    }

    /// Delete every row of a container
    pub async fn empty_container(
        &self,
        ctx: &ExecutionContext,
        connection_id: Uuid,
        name: &str,
    ) -> Result<(), ConnectorError> {
        let statement = sql::build_truncate_sql(name);
        self.run_mutation(ctx, connection_id, name, &statement, "empty container")
            .await?;
        info!(container = %name, "emptied container");
        Ok(())
    }

    /// Rename a container
    pub async fn rename_container(
        &self,
        ctx: &ExecutionContext,
        connection_id: Uuid,
        old_name: &str,
        new_name: &str,
    ) -> Result<(), ConnectorError> {
        let statement = sql::build_rename_sql(old_name, new_name);
        self.run_mutation(ctx, connection_id, old_name, &statement, "rename container")
            .await?;
        info!(container = %old_name, new_name = %new_name, "renamed container");
        Ok(())
    }

    /// Drop a container
    pub async fn remove_container(
        &self,
        ctx: &ExecutionContext,
        connection_id: Uuid,
        name: &str,
    ) -> Result<(), ConnectorError> {
        let statement = sql::build_drop_sql(name);
        self.run_mutation(ctx, connection_id, name, &statement, "remove container")
            .await?;
        info!(container = %name, "removed container");
        Ok(())
    }

    /// Move a container aside by renaming it with a timestamp suffix.
    ///
    /// Returns the archive name.
    pub async fn archive_container(
        &self,
        ctx: &ExecutionContext,
        connection_id: Uuid,
        name: &str,
    ) -> Result<String, ConnectorError> {
        let archived = archive_name(name, Utc::now());
        self.rename_container(ctx, connection_id, name, &archived)
            .await?;
        Ok(archived)
    }

    /// Tables in the connection's current schema
    pub async fn get_containers(&self, ctx: &ExecutionContext, connection_id: Uuid) -> Vec<Container> {
        let result = self
            .run_query(ctx, connection_id, "", &sql::build_list_tables_sql())
            .await;

        match result {
            Ok(rows) => {
                let index = rows.column_index("TABLE_NAME").unwrap_or(0);
                rows.column_values(index)
                    .map(|name| Container {
                        id: name.to_string(),
                        name: name.to_string(),
                    })
                    .collect()
            }
            Err(e) => {
                warn!(connection = %connection_id, error = %e, "failed to list containers");
                Vec::new()
            }
        }
    }

    /// Columns of one container
    pub async fn get_data_types(
        &self,
        ctx: &ExecutionContext,
        connection_id: Uuid,
        container: &str,
    ) -> Vec<ColumnDataType> {
        let result = self
            .run_query(
                ctx,
                connection_id,
                container,
                &sql::build_list_columns_sql(container),
            )
            .await;

        match result {
            Ok(rows) => {
                let name_index = rows.column_index("COLUMN_NAME").unwrap_or(0);
                let type_index = rows.column_index("DATA_TYPE").unwrap_or(1);
                rows.rows
                    .iter()
                    .filter_map(|row| {
                        let name = row.get(name_index)?.as_deref()?;
                        let raw = row
                            .get(type_index)
                            .and_then(|v| v.as_deref())
                            .unwrap_or_default();
                        Some(ColumnDataType {
                            name: name.to_string(),
                            raw_data_type: raw.to_string(),
                            data_type: DataType::from_raw(raw),
                        })
                    })
                    .collect()
            }
            Err(e) => {
                warn!(container = %container, error = %e, "failed to list data types");
                Vec::new()
            }
        }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Buffer one record for `container`, flushing first if the cache
    /// reaches the threshold.
    ///
    /// A failed threshold flush does not fail the call: it is logged and
    /// the records stay buffered for the next pass. Host integrations that
    /// expect the write to surface flush errors should call [`Self::flush`]
    /// and inspect the [`FlushReport`].
    ///
    /// # Errors
    ///
    /// Returns error only if the record could not be buffered: it has no
    /// columns or no `OriginEntityCode` column, credentials could not be
    /// resolved, or the caller cancelled.
    pub async fn store_data(
        &self,
        ctx: &ExecutionContext,
        connection_id: Uuid,
        container: &str,
        record: Record,
    ) -> Result<(), ConnectorError> {
        if let Err(e) = check_record(&record) {
            warn!(container = %container, error = %e, "rejecting record");
            return Err(e);
        }
        let config = self.resolve(ctx, connection_id, container).await?;

        let count = {
            let mut cache = self.cache.lock().await;
            cache.add_item(record, config);
            cache.count()
        };
        self.metrics.record_buffered();

        if count >= self.flush_threshold {
            debug!(count, threshold = self.flush_threshold, "flush threshold reached");
            self.flush(ctx).await;
        }
        Ok(())
    }

    /// Edge records are not exported
    pub async fn store_edge_data(
        &self,
        _ctx: &ExecutionContext,
        _connection_id: Uuid,
        container: &str,
        _record: Record,
    ) -> Result<(), ConnectorError> {
        debug!(container = %container, "ignoring edge data");
        Ok(())
    }

    /// Flush if anything is buffered
    pub async fn sync(&self, ctx: &ExecutionContext) -> FlushReport {
        if self.count().await == 0 {
            return FlushReport::default();
        }
        self.flush(ctx).await
    }

    /// Write every buffered partition.
    ///
    /// Holds the cache lock for the whole pass. Partitions are flushed in
    /// first-insert order; each is cleared only after its statement
    /// succeeds. A cancelled context stops the pass and leaves the rest
    /// buffered.
    pub async fn flush(&self, ctx: &ExecutionContext) -> FlushReport {
        let mut cache = self.cache.lock().await;
        let mut report = FlushReport::default();

        // Another caller may have drained the cache while we waited
        if cache.is_empty() {
            return report;
        }
        self.metrics.record_flush();

        for (config, records) in cache.partitions() {
            if ctx.is_cancelled() {
                warn!(container = %config.container(), "flush cancelled, leaving partition buffered");
                report.partitions_failed += 1;
                continue;
            }

            let buffered = records.len();
            let mut retained = Vec::new();
            let mut dropped = 0;

            // One statement per column set, so no row loses a column
            for batch in group_by_columns(dedupe_by_origin(records)) {
                let statement = match sql::build_upsert_sql(config.container(), &batch) {
                    Ok(statement) => statement,
                    Err(e) => {
                        dropped += batch.len();
                        error!(
                            container = %config.container(),
                            rows = batch.len(),
                            error = %e,
                            "dropping rows that cannot form a statement"
                        );
                        continue;
                    }
                };

                match self.execute(ctx, &config, &statement).await {
                    Ok(_) => debug!(
                        container = %config.container(),
                        rows = batch.len(),
                        columns = batch[0].len(),
                        "flushed batch"
                    ),
                    Err(e) => {
                        error!(
                            container = %config.container(),
                            rows = batch.len(),
                            error = %e,
                            "failed to flush batch, keeping rows buffered"
                        );
                        retained.extend(batch);
                    }
                }
            }

            let kept = retained.len();
            let written = buffered.saturating_sub(dropped + kept);
            cache.retain(&config, retained);

            self.metrics.record_flushed(written as u64);
            self.metrics.record_dropped(dropped as u64);
            report.records_flushed += written;
            report.records_dropped += dropped;
            if kept == 0 {
                report.partitions_flushed += 1;
            } else {
                self.metrics.record_flush_error();
                report.partitions_failed += 1;
            }
        }

        report.records_retained = cache.count();
        if report.partitions_flushed > 0 || report.partitions_failed > 0 {
            info!(
                partitions = report.partitions_flushed,
                records = report.records_flushed,
                failed = report.partitions_failed,
                dropped = report.records_dropped,
                retained = report.records_retained,
                "flush complete"
            );
        }
        report
    }

    /// Close warehouse sessions
    pub async fn close(&self) -> Result<(), ConnectorError> {
        self.client.close().await
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Resolve credentials for `connection_id` into a destination config
    async fn resolve(
        &self,
        ctx: &ExecutionContext,
        connection_id: Uuid,
        container: &str,
    ) -> Result<ConnectionConfig, ConnectorError> {
        let result = ctx
            .run(self.auth.authentication_details(ctx, connection_id))
            .await
            .and_then(|details| ConnectionConfig::from_authentication(&details, container));

        if let Err(ref e) = result {
            error!(
                connection = %connection_id,
                container = %container,
                error = %e,
                "failed to resolve connection"
            );
        }
        result
    }

    async fn execute(
        &self,
        ctx: &ExecutionContext,
        config: &ConnectionConfig,
        statement: &Statement,
    ) -> Result<QueryResult, ConnectorError> {
        let result = ctx.run(self.client.execute(config, statement)).await;
        self.metrics.record_statement(result.is_ok());
        result
    }

    async fn run_query(
        &self,
        ctx: &ExecutionContext,
        connection_id: Uuid,
        container: &str,
        statement: &Statement,
    ) -> Result<QueryResult, ConnectorError> {
        let config = self.resolve(ctx, connection_id, container).await?;
        self.execute(ctx, &config, statement).await
    }

    async fn run_mutation(
        &self,
        ctx: &ExecutionContext,
        connection_id: Uuid,
        container: &str,
        statement: &Statement,
        operation: &'static str,
    ) -> Result<(), ConnectorError> {
        let result = self
            .run_query(ctx, connection_id, container, statement)
            .await;
        if let Err(ref e) = result {
            error!(container = %container, operation, error = %e, "container operation failed");
        }
        result.map(|_| ())
    }
}

/// Archive name for a container: the name with a `yyyyMMddHHmmss` suffix,
/// made valid as a container name
pub fn archive_name(name: &str, at: DateTime<Utc>) -> String {
    valid_container_name(&format!("{}{}", name, at.format("%Y%m%d%H%M%S")))
}

/// Reject records no `MERGE` could write
fn check_record(record: &Record) -> Result<(), ConnectorError> {
    if record.is_empty() {
        return Err(ConnectorError::InvalidRecord("record has no columns".into()));
    }
    if record.get(ORIGIN_ENTITY_CODE).is_none() {
        return Err(ConnectorError::InvalidRecord(format!(
            "record has no {} column",
            ORIGIN_ENTITY_CODE
        )));
    }
    Ok(())
}

/// Split rows into batches that share one column set, in first-seen order.
///
/// Column order does not matter; each batch takes its layout from its first
/// row.
fn group_by_columns(rows: Vec<Record>) -> Vec<Vec<Record>> {
    let mut index: HashMap<Vec<String>, usize> = HashMap::new();
    let mut batches: Vec<Vec<Record>> = Vec::new();

    for row in rows {
        let mut key: Vec<String> = row.columns().map(str::to_string).collect();
        key.sort_unstable();
        match index.get(&key) {
            Some(&i) => batches[i].push(row),
            None => {
                index.insert(key, batches.len());
                batches.push(vec![row]);
            }
        }
    }
    batches
}

/// Collapse records sharing an `OriginEntityCode` so one `MERGE` never
/// matches a target row twice.
///
/// The last record for a code wins and takes the position of the first.
/// Records without a code are kept as they are.
fn dedupe_by_origin(records: Vec<Record>) -> Vec<Record> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut rows: Vec<Record> = Vec::with_capacity(records.len());

    for record in records {
        let key = record
            .get(ORIGIN_ENTITY_CODE)
            .filter(|v| !v.is_null())
            .and_then(|v| v.binding().value);

        match key {
            Some(key) => match seen.get(&key) {
                Some(&index) => rows[index] = record,
                None => {
                    seen.insert(key, rows.len());
                    rows.push(record);
                }
            },
            None => rows.push(record),
        }
    }
    rows
}

#[cfg(test)]
#[path = "connector_test.rs"]
mod connector_test;
