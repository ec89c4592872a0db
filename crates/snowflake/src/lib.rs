//! Snowflake export connector
//!
//! Publishes entity records from a data-integration host into Snowflake
//! tables. The host owns credentials and scheduling; this crate implements
//! container lifecycle, buffered writes and the flush that turns buffered
//! records into `MERGE` upserts.
//!
//! # Design Principles
//!
//! - **Buffered writes**: records accumulate per destination and are
//!   flushed on a size threshold or a timer tick
//! - **One flush at a time**: a single lock guards the cache for inserts
//!   and flushes alike
//! - **At-least-once**: a partition is cleared only after its statement
//!   succeeds; re-flushing is harmless because upserts match on
//!   `OriginEntityCode`
//! - **Bound values**: record values never appear in statement text
//!
//! # Example
//!
//! ```ignore
//! use snowflake_export::{
//!     ExecutionContext, SnowflakeClient, SnowflakeClientConfig, SnowflakeConnector,
//!     StaticAuthentication, SyncScheduler,
//! };
//!
//! let client = SnowflakeClient::new(SnowflakeClientConfig::default())?;
//! let connector = Arc::new(SnowflakeConnector::new(client, auth, 50));
//! let (scheduler, handle) = SyncScheduler::new(Arc::clone(&connector), interval);
//! tokio::spawn(scheduler.run());
//!
//! connector.store_data(&ctx, connection_id, "Orders", record).await?;
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod connection;
pub mod connector;
mod error;
pub mod host;
pub mod metrics;
pub mod model;
pub mod sanitize;
pub mod scheduler;
pub mod snowflake;
pub mod sql;
pub mod value;

#[cfg(test)]
mod testing;

// Re-exports
pub use cache::WriteCache;
pub use client::{QueryResult, WarehouseClient};
pub use config::{Config, ConfigError, ConnectorSettings, LogConfig, LogFormat, LogLevel};
pub use connection::ConnectionConfig;
pub use connector::{FlushReport, SnowflakeConnector};
pub use error::ConnectorError;
pub use host::{AuthenticationMap, AuthenticationProvider, ExecutionContext, StaticAuthentication};
pub use metrics::{ConnectorMetrics, MetricsSnapshot};
pub use model::{ColumnDataType, Container, ContainerModel, DataType};
pub use scheduler::{SyncHandle, SyncScheduler};
pub use snowflake::{SnowflakeClient, SnowflakeClientConfig};
pub use sql::Statement;
pub use value::{Record, Value};
