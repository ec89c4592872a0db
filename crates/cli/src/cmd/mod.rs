//! Command implementations for the snowflake-export CLI

pub mod container;
pub mod load;

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use snowflake_export::{
    Config, ExecutionContext, SnowflakeClient, SnowflakeConnector, StaticAuthentication,
};
use uuid::Uuid;

pub type Connector = SnowflakeConnector<SnowflakeClient, StaticAuthentication>;

/// The connector plus the connection every command runs against
pub struct Target {
    pub connector: Arc<Connector>,
    pub connection_id: Uuid,
    pub connection_name: String,
}

impl Target {
    /// Build a connector for the selected connection
    pub fn connect(config: &Config, name: Option<&str>) -> Result<Self> {
        let connection_name = select_connection(config, name)?;

        let client = SnowflakeClient::new(config.connector.client_config())
            .context("failed to create warehouse client")?;
        let (auth, ids) = config.authentication();
        let Some(&connection_id) = ids.get(&connection_name) else {
            bail!("connection '{}' was not registered", connection_name);
        };

        Ok(Self {
            connector: Arc::new(SnowflakeConnector::new(
                client,
                auth,
                config.connector.flush_threshold,
            )),
            connection_id,
            connection_name,
        })
    }

    pub fn context(&self) -> ExecutionContext {
        ExecutionContext::new()
    }
}

/// Pick the named connection, or the only one configured
fn select_connection(config: &Config, name: Option<&str>) -> Result<String> {
    if let Some(name) = name {
        config.connection(name)?;
        return Ok(name.to_string());
    }

    let mut names = config.connections.keys();
    match (names.next(), names.next()) {
        (Some(only), None) => Ok(only.clone()),
        (None, _) => bail!("no connections configured"),
        (Some(_), Some(_)) => bail!(
            "{} connections configured; choose one with --connection",
            config.connections.len()
        ),
    }
}
