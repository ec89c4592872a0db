//! Connection configuration
//!
//! `ConnectionConfig` identifies one destination table: warehouse
//! coordinates, credentials and the target container. It is the write
//! cache partition key, so equality and hashing cover every field.

use std::fmt;

use crate::error::ConnectorError;
use crate::host::AuthenticationMap;

/// Authentication map key names, as the host stores them
pub mod keys {
    pub const ACCOUNT: &str = "Account";
    pub const HOST: &str = "Host";
    pub const PORT_NUMBER: &str = "PortNumber";
    pub const ROLE: &str = "Role";
    pub const WAREHOUSE: &str = "Warehouse";
    pub const USERNAME: &str = "Username";
    pub const PASSWORD: &str = "Password";
    pub const DATABASE_NAME: &str = "DatabaseName";
    pub const SCHEMA: &str = "Schema";
}

/// Default HTTPS port for warehouse endpoints
pub const DEFAULT_PORT: u16 = 443;

/// Immutable description of a destination table
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ConnectionConfig {
    account: String,
    host: String,
    port: String,
    role: String,
    warehouse: String,
    username: String,
    password: String,
    database: String,
    schema: String,
    container: String,
}

impl ConnectionConfig {
    /// Build a config from the host's authentication map and a container name.
    ///
    /// `Host`, `DatabaseName`, `Username` and `Password` are required; the
    /// remaining keys default to empty.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::MissingAuthKey`] if a required key is absent
    /// or blank.
    pub fn from_authentication(
        auth: &AuthenticationMap,
        container: impl Into<String>,
    ) -> Result<Self, ConnectorError> {
        let required = |key: &'static str| -> Result<String, ConnectorError> {
            match auth.get(key).map(|v| v.trim()) {
                Some(v) if !v.is_empty() => Ok(v.to_string()),
                _ => Err(ConnectorError::MissingAuthKey(key)),
            }
        };
        let optional = |key: &str| auth.get(key).map(|v| v.trim().to_string()).unwrap_or_default();

        Ok(Self {
            account: optional(keys::ACCOUNT),
            host: required(keys::HOST)?,
            port: optional(keys::PORT_NUMBER),
            role: optional(keys::ROLE),
            warehouse: optional(keys::WAREHOUSE),
            username: required(keys::USERNAME)?,
            password: required(keys::PASSWORD)?,
            database: required(keys::DATABASE_NAME)?,
            schema: optional(keys::SCHEMA),
            container: container.into(),
        })
    }

    /// Build a config for connection-level operations (no target container)
    pub fn for_connection(auth: &AuthenticationMap) -> Result<Self, ConnectorError> {
        Self::from_authentication(auth, String::new())
    }

    /// Same coordinates, different target container
    pub fn with_container(&self, container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            ..self.clone()
        }
    }

    /// Same coordinates with the container cleared.
    ///
    /// Sessions are shared by every container on one connection, so this is
    /// the key the warehouse client caches them under.
    pub fn session_key(&self) -> Self {
        self.with_container(String::new())
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn warehouse(&self) -> &str {
        &self.warehouse
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Target container (table) name
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Port as configured, falling back to [`DEFAULT_PORT`] when blank or
    /// unparseable
    pub fn port(&self) -> u16 {
        self.port.parse().unwrap_or(DEFAULT_PORT)
    }

    /// Account name to log in with.
    ///
    /// Falls back to the first label of the host when no account is
    /// configured (`acme.snowflakecomputing.com` -> `acme`).
    pub fn account_name(&self) -> &str {
        if !self.account.is_empty() {
            return &self.account;
        }
        self.host.split('.').next().unwrap_or(&self.host)
    }

    /// Base URL of the warehouse endpoint for the given scheme
    pub fn base_url(&self, scheme: &str) -> String {
        format!("{}://{}:{}", scheme, self.host, self.port())
    }

    /// Driver-style connection string with the password masked.
    ///
    /// Suitable for logs and diagnostics only.
    pub fn connection_string(&self) -> String {
        format!(
            "scheme=https;ACCOUNT={};HOST={};port={};ROLE={};WAREHOUSE={};USER={};PASSWORD=****;DB={};SCHEMA={}",
            self.account,
            self.host,
            self.port(),
            self.role,
            self.warehouse,
            self.username,
            self.database,
            self.schema,
        )
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("account", &self.account)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("role", &self.role)
            .field("warehouse", &self.warehouse)
            .field("username", &self.username)
            .field("password", &"****")
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("container", &self.container)
            .finish()
    }
}

#[cfg(test)]
#[path = "connection_test.rs"]
mod connection_test;
