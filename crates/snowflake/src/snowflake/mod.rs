//! Snowflake warehouse client
//!
//! Talks to the Snowflake session and query endpoints over HTTPS with
//! `reqwest`. One session is opened per connection (the connection config
//! with its container cleared) and reused for every container on it.
//!
//! # Protocol
//!
//! - `POST /session/v1/login-request` exchanges username and password for a
//!   session token
//! - `POST /queries/v1/query-request` runs one statement with positional
//!   JSON bindings
//! - long-running statements return a result URL that is polled until the
//!   result is ready or the query timeout passes
//! - `POST /session?delete=true` closes the session
//!
//! A statement that fails with an expired session logs in again once and
//! retries. There is no other retry.

mod protocol;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::{QueryResult, WarehouseClient};
use crate::connection::ConnectionConfig;
use crate::error::ConnectorError;
use crate::sql::Statement;

use protocol::{
    LOGIN_PATH, LoginData, LoginRequest, LoginResponse, QUERY_PATH, QueryRequest, QueryResponse,
    SESSION_PATH,
};

const SNOWFLAKE_ACCEPT: &str = "application/snowflake";

/// Snowflake client configuration
#[derive(Debug, Clone)]
pub struct SnowflakeClientConfig {
    /// URL scheme for warehouse endpoints
    pub scheme: String,
    /// Timeout for the login request
    pub login_timeout: Duration,
    /// Upper bound for one statement, including result polling
    pub query_timeout: Duration,
    /// Delay between result polls for long-running statements
    pub poll_interval: Duration,
    /// Client application name reported at login
    pub client_app_id: String,
}

impl Default for SnowflakeClientConfig {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            login_timeout: Duration::from_secs(60),
            query_timeout: Duration::from_secs(300),
            poll_interval: Duration::from_millis(500),
            client_app_id: env!("CARGO_PKG_NAME").to_string(),
        }
    }
}

/// An open warehouse session
#[derive(Debug)]
struct Session {
    id: u64,
    token: String,
    base_url: String,
    sequence: AtomicU64,
}

impl Session {
    fn authorization(&self) -> String {
        format!("Snowflake Token=\"{}\"", self.token)
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Warehouse client for Snowflake
pub struct SnowflakeClient {
    http: reqwest::Client,
    config: SnowflakeClientConfig,
    sessions: Mutex<HashMap<ConnectionConfig, Arc<Session>>>,
    next_session_id: AtomicU64,
}

impl SnowflakeClient {
    /// Create a client
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client creation fails (e.g., TLS misconfiguration)
    pub fn new(config: SnowflakeClientConfig) -> Result<Self, ConnectorError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(config.query_timeout)
            .build()
            .map_err(|e| ConnectorError::Init(format!("Snowflake HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            sessions: Mutex::new(HashMap::new()),
            next_session_id: AtomicU64::new(0),
        })
    }

    /// Number of open sessions
    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Cached session for `key`, logging in if there is none
    async fn session(&self, key: &ConnectionConfig) -> Result<Arc<Session>, ConnectorError> {
        let cached = self.sessions.lock().get(key).cloned();
        if let Some(session) = cached {
            return Ok(session);
        }

        let session = Arc::new(self.login(key).await?);

        // A concurrent login for the same key may have won; keep the first
        let mut sessions = self.sessions.lock();
        let cached = sessions.entry(key.clone()).or_insert(session);
        Ok(Arc::clone(cached))
    }

    /// Drop `session` from the cache unless it was already replaced
    fn invalidate(&self, key: &ConnectionConfig, session: &Session) {
        let mut sessions = self.sessions.lock();
        if sessions.get(key).is_some_and(|cached| cached.id == session.id) {
            sessions.remove(key);
        }
    }

    async fn login(&self, connection: &ConnectionConfig) -> Result<Session, ConnectorError> {
        let base_url = connection.base_url(&self.config.scheme);
        let url = format!("{}{}", base_url, LOGIN_PATH);

        let mut params = vec![("requestId", Uuid::new_v4().to_string())];
        for (name, value) in [
            ("databaseName", connection.database()),
            ("schemaName", connection.schema()),
            ("warehouse", connection.warehouse()),
            ("roleName", connection.role()),
        ] {
            if !value.is_empty() {
                params.push((name, value.to_string()));
            }
        }

        let body = LoginRequest {
            data: LoginData {
                client_app_id: &self.config.client_app_id,
                client_app_version: env!("CARGO_PKG_VERSION"),
                account_name: connection.account_name(),
                login_name: connection.username(),
                password: connection.password(),
            },
        };

        let response = self
            .http
            .post(&url)
            .query(&params)
            .header(ACCEPT, "application/json")
            .timeout(self.config.login_timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConnectorError::AuthFailed(format!(
                "login returned HTTP {}",
                status
            )));
        }

        let login: LoginResponse = response.json().await?;
        let token = match (login.success, login.data.and_then(|d| d.token)) {
            (true, Some(token)) => token,
            _ => {
                return Err(ConnectorError::AuthFailed(format!(
                    "{} ({})",
                    login.message.unwrap_or_else(|| "login rejected".to_string()),
                    login.code.unwrap_or_default()
                )));
            }
        };

        let id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        info!(
            session = id,
            connection = %connection.connection_string(),
            "opened Snowflake session"
        );

        Ok(Session {
            id,
            token,
            base_url,
            sequence: AtomicU64::new(0),
        })
    }

    async fn query(
        &self,
        session: &Session,
        statement: &Statement,
    ) -> Result<QueryResult, ConnectorError> {
        let url = format!("{}{}", session.base_url, QUERY_PATH);
        let body = QueryRequest::new(statement, session.next_sequence());
        let deadline = tokio::time::Instant::now() + self.config.query_timeout;

        let request = self
            .http
            .post(&url)
            .query(&[("requestId", Uuid::new_v4().to_string())])
            .json(&body);
        let mut response = self.send(session, request).await?;

        while response.is_in_progress() {
            let Some(result_url) = response.data.as_ref().and_then(|d| d.get_result_url.clone())
            else {
                return Err(ConnectorError::execution(
                    response.code(),
                    "statement in progress without a result URL",
                ));
            };

            if tokio::time::Instant::now() + self.config.poll_interval > deadline {
                return Err(ConnectorError::Timeout);
            }
            tokio::time::sleep(self.config.poll_interval).await;

            debug!(session = session.id, url = %result_url, "polling statement result");
            let request = self.http.get(format!("{}{}", session.base_url, result_url));
            response = self.send(session, request).await?;
        }

        if !response.success {
            let code = response.code().to_string();
            return Err(ConnectorError::execution(
                code,
                response.message.unwrap_or_default(),
            ));
        }

        let data = response.data.unwrap_or_default();
        Ok(QueryResult {
            columns: data.rowtype.into_iter().map(|r| r.name).collect(),
            rows: data.rowset,
            rows_affected: data.stats.map(|s| s.rows_affected()),
        })
    }

    /// Send an authorized request and decode the query envelope
    async fn send(
        &self,
        session: &Session,
        request: reqwest::RequestBuilder,
    ) -> Result<QueryResponse, ConnectorError> {
        let response = request
            .header(AUTHORIZATION, session.authorization())
            .header(ACCEPT, SNOWFLAKE_ACCEPT)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ConnectorError::SessionExpired);
        }
        let response = response.error_for_status()?;

        let body = response.bytes().await?;
        let decoded: QueryResponse = serde_json::from_slice(&body)?;
        if decoded.is_session_expired() {
            return Err(ConnectorError::SessionExpired);
        }
        Ok(decoded)
    }

    async fn delete_session(&self, session: &Session) -> Result<(), ConnectorError> {
        let url = format!("{}{}", session.base_url, SESSION_PATH);
        self.http
            .post(&url)
            .query(&[("delete", "true")])
            .header(AUTHORIZATION, session.authorization())
            .header(ACCEPT, SNOWFLAKE_ACCEPT)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

impl WarehouseClient for SnowflakeClient {
    async fn execute(
        &self,
        connection: &ConnectionConfig,
        statement: &Statement,
    ) -> Result<QueryResult, ConnectorError> {
        let key = connection.session_key();
        let session = self.session(&key).await?;

        match self.query(&session, statement).await {
            Err(ConnectorError::SessionExpired) => {
                debug!(session = session.id, "session expired, logging in again");
                self.invalidate(&key, &session);
                let session = self.session(&key).await?;
                self.query(&session, statement).await
            }
            other => other,
        }
    }

    async fn close(&self) -> Result<(), ConnectorError> {
        let sessions: Vec<_> = self.sessions.lock().drain().map(|(_, s)| s).collect();

        let mut first_error = None;
        for session in sessions {
            match self.delete_session(&session).await {
                Ok(()) => debug!(session = session.id, "closed Snowflake session"),
                Err(e) => {
                    warn!(session = session.id, error = %e, "failed to close Snowflake session");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
