//! Host-facing collaborators
//!
//! The host platform owns credential storage and request lifetimes. The
//! connector sees them through [`AuthenticationProvider`] and
//! [`ExecutionContext`].

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::ConnectorError;

/// Raw authentication details as stored by the host (key -> value)
pub type AuthenticationMap = HashMap<String, String>;

/// Per-request context propagated from the host
///
/// Carries the caller's cancellation token and optional deadline. Every
/// warehouse round-trip made on behalf of a request runs through
/// [`ExecutionContext::run`].
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl ExecutionContext {
    /// Context with no deadline and a fresh cancellation token
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Set an absolute deadline
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set a deadline relative to now
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// The cancellation token
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// The deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the caller has cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drive a future to completion unless the caller cancels or the
    /// deadline passes first.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, ConnectorError>
    where
        F: Future<Output = Result<T, ConnectorError>>,
    {
        if self.cancel.is_cancelled() {
            return Err(ConnectorError::Cancelled);
        }

        let guarded = async {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(ConnectorError::Cancelled),
                result = fut => result,
            }
        };

        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, guarded)
                .await
                .map_err(|_| ConnectorError::Timeout)?,
            None => guarded.await,
        }
    }
}

/// Resolves stored credentials for a logical connection
pub trait AuthenticationProvider: Send + Sync {
    /// Look up the authentication map for `connection_id`
    fn authentication_details(
        &self,
        ctx: &ExecutionContext,
        connection_id: Uuid,
    ) -> impl Future<Output = Result<AuthenticationMap, ConnectorError>> + Send;
}

/// Authentication provider backed by a fixed in-memory table
#[derive(Debug, Clone, Default)]
pub struct StaticAuthentication {
    connections: HashMap<Uuid, AuthenticationMap>,
}

impl StaticAuthentication {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Register authentication details for a connection
    pub fn insert(&mut self, connection_id: Uuid, details: AuthenticationMap) {
        self.connections.insert(connection_id, details);
    }

    /// Builder-style registration
    pub fn with_connection(mut self, connection_id: Uuid, details: AuthenticationMap) -> Self {
        self.insert(connection_id, details);
        self
    }

    /// Number of registered connections
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether no connections are registered
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl AuthenticationProvider for StaticAuthentication {
    async fn authentication_details(
        &self,
        _ctx: &ExecutionContext,
        connection_id: Uuid,
    ) -> Result<AuthenticationMap, ConnectorError> {
        self.connections
            .get(&connection_id)
            .cloned()
            .ok_or(ConnectorError::UnknownConnection(connection_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_passes_result_through() {
        let ctx = ExecutionContext::new();
        let value = ctx.run(async { Ok::<_, ConnectorError>(42) }).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_run_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = ExecutionContext::new().with_cancellation(token);

        let result = ctx.run(async { Ok::<_, ConnectorError>(()) }).await;
        assert!(matches!(result, Err(ConnectorError::Cancelled)));
    }

    #[tokio::test]
    async fn test_run_cancelled_while_pending() {
        let token = CancellationToken::new();
        let ctx = ExecutionContext::new().with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });

        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, ConnectorError>(())
            })
            .await;

        canceller.await.unwrap();
        assert!(matches!(result, Err(ConnectorError::Cancelled)));
    }

    #[tokio::test]
    async fn test_run_deadline_exceeded() {
        let ctx = ExecutionContext::new().with_timeout(Duration::from_millis(20));

        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, ConnectorError>(())
            })
            .await;

        assert!(matches!(result, Err(ConnectorError::Timeout)));
    }

    #[tokio::test]
    async fn test_static_authentication_lookup() {
        let id = Uuid::new_v4();
        let mut details = AuthenticationMap::new();
        details.insert("Host".into(), "acme.snowflakecomputing.com".into());

        let provider = StaticAuthentication::new().with_connection(id, details);
        assert_eq!(provider.len(), 1);

        let ctx = ExecutionContext::new();
        let found = provider.authentication_details(&ctx, id).await.unwrap();
        assert_eq!(found["Host"], "acme.snowflakecomputing.com");

        let missing = provider.authentication_details(&ctx, Uuid::new_v4()).await;
        assert!(matches!(missing, Err(ConnectorError::UnknownConnection(_))));
    }
}
