//! Connection providers.
//!
//! A provider is a named factory bound to one source of connections. The
//! pool consumes providers most-recently-added-first and permanently drops
//! any provider that signals exhaustion. [`ServerProvider`] dials one
//! static server address; discovery-based providers can be added through
//! the same trait without touching the pool's selection algorithm.

use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;

use crate::connection::Connection;

/// A factory yielding at most one usable connection per call.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Short name identifying this provider in logs.
    fn name(&self) -> String;

    /// Yield a connection, or `None` when no connection is available from
    /// this source at this time.
    async fn connect(&self) -> Option<Connection>;
}

/// Provider bound to one backend server address.
#[derive(Debug, Clone)]
pub struct ServerProvider {
    host: String,
    port: u16,
    connect_timeout: Duration,
}

impl ServerProvider {
    /// Default dial timeout.
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a provider for `host:port`.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Override the dial timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

#[async_trait]
impl ConnectionProvider for ServerProvider {
    fn name(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    async fn connect(&self) -> Option<Connection> {
        let dial = TcpStream::connect((self.host.as_str(), self.port));
        match tokio::time::timeout(self.connect_timeout, dial).await {
            Ok(Ok(stream)) => {
                // Request/response round trips suffer under Nagle
                let _ = stream.set_nodelay(true);
                tracing::debug!(server = %self.name(), "connected");
                Some(Connection::new(Box::new(stream), false))
            }
            Ok(Err(err)) => {
                tracing::warn!(server = %self.name(), error = %err, "connect failed");
                None
            }
            Err(_) => {
                tracing::warn!(
                    server = %self.name(),
                    timeout_ms = self.connect_timeout.as_millis() as u64,
                    "connect timed out"
                );
                None
            }
        }
    }
}
