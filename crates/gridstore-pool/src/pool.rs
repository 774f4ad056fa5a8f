//! The connection pool.

use std::sync::Arc;

use gridstore_codec::Transport;
use tokio::sync::Mutex;

use crate::connection::{Connection, Credentials};
use crate::error::PoolError;
use crate::metrics::{ConnectionMetrics, MetricsSink};
use crate::provider::{ConnectionProvider, ServerProvider};

/// A shared pool of authenticated connections to one or more servers.
///
/// All membership mutation (the idle list, the provider list, credential
/// changes) happens under one pool-wide async mutex. Handshake and
/// authentication for a connection being checked out run under that same
/// lock, serializing setup across concurrent callers (see the crate docs
/// for the trade-off).
pub struct Pool {
    state: Mutex<PoolState>,
    metrics: Arc<dyn MetricsSink>,
}

struct PoolState {
    /// Idle connections, most recently returned or added at the tail.
    idle: Vec<Connection>,
    /// Providers, most recently added at the tail.
    providers: Vec<Box<dyn ConnectionProvider>>,
    credentials: Option<Credentials>,
}

/// An exclusive checkout of one connection.
///
/// The caller must hand it back through exactly one of
/// [`Pool::return_connection`] or [`Pool::discard_connection`] per
/// successful [`Pool::get_connection`].
pub struct PooledConnection {
    connection: Connection,
}

impl PooledConnection {
    /// Log-correlation id of the checked-out connection.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.connection.id()
    }

    /// Mutable access to the underlying transport.
    pub fn transport_mut(&mut self) -> &mut Box<dyn Transport> {
        self.connection.transport_mut()
    }
}

impl std::fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("connection", &self.connection)
            .finish()
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}

impl Pool {
    /// Create an empty pool with the default metrics sink.
    #[must_use]
    pub fn new() -> Self {
        Self::with_metrics(ConnectionMetrics::new())
    }

    /// Create an empty pool reporting to the given sink.
    pub fn with_metrics(metrics: Arc<dyn MetricsSink>) -> Self {
        Self {
            state: Mutex::new(PoolState {
                idle: Vec::new(),
                providers: Vec::new(),
                credentials: None,
            }),
            metrics,
        }
    }

    /// The sink this pool reports to.
    #[must_use]
    pub fn metrics(&self) -> &Arc<dyn MetricsSink> {
        &self.metrics
    }

    /// Register a pre-established transport directly into the idle list.
    ///
    /// Bypasses the providers and does not count as a created connection.
    pub async fn add_connection(&self, transport: Box<dyn Transport>, handshake_done: bool) {
        let connection = Connection::new(transport, handshake_done);
        tracing::debug!(connection = connection.id(), "pre-established connection added");
        self.state.lock().await.idle.push(connection);
    }

    /// Append a provider dialing the given server address.
    pub async fn add_server(&self, host: impl Into<String>, port: u16) {
        self.add_provider(Box::new(ServerProvider::new(host, port)))
            .await;
    }

    /// Append a custom connection provider.
    pub async fn add_provider(&self, provider: Box<dyn ConnectionProvider>) {
        tracing::debug!(provider = %provider.name(), "provider added");
        self.state.lock().await.providers.push(provider);
    }

    /// Locator-based discovery is not implemented.
    ///
    /// Kept as an explicit extension point: a discovery-backed
    /// [`ConnectionProvider`] can be registered through
    /// [`add_provider`](Self::add_provider) without changing the pool's
    /// selection algorithm.
    pub fn add_locator(&self, _host: &str, _port: u16) -> Result<(), PoolError> {
        Err(PoolError::LocatorsUnsupported)
    }

    /// Store pool-wide credentials and enable authentication for all
    /// subsequently obtained connections.
    pub async fn add_credentials(
        &self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) {
        let mut state = self.state.lock().await;
        state.credentials = Some(Credentials::new(username, password));
    }

    /// Acquire an exclusive connection.
    ///
    /// Selection order: the most recently returned or added idle
    /// connection first; otherwise providers are asked
    /// most-recently-added-first, and a provider that yields nothing is
    /// permanently removed. The selected connection completes its
    /// handshake and (when credentials are configured) authentication
    /// before being handed out; failures there discard it and propagate.
    pub async fn get_connection(&self) -> Result<PooledConnection, PoolError> {
        let mut state = self.state.lock().await;

        let mut connection = match state.idle.pop() {
            Some(connection) => connection,
            None => {
                let mut created = None;
                while let Some(provider) = state.providers.last() {
                    if let Some(connection) = provider.connect().await {
                        created = Some(connection);
                        break;
                    }
                    if let Some(dead) = state.providers.pop() {
                        tracing::warn!(provider = %dead.name(), "provider exhausted, removed");
                    }
                }
                match created {
                    Some(connection) => {
                        self.metrics.connection_created();
                        connection
                    }
                    None => return Err(PoolError::ConnectionUnavailable),
                }
            }
        };

        if let Err(err) = connection.handshake().await {
            tracing::warn!(connection = connection.id(), error = %err, "handshake failed");
            self.metrics.connection_discarded();
            connection.close().await;
            return Err(err);
        }

        if let Some(credentials) = state.credentials.clone() {
            if let Err(err) = connection.authenticate(&credentials).await {
                tracing::warn!(connection = connection.id(), error = %err, "authentication failed");
                self.metrics.connection_discarded();
                connection.close().await;
                return Err(err);
            }
        }

        self.metrics.checkout_started();
        tracing::trace!(connection = connection.id(), "connection checked out");
        Ok(PooledConnection { connection })
    }

    /// Return a checked-out connection to the idle list.
    pub async fn return_connection(&self, checkout: PooledConnection) {
        let mut state = self.state.lock().await;
        tracing::trace!(connection = checkout.id(), "connection returned");
        state.idle.push(checkout.connection);
        self.metrics.checkout_ended();
    }

    /// Remove a checked-out connection from the pool and close its
    /// transport unconditionally.
    pub async fn discard_connection(&self, checkout: PooledConnection) {
        tracing::debug!(connection = checkout.id(), "connection discarded");
        checkout.connection.close().await;
        self.metrics.checkout_ended();
        self.metrics.connection_discarded();
    }

    /// Number of idle connections currently pooled.
    pub async fn idle_count(&self) -> usize {
        self.state.lock().await.idle.len()
    }

    /// Number of registered providers remaining.
    pub async fn provider_count(&self) -> usize {
        self.state.lock().await.providers.len()
    }
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool").finish_non_exhaustive()
    }
}
