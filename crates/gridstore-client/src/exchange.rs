//! The message-exchange engine.
//!
//! Executes one logical operation (a single schema-encoded request)
//! against the cluster: acquire a connection, write the framed request in
//! one call, read the full framed response, decode it. Transient transport
//! failures (a write-phase socket error, or end-of-stream while reading)
//! discard the failing connection and restart the whole operation on a
//! fresh one, up to a bounded retry budget. Everything else is fatal: the
//! connection is discarded and the error propagates.

use std::sync::Arc;
use std::time::Duration;

use gridstore_codec::{read_frame, write_frame};
use gridstore_pool::{Pool, PooledConnection};
use gridstore_protocol::Message;

use crate::error::Error;

/// Bounds and paces whole-operation retries on transient transport
/// failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first, each on a fresh connection.
    pub max_retries: u32,
    /// Fixed pause before each retry.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    /// Override the retry budget.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Override the pause before each retry.
    #[must_use]
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }
}

pub(crate) struct Exchange {
    pool: Arc<Pool>,
    retry: RetryPolicy,
}

impl Exchange {
    pub(crate) fn new(pool: Arc<Pool>, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }

    /// Execute one request/response operation, retrying transparently on
    /// transient transport failure.
    pub(crate) async fn execute(&self, request: &Message) -> Result<Message, Error> {
        let mut attempt: u32 = 0;

        loop {
            // Acquisition failure is fatal; there is nothing to retry onto.
            let mut checkout = self.pool.get_connection().await?;
            let connection = checkout.id();

            match Self::round_trip(&mut checkout, request).await {
                Ok(response) => {
                    self.pool.return_connection(checkout).await;
                    return Ok(response);
                }
                Err(err) => {
                    self.pool.discard_connection(checkout).await;
                    if err.is_retryable() && attempt < self.retry.max_retries {
                        attempt += 1;
                        tracing::debug!(
                            connection,
                            attempt,
                            max_retries = self.retry.max_retries,
                            error = %err,
                            "transient transport failure; retrying on a fresh connection"
                        );
                        if !self.retry.backoff.is_zero() {
                            tokio::time::sleep(self.retry.backoff).await;
                        }
                        continue;
                    }
                    return Err(err);
                }
            }
        }
    }

    async fn round_trip(
        checkout: &mut PooledConnection,
        request: &Message,
    ) -> Result<Message, Error> {
        let payload = request.encode();
        write_frame(checkout.transport_mut(), &payload).await?;

        let frame = read_frame(checkout.transport_mut()).await?;
        match Message::decode(frame)? {
            Message::ErrorResponse { error } => Err(Error::Server(error)),
            response => Ok(response),
        }
    }
}
