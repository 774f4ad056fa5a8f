//! A single pooled connection and its setup exchanges.

use std::sync::atomic::{AtomicU64, Ordering};

use gridstore_codec::{Transport, read_frame, write_frame};
use gridstore_protocol::{AuthenticationRequest, HandshakeRequest, Message};
use tokio::io::AsyncWriteExt;

use crate::error::PoolError;

// Log-correlation ids only; no behavior depends on them.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Pool-wide credentials for per-acquisition authentication.
#[derive(Clone)]
pub struct Credentials {
    /// Username presented to the server.
    pub username: String,
    /// Password presented to the server.
    pub password: String,
}

impl Credentials {
    /// Create a credential pair.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One transport plus its setup state.
///
/// Handshake and authentication are idempotent per connection: completion
/// is recorded and later invocations are no-ops, so pre-established
/// connections registered via
/// [`Pool::add_connection`](crate::Pool::add_connection) are never
/// re-negotiated.
pub struct Connection {
    id: u64,
    transport: Box<dyn Transport>,
    handshake_done: bool,
    authentication_done: bool,
}

impl Connection {
    /// Wrap a transport.
    ///
    /// `handshake_done` marks a transport whose version exchange already
    /// happened elsewhere.
    pub fn new(transport: Box<dyn Transport>, handshake_done: bool) -> Self {
        Self {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            transport,
            handshake_done,
            authentication_done: false,
        }
    }

    /// Log-correlation id of this connection.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Mutable access to the underlying transport.
    pub fn transport_mut(&mut self) -> &mut Box<dyn Transport> {
        &mut self.transport
    }

    /// Perform the protocol version exchange. No-op when already done.
    pub(crate) async fn handshake(&mut self) -> Result<(), PoolError> {
        if self.handshake_done {
            return Ok(());
        }

        let request = Message::HandshakeRequest(HandshakeRequest::default());
        write_frame(&mut self.transport, &request.encode()).await?;
        let payload = read_frame(&mut self.transport).await?;

        match Message::decode(payload)? {
            Message::HandshakeResponse(response) if response.accepted => {
                self.handshake_done = true;
                tracing::debug!(
                    connection = self.id,
                    server_major = response.server_major,
                    server_minor = response.server_minor,
                    "handshake complete"
                );
                Ok(())
            }
            Message::HandshakeResponse(response) => Err(PoolError::HandshakeRejected {
                server_major: response.server_major,
                server_minor: response.server_minor,
            }),
            Message::ErrorResponse { error } => Err(PoolError::SetupRefused(error)),
            other => Err(PoolError::UnexpectedSetupResponse(other.kind())),
        }
    }

    /// Present credentials. No-op when this connection already
    /// authenticated.
    pub(crate) async fn authenticate(&mut self, credentials: &Credentials) -> Result<(), PoolError> {
        if self.authentication_done {
            return Ok(());
        }

        let request = Message::AuthenticationRequest(AuthenticationRequest {
            username: credentials.username.clone(),
            password: credentials.password.clone(),
        });
        write_frame(&mut self.transport, &request.encode()).await?;
        let payload = read_frame(&mut self.transport).await?;

        match Message::decode(payload)? {
            Message::AuthenticationResponse(response) if response.authenticated => {
                self.authentication_done = true;
                tracing::debug!(connection = self.id, "authentication complete");
                Ok(())
            }
            Message::AuthenticationResponse(_) => Err(PoolError::AuthenticationFailed(
                "credentials rejected".to_string(),
            )),
            Message::ErrorResponse { error } => {
                Err(PoolError::AuthenticationFailed(error.to_string()))
            }
            other => Err(PoolError::UnexpectedSetupResponse(other.kind())),
        }
    }

    /// Close the transport. Close errors are swallowed: the connection is
    /// unusable regardless.
    pub(crate) async fn close(mut self) {
        let _ = self.transport.shutdown().await;
        tracing::debug!(connection = self.id, "connection closed");
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("handshake_done", &self.handshake_done)
            .field("authentication_done", &self.authentication_done)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use gridstore_protocol::{AuthenticationResponse, HandshakeResponse};

    use super::*;

    /// Serve one setup exchange on the far end of a duplex pipe.
    async fn answer_with(server: &mut (impl Transport), response: Message) {
        let _request = read_frame(server).await.expect("server read");
        write_frame(server, &response.encode())
            .await
            .expect("server write");
    }

    #[tokio::test]
    async fn test_handshake_accepted_and_idempotent() {
        let (client, mut server) = tokio::io::duplex(1024);
        let mut connection = Connection::new(Box::new(client), false);

        let server_task = tokio::spawn(async move {
            answer_with(
                &mut server,
                Message::HandshakeResponse(HandshakeResponse {
                    accepted: true,
                    server_major: 1,
                    server_minor: 1,
                }),
            )
            .await;
        });

        connection.handshake().await.expect("handshake");
        server_task.await.expect("server task");

        // Second call must not touch the wire; the server is gone.
        connection.handshake().await.expect("idempotent handshake");
    }

    #[tokio::test]
    async fn test_handshake_rejection_reports_server_version() {
        let (client, mut server) = tokio::io::duplex(1024);
        let mut connection = Connection::new(Box::new(client), false);

        tokio::spawn(async move {
            answer_with(
                &mut server,
                Message::HandshakeResponse(HandshakeResponse {
                    accepted: false,
                    server_major: 2,
                    server_minor: 0,
                }),
            )
            .await;
        });

        let err = connection.handshake().await.expect_err("rejected");
        assert!(matches!(
            err,
            PoolError::HandshakeRejected {
                server_major: 2,
                server_minor: 0
            }
        ));
    }

    #[tokio::test]
    async fn test_authentication_rejection() {
        let (client, mut server) = tokio::io::duplex(1024);
        let mut connection = Connection::new(Box::new(client), true);

        tokio::spawn(async move {
            answer_with(
                &mut server,
                Message::AuthenticationResponse(AuthenticationResponse {
                    authenticated: false,
                }),
            )
            .await;
        });

        let credentials = Credentials::new("admin", "wrong");
        let err = connection
            .authenticate(&credentials)
            .await
            .expect_err("rejected");
        assert!(matches!(err, PoolError::AuthenticationFailed(_)));
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = Credentials::new("admin", "hunter2");
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
    }
}
