//! `DuelhallServer` builder and accept loop.
//!
//! This is the entry point for running a Duelhall server. It ties the
//! layers together: transport → protocol → session.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use duelhall_protocol::{JsonCodec, TerminationReason};
use duelhall_session::{GameRules, SessionConfig, SessionManager};
use duelhall_transport::{Transport, WebSocketTransport};
use serde::{Deserialize, Serialize};

use crate::DuelhallError;
use crate::handler::handle_connection;

/// How long a connection may stay silent before it is dropped. Clients
/// are expected to heartbeat well inside this.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// A connection that sends nothing for this long is closed and its
    /// participant moves to the reconnection ledger.
    pub idle_timeout: Duration,
    /// Applied to every session the server creates.
    pub session: SessionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            session: SessionConfig::default(),
        }
    }
}

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<R: GameRules> {
    pub(crate) sessions: SessionManager<R>,
    pub(crate) codec: JsonCodec,
    pub(crate) idle_timeout: Duration,
}

/// Builder for configuring and starting a Duelhall server.
///
/// # Example
///
/// ```rust,ignore
/// use duelhall::prelude::*;
///
/// let server = DuelhallServer::builder()
///     .bind("0.0.0.0:8080")
///     .idle_timeout(Duration::from_secs(60))
///     .build::<MyRules>()
///     .await?;
/// server.run().await
/// ```
pub struct DuelhallServerBuilder {
    config: ServerConfig,
}

impl DuelhallServerBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Starts from a complete configuration, e.g. one read from a file.
    pub fn from_config(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Sets the configuration every new session is created with.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    /// Binds the listener and builds the server.
    ///
    /// Uses `JsonCodec` over `WebSocketTransport`.
    pub async fn build<R: GameRules>(self) -> Result<DuelhallServer<R>, DuelhallError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;

        let state = Arc::new(ServerState {
            sessions: SessionManager::new(self.config.session),
            codec: JsonCodec,
            idle_timeout: self.config.idle_timeout,
        });

        Ok(DuelhallServer { transport, state })
    }
}

impl Default for DuelhallServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A Duelhall server bound to its listener.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct DuelhallServer<R: GameRules> {
    transport: WebSocketTransport,
    state: Arc<ServerState<R>>,
}

impl<R: GameRules> DuelhallServer<R> {
    /// Creates a new builder.
    pub fn builder() -> DuelhallServerBuilder {
        DuelhallServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, DuelhallError> {
        Ok(self.transport.local_addr()?)
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), DuelhallError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` resolves, then terminates
    /// every session with [`TerminationReason::Shutdown`].
    ///
    /// ```rust,ignore
    /// server.run_until(async { let _ = tokio::signal::ctrl_c().await; }).await?;
    /// ```
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), DuelhallError> {
        tracing::info!(addr = ?self.transport.local_addr().ok(), "Duelhall server running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) if e.is_per_client() => {
                        tracing::debug!(error = %e, "rejected incoming connection");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        tracing::info!("shutting down");
        self.state
            .sessions
            .terminate_all(TerminationReason::Shutdown)
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default_values() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.idle_timeout, DEFAULT_IDLE_TIMEOUT);
        assert_eq!(config.session, SessionConfig::default());
    }

    #[test]
    fn test_builder_setters_override_defaults() {
        let builder = DuelhallServerBuilder::new()
            .bind("0.0.0.0:9000")
            .idle_timeout(Duration::from_secs(5))
            .session_config(SessionConfig::default().named("Finals"));

        assert_eq!(builder.config.bind_addr, "0.0.0.0:9000");
        assert_eq!(builder.config.idle_timeout, Duration::from_secs(5));
        assert_eq!(builder.config.session.name.as_deref(), Some("Finals"));
    }
}
