//! `Server` builder and accept loop.
//!
//! This is the entry point for running a Skirmish server. It ties the
//! layers together: transport → protocol → session → queue/room.

use std::sync::Arc;

use skirmish_protocol::{Codec, JsonCodec};
use skirmish_queue::{DeckProvider, MatchQueue};
use skirmish_room::Registry;
use skirmish_session::Authenticator;
use skirmish_transport::WsListener;
use tokio::sync::Mutex;

use crate::SkirmishError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The queue
/// and registry are the two single-writer stores of the system; each is
/// serialized behind its own `Mutex`, and every mutation happens in one
/// synchronous critical section — that is what makes room creation and
/// move application atomic.
pub struct ServerState<A, D, C> {
    pub(crate) queue: Mutex<MatchQueue>,
    pub(crate) registry: Mutex<Registry>,
    pub(crate) auth: A,
    pub(crate) decks: D,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Skirmish server.
///
/// # Example
///
/// ```rust,ignore
/// let server = Server::builder()
///     .bind("0.0.0.0:8080")
///     .build(my_auth, my_decks)
///     .await?;
/// server.run().await
/// ```
pub struct ServerBuilder {
    bind_addr: String,
}

impl ServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Builds the server with the given authenticator and deck provider.
    ///
    /// Uses [`JsonCodec`] — the only codec the browser client speaks.
    pub async fn build<A: Authenticator, D: DeckProvider>(
        self,
        auth: A,
        decks: D,
    ) -> Result<Server<A, D, JsonCodec>, SkirmishError> {
        let listener = WsListener::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            queue: Mutex::new(MatchQueue::new()),
            registry: Mutex::new(Registry::new()),
            auth,
            decks,
            codec: JsonCodec,
        });

        Ok(Server { listener, state })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Skirmish server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct Server<A, D, C> {
    listener: WsListener,
    state: Arc<ServerState<A, D, C>>,
}

impl<A, D, C> Server<A, D, C>
where
    A: Authenticator,
    D: DeckProvider,
    C: Codec,
{
    /// Creates a new builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns one handler task per
    /// connection. Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), SkirmishError> {
        tracing::info!("Skirmish server running");

        loop {
            match self.listener.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(conn, state).await
                        {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
