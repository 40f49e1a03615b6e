//! WebSocket listener and connection built on `tokio-tungstenite`.

use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{
    Request, Response,
};

use crate::{ConnectionId, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type WsStream = WebSocketStream<TcpStream>;

/// What the client asked for in the HTTP upgrade request.
///
/// Captured once during the handshake; this is the only HTTP state the
/// rest of the server ever sees.
#[derive(Debug, Clone)]
pub struct ConnectRequest {
    /// The request-URI path, e.g. `/queue` or `/room/a1B2c3D4e5F6g7H8`.
    pub path: String,
    /// The raw `Authorization` header value, if any.
    pub authorization: Option<String>,
}

/// Listens for incoming WebSocket connections.
pub struct WsListener {
    listener: TcpListener,
}

impl WsListener {
    /// Binds a listener to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self { listener })
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Waits for and accepts the next incoming connection, capturing the
    /// upgrade request's path and `Authorization` header on the way.
    pub async fn accept(&mut self) -> Result<WsConnection, TransportError> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let mut request = ConnectRequest {
            path: String::new(),
            authorization: None,
        };
        let ws = tokio_tungstenite::accept_hdr_async(
            stream,
            |req: &Request, resp: Response| {
                request.path = req.uri().path().to_string();
                request.authorization = req
                    .headers()
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                Ok(resp)
            },
        )
        .await
        .map_err(|e| {
            TransportError::AcceptFailed(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                e,
            ))
        })?;

        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        tracing::debug!(%id, %addr, path = %request.path, "accepted WebSocket connection");

        // Sink and stream halves are locked independently: the handler
        // task must be able to push an outbound event while its recv
        // future is parked waiting for the next inbound frame.
        let (sink, stream) = ws.split();
        Ok(WsConnection {
            id,
            request,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        })
    }
}

/// A single accepted connection carrying JSON text frames.
pub struct WsConnection {
    id: ConnectionId,
    request: ConnectRequest,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
}

impl WsConnection {
    /// Sends one text frame to the client.
    pub async fn send(&self, text: &str) -> Result<(), TransportError> {
        self.sink
            .lock()
            .await
            .send(Message::text(text.to_string()))
            .await
            .map_err(|e| {
                TransportError::SendFailed(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    e,
                ))
            })
    }

    /// Receives the next text frame from the client.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed. Binary
    /// frames are accepted if they hold valid UTF-8; ping/pong frames are
    /// skipped.
    pub async fn recv(&self) -> Result<Option<String>, TransportError> {
        loop {
            let msg = self.stream.lock().await.next().await;
            match msg {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_str().to_string()));
                }
                Some(Ok(Message::Binary(data))) => {
                    match String::from_utf8(data.to_vec()) {
                        Ok(text) => return Ok(Some(text)),
                        Err(_) => continue,
                    }
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // ping/pong/frame
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(
                        std::io::Error::new(
                            std::io::ErrorKind::ConnectionReset,
                            e,
                        ),
                    ));
                }
            }
        }
    }

    /// Closes the connection.
    pub async fn close(&self) -> Result<(), TransportError> {
        self.sink.lock().await.close().await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    /// Returns the unique identifier for this connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns what the client asked for at upgrade time.
    pub fn request(&self) -> &ConnectRequest {
        &self.request
    }
}
