//! The realtime-socket transport seam.
//!
//! The connection manager only needs a way to open an authenticated frame
//! pipe; [`Transport`] is that seam. Production code uses
//! [`WebSocketTransport`] (tokio-tungstenite against the fixed Replit
//! endpoint); tests inject scripted in-memory sockets.

use std::pin::Pin;

use futures_util::future::BoxFuture;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::COOKIE;
use tokio_tungstenite::tungstenite::protocol::Message;

use crate::auth::SessionToken;
use crate::error::{ReplitLinkError, Result};
use crate::REPLIT_DOMAIN;

/// Path of the realtime endpoint on the fixed Replit domain.
pub(crate) const SUBSCRIPTIONS_PATH: &str = "/graphql_subscriptions";

/// Outbound half of a realtime socket.
pub type FrameSink = Pin<Box<dyn Sink<Message, Error = ReplitLinkError> + Send>>;

/// Inbound half of a realtime socket.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Message>> + Send>>;

/// An open realtime socket, split into its two directions.
pub struct RealtimeSocket {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

impl RealtimeSocket {
    /// Box up a sink/stream pair into a socket handle.
    pub fn new(
        sink: impl Sink<Message, Error = ReplitLinkError> + Send + 'static,
        stream: impl Stream<Item = Result<Message>> + Send + 'static,
    ) -> Self {
        Self {
            sink: Box::pin(sink),
            stream: Box::pin(stream),
        }
    }
}

/// Opens authenticated realtime sockets.
pub trait Transport: Send + Sync {
    /// Attempt to open one socket. Each call is one connection attempt; the
    /// connection manager decides when and how often to call it.
    fn open(&self) -> BoxFuture<'static, Result<RealtimeSocket>>;
}

/// Production transport: WebSocket upgrade against
/// `wss://replit.com/graphql_subscriptions`, authenticated with the
/// `connect.sid` session cookie.
pub struct WebSocketTransport {
    token: SessionToken,
}

impl WebSocketTransport {
    pub fn new(token: SessionToken) -> Self {
        Self { token }
    }
}

impl Transport for WebSocketTransport {
    fn open(&self) -> BoxFuture<'static, Result<RealtimeSocket>> {
        let token = self.token.clone();
        Box::pin(async move {
            let url = format!("wss://{}{}", REPLIT_DOMAIN, SUBSCRIPTIONS_PATH);
            let mut request = url.into_client_request().map_err(|e| {
                ReplitLinkError::WebSocket(format!("Failed to build WebSocket request: {}", e))
            })?;
            request.headers_mut().insert(COOKIE, token.ws_cookie_value()?);

            let (ws_stream, _response) = connect_async(request)
                .await
                .map_err(|e| ReplitLinkError::WebSocket(format!("Connection failed: {}", e)))?;

            let (sink, stream) = ws_stream.split();
            Ok(RealtimeSocket::new(
                sink.sink_map_err(|e| ReplitLinkError::WebSocket(e.to_string())),
                stream.map(|frame| {
                    frame.map_err(|e| ReplitLinkError::WebSocket(e.to_string()))
                }),
            ))
        })
    }
}
