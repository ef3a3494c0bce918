//! Shared helpers for integration tests: a scripted in-memory transport so
//! connection, replay, and dispatch behaviour can be exercised without a
//! network.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::Sink;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::Message;

use replit_link::{RealtimeSocket, ReplitLinkError, Result, Transport};

/// Sink half of a scripted socket: records every outbound frame.
struct CaptureSink {
    sent: Arc<Mutex<Vec<Message>>>,
}

impl Sink<Message> for CaptureSink {
    type Error = ReplitLinkError;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn start_send(self: Pin<&mut Self>, item: Message) -> Result<()> {
        self.sent.lock().unwrap().push(item);
        Ok(())
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Test-side handle to one scripted socket.
pub struct SocketHandle {
    sent: Arc<Mutex<Vec<Message>>>,
    inbound: Option<mpsc::UnboundedSender<Result<Message>>>,
}

impl SocketHandle {
    /// Every text frame the client has sent on this socket, in order.
    pub fn sent_texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|msg| match msg {
                Message::Text(text) => Some(text.to_string()),
                _ => None,
            })
            .collect()
    }

    /// Sent text frames parsed as JSON values.
    pub fn sent_json(&self) -> Vec<serde_json::Value> {
        self.sent_texts()
            .iter()
            .map(|text| serde_json::from_str(text).expect("client sent invalid JSON"))
            .collect()
    }

    /// Deliver a text frame to the client.
    pub fn push_text(&self, text: &str) {
        self.inbound
            .as_ref()
            .expect("socket already disconnected")
            .send(Ok(Message::Text(text.to_string().into())))
            .expect("client stream dropped");
    }

    /// End the inbound stream, simulating the connection dropping.
    pub fn disconnect(&mut self) {
        self.inbound.take();
    }

    /// Wait until the client has sent at least `n` text frames.
    pub async fn wait_for_frames(&self, n: usize) {
        let sent = Arc::clone(&self.sent);
        wait_until(move || {
            sent.lock()
                .unwrap()
                .iter()
                .filter(|msg| matches!(msg, Message::Text(_)))
                .count()
                >= n
        })
        .await;
    }
}

enum Script {
    Failure,
    Socket(RealtimeSocket),
}

/// A [`Transport`] serving pre-scripted connection outcomes.
///
/// Each `open` call consumes the next scripted outcome; when none is queued
/// the attempt blocks until one is scripted, so tests control exactly when
/// connections come up.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    scripts: Arc<Mutex<VecDeque<Script>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        Self::default()
    }

    /// Script one failing connection attempt.
    pub fn script_failure(&self) {
        self.scripts.lock().unwrap().push_back(Script::Failure);
    }

    /// Script one successful connection and return its test-side handle.
    pub fn script_socket(&self) -> SocketHandle {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel::<Result<Message>>();

        let sink = CaptureSink {
            sent: Arc::clone(&sent),
        };
        let stream = futures_util::stream::poll_fn(move |cx| inbound_rx.poll_recv(cx));

        self.scripts
            .lock()
            .unwrap()
            .push_back(Script::Socket(RealtimeSocket::new(sink, stream)));

        SocketHandle {
            sent,
            inbound: Some(inbound_tx),
        }
    }
}

impl Transport for ScriptedTransport {
    fn open(&self) -> BoxFuture<'static, Result<RealtimeSocket>> {
        let scripts = Arc::clone(&self.scripts);
        Box::pin(async move {
            loop {
                let script = scripts.lock().unwrap().pop_front();
                match script {
                    Some(Script::Failure) => {
                        return Err(ReplitLinkError::WebSocket("scripted failure".into()));
                    }
                    Some(Script::Socket(socket)) => return Ok(socket),
                    None => tokio::time::sleep(Duration::from_millis(5)).await,
                }
            }
        })
    }
}

/// Poll `cond` until it holds, panicking after two seconds.
pub async fn wait_until(cond: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !cond() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within 2s"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
