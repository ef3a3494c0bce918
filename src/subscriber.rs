//! The realtime subscriber: public handle over the connection manager.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::auth::SessionToken;
use crate::connection::{connection_task, Cmd};
use crate::error::{ReplitLinkError, Result};
use crate::models::ClientFrame;
use crate::registry::SubscriptionRegistry;
use crate::retry::{ImmediateRetry, RetryPolicy};
use crate::transport::{Transport, WebSocketTransport};
use crate::SubscriptionId;

/// A client that continually maintains the realtime connection to Replit.
///
/// One `Subscriber` owns one multiplexed socket. Registering a subscription
/// provides no guarantee that the request has reached Replit; the record is
/// stored locally and sent immediately if a connection is active, and on
/// every newly established connection after that. Whenever the socket closes
/// or fails, the subscriber reconnects and replays all live subscriptions,
/// forever, until the `Subscriber` is dropped.
///
/// # Examples
///
/// ```rust,no_run
/// use replit_link::Subscriber;
///
/// # async fn example() {
/// let subscriber = Subscriber::new("s%3A...");
///
/// let id = subscriber.subscribe(
///     "subscription { installEvents { message } }",
///     None,
///     |id, data| println!("[{}] {}", id, data),
/// );
///
/// // ... later
/// subscriber.unsubscribe(id);
/// # }
/// ```
pub struct Subscriber {
    registry: Arc<Mutex<SubscriptionRegistry>>,
    cmd_tx: mpsc::UnboundedSender<Cmd>,
    connected: Arc<AtomicBool>,
    _task: JoinHandle<()>,
}

impl Subscriber {
    /// Create a subscriber authenticated with the given `connect.sid` token.
    ///
    /// Must be called within a tokio runtime; the connection manager runs as
    /// a background task and starts connecting immediately.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_session(SessionToken::new(token))
    }

    /// Create a subscriber from an existing session, sharing a
    /// [`ReplitClient`](crate::ReplitClient)'s credentials.
    pub(crate) fn with_session(token: SessionToken) -> Self {
        Self::spawn(
            Arc::new(WebSocketTransport::new(token)),
            Box::new(ImmediateRetry),
        )
    }

    /// Create a builder for custom configuration.
    pub fn builder() -> SubscriberBuilder {
        SubscriberBuilder::new()
    }

    fn spawn(transport: Arc<dyn Transport>, retry: Box<dyn RetryPolicy>) -> Self {
        let registry = Arc::new(Mutex::new(SubscriptionRegistry::new()));
        let connected = Arc::new(AtomicBool::new(false));
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(connection_task(
            cmd_rx,
            transport,
            Arc::clone(&registry),
            retry,
            Arc::clone(&connected),
        ));

        Self {
            registry,
            cmd_tx,
            connected,
            _task: task,
        }
    }

    /// Register a subscription and return its ID.
    ///
    /// The handler is invoked with `(id, payload.data)` for every `data`
    /// frame addressed to this subscription. It runs synchronously on the
    /// shared dispatch path and must not block; any context it needs should
    /// be captured in the closure.
    ///
    /// Returns unconditionally; a send failure is not reported here. The
    /// registry record, not any acknowledgement, is the source of truth:
    /// if the frame is lost with the connection it is replayed on the next
    /// one, as long as the record is still live.
    pub fn subscribe<F>(&self, query: &str, variables: Option<JsonValue>, handler: F) -> SubscriptionId
    where
        F: Fn(SubscriptionId, JsonValue) + Send + Sync + 'static,
    {
        let id = {
            let mut registry = self.registry.lock().unwrap();
            registry.register(Arc::new(handler), |id| {
                ClientFrame::start(id, query, variables)
            })
        };
        // Enqueued unconditionally: the connection task drops it while
        // disconnected (the next replay covers the record) and skips it when
        // the current socket's replay already included this ID.
        let _ = self.cmd_tx.send(Cmd::Start(id));
        id
    }

    /// Register a subscription whose handler receives deserialized events.
    ///
    /// Each `payload.data` value is fed through
    /// [`serde_json::from_value::<T>`] and the handler receives the
    /// deserializer's own `Result`; no recovery is added here.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use serde::Deserialize;
    /// use replit_link::Subscriber;
    ///
    /// #[derive(Deserialize)]
    /// struct InstallEvent {
    ///     message: String,
    /// }
    ///
    /// # async fn example(subscriber: Subscriber) {
    /// subscriber.subscribe_json::<InstallEvent, _>(
    ///     "subscription { installEvents { message } }",
    ///     None,
    ///     |_, event| {
    ///         if let Ok(event) = event {
    ///             println!("{}", event.message);
    ///         }
    ///     },
    /// );
    /// # }
    /// ```
    pub fn subscribe_json<T, F>(
        &self,
        query: &str,
        variables: Option<JsonValue>,
        handler: F,
    ) -> SubscriptionId
    where
        T: DeserializeOwned,
        F: Fn(SubscriptionId, serde_json::Result<T>) + Send + Sync + 'static,
    {
        self.subscribe(query, variables, move |id, data| {
            handler(id, serde_json::from_value::<T>(data))
        })
    }

    /// Cancel a subscription.
    ///
    /// Once the record is tombstoned, no new handler invocation begins for
    /// `id`; frames still in flight find no handler. One invocation that the
    /// dispatcher picked up concurrently may still be completing when this
    /// returns. A `stop` frame is sent only when the record was live and a
    /// connection exists; unknown or already-cancelled IDs are a complete
    /// no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let was_live = self.registry.lock().unwrap().cancel(id);
        if was_live && self.is_connected() {
            let _ = self.cmd_tx.send(Cmd::Stop(id));
        }
    }

    /// Whether a live socket currently exists.
    ///
    /// Purely informational: there is no "connecting" state, and a `false`
    /// here only means the subscriber is between connections.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Shut the subscriber down.
    ///
    /// Releases the socket and stops reconnecting. Queued sends are dropped
    /// and no `stop` frames are sent for remaining subscriptions. Also runs
    /// on `Drop`; safe to call more than once.
    pub fn close(&self) {
        let _ = self.cmd_tx.send(Cmd::Shutdown);
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(Cmd::Shutdown);
    }
}

/// Builder for configuring [`Subscriber`] instances.
pub struct SubscriberBuilder {
    token: Option<SessionToken>,
    transport: Option<Arc<dyn Transport>>,
    retry: Option<Box<dyn RetryPolicy>>,
}

impl SubscriberBuilder {
    fn new() -> Self {
        Self {
            token: None,
            transport: None,
            retry: None,
        }
    }

    /// Authenticate with a `connect.sid` session token.
    pub fn session_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SessionToken::new(token));
        self
    }

    /// Use a custom transport instead of the Replit WebSocket endpoint.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Pace reconnection attempts with a custom policy.
    ///
    /// The default is [`ImmediateRetry`]: unbounded, undelayed retries.
    pub fn retry_policy(mut self, retry: impl RetryPolicy + 'static) -> Self {
        self.retry = Some(Box::new(retry));
        self
    }

    /// Build the subscriber and start its connection task.
    pub fn build(self) -> Result<Subscriber> {
        let transport: Arc<dyn Transport> = match (self.transport, self.token) {
            (Some(transport), _) => transport,
            (None, Some(token)) => Arc::new(WebSocketTransport::new(token)),
            (None, None) => {
                return Err(ReplitLinkError::Configuration(
                    "a session token or a transport is required".into(),
                ));
            }
        };
        let retry = self.retry.unwrap_or_else(|| Box::new(ImmediateRetry));
        Ok(Subscriber::spawn(transport, retry))
    }
}
