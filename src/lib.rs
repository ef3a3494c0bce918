//! # replit-link: Replit GraphQL client
//!
//! A Rust client for Replit's GraphQL API. The heart of the crate is the
//! realtime subscription engine: one self-healing WebSocket connection
//! multiplexing any number of independently-lifecycled subscriptions.
//!
//! ## Features
//!
//! - **Realtime subscriptions**: register GraphQL subscriptions over a
//!   single shared socket; each event is routed to its handler by ID
//! - **Self-healing connection**: the socket is reconnected whenever it
//!   closes or fails, and all live subscriptions are replayed automatically
//! - **Typed events**: optionally deserialize subscription payloads into
//!   your own serde types
//! - **One-shot queries**: regular GraphQL queries and mutations over HTTPS
//! - **Session auth**: authenticates everything with a `connect.sid` cookie
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use replit_link::ReplitClient;
//!
//! #[tokio::main]
//! async fn main() -> replit_link::Result<()> {
//!     let client = ReplitClient::new("s%3A...")?;
//!
//!     // One-shot query
//!     let me = client.query("query { currentUser { username } }", None).await?;
//!     println!("logged in as {}", me["currentUser"]["username"]);
//!
//!     // Realtime subscription
//!     let subscriber = client.subscriber();
//!     subscriber.subscribe(
//!         "subscription { installEvents { message } }",
//!         None,
//!         |id, data| println!("[{}] {}", id, data),
//!     );
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Delivery semantics
//!
//! Subscription registration is fire-and-forget: `subscribe` returns an ID
//! immediately and the engine takes care of (re)sending the registration to
//! the server whenever a connection exists. Connection failures are never
//! surfaced; callers observe only whether their handlers fire.

pub mod auth;
pub mod client;
mod connection;
mod dispatch;
pub mod error;
pub mod models;
mod registry;
pub mod retry;
pub mod subscriber;
pub mod transport;

pub use auth::SessionToken;
pub use client::ReplitClient;
pub use error::{ReplitLinkError, Result};
pub use models::{ClientFrame, DataPayload, QueryRequest, ServerFrame, StartPayload};
pub use retry::{ExponentialBackoff, ImmediateRetry, RetryPolicy};
pub use subscriber::{Subscriber, SubscriberBuilder};
pub use transport::{FrameSink, FrameStream, RealtimeSocket, Transport, WebSocketTransport};

/// Integer ID identifying one subscription for the lifetime of a client.
///
/// IDs are allocated from a monotonic counter starting at 0 and are never
/// reused, even across reconnects; the ID is part of the wire protocol, not
/// just a local index.
pub type SubscriptionId = u64;

/// The fixed Replit domain all requests go to.
pub const REPLIT_DOMAIN: &str = "replit.com";

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
