use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::SubscriptionId;

/// Client-to-server frames on the realtime socket.
///
/// Three shapes exist: the protocol-init frame sent once per connection,
/// a `start` frame per subscription, and a `stop` frame per cancellation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Initialise the subscription protocol after the socket opens.
    ConnectionInit {
        /// Always an empty object.
        payload: JsonValue,
    },

    /// Register a subscription under a client-assigned integer ID.
    Start {
        /// The subscription ID; unique for the lifetime of the client.
        id: SubscriptionId,
        /// The GraphQL operation to run server-side.
        payload: StartPayload,
    },

    /// Cancel the subscription with the given ID.
    Stop {
        /// The subscription ID to stop.
        id: SubscriptionId,
    },
}

/// Payload of a [`ClientFrame::Start`] frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartPayload {
    /// Always serialized as `null`; Replit infers the operation from the query.
    #[serde(rename = "operationName")]
    pub operation_name: Option<String>,
    /// The GraphQL subscription query.
    pub query: String,
    /// Query variables; an empty object when the caller passed none.
    pub variables: JsonValue,
    /// Always an empty object.
    pub extensions: JsonValue,
}

impl ClientFrame {
    /// The protocol-init frame: `{"type":"connection_init","payload":{}}`.
    pub fn connection_init() -> Self {
        ClientFrame::ConnectionInit { payload: json!({}) }
    }

    /// Build a `start` frame for a subscription registration.
    pub fn start(id: SubscriptionId, query: impl Into<String>, variables: Option<JsonValue>) -> Self {
        ClientFrame::Start {
            id,
            payload: StartPayload {
                operation_name: None,
                query: query.into(),
                variables: variables.unwrap_or_else(|| json!({})),
                extensions: json!({}),
            },
        }
    }

    /// Build a `stop` frame for a cancellation.
    pub fn stop(id: SubscriptionId) -> Self {
        ClientFrame::Stop { id }
    }
}
