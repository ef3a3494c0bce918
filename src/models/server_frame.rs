use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::SubscriptionId;

/// Server-to-client frames on the realtime socket.
///
/// Only [`ServerFrame::Data`] is routed to subscription handlers. Every other
/// envelope type (acknowledgements, keep-alives, server error envelopes, and
/// anything unrecognised) parses successfully and is dropped by the
/// dispatcher. Server-side GraphQL errors delivered over the realtime channel
/// therefore never reach callers; this mirrors the upstream protocol handling
/// and is a known limitation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// The server accepted the `connection_init` frame.
    ConnectionAck,

    /// Keep-alive tick.
    #[serde(rename = "ka")]
    KeepAlive,

    /// An event for the subscription registered under `id`.
    Data {
        id: SubscriptionId,
        payload: DataPayload,
    },

    /// Server-reported error envelope. Dropped by the dispatcher.
    Error {
        #[serde(default)]
        id: Option<SubscriptionId>,
        #[serde(default)]
        payload: JsonValue,
    },

    /// The server finished a subscription. Dropped by the dispatcher.
    Complete {
        #[serde(default)]
        id: Option<SubscriptionId>,
    },

    /// Any envelope type this client does not recognise.
    #[serde(other)]
    Unknown,
}

/// Payload of a [`ServerFrame::Data`] frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DataPayload {
    /// The GraphQL `data` value delivered to the handler.
    #[serde(default)]
    pub data: JsonValue,
}
