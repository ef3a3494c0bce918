//! Subscription registry: stable integer IDs and liveness tracking.
//!
//! The registry, not any send acknowledgement, is the source of truth for
//! "subscribed". The connection task replays its live entries after every
//! reconnect, so a registration made while disconnected still reaches the
//! server once a connection exists.

use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::models::ClientFrame;
use crate::SubscriptionId;

/// Handler invoked with `(id, payload.data)` for each routed `data` frame.
///
/// Handlers run synchronously on the shared read/dispatch path and must not
/// block. Caller context travels by closure capture.
pub type EventHandler = Arc<dyn Fn(SubscriptionId, JsonValue) + Send + Sync>;

/// A live subscription record.
struct Subscription {
    /// The prepared `start` frame, replayed verbatim on reconnect.
    frame: ClientFrame,
    handler: EventHandler,
}

/// Ordered table of subscription records indexed by ID.
///
/// IDs are assigned from a monotonic counter (the slot vector's length) and
/// are never reused: cancelling a subscription tombstones its slot rather
/// than removing it, so `id < counter` always addresses exactly one slot.
/// A tombstoned slot releases its frame and handler but keeps its position.
#[derive(Default)]
pub(crate) struct SubscriptionRegistry {
    slots: Vec<Option<Subscription>>,
}

impl SubscriptionRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The ID the next `register` call will assign.
    pub(crate) fn next_id(&self) -> SubscriptionId {
        self.slots.len() as SubscriptionId
    }

    /// Allocate the next ID and store a live record for it.
    ///
    /// `build` receives the assigned ID so the stored `start` frame can embed
    /// it. The counter advances unconditionally; IDs are never rolled back.
    pub(crate) fn register(
        &mut self,
        handler: EventHandler,
        build: impl FnOnce(SubscriptionId) -> ClientFrame,
    ) -> SubscriptionId {
        let id = self.next_id();
        self.slots.push(Some(Subscription {
            frame: build(id),
            handler,
        }));
        id
    }

    /// Tombstone the record at `id`, releasing its frame and handler.
    ///
    /// Returns `true` if the record was live. Unknown and already-tombstoned
    /// IDs are a no-op returning `false`.
    pub(crate) fn cancel(&mut self, id: SubscriptionId) -> bool {
        match self.slots.get_mut(id as usize) {
            Some(slot) => slot.take().is_some(),
            None => false,
        }
    }

    /// The handler at `id`, or `None` for out-of-range or tombstoned IDs.
    pub(crate) fn handler(&self, id: SubscriptionId) -> Option<EventHandler> {
        self.slots
            .get(id as usize)
            .and_then(|slot| slot.as_ref())
            .map(|sub| Arc::clone(&sub.handler))
    }

    /// The stored `start` frame at `id`, if the record is still live.
    pub(crate) fn start_frame(&self, id: SubscriptionId) -> Option<ClientFrame> {
        self.slots
            .get(id as usize)
            .and_then(|slot| slot.as_ref())
            .map(|sub| sub.frame.clone())
    }

    /// Snapshot of every live subscription's `start` frame in ascending ID
    /// order, for replay after reconnect.
    pub(crate) fn live_frames(&self) -> Vec<ClientFrame> {
        self.slots
            .iter()
            .filter_map(|slot| slot.as_ref().map(|sub| sub.frame.clone()))
            .collect()
    }
}
