//! Routing of inbound realtime frames to subscription handlers.
//!
//! Bad server input never fails the connection: malformed JSON, unrecognised
//! envelope types, and frames addressed to unknown or tombstoned IDs are all
//! dropped here. Callers observe only whether their handlers fire.

use std::sync::Mutex;

use crate::models::ServerFrame;
use crate::registry::SubscriptionRegistry;

/// Parse one inbound text frame and invoke the matching handler, if any.
///
/// Only `data` frames are routed. The handler liveness check happens at
/// dispatch time, so a frame racing an `unsubscribe` finds no handler. The
/// handler itself runs after the lock is released (it may call back into the
/// registry), which is why a cancel landing in that window can overlap one
/// final invocation.
pub(crate) fn dispatch(registry: &Mutex<SubscriptionRegistry>, text: &str) {
    let frame = match serde_json::from_str::<ServerFrame>(text) {
        Ok(frame) => frame,
        Err(e) => {
            log::debug!("[replit-link] Dropping malformed frame: {}", e);
            return;
        }
    };

    match frame {
        ServerFrame::Data { id, payload } => {
            let handler = registry.lock().unwrap().handler(id);
            match handler {
                Some(handler) => handler(id, payload.data),
                None => {
                    log::debug!("[replit-link] No live subscription for id {}", id);
                }
            }
        }
        // Everything else is accepted by the parser but intentionally
        // ignored, including server error envelopes.
        other => {
            log::trace!("[replit-link] Ignoring frame: {:?}", other);
        }
    }
}
