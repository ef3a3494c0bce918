//! The connection manager: a background task that owns the single realtime
//! socket and keeps it alive forever.
//!
//! Lifecycle:
//! 1. Open a socket through the [`Transport`], send `connection_init`, replay
//!    every live subscription's `start` frame in ascending ID order
//! 2. Enter the event loop: route inbound frames, process commands
//! 3. On close or error: drop the socket and go back to 1
//!
//! Absent an explicit shutdown the task never exits: connect failures are
//! retried per the [`RetryPolicy`] with no attempt cap, and none of them
//! surface to callers. Presence of a live socket is the only connection
//! state that exists.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio_tungstenite::tungstenite::protocol::Message;

use crate::dispatch::dispatch;
use crate::error::Result;
use crate::models::ClientFrame;
use crate::registry::SubscriptionRegistry;
use crate::retry::RetryPolicy;
use crate::transport::{FrameSink, RealtimeSocket, Transport};
use crate::SubscriptionId;

/// Commands sent from the public API to the background connection task.
pub(crate) enum Cmd {
    /// Send the stored `start` frame for a freshly registered subscription.
    Start(SubscriptionId),
    /// Send a `stop` frame for a cancelled subscription.
    Stop(SubscriptionId),
    /// Release the socket and exit without sending further stop-frames.
    Shutdown,
}

/// Serialize a frame and send it over the socket's outbound half.
async fn send_frame(sink: &mut FrameSink, frame: &ClientFrame) -> Result<()> {
    let text = serde_json::to_string(frame)?;
    log::debug!("[replit-link] Sending frame: {}", text);
    sink.send(Message::Text(text.into())).await
}

/// One connection attempt: open, init, replay.
///
/// Returns the live socket and the replay watermark: the ID counter value at
/// snapshot time. Every live subscription below the watermark has had its
/// `start` frame sent on this socket, so queued `Start` commands for those
/// IDs must not be re-sent.
async fn connect(
    transport: &dyn Transport,
    registry: &Mutex<SubscriptionRegistry>,
) -> Option<(RealtimeSocket, SubscriptionId)> {
    let mut socket = match transport.open().await {
        Ok(socket) => socket,
        Err(e) => {
            log::debug!("[replit-link] Connection attempt failed: {}", e);
            return None;
        }
    };

    if let Err(e) = send_frame(&mut socket.sink, &ClientFrame::connection_init()).await {
        log::debug!("[replit-link] Failed to send connection_init: {}", e);
        return None;
    }

    // Snapshot under one lock so the watermark matches the replayed frames.
    let (frames, watermark) = {
        let reg = registry.lock().unwrap();
        (reg.live_frames(), reg.next_id())
    };

    if !frames.is_empty() {
        log::info!(
            "[replit-link] Replaying {} live subscription(s) after connect",
            frames.len()
        );
    }
    for frame in &frames {
        if let Err(e) = send_frame(&mut socket.sink, frame).await {
            log::warn!("[replit-link] Failed to replay subscription: {}", e);
            return None;
        }
    }

    Some((socket, watermark))
}

/// The main background task managing the realtime connection.
pub(crate) async fn connection_task(
    mut cmd_rx: mpsc::UnboundedReceiver<Cmd>,
    transport: Arc<dyn Transport>,
    registry: Arc<Mutex<SubscriptionRegistry>>,
    mut retry: Box<dyn RetryPolicy>,
    connected: Arc<AtomicBool>,
) {
    let mut socket: Option<RealtimeSocket> = None;
    // IDs below this value were covered by the replay on the current socket.
    let mut replayed_below: SubscriptionId = 0;

    loop {
        if let Some(ref mut sock) = socket {
            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(Cmd::Start(id)) => {
                        if id < replayed_below {
                            // Already sent as part of the replay.
                            continue;
                        }
                        let frame = registry.lock().unwrap().start_frame(id);
                        // Tombstoned before we got here: nothing to send.
                        let Some(frame) = frame else { continue };
                        if let Err(e) = send_frame(&mut sock.sink, &frame).await {
                            log::warn!("[replit-link] Send failed, reconnecting: {}", e);
                            connected.store(false, Ordering::SeqCst);
                            socket = None;
                        }
                    }
                    Some(Cmd::Stop(id)) => {
                        if let Err(e) = send_frame(&mut sock.sink, &ClientFrame::stop(id)).await {
                            log::warn!("[replit-link] Send failed, reconnecting: {}", e);
                            connected.store(false, Ordering::SeqCst);
                            socket = None;
                        }
                    }
                    Some(Cmd::Shutdown) | None => {
                        let _ = sock.sink.close().await;
                        connected.store(false, Ordering::SeqCst);
                        log::debug!("[replit-link] Connection task shut down");
                        return;
                    }
                },
                frame = sock.stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        dispatch(&registry, &text);
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        let _ = sock.sink.send(Message::Pong(payload)).await;
                    }
                    // Binary and other control frames carry nothing for us.
                    Some(Ok(Message::Close(_))) | None => {
                        log::info!("[replit-link] Realtime connection closed, reconnecting");
                        connected.store(false, Ordering::SeqCst);
                        socket = None;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        log::warn!("[replit-link] Socket error, reconnecting: {}", e);
                        connected.store(false, Ordering::SeqCst);
                        socket = None;
                    }
                },
            }
        } else {
            // Disconnected. Wait out the policy delay (still honouring
            // shutdown), then attempt one connection.
            let delay = retry.next_delay();
            if delay.is_zero() {
                loop {
                    match cmd_rx.try_recv() {
                        Ok(Cmd::Shutdown) | Err(TryRecvError::Disconnected) => return,
                        // Start/Stop need no network action while offline:
                        // the registry already reflects them and the next
                        // replay picks them up.
                        Ok(_) => {}
                        Err(TryRecvError::Empty) => break,
                    }
                }
                // A transport that fails before its first await would
                // otherwise let this loop hog the worker.
                tokio::task::yield_now().await;
            } else {
                let sleep = tokio::time::sleep(delay);
                tokio::pin!(sleep);
                loop {
                    tokio::select! {
                        cmd = cmd_rx.recv() => match cmd {
                            Some(Cmd::Shutdown) | None => return,
                            Some(_) => {}
                        },
                        _ = &mut sleep => break,
                    }
                }
            }

            if let Some((sock, watermark)) = connect(transport.as_ref(), &registry).await {
                retry.reset();
                replayed_below = watermark;
                connected.store(true, Ordering::SeqCst);
                log::info!("[replit-link] Realtime connection established");
                socket = Some(sock);
            }
        }
    }
}
