//! Integration tests for subscription registration and cancellation over a
//! scripted transport: frame content, ID allocation, and stop-frame
//! semantics.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::time::sleep;

use replit_link::Subscriber;

mod common;
use common::ScriptedTransport;

fn subscriber_with(transport: &ScriptedTransport) -> Subscriber {
    Subscriber::builder()
        .transport(Arc::new(transport.clone()))
        .build()
        .expect("transport is configured")
}

fn count_stops(frames: &[serde_json::Value]) -> usize {
    frames.iter().filter(|f| f["type"] == "stop").count()
}

#[tokio::test]
async fn test_connection_init_is_sent_first() {
    let transport = ScriptedTransport::new();
    let socket = transport.script_socket();
    let _sub = subscriber_with(&transport);

    socket.wait_for_frames(1).await;
    assert_eq!(
        socket.sent_json()[0],
        json!({"type": "connection_init", "payload": {}})
    );
}

#[tokio::test]
async fn test_subscribe_sends_start_frame_with_full_payload() {
    let transport = ScriptedTransport::new();
    let socket = transport.script_socket();
    let sub = subscriber_with(&transport);

    let id = sub.subscribe(
        "subscription { installEvents { message } }",
        Some(json!({"repl": "abc"})),
        |_, _| {},
    );
    assert_eq!(id, 0);

    socket.wait_for_frames(2).await;
    assert_eq!(
        socket.sent_json()[1],
        json!({
            "type": "start",
            "id": 0,
            "payload": {
                "operationName": null,
                "query": "subscription { installEvents { message } }",
                "variables": {"repl": "abc"},
                "extensions": {}
            }
        })
    );
}

#[tokio::test]
async fn test_ids_never_repeat_across_reconnects() {
    let transport = ScriptedTransport::new();
    let mut first = transport.script_socket();
    let sub = subscriber_with(&transport);

    assert_eq!(sub.subscribe("q1", None, |_, _| {}), 0);
    first.wait_for_frames(2).await;
    sub.unsubscribe(0);

    first.disconnect();
    let second = transport.script_socket();
    second.wait_for_frames(1).await;

    // The tombstoned slot is retained; the counter keeps going.
    assert_eq!(sub.subscribe("q2", None, |_, _| {}), 1);
    assert_eq!(sub.subscribe("q3", None, |_, _| {}), 2);
}

#[tokio::test]
async fn test_unsubscribe_sends_exactly_one_stop_frame() {
    let transport = ScriptedTransport::new();
    let socket = transport.script_socket();
    let sub = subscriber_with(&transport);

    sub.subscribe("q", None, |_, _| {});
    socket.wait_for_frames(2).await;

    sub.unsubscribe(0);
    socket.wait_for_frames(3).await;
    assert_eq!(socket.sent_json()[2], json!({"type": "stop", "id": 0}));

    // A second unsubscribe on the same ID must not resend a stop-frame.
    sub.unsubscribe(0);
    sleep(Duration::from_millis(50)).await;
    assert_eq!(count_stops(&socket.sent_json()), 1);
}

#[tokio::test]
async fn test_unsubscribe_unknown_id_sends_nothing() {
    let transport = ScriptedTransport::new();
    let socket = transport.script_socket();
    let sub = subscriber_with(&transport);

    socket.wait_for_frames(1).await;
    sub.unsubscribe(42);

    sleep(Duration::from_millis(50)).await;
    assert_eq!(socket.sent_json().len(), 1, "only connection_init expected");
}

#[tokio::test]
async fn test_subscribe_while_disconnected_waits_in_registry() {
    let transport = ScriptedTransport::new();
    let sub = subscriber_with(&transport);
    assert!(!sub.is_connected());

    // No socket exists yet; the record only waits in the registry.
    let id = sub.subscribe("q", None, |_, _| {});
    assert_eq!(id, 0);

    let socket = transport.script_socket();
    socket.wait_for_frames(2).await;
    let frames = socket.sent_json();
    assert_eq!(frames[0]["type"], "connection_init");
    assert_eq!(frames[1]["type"], "start");
    assert_eq!(frames[1]["id"], 0);
}

#[tokio::test]
async fn test_close_releases_socket_without_stop_frames() {
    let transport = ScriptedTransport::new();
    let socket = transport.script_socket();
    let sub = subscriber_with(&transport);

    sub.subscribe("q1", None, |_, _| {});
    sub.subscribe("q2", None, |_, _| {});
    socket.wait_for_frames(3).await;

    sub.close();
    common::wait_until(|| !sub.is_connected()).await;

    assert_eq!(
        count_stops(&socket.sent_json()),
        0,
        "shutdown must not send stop-frames"
    );
}
