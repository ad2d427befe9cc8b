//! WASM-target tests for chat-types.
//!
//! Mirrors the native unit tests that touch uuid/chrono, since those crates
//! switch to JS-backed randomness and clocks under wasm32-unknown-unknown.
//! Run via `wasm-pack test --node`.

use wasm_bindgen_test::*;

use chat_types::api::*;
use chat_types::event::*;
use chat_types::message::*;

// ─── Message Tests ───────────────────────────────────────

#[wasm_bindgen_test]
fn message_ids_are_unique() {
    let a = Message::user("same");
    let b = Message::user("same");
    assert_ne!(a.id, b.id);
}

#[wasm_bindgen_test]
fn message_timestamp_is_rfc3339() {
    let msg = Message::assistant("hi");
    assert!(chrono::DateTime::parse_from_rfc3339(&msg.timestamp).is_ok());
}

#[wasm_bindgen_test]
fn message_error_prefix() {
    let msg = Message::error("boom");
    assert_eq!(msg.role, Role::System);
    assert_eq!(msg.content, "Error: boom");
}

// ─── Stream Record Tests ─────────────────────────────────

#[wasm_bindgen_test]
fn stream_record_kinds() {
    let content: StreamRecord =
        serde_json::from_str(r#"{"type":"content","content":"A"}"#).unwrap();
    assert_eq!(content.into_event(), Some(StreamEvent::Content("A".to_string())));

    let done: StreamRecord = serde_json::from_str(r#"{"type":"done"}"#).unwrap();
    assert_eq!(done.into_event(), Some(StreamEvent::Done));

    let error: StreamRecord =
        serde_json::from_str(r#"{"type":"error","error":"boom"}"#).unwrap();
    assert_eq!(error.into_event(), Some(StreamEvent::Error("boom".to_string())));
}

// ─── API Payload Tests ───────────────────────────────────

#[wasm_bindgen_test]
fn history_normalization_generates_ids() {
    let entries: Vec<HistoryEntry> = serde_json::from_str(
        r#"[{"role":"user","content":"a"},{"role":"assistant","content":"b"}]"#,
    )
    .unwrap();
    let messages = normalize_history(entries);
    assert_eq!(messages.len(), 2);
    assert_ne!(messages[0].id, messages[1].id);
    assert!(messages.iter().all(|m| !m.streaming));
}

#[wasm_bindgen_test]
fn send_failure_maps_to_system_message() {
    let resp: SendResponse =
        serde_json::from_str(r#"{"success":false,"content":"nope"}"#).unwrap();
    let msg = resp.into_message();
    assert_eq!(msg.role, Role::System);
    assert_eq!(msg.content, "Error: nope");
}
