//! WASM-target tests for chat-platform (Node.js runtime).
//!
//! Covers the parts of the adapters that run without a browser page or a
//! live server: credential checks, error shaping, Keycloak lookup, and the
//! refresh timer.

use wasm_bindgen_test::*;

use chat_core::auth::CredentialStore;
use chat_core::ports::*;
use chat_platform::http::{body_chunks, http_error, request_headers, HttpChatApi};
use chat_platform::identity::KeycloakIdentity;
use chat_platform::refresh::spawn_token_refresh;
use chat_types::config::ChatConfig;
use chat_types::ChatError;

use std::cell::Cell;
use std::rc::Rc;
use async_trait::async_trait;
use futures::StreamExt;
use gloo_timers::future::TimeoutFuture;
use js_sys::{Function, Object, Reflect, Uint8Array};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::ReadableStream;

// ─── HttpChatApi Tests ───────────────────────────────────

fn api_without_token() -> HttpChatApi {
    let config = ChatConfig::default().with_api_base("http://localhost:8000/");
    HttpChatApi::new(config, Rc::new(CredentialStore::new()))
}

#[wasm_bindgen_test]
fn request_headers_carry_json_and_bearer() {
    let headers = request_headers("abc.def");
    assert_eq!(
        headers,
        [
            ("Content-Type", "application/json".to_string()),
            ("Authorization", "Bearer abc.def".to_string()),
        ]
    );
}

#[wasm_bindgen_test]
async fn http_api_refuses_without_token() {
    let api = api_without_token();
    assert_eq!(api.fetch_history().await.unwrap_err(), ChatError::Unauthenticated);
    assert_eq!(api.clear_history().await.unwrap_err(), ChatError::Unauthenticated);
    assert_eq!(api.send_message("hi").await.unwrap_err(), ChatError::Unauthenticated);
    assert!(matches!(
        api.stream_message("hi").await,
        Err(ChatError::Unauthenticated)
    ));
}

#[wasm_bindgen_test]
fn http_error_keeps_short_body() {
    let err = http_error(500, "  internal failure\n");
    assert_eq!(
        err,
        ChatError::Http { status: 500, body: "internal failure".to_string() }
    );
    assert_eq!(err.to_string(), "HTTP error! status: 500: internal failure");
}

#[wasm_bindgen_test]
fn http_error_truncates_long_body() {
    let page = "<html>".repeat(100);
    match http_error(502, &page) {
        ChatError::Http { status, body } => {
            assert_eq!(status, 502);
            assert_eq!(body.chars().count(), 201);
            assert!(body.ends_with('…'));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[wasm_bindgen_test]
fn http_error_without_body() {
    assert_eq!(http_error(404, "").to_string(), "HTTP error! status: 404");
}

// ─── Response body Tests ─────────────────────────────────

fn call_on(controller: &JsValue, method: &str, args: &[JsValue]) {
    let f: Function = Reflect::get(controller, &JsValue::from_str(method))
        .unwrap()
        .unchecked_into();
    f.apply(controller, &args.iter().collect()).unwrap();
}

#[wasm_bindgen_test]
async fn body_chunks_reads_until_close() {
    let start = Closure::<dyn FnMut(JsValue)>::new(|controller: JsValue| {
        for part in ["data: {\"type\":", "\"done\"}"] {
            let bytes: JsValue = Uint8Array::from(part.as_bytes()).into();
            call_on(&controller, "enqueue", &[bytes]);
        }
        call_on(&controller, "close", &[]);
    });
    let source = Object::new();
    Reflect::set(&source, &JsValue::from_str("start"), start.as_ref()).unwrap();
    let body = ReadableStream::new_with_underlying_source(&source).unwrap();

    let chunks: Vec<Vec<u8>> = body_chunks(body)
        .unwrap()
        .map(|chunk| chunk.unwrap())
        .collect()
        .await;
    assert_eq!(chunks.concat(), br#"data: {"type":"done"}"#.to_vec());
}

#[wasm_bindgen_test]
async fn dropping_unfinished_body_cancels_it() {
    let cancelled = Rc::new(Cell::new(false));
    let flag = cancelled.clone();
    let on_cancel = Closure::<dyn FnMut(JsValue)>::new(move |_reason: JsValue| flag.set(true));
    let source = Object::new();
    Reflect::set(&source, &JsValue::from_str("cancel"), on_cancel.as_ref()).unwrap();
    let body = ReadableStream::new_with_underlying_source(&source).unwrap();

    let chunks = body_chunks(body).unwrap();
    drop(chunks);
    TimeoutFuture::new(0).await;
    assert!(cancelled.get());
}

// ─── KeycloakIdentity Tests ──────────────────────────────

#[wasm_bindgen_test]
fn keycloak_missing_global() {
    match KeycloakIdentity::from_global() {
        Err(ChatError::Identity(msg)) => assert!(msg.contains("keycloak")),
        Err(other) => panic!("unexpected error: {:?}", other),
        Ok(_) => panic!("no keycloak global under node"),
    }
}

// ─── Token refresh Tests ─────────────────────────────────

struct CountingIdentity {
    refreshes: Cell<u32>,
}

#[async_trait(?Send)]
impl IdentityPort for CountingIdentity {
    async fn init(&self) -> chat_types::Result<Option<String>> {
        Ok(Some("initial".to_string()))
    }

    async fn refresh(&self, _min_validity_secs: u32) -> chat_types::Result<Option<String>> {
        let n = self.refreshes.get() + 1;
        self.refreshes.set(n);
        Ok(Some(format!("token-{}", n)))
    }
}

#[wasm_bindgen_test]
async fn token_refresh_updates_store() {
    let identity = Rc::new(CountingIdentity { refreshes: Cell::new(0) });
    let store = CredentialStore::with_token("initial");
    let mut config = ChatConfig::default();
    config.token_refresh_interval_ms = 10;

    let handle = spawn_token_refresh(identity.clone(), store.clone(), &config);
    TimeoutFuture::new(60).await;
    handle.abort();

    let count = identity.refreshes.get();
    assert!(count >= 1);
    assert_eq!(store.bearer_token(), Some(format!("token-{}", count)));

    TimeoutFuture::new(40).await;
    assert_eq!(identity.refreshes.get(), count);
}
