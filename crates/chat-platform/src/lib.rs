//! Browser adapters for the chat-core ports.
//!
//! - `http`: the chat REST API over `fetch()`, including the streaming body reader
//! - `identity`: the page's Keycloak adapter
//! - `refresh`: periodic token refresh

pub mod http;
pub mod identity;
pub mod refresh;

use wasm_bindgen::{JsCast, JsValue};

/// Best-effort text of a thrown JS value
pub(crate) fn js_error_text(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}
