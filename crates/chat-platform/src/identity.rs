//! Keycloak identity adapter.
//!
//! The page loads `keycloak.js` and exposes a configured instance as
//! `window.keycloak`; this adapter drives it through `js_sys::Reflect`.

use async_trait::async_trait;
use js_sys::{Function, Object, Promise, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use chat_core::ports::IdentityPort;
use chat_types::{ChatError, Result};
use crate::js_error_text;

/// Global the Keycloak instance is published under
pub const KEYCLOAK_GLOBAL: &str = "keycloak";

pub struct KeycloakIdentity {
    keycloak: JsValue,
}

impl KeycloakIdentity {
    /// Look up the page's Keycloak instance.
    pub fn from_global() -> Result<Self> {
        let keycloak = Reflect::get(&js_sys::global(), &JsValue::from_str(KEYCLOAK_GLOBAL))
            .map_err(|e| ChatError::JsInterop(js_error_text(&e)))?;
        if keycloak.is_undefined() || keycloak.is_null() {
            return Err(ChatError::Identity(format!(
                "window.{} is not available",
                KEYCLOAK_GLOBAL
            )));
        }
        Ok(Self { keycloak })
    }

    /// Call `keycloak[name](arg)` and await the promise it returns.
    async fn call(&self, name: &str, arg: &JsValue) -> Result<JsValue> {
        let method: Function = Reflect::get(&self.keycloak, &JsValue::from_str(name))
            .map_err(|e| ChatError::JsInterop(js_error_text(&e)))?
            .dyn_into()
            .map_err(|_| ChatError::Identity(format!("keycloak.{} is not a function", name)))?;

        let promise: Promise = method
            .call1(&self.keycloak, arg)
            .map_err(|e| ChatError::Identity(js_error_text(&e)))?
            .dyn_into()
            .map_err(|_| ChatError::Identity(format!("keycloak.{} did not return a promise", name)))?;

        JsFuture::from(promise)
            .await
            .map_err(|e| ChatError::Identity(js_error_text(&e)))
    }

    fn token(&self) -> Option<String> {
        Reflect::get(&self.keycloak, &JsValue::from_str("token"))
            .ok()
            .and_then(|t| t.as_string())
            .filter(|t| !t.is_empty())
    }
}

#[async_trait(?Send)]
impl IdentityPort for KeycloakIdentity {
    async fn init(&self) -> Result<Option<String>> {
        let options = Object::new();
        let set = |key: &str, value: JsValue| {
            Reflect::set(&options, &JsValue::from_str(key), &value)
                .map_err(|e| ChatError::JsInterop(js_error_text(&e)))
        };
        set("onLoad", JsValue::from_str("login-required"))?;
        if let Ok(origin) = gloo_utils::window().location().origin() {
            set("redirectUri", JsValue::from_str(&origin))?;
        }

        let authenticated = self.call("init", &options).await?;
        if authenticated.as_bool().unwrap_or(false) {
            Ok(self.token())
        } else {
            Ok(None)
        }
    }

    async fn refresh(&self, min_validity_secs: u32) -> Result<Option<String>> {
        let refreshed = self
            .call("updateToken", &JsValue::from(min_validity_secs))
            .await?;
        if refreshed.as_bool().unwrap_or(false) {
            Ok(self.token())
        } else {
            Ok(None)
        }
    }
}
