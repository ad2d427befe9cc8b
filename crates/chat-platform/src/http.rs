//! Chat REST API adapter.
//!
//! Uses browser `fetch()` via gloo-net. The streaming endpoint's body is read
//! chunk by chunk from the response's `ReadableStream`.

use std::rc::Rc;
use async_trait::async_trait;
use futures::stream;
use gloo_net::http::{Method, RequestBuilder, Response};
use js_sys::{Reflect, Uint8Array};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{ReadableStream, ReadableStreamDefaultReader};

use chat_core::ports::*;
use chat_types::{
    ChatError, Result,
    api::{normalize_history, ChatRequestBody, HistoryEntry, SendResponse},
    config::ChatConfig,
    message::Message,
};
use crate::js_error_text;

/// Talks to `/chat`, `/chat/clear` and `/chat/stream` under the configured base.
pub struct HttpChatApi {
    config: ChatConfig,
    credentials: Rc<dyn CredentialPort>,
}

impl HttpChatApi {
    pub fn new(config: ChatConfig, credentials: Rc<dyn CredentialPort>) -> Self {
        Self { config, credentials }
    }

    /// Request for `path` carrying the JSON content type and the bearer
    /// token. Fails before anything is built when there is no token.
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let token = self
            .credentials
            .bearer_token()
            .ok_or(ChatError::Unauthenticated)?;
        let url = self.config.endpoint(path);
        let builder = RequestBuilder::new(&url).method(method);
        Ok(request_headers(&token)
            .iter()
            .fold(builder, |builder, (name, value)| builder.header(name, value)))
    }

    async fn post_message(&self, path: &str, text: &str) -> Result<Response> {
        let body = ChatRequestBody { message: text.to_string() };
        let response = self
            .request(Method::POST, path)?
            .json(&body)
            .map_err(|e| ChatError::Serialization(e.to_string()))?
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;
        ensure_ok(response).await
    }
}

#[async_trait(?Send)]
impl ChatApiPort for HttpChatApi {
    async fn fetch_history(&self) -> Result<Vec<Message>> {
        let response = self
            .request(Method::GET, "/chat")?
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;
        let response = ensure_ok(response).await?;

        let entries: Vec<HistoryEntry> = response
            .json()
            .await
            .map_err(|e| ChatError::Serialization(e.to_string()))?;
        Ok(normalize_history(entries))
    }

    async fn clear_history(&self) -> Result<()> {
        let response = self
            .request(Method::POST, "/chat/clear")?
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;
        ensure_ok(response).await?;
        Ok(())
    }

    async fn send_message(&self, text: &str) -> Result<Message> {
        let response = self.post_message("/chat", text).await?;
        let reply: SendResponse = response
            .json()
            .await
            .map_err(|e| ChatError::Serialization(e.to_string()))?;
        Ok(reply.into_message())
    }

    async fn stream_message(&self, text: &str) -> Result<ByteStream> {
        let response = self.post_message("/chat/stream", text).await?;
        let body = response
            .body()
            .ok_or_else(|| ChatError::Stream("Response has no body".to_string()))?;
        body_chunks(body)
    }
}

/// Headers sent with every API call
pub fn request_headers(token: &str) -> [(&'static str, String); 2] {
    [
        ("Content-Type", "application/json".to_string()),
        ("Authorization", format!("Bearer {}", token)),
    ]
}

/// Turn a non-2xx response into `ChatError::Http`, keeping the body text.
async fn ensure_ok(response: Response) -> Result<Response> {
    if response.ok() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    log::error!("{} failed with status {}", response.url(), status);
    Err(http_error(status, &body))
}

/// Error for a failed status. Long bodies (HTML error pages) are cut short.
pub fn http_error(status: u16, body: &str) -> ChatError {
    const MAX_BODY: usize = 200;
    let body = body.trim();
    let body = match body.char_indices().nth(MAX_BODY) {
        Some((cut, _)) => format!("{}…", &body[..cut]),
        None => body.to_string(),
    };
    ChatError::Http { status, body }
}

// ─── Streaming body ──────────────────────────────────────────

/// Reader over a response body. Dropping it before the body ends cancels the
/// underlying fetch, so an aborted stream stops downloading.
struct BodyReader {
    reader: ReadableStreamDefaultReader,
    done: bool,
}

impl BodyReader {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        let result = JsFuture::from(self.reader.read())
            .await
            .map_err(|e| ChatError::Network(js_error_text(&e)))?;

        let done = Reflect::get(&result, &JsValue::from_str("done"))
            .map_err(|e| ChatError::JsInterop(js_error_text(&e)))?
            .as_bool()
            .unwrap_or(false);
        if done {
            self.done = true;
            return Ok(None);
        }

        let value = Reflect::get(&result, &JsValue::from_str("value"))
            .map_err(|e| ChatError::JsInterop(js_error_text(&e)))?;
        Ok(Some(Uint8Array::new(&value).to_vec()))
    }
}

impl Drop for BodyReader {
    fn drop(&mut self) {
        if self.done {
            self.reader.release_lock();
        } else {
            log::debug!("Cancelling unfinished response body");
            let cancelled = JsFuture::from(self.reader.cancel());
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(e) = cancelled.await {
                    log::debug!("Body cancel rejected: {}", js_error_text(&e));
                }
            });
        }
    }
}

/// Chunks of a response body, in order. Dropping the stream early cancels
/// the body.
pub fn body_chunks(body: ReadableStream) -> Result<ByteStream> {
    let reader: ReadableStreamDefaultReader = body
        .get_reader()
        .dyn_into()
        .map_err(|e| ChatError::JsInterop(js_error_text(&e)))?;
    let reader = BodyReader { reader, done: false };

    Ok(Box::pin(stream::unfold(Some(reader), |state| async move {
        let mut reader = state?;
        match reader.next_chunk().await {
            Ok(Some(bytes)) => Some((Ok(bytes), Some(reader))),
            Ok(None) => None,
            Err(e) => Some((Err(e), None)),
        }
    })))
}
