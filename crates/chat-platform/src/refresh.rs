//! Background token refresh.

use std::rc::Rc;
use futures::future::{abortable, AbortHandle};
use futures::StreamExt;
use gloo_timers::future::IntervalStream;

use chat_core::auth::{refresh_once, CredentialStore};
use chat_core::ports::IdentityPort;
use chat_types::config::ChatConfig;

/// Refresh the token every `token_refresh_interval_ms` for as long as the
/// page lives. Independent of any chat request; abort the handle to stop.
pub fn spawn_token_refresh(
    identity: Rc<dyn IdentityPort>,
    store: CredentialStore,
    config: &ChatConfig,
) -> AbortHandle {
    let interval_ms = config.token_refresh_interval_ms;
    let min_validity = config.token_min_validity_secs;

    let (task, handle) = abortable(async move {
        let mut ticks = IntervalStream::new(interval_ms);
        while ticks.next().await.is_some() {
            refresh_once(identity.as_ref(), &store, min_validity).await;
        }
    });

    wasm_bindgen_futures::spawn_local(async move {
        if task.await.is_err() {
            log::debug!("Token refresh stopped");
        }
    });
    handle
}
