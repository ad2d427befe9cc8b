//! Bearer credential held for the lifetime of the page.
//!
//! The store is constructed once by the app and injected into the API
//! adapter and the session; the identity provider writes new tokens into it.

use std::cell::RefCell;
use std::rc::Rc;
use chat_types::Result;
use crate::ports::{CredentialPort, IdentityPort};

/// Shared token slot — clone-cheap via Rc.
#[derive(Clone, Default)]
pub struct CredentialStore {
    token: Rc<RefCell<Option<String>>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set_token(Some(token.into()));
        store
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.borrow_mut() = token.filter(|t| !t.is_empty());
    }

    pub fn clear(&self) {
        self.set_token(None);
    }
}

impl CredentialPort for CredentialStore {
    fn bearer_token(&self) -> Option<String> {
        self.token.borrow().clone()
    }
}

/// Run the identity provider's sign-in and store the token it issues.
/// Returns whether the user is now authenticated.
pub async fn sign_in(identity: &dyn IdentityPort, store: &CredentialStore) -> Result<bool> {
    match identity.init().await? {
        Some(token) => {
            store.set_token(Some(token));
            log::info!("Signed in");
            Ok(store.is_authenticated())
        }
        None => {
            log::warn!("Identity provider did not authenticate the user");
            store.clear();
            Ok(false)
        }
    }
}

/// One refresh tick. Failures are logged and leave the current token in place.
/// Returns whether a new token was stored.
pub async fn refresh_once(
    identity: &dyn IdentityPort,
    store: &CredentialStore,
    min_validity_secs: u32,
) -> bool {
    match identity.refresh(min_validity_secs).await {
        Ok(Some(token)) => {
            store.set_token(Some(token));
            log::debug!("Token refreshed");
            true
        }
        Ok(None) => false,
        Err(e) => {
            log::error!("Failed to refresh token: {}", e);
            false
        }
    }
}
