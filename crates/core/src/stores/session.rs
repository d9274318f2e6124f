use std::sync::Arc;

use tracing::{debug, error, info};

use crate::{
    models::{User, UserType},
    storage::{Storage, StorageError, TOKEN_KEY, USER_KEY},
};

#[derive(Debug, Clone)]
struct Credentials {
    user: User,
    token: String,
}

/// Holds the signed-in user and token, mirrored to storage on every change.
///
/// The user and token live in a single slot, so the store is either
/// anonymous or fully authenticated; there is no way to hold one without
/// the other.
pub struct SessionStore {
    storage: Arc<dyn Storage>,
    current: Option<Credentials>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("user", &self.current.as_ref().map(|c| c.user.email.as_str()))
            .field("token", &self.current.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Build a store and rehydrate it from storage.
    ///
    /// A stored user that fails to parse is logged and both keys are
    /// removed, leaving the session anonymous.
    pub fn restore(storage: Arc<dyn Storage>) -> Self {
        let mut store = Self {
            storage,
            current: None,
        };
        store.load_from_storage();
        store
    }

    /// Sign in with the given pair, replacing any previous session.
    pub fn set_auth(&mut self, user: User, token: impl Into<String>) {
        let token = token.into();
        info!(user_id = user.id, "session authenticated");
        self.persist(&user, &token);
        self.current = Some(Credentials { user, token });
    }

    /// Sign out and forget the stored pair.
    pub fn clear_auth(&mut self) {
        if self.current.take().is_some() {
            info!("session cleared");
        }
        self.remove_stored();
    }

    /// True iff both a user and a token are held.
    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    /// Signed-in user, if any.
    pub fn user(&self) -> Option<&User> {
        self.current.as_ref().map(|credentials| &credentials.user)
    }

    /// Bearer token, if any.
    pub fn token(&self) -> Option<&str> {
        self.current
            .as_ref()
            .map(|credentials| credentials.token.as_str())
    }

    /// Whether the signed-in user is a vendor.
    pub fn is_vendor(&self) -> bool {
        self.user()
            .map(|user| user.user_type == UserType::Vendor)
            .unwrap_or(false)
    }

    /// Whether the signed-in user is a customer.
    pub fn is_customer(&self) -> bool {
        self.user()
            .map(|user| user.user_type == UserType::Customer)
            .unwrap_or(false)
    }

    // Either both keys hold the new pair or neither key is stored.
    fn persist(&self, user: &User, token: &str) {
        let written = serde_json::to_string(user)
            .map_err(StorageError::from)
            .and_then(|serialized| {
                self.storage.set(TOKEN_KEY, token)?;
                self.storage.set(USER_KEY, &serialized)
            });
        if let Err(err) = written {
            error!("failed to store session, dropping stored credentials: {err}");
            self.remove_stored();
        }
    }

    fn remove_stored(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(err) = self.storage.remove(key) {
                error!("failed to remove '{key}' from storage: {err}");
            }
        }
    }

    fn load_from_storage(&mut self) {
        let token = self.read(TOKEN_KEY);
        let user = self.read(USER_KEY);
        let (Some(token), Some(user)) = (token, user) else {
            debug!("no stored session");
            return;
        };

        match serde_json::from_str::<User>(&user) {
            Ok(user) => {
                debug!(user_id = user.id, "restored stored session");
                self.current = Some(Credentials { user, token });
            }
            Err(err) => {
                error!("failed to load stored session: {err}");
                self.clear_auth();
            }
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value.filter(|value| !value.is_empty()),
            Err(err) => {
                error!("failed to read '{key}' from storage: {err}");
                None
            }
        }
    }
}
