//! Credential and identity storage on top of a [`Storage`] backend

use crate::error::Result;
use crate::storage::{MemoryStorage, Storage};
use crate::types::Session;
use std::sync::Arc;
use tracing::debug;

/// Storage key for the bearer access token
pub const TOKEN_KEY: &str = "blog_token";
/// Storage key for the logged-in user's display name
pub const USERNAME_KEY: &str = "blog_username";
/// Storage key for the JSON-encoded role list
pub const ROLES_KEY: &str = "blog_roles";

/// Typed access to the credential and identity entries
///
/// Cloning is cheap; clones share the same backend.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn Storage>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Token store backed by a fresh in-memory map
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Current access token; an empty stored value counts as absent
    pub fn access_token(&self) -> Option<String> {
        self.storage
            .get(TOKEN_KEY)
            .filter(|token| !token.is_empty())
    }

    pub fn set_access_token(&self, token: &str) -> Result<()> {
        self.storage.set(TOKEN_KEY, token)
    }

    pub fn username(&self) -> Option<String> {
        self.storage
            .get(USERNAME_KEY)
            .filter(|name| !name.is_empty())
    }

    /// Stored roles; unreadable entries yield an empty list
    pub fn roles(&self) -> Vec<String> {
        self.storage
            .get(ROLES_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    /// Persist a freshly authenticated session
    pub fn store_session(&self, token: &str, username: &str, roles: &[String]) -> Result<()> {
        self.storage.set(TOKEN_KEY, token)?;
        self.storage.set(USERNAME_KEY, username)?;
        self.storage.set(ROLES_KEY, &serde_json::to_string(roles)?)?;
        Ok(())
    }

    /// The logged-in identity, present only when both token and username are stored
    pub fn session(&self) -> Option<Session> {
        self.access_token()?;
        let username = self.username()?;
        Some(Session {
            username,
            roles: self.roles(),
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    /// Erase the credential and all identity data
    pub fn clear_session(&self) -> Result<()> {
        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(USERNAME_KEY)?;
        self.storage.remove(ROLES_KEY)?;
        debug!("Cleared stored session");
        Ok(())
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::in_memory()
    }
}
