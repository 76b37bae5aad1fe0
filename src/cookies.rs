//! Cookie jar that survives restarts by mirroring `Set-Cookie` headers into [`Storage`]
//!
//! The refresh token is an http-only cookie, so a session restored from
//! storage can only be refreshed if the jar is restored with it.

use crate::error::Result;
use crate::storage::Storage;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};
use url::Url;

/// Storage key for the recorded `Set-Cookie` headers
pub const COOKIES_KEY: &str = "blog_cookies";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredCookie {
    origin: String,
    name: String,
    url: String,
    header: String,
}

/// Cookie store backed by reqwest's [`Jar`], persisted through a [`Storage`] backend
///
/// Only the latest `Set-Cookie` per origin and cookie name is kept; replaying
/// them in order on load rebuilds the jar, including expirations.
pub struct SessionCookies {
    jar: Jar,
    storage: Arc<dyn Storage>,
    write_lock: Mutex<()>,
}

impl SessionCookies {
    /// Build a jar from whatever cookies `storage` holds
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let jar = Jar::default();
        let stored = read_stored(storage.as_ref());

        for cookie in &stored {
            match Url::parse(&cookie.url) {
                Ok(url) => jar.add_cookie_str(&cookie.header, &url),
                Err(e) => warn!(url = %cookie.url, error = %e, "Skipping stored cookie with invalid URL"),
            }
        }
        if !stored.is_empty() {
            debug!(count = stored.len(), "Restored session cookies");
        }

        Self {
            jar,
            storage,
            write_lock: Mutex::new(()),
        }
    }

    fn remember(&self, url: &Url, headers: &[&HeaderValue]) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let origin = url.origin().ascii_serialization();
        let mut stored = read_stored(self.storage.as_ref());

        for header in headers {
            let Ok(raw) = header.to_str() else {
                continue;
            };
            let Some(name) = cookie_name(raw) else {
                continue;
            };
            stored.retain(|c| !(c.origin == origin && c.name == name));
            stored.push(StoredCookie {
                origin: origin.clone(),
                name,
                url: url.to_string(),
                header: raw.to_string(),
            });
        }

        self.storage.set(COOKIES_KEY, &serde_json::to_string(&stored)?)
    }
}

impl CookieStore for SessionCookies {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let headers: Vec<&HeaderValue> = cookie_headers.collect();
        if let Err(e) = self.remember(url, &headers) {
            warn!(error = %e, "Failed to persist cookies");
        }
        self.jar.set_cookies(&mut headers.into_iter(), url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.jar.cookies(url)
    }
}

fn read_stored(storage: &dyn Storage) -> Vec<StoredCookie> {
    storage
        .get(COOKIES_KEY)
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

fn cookie_name(set_cookie: &str) -> Option<String> {
    let pair = set_cookie.split(';').next()?;
    let (name, _) = pair.split_once('=')?;
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}
