//! In-memory token reuse with single-flight refresh.

use crate::error::{AuthError, Result};
use chrono::{DateTime, Duration, Utc};
use std::sync::{Condvar, Mutex, PoisonError};

/// Refresh this long before the token actually expires.
const EXPIRY_SAFETY_WINDOW_SECS: i64 = 300; // 5 minutes

/// A token together with its absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Token valid for `secs` seconds from now. Lifetimes chrono cannot represent
    /// are rejected.
    pub fn expiring_in(token: impl Into<String>, secs: i64) -> Result<Self> {
        let expires_at = Duration::try_seconds(secs)
            .and_then(|d| Utc::now().checked_add_signed(d))
            .ok_or_else(|| AuthError::ParseError(format!("Token lifetime out of range: {secs}s")))?;
        Ok(Self::new(token, expires_at))
    }

    /// Usable if it is not within the safety window of expiry.
    pub fn is_fresh(&self) -> bool {
        self.expires_at
            .checked_sub_signed(Duration::seconds(EXPIRY_SAFETY_WINDOW_SECS))
            .is_some_and(|refresh_at| refresh_at > Utc::now())
    }
}

pub(crate) struct TokenCache {
    cache: Mutex<Option<AccessToken>>,
    // Prevent thundering herd on concurrent refresh
    refreshing: (Mutex<bool>, Condvar),
}

impl TokenCache {
    pub(crate) fn new() -> Self {
        Self {
            cache: Mutex::new(None),
            refreshing: (Mutex::new(false), Condvar::new()),
        }
    }

    pub(crate) fn with_token(token: AccessToken) -> Self {
        let cache = Self::new();
        cache.store(token);
        cache
    }

    fn cached(&self) -> Option<String> {
        let guard = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .filter(|t| t.is_fresh())
            .map(|t| t.token.clone())
    }

    fn store(&self, token: AccessToken) {
        let mut guard = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(token);
    }

    /// Returns the cached token, or runs `fetch` once while concurrent callers wait.
    ///
    /// If the in-flight fetch fails, each waiter retries on its own turn.
    pub(crate) fn get_or_refresh<F>(&self, fetch: F) -> Result<String>
    where
        F: FnOnce() -> Result<AccessToken>,
    {
        if let Some(tok) = self.cached() {
            return Ok(tok);
        }

        let (lock, cvar) = &self.refreshing;
        let mut refreshing = lock.lock().unwrap_or_else(PoisonError::into_inner);
        while *refreshing {
            refreshing = cvar
                .wait(refreshing)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if let Some(tok) = self.cached() {
            return Ok(tok);
        }
        *refreshing = true;
        drop(refreshing);

        let _reset = RefreshReset { lock, cvar };
        let fresh = fetch()?;
        let token = fresh.token.clone();
        self.store(fresh);
        Ok(token)
    }
}

/// Clears the refreshing flag even if `fetch` errors or panics.
struct RefreshReset<'a> {
    lock: &'a Mutex<bool>,
    cvar: &'a Condvar,
}

impl Drop for RefreshReset<'_> {
    fn drop(&mut self) {
        let mut refreshing = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        *refreshing = false;
        self.cvar.notify_all();
    }
}
