//! Secure Token Storage
//!
//! Persists the Crowdin access token through the platform `SecureStore`
//! (Keychain, Credential Manager, libsecret) and keeps an in-memory copy so
//! callers can ask "are we signed in?" without awaiting.
//!
//! Storage failures never surface to callers: a token that cannot be read is
//! the same as no token, and a token that cannot be persisted still works for
//! the rest of the session.
//!
//! Every change to the persisted token happens under one async lock, so the
//! secure store always ends up holding whatever the cache last settled on.
//!
//! ## Example
//!
//! ```no_run
//! use core_auth::{AccessToken, TokenStore};
//! use std::sync::Arc;
//! # use bridge_traits::storage::SecureStore;
//! # async fn example(secure_store: Arc<dyn SecureStore>) {
//! let token_store = TokenStore::new(secure_store);
//!
//! token_store.save(AccessToken::new("token")).await;
//! assert!(token_store.cached().is_some());
//!
//! token_store.clear().await;
//! # }
//! ```

use crate::types::AccessToken;
use bridge_traits::storage::SecureStore;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Secure store key holding the token record.
///
/// The value is a JSON object `{"access_token": ..., "expires_at": ...}`.
/// A bare token string written by older builds is still accepted.
pub const TOKEN_STORAGE_KEY: &str = "crowdin_access_token";

#[derive(Serialize, Deserialize)]
struct StoredToken {
    access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<i64>,
}

#[derive(Debug, Clone)]
enum CacheState {
    /// Secure storage has not been consulted yet.
    Unprimed,
    Loaded(Option<AccessToken>),
}

/// Cached, securely persisted access token.
pub struct TokenStore {
    secure_store: Arc<dyn SecureStore>,
    cache: RwLock<CacheState>,
    persist: Mutex<()>,
}

impl TokenStore {
    pub fn new(secure_store: Arc<dyn SecureStore>) -> Self {
        debug!("Initializing TokenStore");
        Self {
            secure_store,
            cache: RwLock::new(CacheState::Unprimed),
            persist: Mutex::new(()),
        }
    }

    fn read_cache(&self) -> RwLockReadGuard<'_, CacheState> {
        self.cache.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_cache(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.cache.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Current in-memory token without touching secure storage.
    pub fn cached(&self) -> Option<AccessToken> {
        match &*self.read_cache() {
            CacheState::Loaded(Some(token)) if !token.is_expired() => Some(token.clone()),
            _ => None,
        }
    }

    /// Load the token, consulting secure storage the first time.
    ///
    /// Missing, unreadable or corrupt secrets yield `None`. A token whose
    /// known expiry has passed is cleared and reported as absent.
    pub async fn load(&self) -> Option<AccessToken> {
        let cached = self.read_cache().clone();

        let token = match cached {
            CacheState::Loaded(token) => token,
            CacheState::Unprimed => {
                let _persist = self.persist.lock().await;
                // Another load, save or clear may have settled it meanwhile
                let settled = self.read_cache().clone();
                match settled {
                    CacheState::Loaded(current) => current,
                    CacheState::Unprimed => {
                        let loaded = self.read_persisted().await;
                        *self.write_cache() = CacheState::Loaded(loaded.clone());
                        loaded
                    }
                }
            }
        };

        match token {
            Some(token) if token.is_expired() => {
                info!("Stored Crowdin token has expired, discarding it");
                self.clear_if_current(&token).await;
                None
            }
            other => other,
        }
    }

    async fn read_persisted(&self) -> Option<AccessToken> {
        let data = match self.secure_store.get_secret(TOKEN_STORAGE_KEY).await {
            Ok(Some(data)) => data,
            Ok(None) => {
                debug!("No Crowdin token in secure storage");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read token from secure storage");
                return None;
            }
        };

        match String::from_utf8(data).ok().and_then(|text| decode_stored(&text)) {
            Some(token) => {
                debug!("Loaded Crowdin token from secure storage");
                Some(token)
            }
            None => {
                warn!("Stored token is corrupted, removing it");
                if let Err(e) = self.secure_store.delete_secret(TOKEN_STORAGE_KEY).await {
                    warn!(error = %e, "Failed to delete corrupted token data");
                }
                None
            }
        }
    }

    /// Replace the current token and persist it.
    ///
    /// If persistence fails the token is still used for this session.
    pub async fn save(&self, token: AccessToken) {
        let record = serde_json::to_vec(&StoredToken {
            access_token: token.secret().to_string(),
            expires_at: token.expires_at(),
        });
        let has_domain = token.domain().is_some();

        let _persist = self.persist.lock().await;
        *self.write_cache() = CacheState::Loaded(Some(token));

        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Failed to encode Crowdin token, keeping it for this session only");
                return;
            }
        };

        match self
            .secure_store
            .set_secret(TOKEN_STORAGE_KEY, &record)
            .await
        {
            Ok(()) => info!(enterprise = has_domain, "Crowdin token stored securely"),
            Err(e) => warn!(
                error = %e,
                "Failed to persist Crowdin token, keeping it for this session only"
            ),
        }
    }

    /// Forget the token in memory and in secure storage. Idempotent.
    pub async fn clear(&self) {
        let _persist = self.persist.lock().await;
        *self.write_cache() = CacheState::Loaded(None);

        if let Err(e) = self.secure_store.delete_secret(TOKEN_STORAGE_KEY).await {
            warn!(error = %e, "Failed to delete Crowdin token from secure storage");
        } else {
            debug!("Crowdin token cleared");
        }
    }

    /// Clear only if `token` is still the current token.
    ///
    /// Returns whether anything was cleared. A rejection reported for a token
    /// that has since been replaced leaves the newer token alone.
    pub async fn clear_if_current(&self, token: &AccessToken) -> bool {
        let _persist = self.persist.lock().await;
        let is_current = {
            let mut cache = self.write_cache();
            match &*cache {
                CacheState::Loaded(Some(current)) if current == token => {
                    *cache = CacheState::Loaded(None);
                    true
                }
                _ => false,
            }
        };

        if !is_current {
            debug!("Token already replaced, not clearing");
            return false;
        }

        if let Err(e) = self.secure_store.delete_secret(TOKEN_STORAGE_KEY).await {
            warn!(error = %e, "Failed to delete Crowdin token from secure storage");
        }
        true
    }
}

fn decode_stored(text: &str) -> Option<AccessToken> {
    let text = text.trim();
    if text.starts_with('{') {
        let stored: StoredToken = serde_json::from_str(text).ok()?;
        let secret = stored.access_token.trim();
        if secret.is_empty() {
            return None;
        }
        let token = AccessToken::new(secret);
        return Some(match stored.expires_at {
            Some(ts) => token.with_expires_at(ts),
            None => token,
        });
    }

    (!text.is_empty()).then(|| AccessToken::new(text))
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("cache", &*self.read_cache())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemorySecureStore;
    use crate::types::jwt_with_claims;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_load_from_empty_store() {
        let store = Arc::new(MemorySecureStore::default());
        let token_store = TokenStore::new(store);

        assert_eq!(token_store.load().await, None);
        assert_eq!(token_store.cached(), None);
    }

    #[tokio::test]
    async fn test_save_then_load_from_fresh_store() {
        let store = Arc::new(MemorySecureStore::default());

        TokenStore::new(store.clone())
            .save(AccessToken::new("persisted"))
            .await;

        let token_store = TokenStore::new(store.clone());
        assert_eq!(token_store.cached(), None);
        let loaded = token_store.load().await.unwrap();
        assert_eq!(loaded.secret(), "persisted");
        assert_eq!(token_store.cached(), Some(loaded));
    }

    #[tokio::test]
    async fn test_load_only_reads_storage_once() {
        let store = Arc::new(MemorySecureStore::default());
        store.insert(TOKEN_STORAGE_KEY, b"abc").await;
        let token_store = TokenStore::new(store.clone());

        token_store.load().await;
        token_store.load().await;

        assert_eq!(store.get_count(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_secret_is_deleted() {
        let store = Arc::new(MemorySecureStore::default());
        store.insert(TOKEN_STORAGE_KEY, &[0xff, 0xfe, 0x00]).await;
        let token_store = TokenStore::new(store.clone());

        assert_eq!(token_store.load().await, None);
        assert!(!store.contains(TOKEN_STORAGE_KEY).await);
    }

    #[tokio::test]
    async fn test_read_failure_degrades_to_none() {
        let store = Arc::new(MemorySecureStore::default());
        store.insert(TOKEN_STORAGE_KEY, b"abc").await;
        store.fail_reads(true);
        let token_store = TokenStore::new(store.clone());

        assert_eq!(token_store.load().await, None);
    }

    #[tokio::test]
    async fn test_write_failure_keeps_session_token() {
        let store = Arc::new(MemorySecureStore::default());
        store.fail_writes(true);
        let token_store = TokenStore::new(store.clone());

        token_store.save(AccessToken::new("session-only")).await;

        assert_eq!(token_store.cached().unwrap().secret(), "session-only");
        assert_eq!(token_store.load().await.unwrap().secret(), "session-only");
        assert!(!store.contains(TOKEN_STORAGE_KEY).await);
    }

    #[tokio::test]
    async fn test_expired_token_loads_as_absent() {
        let store = Arc::new(MemorySecureStore::default());
        let expired = jwt_with_claims(json!({ "exp": 1_000 }));
        store.insert(TOKEN_STORAGE_KEY, expired.as_bytes()).await;
        let token_store = TokenStore::new(store.clone());

        assert_eq!(token_store.load().await, None);
        assert!(!store.contains(TOKEN_STORAGE_KEY).await);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let store = Arc::new(MemorySecureStore::default());
        let token_store = TokenStore::new(store.clone());
        token_store.save(AccessToken::new("abc")).await;

        token_store.clear().await;
        token_store.clear().await;

        assert_eq!(token_store.load().await, None);
        assert!(!store.contains(TOKEN_STORAGE_KEY).await);
    }

    #[tokio::test]
    async fn test_clear_if_current_spares_newer_token() {
        let store = Arc::new(MemorySecureStore::default());
        let token_store = TokenStore::new(store.clone());

        let old = AccessToken::new("old");
        token_store.save(old.clone()).await;
        token_store.save(AccessToken::new("new")).await;

        assert!(!token_store.clear_if_current(&old).await);
        assert_eq!(token_store.cached().unwrap().secret(), "new");
        assert!(store.contains(TOKEN_STORAGE_KEY).await);

        let current = token_store.cached().unwrap();
        assert!(token_store.clear_if_current(&current).await);
        assert_eq!(token_store.cached(), None);
        assert!(!store.contains(TOKEN_STORAGE_KEY).await);
    }

    #[tokio::test]
    async fn test_expires_in_survives_restart() {
        let store = Arc::new(MemorySecureStore::default());
        let token = AccessToken::new("opaque").with_expires_in(3600);
        let expires_at = token.expires_at();
        assert!(expires_at.is_some());

        TokenStore::new(store.clone()).save(token).await;

        let loaded = TokenStore::new(store).load().await.unwrap();
        assert_eq!(loaded.secret(), "opaque");
        assert_eq!(loaded.expires_at(), expires_at);
    }

    #[tokio::test]
    async fn test_stored_expiry_in_the_past_loads_as_absent() {
        let store = Arc::new(MemorySecureStore::default());
        store
            .insert(
                TOKEN_STORAGE_KEY,
                br#"{"access_token":"opaque","expires_at":1000}"#,
            )
            .await;
        let token_store = TokenStore::new(store.clone());

        assert_eq!(token_store.load().await, None);
        assert!(!store.contains(TOKEN_STORAGE_KEY).await);
    }

    #[tokio::test]
    async fn test_bare_secret_from_older_builds_still_loads() {
        let store = Arc::new(MemorySecureStore::default());
        store.insert(TOKEN_STORAGE_KEY, b"legacy-token\n").await;

        let loaded = TokenStore::new(store).load().await.unwrap();
        assert_eq!(loaded.secret(), "legacy-token");
        assert_eq!(loaded.expires_at(), None);
    }

    #[tokio::test]
    async fn test_malformed_record_is_deleted() {
        let store = Arc::new(MemorySecureStore::default());
        store
            .insert(TOKEN_STORAGE_KEY, br#"{"access_token":"#)
            .await;
        let token_store = TokenStore::new(store.clone());

        assert_eq!(token_store.load().await, None);
        assert!(!store.contains(TOKEN_STORAGE_KEY).await);
    }

    #[tokio::test]
    async fn test_save_during_stale_clear_keeps_new_token_persisted() {
        let store = Arc::new(MemorySecureStore::default());
        let token_store = Arc::new(TokenStore::new(store.clone()));
        let old = AccessToken::new("old");
        token_store.save(old.clone()).await;

        let release = store.hold_deletes();
        let clearing = {
            let token_store = token_store.clone();
            tokio::spawn(async move { token_store.clear_if_current(&old).await })
        };
        store.delete_started().await;

        let saving = {
            let token_store = token_store.clone();
            tokio::spawn(async move { token_store.save(AccessToken::new("new")).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        release.notify_one();

        assert!(clearing.await.unwrap());
        saving.await.unwrap();

        assert_eq!(token_store.cached().unwrap().secret(), "new");
        assert!(store.contains(TOKEN_STORAGE_KEY).await);
        let reloaded = TokenStore::new(store).load().await.unwrap();
        assert_eq!(reloaded.secret(), "new");
    }
}
