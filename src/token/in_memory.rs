//! In-memory resumption token store.
//!
//! Tokens live in a `HashMap` behind a tokio `RwLock`. Resolution takes the
//! write lock and removes the entry, which makes it read-once under any amount
//! of concurrency. Tokens do not survive a process restart; use
//! [`FileTokenStore`](crate::token::FileTokenStore) when they must.

use crate::token::{
    Continuation, IssuedToken, ResumptionTokenStore, StoredToken, TokenStoreError, new_token_id,
};
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

const MAX_ISSUE_ATTEMPTS: usize = 8;

/// Thread-safe in-memory token store.
///
/// Cloning is cheap and clones share the same tokens.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTokenStore {
    tokens: Arc<RwLock<HashMap<String, StoredToken>>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove all tokens (useful for testing).
    pub async fn clear(&self) {
        self.tokens.write().await.clear();
    }
}

impl ResumptionTokenStore for InMemoryTokenStore {
    async fn issue(
        &self,
        continuation: Continuation,
        expires_at: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenStoreError> {
        let mut tokens = self.tokens.write().await;

        for _ in 0..MAX_ISSUE_ATTEMPTS {
            let token = new_token_id();
            if tokens.contains_key(&token) {
                continue;
            }

            debug!("Issued resumption token {} at cursor {}", token, continuation.cursor);
            tokens.insert(
                token.clone(),
                StoredToken {
                    continuation,
                    issued_at: Utc::now(),
                    expires_at,
                },
            );
            return Ok(IssuedToken::new(token, expires_at));
        }

        Err(TokenStoreError::IdentityExhausted {
            attempts: MAX_ISSUE_ATTEMPTS,
        })
    }

    async fn resolve(&self, token: &str) -> Result<Option<Continuation>, TokenStoreError> {
        let now = Utc::now();
        let mut tokens = self.tokens.write().await;

        let resolved = tokens
            .remove(token)
            .filter(|stored| !stored.is_expired_at(now))
            .map(|stored| stored.continuation);

        tokens.retain(|_, stored| !stored.is_expired_at(now));

        debug!(
            "Resolved resumption token {}: {}",
            token,
            if resolved.is_some() { "live" } else { "unknown or expired" }
        );
        Ok(resolved)
    }

    async fn purge_expired(&self) -> Result<usize, TokenStoreError> {
        let now = Utc::now();
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, stored| !stored.is_expired_at(now));

        let purged = before - tokens.len();
        if purged > 0 {
            info!("Purged {} expired resumption tokens", purged);
        }
        Ok(purged)
    }

    async fn len(&self) -> Result<usize, TokenStoreError> {
        Ok(self.tokens.read().await.len())
    }
}
