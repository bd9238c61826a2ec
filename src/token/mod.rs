//! Resumption token storage.
//!
//! A resumption token is the opaque handle a harvester presents to fetch the
//! next page of a ListRecords/ListIdentifiers result. Behind the handle the
//! store keeps a [`Continuation`]: how many records were delivered so far and
//! the filters of the original query.
//!
//! # Contract
//!
//! - `issue` mints an unguessable identity that never collides with a live
//!   token and persists the continuation with its expiration instant.
//! - `resolve` is read-once: it atomically removes the token and returns the
//!   continuation only if it has not expired. An expired token is
//!   indistinguishable from an absent one (both yield `None`). Of two
//!   concurrent resolutions of the same token exactly one succeeds.
//! - Expired tokens are purged lazily on lookup and explicitly through
//!   `purge_expired`.
//!
//! The store knows nothing about OAI-PMH error codes; mapping `None` to
//! `badResumptionToken` is the dispatch engine's job.
//!
//! # Example Usage
//!
//! ```rust
//! use oai_pmh_server::token::{Continuation, InMemoryTokenStore, ResumptionTokenStore};
//! use chrono::{Duration, Utc};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryTokenStore::new();
//! let continuation = Continuation::new(50, "oai_dc", None, None);
//!
//! let issued = store.issue(continuation.clone(), Utc::now() + Duration::hours(1)).await?;
//! assert_eq!(store.resolve(issued.token()).await?, Some(continuation));
//! assert_eq!(store.resolve(issued.token()).await?, None);
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod file;
pub mod in_memory;


pub use errors::TokenStoreError;
pub use file::FileTokenStore;
pub use in_memory::InMemoryTokenStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Continuation state of a paged list request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Continuation {
    /// Number of records delivered before the next page
    pub cursor: usize,
    pub metadata_prefix: String,
    /// `from` argument of the original request, as sent
    pub from: Option<String>,
    /// `until` argument of the original request, as sent
    pub until: Option<String>,
}

impl Continuation {
    pub fn new(
        cursor: usize,
        metadata_prefix: impl Into<String>,
        from: Option<String>,
        until: Option<String>,
    ) -> Self {
        Self {
            cursor,
            metadata_prefix: metadata_prefix.into(),
            from,
            until,
        }
    }
}

/// A continuation as persisted by a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub continuation: Continuation,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl StoredToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// A freshly minted token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl IssuedToken {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// The opaque value handed to the harvester.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

/// Generate an unguessable token identity.
pub(crate) fn new_token_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Durable, expiring, read-once mapping from token strings to continuations.
pub trait ResumptionTokenStore: Send + Sync {
    /// Persist `continuation` under a new token valid until `expires_at`.
    fn issue(
        &self,
        continuation: Continuation,
        expires_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<IssuedToken, TokenStoreError>> + Send;

    /// Remove the token and return its continuation if it was live.
    ///
    /// Returns `None` when the token is unknown, already consumed or expired.
    fn resolve(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Option<Continuation>, TokenStoreError>> + Send;

    /// Delete every expired token, returning how many were removed.
    ///
    /// Persistent stores also delete entries that no longer decode.
    fn purge_expired(&self) -> impl Future<Output = Result<usize, TokenStoreError>> + Send;

    /// Number of tokens currently stored, expired ones included.
    fn len(&self) -> impl Future<Output = Result<usize, TokenStoreError>> + Send;
}
