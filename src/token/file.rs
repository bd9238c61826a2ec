//! Filesystem-backed resumption token store.
//!
//! Each token is one JSON file in a directory. The file name is the configured
//! prefix followed by the URL-safe base64 SHA-256 digest of the token, so a
//! token presented by a harvester is never used as a path component.
//!
//! Issuing writes the continuation to a staging file first and then hard-links
//! it under the token name. Linking never replaces an existing file, so live
//! tokens cannot collide, and a token file only appears once it is complete. A
//! failed write removes the staging file. Resolving first claims the file by renaming it to a unique
//! name; rename is atomic, so of two concurrent resolutions only one finds the
//! file. The claimed file is then read and deleted.
//!
//! Expired tokens are only reaped by [`purge_expired`], not on lookup. Purging
//! also deletes token files that no longer decode.
//!
//! [`purge_expired`]: crate::token::ResumptionTokenStore::purge_expired
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use oai_pmh_server::token::{Continuation, FileTokenStore, ResumptionTokenStore};
//! use chrono::{Duration, Utc};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = FileTokenStore::new("/tmp", "oai2-")?;
//! store.ensure_directory().await?;
//!
//! let issued = store
//!     .issue(Continuation::new(100, "oai_dc", None, None), Utc::now() + Duration::hours(24))
//!     .await?;
//! let continuation = store.resolve(issued.token()).await?;
//! # Ok(())
//! # }
//! ```

use crate::token::{
    Continuation, IssuedToken, ResumptionTokenStore, StoredToken, TokenStoreError, new_token_id,
};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const MAX_ISSUE_ATTEMPTS: usize = 8;
const CLAIM_MARKER: &str = ".claimed-";
const STAGING_MARKER: &str = ".staged-";

/// What a token file held when it was read.
#[derive(Debug)]
enum TokenFile {
    Missing,
    Unreadable,
    Stored(StoredToken),
}

/// Token store keeping one JSON file per token.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    directory: PathBuf,
    prefix: String,
}

impl FileTokenStore {
    /// Create a store writing `<directory>/<prefix><digest>` files.
    ///
    /// # Errors
    ///
    /// Returns [`TokenStoreError::Configuration`] if the prefix is empty or
    /// contains a path separator or a dot.
    pub fn new(directory: impl Into<PathBuf>, prefix: impl Into<String>) -> Result<Self, TokenStoreError> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(TokenStoreError::configuration("token file prefix must not be empty", "prefix"));
        }
        if prefix.contains(['/', '\\', '.']) {
            return Err(TokenStoreError::configuration(
                "token file prefix must not contain path separators or dots",
                "prefix",
            ));
        }

        Ok(Self {
            directory: directory.into(),
            prefix,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Create the token directory if it does not exist.
    pub async fn ensure_directory(&self) -> Result<(), TokenStoreError> {
        fs::create_dir_all(&self.directory)
            .await
            .map_err(|e| TokenStoreError::io("create token directory", &self.directory, e))
    }

    fn path_for(&self, token: &str) -> PathBuf {
        let digest = URL_SAFE_NO_PAD.encode(Sha256::digest(token.as_bytes()));
        self.directory.join(format!("{}{}", self.prefix, digest))
    }

    /// Whether a directory entry is a live (unclaimed) token file of this store.
    fn is_token_file(&self, name: &str) -> bool {
        name.starts_with(&self.prefix) && !name[self.prefix.len()..].contains('.')
    }

    async fn token_files(&self) -> Result<Vec<PathBuf>, TokenStoreError> {
        let mut entries = match fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(TokenStoreError::io("list token directory", &self.directory, e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| TokenStoreError::io("list token directory", &self.directory, e))?
        {
            if entry.file_name().to_str().is_some_and(|name| self.is_token_file(name)) {
                files.push(entry.path());
            }
        }
        Ok(files)
    }

    async fn read_token_file(path: &Path) -> Result<TokenFile, TokenStoreError> {
        let contents = match fs::read(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(TokenFile::Missing),
            Err(e) => return Err(TokenStoreError::io("read token", path, e)),
        };

        match serde_json::from_slice(&contents) {
            Ok(stored) => Ok(TokenFile::Stored(stored)),
            Err(e) => {
                warn!("Unreadable token file {}: {}", path.display(), e);
                Ok(TokenFile::Unreadable)
            }
        }
    }

    /// A unique scratch name that is never mistaken for a token file.
    fn staging_path(&self) -> PathBuf {
        self.directory
            .join(format!("{}{}{}", self.prefix, STAGING_MARKER, new_token_id()))
    }

    async fn write_staged(path: &Path, contents: &[u8]) -> Result<(), TokenStoreError> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
            .map_err(|e| TokenStoreError::io("create token", path, e))?;
        file.write_all(contents)
            .await
            .map_err(|e| TokenStoreError::io("write token", path, e))?;
        file.flush()
            .await
            .map_err(|e| TokenStoreError::io("write token", path, e))
    }

    /// Link the fully written staging file under a fresh token name.
    async fn publish(&self, staged: &Path, expires_at: DateTime<Utc>) -> Result<IssuedToken, TokenStoreError> {
        for _ in 0..MAX_ISSUE_ATTEMPTS {
            let token = new_token_id();
            let path = self.path_for(&token);

            match fs::hard_link(staged, &path).await {
                Ok(()) => {
                    debug!("Issued resumption token file {}", path.display());
                    return Ok(IssuedToken::new(token, expires_at));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(TokenStoreError::io("publish token", &path, e)),
            }
        }

        Err(TokenStoreError::IdentityExhausted {
            attempts: MAX_ISSUE_ATTEMPTS,
        })
    }

    async fn remove(path: &Path) -> Result<(), TokenStoreError> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TokenStoreError::io("delete token", path, e)),
        }
    }
}

impl ResumptionTokenStore for FileTokenStore {
    async fn issue(
        &self,
        continuation: Continuation,
        expires_at: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenStoreError> {
        let stored = StoredToken {
            continuation,
            issued_at: Utc::now(),
            expires_at,
        };
        let contents = serde_json::to_vec(&stored)
            .map_err(|e| TokenStoreError::serialization("encode continuation", e))?;

        let staged = self.staging_path();
        if let Err(e) = Self::write_staged(&staged, &contents).await {
            Self::remove(&staged).await?;
            return Err(e);
        }

        let published = self.publish(&staged, expires_at).await;
        Self::remove(&staged).await?;
        published
    }

    async fn resolve(&self, token: &str) -> Result<Option<Continuation>, TokenStoreError> {
        let path = self.path_for(token);
        let mut claimed = path.clone().into_os_string();
        claimed.push(CLAIM_MARKER);
        claimed.push(new_token_id());
        let claimed = PathBuf::from(claimed);

        match fs::rename(&path, &claimed).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Resumption token {} is unknown or already consumed", token);
                return Ok(None);
            }
            Err(e) => return Err(TokenStoreError::io("claim token", &path, e)),
        }

        let read = Self::read_token_file(&claimed).await;
        Self::remove(&claimed).await?;

        match read? {
            TokenFile::Stored(stored) if !stored.is_expired_at(Utc::now()) => Ok(Some(stored.continuation)),
            _ => Ok(None),
        }
    }

    async fn purge_expired(&self) -> Result<usize, TokenStoreError> {
        let now = Utc::now();
        let mut purged = 0;

        for path in self.token_files().await? {
            let stale = match Self::read_token_file(&path).await? {
                TokenFile::Missing => false,
                TokenFile::Unreadable => true,
                TokenFile::Stored(stored) => stored.is_expired_at(now),
            };
            if stale {
                Self::remove(&path).await?;
                purged += 1;
            }
        }

        if purged > 0 {
            info!(
                "Purged {} expired or unreadable resumption tokens from {}",
                purged,
                self.directory.display()
            );
        }
        Ok(purged)
    }

    async fn len(&self) -> Result<usize, TokenStoreError> {
        Ok(self.token_files().await?.len())
    }
}
