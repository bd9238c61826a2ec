//! Server configuration and builder.
//!
//! [`OaiServerConfig`] holds the tunables of the pagination protocol: how many
//! records go into one page and how long an issued resumption token stays
//! valid. Token-store addressing belongs to the store itself (see
//! [`FileTokenStore`](crate::token::FileTokenStore)).

use crate::error::{OaiError, OaiResult};
use crate::providers::RecordSource;
use crate::server::OaiPmhServer;
use crate::server::identity::RepositoryIdentity;
use crate::token::ResumptionTokenStore;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MAX_RECORDS: usize = 100;
pub const DEFAULT_TOKEN_VALIDITY_SECS: u64 = 86_400;
const MAX_TOKEN_VALIDITY_SECS: u64 = 10 * 365 * 86_400;

fn default_max_records() -> usize {
    DEFAULT_MAX_RECORDS
}

fn default_token_validity_secs() -> u64 {
    DEFAULT_TOKEN_VALIDITY_SECS
}

/// Pagination settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OaiServerConfig {
    /// Maximum number of records or headers per ListRecords/ListIdentifiers page
    #[serde(default = "default_max_records")]
    pub max_records: usize,

    /// Lifetime of a resumption token, in seconds
    #[serde(default = "default_token_validity_secs")]
    pub token_validity_secs: u64,
}

impl Default for OaiServerConfig {
    fn default() -> Self {
        Self {
            max_records: DEFAULT_MAX_RECORDS,
            token_validity_secs: DEFAULT_TOKEN_VALIDITY_SECS,
        }
    }
}

impl OaiServerConfig {
    /// Parse a configuration from JSON, filling in defaults, and validate it.
    pub fn from_json_str(json: &str) -> OaiResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| OaiError::configuration(format!("Invalid server configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// The token validity window as a chrono duration.
    pub fn token_validity(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.token_validity_secs.min(MAX_TOKEN_VALIDITY_SECS) as i64)
    }

    pub fn validate(&self) -> OaiResult<()> {
        if self.max_records == 0 {
            return Err(OaiError::configuration("max_records must be at least 1"));
        }

        if self.token_validity_secs == 0 {
            return Err(OaiError::configuration("Token validity must be at least one second"));
        }

        if self.token_validity_secs > MAX_TOKEN_VALIDITY_SECS {
            return Err(OaiError::configuration(format!(
                "Token validity cannot exceed {} seconds",
                MAX_TOKEN_VALIDITY_SECS
            )));
        }

        Ok(())
    }
}

/// Builder for configuring and creating [`OaiPmhServer`] instances.
///
/// # Examples
///
/// ```rust
/// use oai_pmh_server::{OaiPmhServerBuilder, RepositoryIdentity};
/// use oai_pmh_server::providers::InMemoryRecordSource;
/// use oai_pmh_server::token::InMemoryTokenStore;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let identity = RepositoryIdentity::new(
///     "Example Repository",
///     "https://repo.example.org/oai",
///     "admin@example.org",
///     "2000-01-01T00:00:00Z",
/// );
///
/// let server = OaiPmhServerBuilder::new(InMemoryRecordSource::new(), InMemoryTokenStore::new(), identity)
///     .with_max_records(50)
///     .with_token_validity(Duration::from_secs(3600))
///     .build()?;
/// assert_eq!(server.config().max_records, 50);
/// # Ok(())
/// # }
/// ```
pub struct OaiPmhServerBuilder<S, T> {
    source: S,
    tokens: T,
    identity: RepositoryIdentity,
    config: OaiServerConfig,
}

impl<S: RecordSource, T: ResumptionTokenStore> OaiPmhServerBuilder<S, T> {
    /// Start from the default configuration.
    pub fn new(source: S, tokens: T, identity: RepositoryIdentity) -> Self {
        Self {
            source,
            tokens,
            identity,
            config: OaiServerConfig::default(),
        }
    }

    /// Set the page size of ListRecords/ListIdentifiers.
    pub fn with_max_records(mut self, max_records: usize) -> Self {
        self.config.max_records = max_records;
        self
    }

    /// Set how long issued resumption tokens stay valid.
    ///
    /// Sub-second precision is dropped.
    pub fn with_token_validity(mut self, validity: Duration) -> Self {
        self.config.token_validity_secs = validity.as_secs();
        self
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, config: OaiServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate configuration and identity and create the server.
    ///
    /// # Errors
    ///
    /// Returns [`OaiError::Configuration`] if either is invalid.
    pub fn build(self) -> OaiResult<OaiPmhServer<S, T>> {
        OaiPmhServer::with_config(self.source, self.tokens, self.identity, self.config)
    }
}
