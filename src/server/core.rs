//! Core server structure and the request entry point.

use crate::error::{OaiResult, ProtocolError};
use crate::providers::RecordSource;
use crate::request::{OaiRequest, Verb};
use crate::response::{ResponseAssembler, ResponseDocument};
use crate::server::builder::OaiServerConfig;
use crate::server::dispatch::RequestContext;
use crate::server::identity::RepositoryIdentity;
use crate::token::ResumptionTokenStore;
use log::{debug, info};

/// OAI-PMH data provider.
///
/// The server validates harvester requests, pulls records from its
/// [`RecordSource`] and keeps paged list requests going through its
/// [`ResumptionTokenStore`]. It holds no per-request state, so a single
/// instance can serve many requests concurrently.
///
/// # Type Parameters
///
/// * `S` - The record source type that implements [`RecordSource`]
/// * `T` - The token store type that implements [`ResumptionTokenStore`]
///
/// # Examples
///
/// ```rust
/// use oai_pmh_server::{OaiPmhServer, OaiRequest, RepositoryIdentity};
/// use oai_pmh_server::providers::InMemoryRecordSource;
/// use oai_pmh_server::token::InMemoryTokenStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let identity = RepositoryIdentity::new(
///     "Example Repository",
///     "https://repo.example.org/oai",
///     "admin@example.org",
///     "2000-01-01T00:00:00Z",
/// );
/// let server = OaiPmhServer::new(InMemoryRecordSource::new(), InMemoryTokenStore::new(), identity)?;
///
/// let request = OaiRequest::new("https://repo.example.org/oai").with_verb("Identify");
/// let response = server.handle(&request).await?;
/// assert!(!response.is_error());
/// # Ok(())
/// # }
/// ```
pub struct OaiPmhServer<S, T> {
    pub(super) source: S,
    pub(super) tokens: T,
    pub(super) identity: RepositoryIdentity,
    pub(super) config: OaiServerConfig,
}

impl<S: RecordSource, T: ResumptionTokenStore> OaiPmhServer<S, T> {
    /// Creates a server with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`OaiError::Configuration`](crate::error::OaiError::Configuration)
    /// if the identity is invalid.
    pub fn new(source: S, tokens: T, identity: RepositoryIdentity) -> OaiResult<Self> {
        Self::with_config(source, tokens, identity, OaiServerConfig::default())
    }

    /// Creates a server with an explicit configuration.
    ///
    /// This is the constructor used by [`OaiPmhServerBuilder`](crate::server::OaiPmhServerBuilder).
    pub fn with_config(
        source: S,
        tokens: T,
        identity: RepositoryIdentity,
        config: OaiServerConfig,
    ) -> OaiResult<Self> {
        config.validate()?;
        identity.validate()?;

        Ok(Self {
            source,
            tokens,
            identity,
            config,
        })
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn tokens(&self) -> &T {
        &self.tokens
    }

    pub fn identity(&self) -> &RepositoryIdentity {
        &self.identity
    }

    pub fn config(&self) -> &OaiServerConfig {
        &self.config
    }

    /// Answer one request.
    ///
    /// Protocol problems never surface as `Err`: they are reported inside the
    /// returned document as `error` nodes.
    ///
    /// # Errors
    ///
    /// Returns [`OaiError::TokenStore`](crate::error::OaiError::TokenStore) if
    /// the resumption token store fails while issuing or resolving a token.
    pub async fn handle(&self, request: &OaiRequest) -> OaiResult<ResponseDocument> {
        let verb = match request.parse_verb() {
            Ok(verb) => verb,
            Err(_) => {
                debug!("Rejecting request with verb {:?}", request.verb());
                return Ok(ResponseDocument::bad_verb(request));
            }
        };

        let mut context = RequestContext::new(request, verb);
        for name in request.repeated_arguments() {
            context.fail(ProtocolError::bad_argument(format!(
                "argument '{}' is repeated",
                name
            )));
        }

        let mut assembler = ResponseAssembler::new(verb, self.identity.granularity);
        match verb {
            Verb::Identify => self.identify(&mut context, &mut assembler),
            Verb::ListMetadataFormats => {
                self.list_metadata_formats(&mut context, &mut assembler)
                    .await
            }
            Verb::ListSets => self.list_sets(&mut context),
            Verb::GetRecord => self.get_record(&mut context, &mut assembler).await,
            Verb::ListIdentifiers | Verb::ListRecords => {
                self.list_records(&mut context, &mut assembler).await?
            }
        }

        let errors = context.into_errors();
        if errors.is_empty() {
            debug!("{} succeeded", verb);
        } else {
            debug!("{} failed with {} error(s)", verb, errors.len());
        }
        Ok(assembler.finish(request, errors))
    }

    /// Reap every expired resumption token. Returns how many were removed.
    pub async fn purge_expired_tokens(&self) -> OaiResult<usize> {
        let purged = self.tokens.purge_expired().await?;
        if purged > 0 {
            info!("Purged {} expired resumption token(s)", purged);
        }
        Ok(purged)
    }
}
