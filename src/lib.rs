//! OAI-PMH 2.0 data provider library for Rust.
//!
//! Implements the server side of the Open Archives Initiative Protocol for
//! Metadata Harvesting: verb dispatch and argument validation, the
//! resumption-token continuation protocol and assembly of conforming XML
//! responses. Records come from a pluggable [`RecordSource`]; continuation
//! state lives in a pluggable [`ResumptionTokenStore`].
//!
//! # Core Components
//!
//! - [`OaiPmhServer`] - Main server answering OAI-PMH requests
//! - [`RecordSource`] - Trait for exposing a record store to harvesters
//! - [`ResumptionTokenStore`] - Trait for persisting paged-list continuations
//! - [`ResponseDocument`] - A complete response, serializable to XML
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use oai_pmh_server::{OaiPmhServerBuilder, OaiRequest, RepositoryIdentity};
//! use oai_pmh_server::providers::InMemoryRecordSource;
//! use oai_pmh_server::record::{MetadataFormat, MetadataFragment};
//! use oai_pmh_server::token::InMemoryTokenStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = InMemoryRecordSource::new();
//! source.add_format(MetadataFormat::oai_dc()).await;
//! source
//!     .put_record(
//!         "oai:example.org:1",
//!         chrono::Utc::now(),
//!         "oai_dc",
//!         MetadataFragment::parse("<oai_dc:dc xmlns:oai_dc=\"http://www.openarchives.org/OAI/2.0/oai_dc/\"/>")?,
//!     )
//!     .await;
//!
//! let identity = RepositoryIdentity::new(
//!     "Example Repository",
//!     "https://example.org/oai",
//!     "admin@example.org",
//!     "2000-01-01T00:00:00Z",
//! );
//! let server = OaiPmhServerBuilder::new(source, InMemoryTokenStore::new(), identity)
//!     .with_max_records(100)
//!     .build()?;
//!
//! let request = OaiRequest::from_pairs(
//!     "https://example.org/oai",
//!     [("verb", "ListRecords"), ("metadataPrefix", "oai_dc")],
//! );
//! let xml = server.handle(&request).await?.to_xml()?;
//! # Ok(())
//! # }
//! ```

pub mod datestamp;
pub mod error;
pub mod providers;
pub mod record;
pub mod request;
pub mod response;
pub mod server;
pub mod token;

// Re-export commonly used types for convenience
pub use datestamp::{Datestamp, Granularity};
pub use error::{OaiError, OaiErrorCode, OaiResult, ProtocolError, SourceError};
pub use providers::{InMemoryRecordSource, RecordSource};
pub use record::{MetadataFormat, MetadataFragment, Record, RecordQuery};
pub use request::{OaiRequest, Verb};
pub use response::ResponseDocument;
pub use server::{
    DeletedRecordPolicy, OaiPmhServer, OaiPmhServerBuilder, OaiServerConfig, RepositoryIdentity,
};
pub use token::{Continuation, FileTokenStore, InMemoryTokenStore, ResumptionTokenStore};
