//! Record source trait for supplying repository content.
//!
//! This is the pull interface the dispatch engine consumes. Implementations own
//! the record store; the engine only asks questions and never mutates it.
//!
//! # Examples
//!
//! ```rust
//! use oai_pmh_server::error::SourceError;
//! use oai_pmh_server::providers::RecordSource;
//! use oai_pmh_server::record::{MetadataFormat, Record, RecordQuery};
//! use std::future::Future;
//!
//! struct EmptyRepository;
//!
//! impl RecordSource for EmptyRepository {
//!     fn list_metadata_formats(
//!         &self,
//!         _identifier: Option<&str>,
//!     ) -> impl Future<Output = Result<Vec<MetadataFormat>, SourceError>> + Send {
//!         async { Ok(vec![MetadataFormat::oai_dc()]) }
//!     }
//!
//!     fn get_record(
//!         &self,
//!         _identifier: &str,
//!         _metadata_prefix: &str,
//!     ) -> impl Future<Output = Result<Option<Record>, SourceError>> + Send {
//!         async { Ok(None) }
//!     }
//!
//!     fn count_records(
//!         &self,
//!         _query: &RecordQuery,
//!     ) -> impl Future<Output = Result<usize, SourceError>> + Send {
//!         async { Ok(0) }
//!     }
//!
//!     fn list_records(
//!         &self,
//!         _query: &RecordQuery,
//!         _offset: usize,
//!         _limit: usize,
//!     ) -> impl Future<Output = Result<Vec<Record>, SourceError>> + Send {
//!         async { Ok(Vec::new()) }
//!     }
//! }
//! ```

use crate::error::SourceError;
use crate::record::{MetadataFormat, Record, RecordQuery};
use std::future::Future;

/// Pull interface to the repository's records.
///
/// Calls are assumed idempotent. The engine imposes no timeout and performs no
/// retries; failures are reported to the harvester as protocol errors. Return
/// [`SourceError::Protocol`] to choose the reported code yourself (for example
/// `idDoesNotExist` from `list_metadata_formats` for an unknown item).
pub trait RecordSource: Send + Sync {
    /// Formats available for `identifier`, or repository-wide when `None`.
    ///
    /// An empty list means no formats are available.
    fn list_metadata_formats(
        &self,
        identifier: Option<&str>,
    ) -> impl Future<Output = Result<Vec<MetadataFormat>, SourceError>> + Send;

    /// The record for an exact identifier/format pair, `None` if unknown.
    fn get_record(
        &self,
        identifier: &str,
        metadata_prefix: &str,
    ) -> impl Future<Output = Result<Option<Record>, SourceError>> + Send;

    /// Total number of records matching `query`.
    fn count_records(
        &self,
        query: &RecordQuery,
    ) -> impl Future<Output = Result<usize, SourceError>> + Send;

    /// Up to `limit` records matching `query`, skipping the first `offset`.
    ///
    /// The ordering must be stable across calls so that successive pages
    /// partition the result set.
    fn list_records(
        &self,
        query: &RecordQuery,
        offset: usize,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Record>, SourceError>> + Send;
}
