//! In-memory record source.
//!
//! Items are kept in a `BTreeMap` keyed by identifier behind a tokio `RwLock`.
//! Each item carries one metadata fragment per format it is available in.
//! Listing orders matches by datestamp, then identifier, so pages taken with
//! increasing offsets partition the result set.
//!
//! # Example Usage
//!
//! ```rust
//! use oai_pmh_server::providers::{InMemoryRecordSource, RecordSource};
//! use oai_pmh_server::record::{MetadataFormat, MetadataFragment, RecordQuery};
//! use chrono::Utc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = InMemoryRecordSource::new();
//! source.add_format(MetadataFormat::oai_dc()).await;
//! source
//!     .put_record(
//!         "oai:example.org:1",
//!         Utc::now(),
//!         "oai_dc",
//!         MetadataFragment::parse("<oai_dc:dc xmlns:oai_dc=\"http://www.openarchives.org/OAI/2.0/oai_dc/\"/>")?,
//!     )
//!     .await;
//!
//! let total = source.count_records(&RecordQuery::new("oai_dc")).await?;
//! assert_eq!(total, 1);
//! # Ok(())
//! # }
//! ```

use crate::error::{ProtocolError, SourceError};
use crate::providers::RecordSource;
use crate::record::{MetadataFormat, MetadataFragment, Record, RecordQuery};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct Item {
    datestamp: DateTime<Utc>,
    deleted: bool,
    metadata: HashMap<String, MetadataFragment>,
}

#[derive(Debug, Default)]
struct Catalog {
    formats: Vec<MetadataFormat>,
    items: BTreeMap<String, Item>,
}

impl Catalog {
    fn matching<'a>(&'a self, query: &'a RecordQuery) -> Vec<(&'a String, &'a Item)> {
        let mut matches: Vec<_> = self
            .items
            .iter()
            .filter(|(_, item)| {
                item.metadata.contains_key(&query.metadata_prefix) && query.matches(&item.datestamp)
            })
            .collect();
        matches.sort_by(|(a_id, a), (b_id, b)| a.datestamp.cmp(&b.datestamp).then(a_id.cmp(b_id)));
        matches
    }

    fn to_record(identifier: &str, item: &Item, metadata_prefix: &str) -> Record {
        if item.deleted {
            return Record::deleted(identifier, item.datestamp);
        }
        Record {
            identifier: identifier.to_string(),
            datestamp: item.datestamp,
            deleted: false,
            metadata: item.metadata.get(metadata_prefix).cloned(),
        }
    }
}

/// Thread-safe in-memory record source.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordSource {
    catalog: Arc<RwLock<Catalog>>,
}

impl InMemoryRecordSource {
    /// Create an empty source with no formats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a repository-wide format, replacing one with the same prefix.
    pub async fn add_format(&self, format: MetadataFormat) {
        let mut catalog = self.catalog.write().await;
        catalog.formats.retain(|existing| existing.prefix != format.prefix);
        catalog.formats.push(format);
    }

    /// Store the metadata of an item in one format.
    ///
    /// The item's datestamp is updated to `datestamp` and it is no longer
    /// considered deleted.
    pub async fn put_record(
        &self,
        identifier: impl Into<String>,
        datestamp: DateTime<Utc>,
        metadata_prefix: impl Into<String>,
        metadata: MetadataFragment,
    ) {
        let mut catalog = self.catalog.write().await;
        let item = catalog.items.entry(identifier.into()).or_insert_with(|| Item {
            datestamp,
            deleted: false,
            metadata: HashMap::new(),
        });
        item.datestamp = datestamp;
        item.deleted = false;
        item.metadata.insert(metadata_prefix.into(), metadata);
    }

    /// Mark an item as deleted. Returns whether the item existed.
    pub async fn delete_record(&self, identifier: &str, datestamp: DateTime<Utc>) -> bool {
        let mut catalog = self.catalog.write().await;
        match catalog.items.get_mut(identifier) {
            Some(item) => {
                item.deleted = true;
                item.datestamp = datestamp;
                true
            }
            None => false,
        }
    }

    /// Remove everything, formats included.
    pub async fn clear(&self) {
        let mut catalog = self.catalog.write().await;
        catalog.formats.clear();
        catalog.items.clear();
    }

    pub async fn stats(&self) -> InMemorySourceStats {
        let catalog = self.catalog.read().await;
        InMemorySourceStats {
            format_count: catalog.formats.len(),
            item_count: catalog.items.len(),
            deleted_count: catalog.items.values().filter(|item| item.deleted).count(),
        }
    }
}

/// Counters describing an [`InMemoryRecordSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemorySourceStats {
    pub format_count: usize,
    pub item_count: usize,
    pub deleted_count: usize,
}

impl RecordSource for InMemoryRecordSource {
    async fn list_metadata_formats(
        &self,
        identifier: Option<&str>,
    ) -> Result<Vec<MetadataFormat>, SourceError> {
        let catalog = self.catalog.read().await;
        let Some(identifier) = identifier else {
            return Ok(catalog.formats.clone());
        };

        let item = catalog
            .items
            .get(identifier)
            .ok_or_else(ProtocolError::id_does_not_exist)?;

        Ok(catalog
            .formats
            .iter()
            .filter(|format| item.metadata.contains_key(&format.prefix))
            .cloned()
            .collect())
    }

    async fn get_record(
        &self,
        identifier: &str,
        metadata_prefix: &str,
    ) -> Result<Option<Record>, SourceError> {
        let catalog = self.catalog.read().await;
        let Some(item) = catalog.items.get(identifier) else {
            return Ok(None);
        };
        if !item.metadata.contains_key(metadata_prefix) {
            return Err(ProtocolError::cannot_disseminate_format().into());
        }
        Ok(Some(Catalog::to_record(identifier, item, metadata_prefix)))
    }

    async fn count_records(&self, query: &RecordQuery) -> Result<usize, SourceError> {
        let catalog = self.catalog.read().await;
        Ok(catalog.matching(query).len())
    }

    async fn list_records(
        &self,
        query: &RecordQuery,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Record>, SourceError> {
        let catalog = self.catalog.read().await;
        Ok(catalog
            .matching(query)
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(identifier, item)| Catalog::to_record(identifier, item, &query.metadata_prefix))
            .collect())
    }
}
