//! Records, metadata formats and selective-harvest queries.
//!
//! The core never inspects metadata content. A record's payload is carried as
//! a [`MetadataFragment`], an XML element that is spliced verbatim into the
//! response tree.

use crate::error::{OaiError, OaiResult};
use chrono::{DateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::{Deserialize, Serialize};

/// A metadata format a repository can disseminate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFormat {
    /// The `metadataPrefix` harvesters use to select the format
    pub prefix: String,
    /// Location of the XML schema
    pub schema: String,
    /// XML namespace of the format
    pub namespace: String,
}

impl MetadataFormat {
    pub fn new(
        prefix: impl Into<String>,
        schema: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            schema: schema.into(),
            namespace: namespace.into(),
        }
    }

    /// The Dublin Core format every OAI-PMH repository must support.
    pub fn oai_dc() -> Self {
        Self::new(
            "oai_dc",
            "http://www.openarchives.org/OAI/2.0/oai_dc.xsd",
            "http://www.openarchives.org/OAI/2.0/oai_dc/",
        )
    }
}

/// An opaque XML payload with exactly one root element.
///
/// Construction checks well-formedness and strips anything outside the root
/// element (XML declaration, comments, processing instructions, doctype), so
/// the fragment can be embedded in another document unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataFragment {
    xml: String,
}

impl MetadataFragment {
    /// Parse and validate an XML fragment.
    ///
    /// # Errors
    ///
    /// Returns [`OaiError::Xml`] if the input is not well-formed, has no root
    /// element, more than one root element, or text outside the root.
    pub fn parse(xml: &str) -> OaiResult<Self> {
        let mut reader = Reader::from_str(xml);
        let mut depth = 0usize;
        let mut root: Option<(usize, usize)> = None;
        let mut root_start = 0usize;

        loop {
            let before = position(&reader)?;
            let event = reader
                .read_event()
                .map_err(|e| OaiError::xml(format!("malformed metadata fragment: {e}")))?;
            let after = position(&reader)?;

            match event {
                Event::Start(_) => {
                    if depth == 0 {
                        if root.is_some() {
                            return Err(OaiError::xml("metadata fragment has more than one root element"));
                        }
                        root_start = before;
                    }
                    depth += 1;
                }
                Event::End(_) => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| OaiError::xml("metadata fragment has an unmatched end tag"))?;
                    if depth == 0 {
                        root = Some((root_start, after));
                    }
                }
                Event::Empty(_) if depth == 0 => {
                    if root.is_some() {
                        return Err(OaiError::xml("metadata fragment has more than one root element"));
                    }
                    root = Some((before, after));
                }
                Event::Text(text) if depth == 0 => {
                    if !text.iter().all(u8::is_ascii_whitespace) {
                        return Err(OaiError::xml("metadata fragment has text outside its root element"));
                    }
                }
                Event::CData(_) if depth == 0 => {
                    return Err(OaiError::xml("metadata fragment has CDATA outside its root element"));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if depth != 0 {
            return Err(OaiError::xml("metadata fragment ends inside an element"));
        }

        match root {
            Some((start, end)) => Ok(Self {
                xml: xml[start..end].to_string(),
            }),
            None => Err(OaiError::xml("metadata fragment has no root element")),
        }
    }

    /// The fragment's serialized root element.
    pub fn as_str(&self) -> &str {
        &self.xml
    }
}

fn position(reader: &Reader<&[u8]>) -> OaiResult<usize> {
    usize::try_from(reader.buffer_position())
        .map_err(|_| OaiError::xml("metadata fragment too large"))
}

/// A repository item in one metadata format, as supplied by the record source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub identifier: String,
    pub datestamp: DateTime<Utc>,
    /// Deleted records are reported with a header only.
    pub deleted: bool,
    pub metadata: Option<MetadataFragment>,
}

impl Record {
    pub fn new(
        identifier: impl Into<String>,
        datestamp: DateTime<Utc>,
        metadata: MetadataFragment,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            datestamp,
            deleted: false,
            metadata: Some(metadata),
        }
    }

    /// A tombstone for a record that no longer exists.
    pub fn deleted(identifier: impl Into<String>, datestamp: DateTime<Utc>) -> Self {
        Self {
            identifier: identifier.into(),
            datestamp,
            deleted: true,
            metadata: None,
        }
    }
}

/// Selective-harvest criteria for ListRecords and ListIdentifiers.
///
/// `from` and `until` are inclusive bounds already widened to the instants
/// their datestamps cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    pub metadata_prefix: String,
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl RecordQuery {
    pub fn new(metadata_prefix: impl Into<String>) -> Self {
        Self {
            metadata_prefix: metadata_prefix.into(),
            from: None,
            until: None,
        }
    }

    /// Whether `datestamp` falls within the query's bounds.
    pub fn matches(&self, datestamp: &DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| *datestamp >= from)
            && self.until.is_none_or(|until| *datestamp <= until)
    }
}
