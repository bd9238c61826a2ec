//! Structural assembly of verb bodies.
//!
//! The assembler owns no protocol logic. Handlers tell it which nodes to add;
//! it takes care of where they go: the single verb node is created lazily on
//! the first verb-scoped append, record headers follow the OAI layout, and the
//! resumption token node carries whichever attributes it is given.

use crate::datestamp::{Granularity, format_utc};
use crate::error::ProtocolError;
use crate::record::Record;
use crate::request::{OaiRequest, Verb};
use crate::response::xml::XmlElement;
use crate::response::{EchoedRequest, ResponseDocument};
use chrono::{DateTime, Utc};

/// Attributes and content of a `resumptionToken` node.
///
/// A node with `token: None` is the explicit end-of-list marker sent on the
/// last page of a multi-page answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResumptionTokenNode {
    pub token: Option<String>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub complete_list_size: Option<usize>,
    pub cursor: Option<usize>,
}

/// Builds the body of one response.
#[derive(Debug)]
pub struct ResponseAssembler {
    verb: Verb,
    granularity: Granularity,
    verb_node: Option<XmlElement>,
}

impl ResponseAssembler {
    /// Start a body for `verb`; record datestamps are written at `granularity`.
    pub fn new(verb: Verb, granularity: Granularity) -> Self {
        Self {
            verb,
            granularity,
            verb_node: None,
        }
    }

    /// The verb node, created on first use.
    pub fn verb_node(&mut self) -> &mut XmlElement {
        let verb = self.verb;
        self.verb_node
            .get_or_insert_with(|| XmlElement::new(verb.as_str()))
    }

    /// Append a child to the verb node.
    pub fn add_to_verb_node(&mut self, name: &str, text: Option<&str>) -> &mut XmlElement {
        self.verb_node().add_child(name, text)
    }

    /// Append a `header` for `record` directly under the verb node.
    pub fn add_header(&mut self, record: &Record) {
        let header = self.header(record);
        self.verb_node().push_element(header);
    }

    /// Append a full `record` node: header plus metadata unless deleted.
    pub fn add_record(&mut self, record: Record) {
        let header = self.header(&record);
        let node = self.add_to_verb_node("record", None);
        node.push_element(header);
        if let (false, Some(metadata)) = (record.deleted, record.metadata) {
            node.add_child("metadata", None).add_fragment(metadata);
        }
    }

    /// Append a `resumptionToken` node.
    pub fn add_resumption_token(&mut self, token: ResumptionTokenNode) {
        let node = self.add_to_verb_node("resumptionToken", token.token.as_deref());
        if let Some(expiration) = token.expiration_date {
            node.set_attribute("expirationDate", format_utc(&expiration));
        }
        if let Some(size) = token.complete_list_size {
            node.set_attribute("completeListSize", size.to_string());
        }
        if let Some(cursor) = token.cursor {
            node.set_attribute("cursor", cursor.to_string());
        }
    }

    fn header(&self, record: &Record) -> XmlElement {
        let mut header = XmlElement::new("header");
        if record.deleted {
            header.set_attribute("status", "deleted");
        }
        header.add_child("identifier", Some(&record.identifier));
        header.add_child("datestamp", Some(&self.granularity.format(&record.datestamp)));
        header
    }

    /// Close the body and produce the document.
    ///
    /// Any accumulated error replaces the body wholesale. A successful request
    /// that appended nothing still gets its (empty) verb node.
    pub fn finish(self, request: &OaiRequest, errors: Vec<ProtocolError>) -> ResponseDocument {
        let echoed = EchoedRequest::from_request(request, Some(self.verb));
        if errors.is_empty() {
            let body = self
                .verb_node
                .unwrap_or_else(|| XmlElement::new(self.verb.as_str()));
            ResponseDocument::success(echoed, body)
        } else {
            ResponseDocument::failure(echoed, errors)
        }
    }
}
