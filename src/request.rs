//! Inbound OAI-PMH requests.
//!
//! An [`OaiRequest`] is the transport-agnostic form of one harvester request:
//! the base URI it was addressed to, the raw `verb` value and the remaining
//! arguments in the order they arrived. Requests are built once and then only
//! read by the dispatch engine.

use crate::error::ProtocolError;
use std::fmt;
use std::str::FromStr;

/// The six OAI-PMH 2.0 verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Identify,
    ListMetadataFormats,
    ListSets,
    ListIdentifiers,
    ListRecords,
    GetRecord,
}

impl Verb {
    pub const ALL: [Verb; 6] = [
        Verb::Identify,
        Verb::ListMetadataFormats,
        Verb::ListSets,
        Verb::ListIdentifiers,
        Verb::ListRecords,
        Verb::GetRecord,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Identify => "Identify",
            Verb::ListMetadataFormats => "ListMetadataFormats",
            Verb::ListSets => "ListSets",
            Verb::ListIdentifiers => "ListIdentifiers",
            Verb::ListRecords => "ListRecords",
            Verb::GetRecord => "GetRecord",
        }
    }
}

impl FromStr for Verb {
    type Err = ProtocolError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Verb::ALL
            .into_iter()
            .find(|verb| verb.as_str() == value)
            .ok_or_else(ProtocolError::bad_verb)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single harvester request.
///
/// # Examples
///
/// ```rust
/// use oai_pmh_server::{OaiRequest, Verb};
///
/// let request = OaiRequest::from_pairs(
///     "https://repo.example.org/oai",
///     [("verb", "ListRecords"), ("metadataPrefix", "oai_dc")],
/// );
/// assert_eq!(request.parse_verb().unwrap(), Verb::ListRecords);
/// assert_eq!(request.argument("metadataPrefix"), Some("oai_dc"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OaiRequest {
    base_uri: String,
    verb: Option<String>,
    verb_repeated: bool,
    arguments: Vec<(String, String)>,
    repeated: Vec<String>,
}

impl OaiRequest {
    /// Create a request with no verb and no arguments.
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            verb: None,
            verb_repeated: false,
            arguments: Vec::new(),
            repeated: Vec::new(),
        }
    }

    /// Build a request from key/value pairs as they arrived on the wire.
    ///
    /// The `verb` pair is split off; every other pair becomes an argument. When
    /// a name occurs more than once the first value is kept and the name is
    /// remembered as repeated.
    pub fn from_pairs<I, K, V>(base_uri: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .fold(Self::new(base_uri), |request, (key, value)| {
                request.with_argument(key, value)
            })
    }

    /// Set the verb.
    pub fn with_verb(self, verb: impl Into<String>) -> Self {
        self.with_argument("verb", verb)
    }

    /// Append an argument (the name `verb` sets the verb).
    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();

        if name == "verb" {
            if self.verb.is_some() {
                self.verb_repeated = true;
            } else {
                self.verb = Some(value);
            }
        } else if self.has_argument(&name) {
            if !self.repeated.contains(&name) {
                self.repeated.push(name);
            }
        } else {
            self.arguments.push((name, value));
        }
        self
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// The raw verb value, if one was supplied.
    pub fn verb(&self) -> Option<&str> {
        self.verb.as_deref()
    }

    /// Interpret the verb; missing, empty, repeated or unknown verbs are `badVerb`.
    pub fn parse_verb(&self) -> Result<Verb, ProtocolError> {
        if self.verb_repeated {
            return Err(ProtocolError::bad_verb());
        }
        match self.verb.as_deref() {
            Some(verb) if !verb.is_empty() => verb.parse(),
            _ => Err(ProtocolError::bad_verb()),
        }
    }

    /// Arguments other than `verb`, in arrival order.
    pub fn arguments(&self) -> &[(String, String)] {
        &self.arguments
    }

    pub fn argument(&self, name: &str) -> Option<&str> {
        self.arguments
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_argument(&self, name: &str) -> bool {
        self.arguments.iter().any(|(key, _)| key == name)
    }

    /// Names of arguments supplied more than once.
    pub fn repeated_arguments(&self) -> &[String] {
        &self.repeated
    }

    /// Argument names not contained in `allowed`.
    pub fn unexpected_arguments<'a>(&'a self, allowed: &'a [&'a str]) -> impl Iterator<Item = &'a str> {
        self.arguments
            .iter()
            .map(|(key, _)| key.as_str())
            .filter(move |key| !allowed.contains(key))
    }
}
