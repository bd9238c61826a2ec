//! OAI-PMH response documents.
//!
//! A [`ResponseDocument`] is the complete answer to one request: the response
//! timestamp, the echoed request and an [`Outcome`] that is either a verb body
//! or a non-empty list of protocol errors, never both. Documents serialize to
//! XML conforming to `http://www.openarchives.org/OAI/2.0/OAI-PMH.xsd`.
//!
//! # Module Organization
//!
//! * [`assembler`] - verb body construction primitives
//! * [`xml`] - element tree and serializer

pub mod assembler;
pub mod xml;

pub use assembler::{ResponseAssembler, ResumptionTokenNode};
pub use xml::{XmlElement, XmlNode};

use crate::datestamp::format_utc;
use crate::error::{OaiError, OaiErrorCode, OaiResult, ProtocolError};
use crate::request::{OaiRequest, Verb};
use chrono::{DateTime, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, Event};

pub const OAI_NAMESPACE: &str = "http://www.openarchives.org/OAI/2.0/";
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const OAI_SCHEMA_LOCATION: &str =
    "http://www.openarchives.org/OAI/2.0/ http://www.openarchives.org/OAI/2.0/OAI-PMH.xsd";

/// Argument names that may appear as attributes of the `request` element.
const ECHOED_ARGUMENTS: &[&str] = &[
    "identifier",
    "metadataPrefix",
    "from",
    "until",
    "set",
    "resumptionToken",
];

/// The `request` element of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoedRequest {
    pub base_uri: String,
    pub verb: Option<Verb>,
    pub arguments: Vec<(String, String)>,
}

impl EchoedRequest {
    /// Echo `request` as answered under `verb`.
    ///
    /// Without a legal verb only the base URI is echoed. Arguments that are
    /// not OAI-PMH argument names are never echoed.
    pub fn from_request(request: &OaiRequest, verb: Option<Verb>) -> Self {
        let arguments = match verb {
            Some(_) => request
                .arguments()
                .iter()
                .filter(|(name, _)| ECHOED_ARGUMENTS.contains(&name.as_str()))
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        Self {
            base_uri: request.base_uri().to_string(),
            verb,
            arguments,
        }
    }

    fn to_element(&self) -> XmlElement {
        let mut element = XmlElement::with_text("request", self.base_uri.as_str());
        if let Some(verb) = self.verb {
            element.set_attribute("verb", verb.as_str());
        }
        for (name, value) in &self.arguments {
            element.set_attribute(name.as_str(), value.as_str());
        }
        element
    }
}

/// Either a verb body or the errors that replaced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Body(XmlElement),
    Errors(Vec<ProtocolError>),
}

/// A complete OAI-PMH response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseDocument {
    response_date: DateTime<Utc>,
    request: EchoedRequest,
    outcome: Outcome,
}

impl ResponseDocument {
    pub fn success(request: EchoedRequest, body: XmlElement) -> Self {
        Self {
            response_date: Utc::now(),
            request,
            outcome: Outcome::Body(body),
        }
    }

    /// An error response; falls back to `badArgument` if `errors` is empty so
    /// the document is never left without content.
    pub fn failure(request: EchoedRequest, mut errors: Vec<ProtocolError>) -> Self {
        if errors.is_empty() {
            errors.push(ProtocolError::new(OaiErrorCode::BadArgument));
        }
        Self {
            response_date: Utc::now(),
            request,
            outcome: Outcome::Errors(errors),
        }
    }

    /// The response to a request without a legal verb.
    pub fn bad_verb(request: &OaiRequest) -> Self {
        Self::failure(
            EchoedRequest::from_request(request, None),
            vec![ProtocolError::bad_verb()],
        )
    }

    pub fn response_date(&self) -> DateTime<Utc> {
        self.response_date
    }

    pub fn request(&self) -> &EchoedRequest {
        &self.request
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Errors(_))
    }

    pub fn body(&self) -> Option<&XmlElement> {
        match &self.outcome {
            Outcome::Body(body) => Some(body),
            Outcome::Errors(_) => None,
        }
    }

    pub fn errors(&self) -> &[ProtocolError] {
        match &self.outcome {
            Outcome::Body(_) => &[],
            Outcome::Errors(errors) => errors,
        }
    }

    pub fn error_codes(&self) -> Vec<OaiErrorCode> {
        self.errors().iter().map(ProtocolError::code).collect()
    }

    /// The body's `resumptionToken` node, if any.
    pub fn resumption_token(&self) -> Option<&XmlElement> {
        self.body()?.child("resumptionToken")
    }

    /// The whole document as an element tree rooted at `OAI-PMH`.
    pub fn to_element(&self) -> XmlElement {
        let mut root = XmlElement::new("OAI-PMH");
        root.set_attribute("xmlns", OAI_NAMESPACE);
        root.set_attribute("xmlns:xsi", XSI_NAMESPACE);
        root.set_attribute("xsi:schemaLocation", OAI_SCHEMA_LOCATION);
        root.add_child("responseDate", Some(&format_utc(&self.response_date)));
        root.push_element(self.request.to_element());

        match &self.outcome {
            Outcome::Body(body) => {
                root.push_element(body.clone());
            }
            Outcome::Errors(errors) => {
                for error in errors {
                    root.add_child("error", Some(error.message()))
                        .set_attribute("code", error.code().as_str());
                }
            }
        }
        root
    }

    /// Serialize as a UTF-8 XML document.
    pub fn to_xml(&self) -> OaiResult<String> {
        let mut writer = Writer::new(Vec::new());
        xml::write_event(
            &mut writer,
            Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
        )?;
        self.to_element().write_to(&mut writer)?;

        String::from_utf8(writer.into_inner())
            .map_err(|e| OaiError::xml(format!("response is not valid UTF-8: {e}")))
    }
}
