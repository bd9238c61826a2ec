//! Error types for OAI-PMH request processing.
//!
//! Two families of errors live here. [`ProtocolError`] is the closed taxonomy
//! defined by OAI-PMH 2.0: these are request-scoped, accumulate while a request
//! is validated and end up as `<error>` nodes in the response document.
//! [`OaiError`] covers everything that is not a protocol answer, such as bad
//! configuration, malformed metadata fragments or token store failures.

use crate::token::TokenStoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The error codes defined by the OAI-PMH 2.0 protocol.
///
/// This repository declares no set hierarchy and treats an empty result as a
/// successful, empty answer, so `noRecordsMatch` is not part of the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OaiErrorCode {
    BadVerb,
    BadArgument,
    BadResumptionToken,
    CannotDisseminateFormat,
    IdDoesNotExist,
    NoMetadataFormats,
    NoSetHierarchy,
}

impl OaiErrorCode {
    /// The code as it appears in the `code` attribute of an `<error>` node.
    pub fn as_str(&self) -> &'static str {
        match self {
            OaiErrorCode::BadVerb => "badVerb",
            OaiErrorCode::BadArgument => "badArgument",
            OaiErrorCode::BadResumptionToken => "badResumptionToken",
            OaiErrorCode::CannotDisseminateFormat => "cannotDisseminateFormat",
            OaiErrorCode::IdDoesNotExist => "idDoesNotExist",
            OaiErrorCode::NoMetadataFormats => "noMetadataFormats",
            OaiErrorCode::NoSetHierarchy => "noSetHierarchy",
        }
    }

    /// The human-readable message used when no more specific one is given.
    pub fn default_message(&self) -> &'static str {
        match self {
            OaiErrorCode::BadVerb => {
                "Value of the verb argument is not a legal OAI-PMH verb, the verb argument is missing, or the verb argument is repeated."
            }
            OaiErrorCode::BadArgument => {
                "The request includes illegal arguments, is missing required arguments, includes a repeated argument, or values for arguments have an illegal syntax."
            }
            OaiErrorCode::BadResumptionToken => {
                "The value of the resumptionToken argument is invalid or expired."
            }
            OaiErrorCode::CannotDisseminateFormat => {
                "The metadata format identified by the value given for the metadataPrefix argument is not supported by the item or by the repository."
            }
            OaiErrorCode::IdDoesNotExist => {
                "The value of the identifier argument is unknown or illegal in this repository."
            }
            OaiErrorCode::NoMetadataFormats => {
                "There are no metadata formats available for the specified item."
            }
            OaiErrorCode::NoSetHierarchy => "The repository does not support sets.",
        }
    }
}

impl fmt::Display for OaiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A protocol-level error reported to the harvester as an `<error>` node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ProtocolError {
    code: OaiErrorCode,
    message: String,
}

impl ProtocolError {
    /// Create an error carrying the protocol's default message for `code`.
    pub fn new(code: OaiErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
        }
    }

    /// Create an error with a custom message.
    pub fn with_message(code: OaiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> OaiErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn bad_verb() -> Self {
        Self::new(OaiErrorCode::BadVerb)
    }

    /// An illegal, repeated or malformed argument.
    pub fn bad_argument(detail: impl fmt::Display) -> Self {
        Self::with_message(
            OaiErrorCode::BadArgument,
            format!("{} ({})", OaiErrorCode::BadArgument.default_message(), detail),
        )
    }

    pub fn bad_resumption_token() -> Self {
        Self::new(OaiErrorCode::BadResumptionToken)
    }

    pub fn cannot_disseminate_format() -> Self {
        Self::new(OaiErrorCode::CannotDisseminateFormat)
    }

    pub fn id_does_not_exist() -> Self {
        Self::new(OaiErrorCode::IdDoesNotExist)
    }

    pub fn no_metadata_formats() -> Self {
        Self::new(OaiErrorCode::NoMetadataFormats)
    }

    pub fn no_set_hierarchy() -> Self {
        Self::new(OaiErrorCode::NoSetHierarchy)
    }
}

/// Failures raised by a [`RecordSource`](crate::providers::RecordSource).
///
/// The dispatch engine never lets these escape: they are folded into the
/// request's accumulated protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The source answered with a protocol error of its own choosing.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The backing store could not be reached.
    #[error("Record source unavailable: {message}")]
    Unavailable { message: String },

    /// Any other backend failure.
    #[error("Record source error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend(Box::new(error))
    }

    /// Convert into the protocol error reported to the harvester.
    ///
    /// Failures without a protocol meaning are reported as `badArgument`
    /// carrying the failure text, the only code that describes "this request
    /// could not be served as asked".
    pub fn into_protocol_error(self) -> ProtocolError {
        match self {
            SourceError::Protocol(error) => error,
            other => ProtocolError::with_message(OaiErrorCode::BadArgument, other.to_string()),
        }
    }
}

/// Errors that are not protocol answers.
#[derive(Debug, thiserror::Error)]
pub enum OaiError {
    /// Invalid server configuration or repository identity
    #[error("Invalid configuration: {message}")]
    Configuration { message: String },

    /// Metadata fragment or response serialization failure
    #[error("XML error: {message}")]
    Xml { message: String },

    /// Resumption token store failure
    #[error("Token store error: {0}")]
    TokenStore(#[from] TokenStoreError),
}

impl OaiError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn xml(message: impl Into<String>) -> Self {
        Self::Xml {
            message: message.into(),
        }
    }
}

pub type OaiResult<T> = Result<T, OaiError>;
