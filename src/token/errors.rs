//! Token store error types.
//!
//! These describe failures of the storage backend itself. An unknown or
//! expired token is not an error at this level; stores report it as `None`.

use std::fmt;
use std::path::PathBuf;

/// Errors that can occur while issuing, resolving or purging tokens.
#[derive(Debug)]
pub enum TokenStoreError {
    /// Filesystem or other I/O failure.
    Io {
        operation: String,
        path: Option<PathBuf>,
        source: std::io::Error,
    },

    /// A stored continuation could not be encoded or decoded.
    Serialization {
        message: String,
        source: Option<serde_json::Error>,
    },

    /// The store was configured with unusable parameters.
    Configuration {
        message: String,
        parameter: Option<String>,
    },

    /// No unused token identity could be generated.
    IdentityExhausted { attempts: usize },
}

impl fmt::Display for TokenStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenStoreError::Io {
                operation,
                path,
                source,
            } => match path {
                Some(path) => write!(f, "I/O error during {} on {}: {}", operation, path.display(), source),
                None => write!(f, "I/O error during {}: {}", operation, source),
            },
            TokenStoreError::Serialization { message, .. } => {
                write!(f, "Serialization error: {}", message)
            }
            TokenStoreError::Configuration { message, parameter } => {
                if let Some(param) = parameter {
                    write!(f, "Configuration error: {} (parameter: {})", message, param)
                } else {
                    write!(f, "Configuration error: {}", message)
                }
            }
            TokenStoreError::IdentityExhausted { attempts } => {
                write!(f, "No free token identity after {} attempts", attempts)
            }
        }
    }
}

impl std::error::Error for TokenStoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TokenStoreError::Io { source, .. } => Some(source),
            TokenStoreError::Serialization { source, .. } => source
                .as_ref()
                .map(|e| e as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl TokenStoreError {
    /// Create an I/O error for an operation on a path.
    pub fn io(operation: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: Some(path.into()),
            source,
        }
    }

    /// Create a serialization error from a serde_json failure.
    pub fn serialization(message: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            parameter: Some(parameter.into()),
        }
    }
}
