//! Per-request validation state and the single-page verb handlers.

use crate::error::{ProtocolError, SourceError};
use crate::providers::RecordSource;
use crate::request::{OaiRequest, Verb};
use crate::response::ResponseAssembler;
use crate::server::OaiPmhServer;
use crate::token::ResumptionTokenStore;
use log::warn;

/// Everything a handler learns while answering one request.
///
/// Errors accumulate here in the order they are raised; the assembler turns a
/// non-empty list into an error response.
#[derive(Debug)]
pub(crate) struct RequestContext<'a> {
    request: &'a OaiRequest,
    verb: Verb,
    errors: Vec<ProtocolError>,
}

impl<'a> RequestContext<'a> {
    pub(crate) fn new(request: &'a OaiRequest, verb: Verb) -> Self {
        Self {
            request,
            verb,
            errors: Vec::new(),
        }
    }

    pub(crate) fn verb(&self) -> Verb {
        self.verb
    }

    pub(crate) fn fail(&mut self, error: ProtocolError) {
        self.errors.push(error);
    }

    pub(crate) fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub(crate) fn argument(&self, name: &str) -> Option<&'a str> {
        self.request.argument(name)
    }

    /// A mandatory argument; missing or empty raises `badArgument`.
    pub(crate) fn required(&mut self, name: &str) -> Option<&'a str> {
        match self.argument(name) {
            Some(value) if !value.is_empty() => Some(value),
            _ => {
                self.fail(ProtocolError::bad_argument(format!(
                    "missing required argument '{}'",
                    name
                )));
                None
            }
        }
    }

    /// Raise one `badArgument` per argument outside `allowed`.
    pub(crate) fn reject_unexpected(&mut self, allowed: &[&str]) {
        let unexpected: Vec<String> = self
            .request
            .unexpected_arguments(allowed)
            .map(str::to_string)
            .collect();
        for name in unexpected {
            self.fail(ProtocolError::bad_argument(format!(
                "argument '{}' is not allowed for {}",
                name, self.verb
            )));
        }
    }

    /// Unwrap a record source answer, folding a failure into the error list.
    pub(crate) fn fold<T>(&mut self, result: Result<T, SourceError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(SourceError::Protocol(error)) => {
                self.fail(error);
                None
            }
            Err(other) => {
                warn!("Record source failed during {}: {}", self.verb, other);
                self.fail(other.into_protocol_error());
                None
            }
        }
    }

    pub(crate) fn into_errors(self) -> Vec<ProtocolError> {
        self.errors
    }
}

impl<S: RecordSource, T: ResumptionTokenStore> OaiPmhServer<S, T> {
    pub(super) fn identify(&self, context: &mut RequestContext<'_>, assembler: &mut ResponseAssembler) {
        context.reject_unexpected(&[]);
        if context.has_errors() {
            return;
        }

        for (name, value) in self.identity.fields() {
            assembler.add_to_verb_node(name, Some(&value));
        }
    }

    pub(super) async fn list_metadata_formats(
        &self,
        context: &mut RequestContext<'_>,
        assembler: &mut ResponseAssembler,
    ) {
        context.reject_unexpected(&["identifier"]);
        if context.has_errors() {
            return;
        }

        let identifier = context.argument("identifier").filter(|id| !id.is_empty());
        let Some(formats) = context.fold(self.source.list_metadata_formats(identifier).await) else {
            return;
        };
        if formats.is_empty() {
            context.fail(ProtocolError::no_metadata_formats());
            return;
        }

        for format in formats {
            let node = assembler.add_to_verb_node("metadataFormat", None);
            node.add_child("metadataPrefix", Some(&format.prefix));
            node.add_child("schema", Some(&format.schema));
            node.add_child("metadataNamespace", Some(&format.namespace));
        }
    }

    /// Sets are not supported; a token can therefore never be valid.
    pub(super) fn list_sets(&self, context: &mut RequestContext<'_>) {
        if context.argument("resumptionToken").is_none() {
            context.reject_unexpected(&[]);
            context.fail(ProtocolError::no_set_hierarchy());
            return;
        }

        context.reject_unexpected(&["resumptionToken"]);
        if !context.has_errors() {
            context.fail(ProtocolError::bad_resumption_token());
        }
    }

    pub(super) async fn get_record(
        &self,
        context: &mut RequestContext<'_>,
        assembler: &mut ResponseAssembler,
    ) {
        context.reject_unexpected(&["identifier", "metadataPrefix"]);
        let identifier = context.required("identifier");
        let prefix = context.required("metadataPrefix");
        if let Some(prefix) = prefix {
            self.require_supported_format(context, prefix).await;
        }

        let (Some(identifier), Some(prefix)) = (identifier, prefix) else {
            return;
        };
        if context.has_errors() {
            return;
        }

        match context.fold(self.source.get_record(identifier, prefix).await) {
            Some(Some(record)) => assembler.add_record(record),
            Some(None) => context.fail(ProtocolError::id_does_not_exist()),
            None => {}
        }
    }

    /// Raise `cannotDisseminateFormat` unless `prefix` is offered repository-wide.
    pub(super) async fn require_supported_format(&self, context: &mut RequestContext<'_>, prefix: &str) {
        if let Some(formats) = context.fold(self.source.list_metadata_formats(None).await) {
            if !formats.iter().any(|format| format.prefix == prefix) {
                context.fail(ProtocolError::cannot_disseminate_format());
            }
        }
    }
}
