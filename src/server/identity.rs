//! Repository identity answered by the Identify verb.

use crate::datestamp::{Datestamp, Granularity};
use crate::error::{OaiError, OaiResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the repository reports deleted records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletedRecordPolicy {
    /// Deletions are not tracked
    No,
    /// Deletions are tracked forever
    Persistent,
    /// Deletions are tracked, with no guarantee of persistence
    Transient,
}

impl DeletedRecordPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeletedRecordPolicy::No => "no",
            DeletedRecordPolicy::Persistent => "persistent",
            DeletedRecordPolicy::Transient => "transient",
        }
    }
}

impl fmt::Display for DeletedRecordPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_protocol_version() -> String {
    "2.0".to_string()
}

/// The fixed identity of a repository, supplied at construction time.
///
/// Values are echoed verbatim by Identify. The repository granularity also
/// governs how record datestamps are rendered and which `from`/`until`
/// arguments are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryIdentity {
    pub repository_name: String,
    #[serde(rename = "baseURL")]
    pub base_url: String,
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,
    #[serde(rename = "adminEmail")]
    pub admin_emails: Vec<String>,
    pub earliest_datestamp: String,
    pub deleted_record: DeletedRecordPolicy,
    pub granularity: Granularity,
}

impl RepositoryIdentity {
    /// Create an identity with second granularity and no deletion tracking.
    pub fn new(
        repository_name: impl Into<String>,
        base_url: impl Into<String>,
        admin_email: impl Into<String>,
        earliest_datestamp: impl Into<String>,
    ) -> Self {
        Self {
            repository_name: repository_name.into(),
            base_url: base_url.into(),
            protocol_version: default_protocol_version(),
            admin_emails: vec![admin_email.into()],
            earliest_datestamp: earliest_datestamp.into(),
            deleted_record: DeletedRecordPolicy::No,
            granularity: Granularity::Second,
        }
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn with_deleted_record(mut self, policy: DeletedRecordPolicy) -> Self {
        self.deleted_record = policy;
        self
    }

    pub fn with_admin_email(mut self, email: impl Into<String>) -> Self {
        self.admin_emails.push(email.into());
        self
    }

    /// Identify body fields, in the order the OAI-PMH schema requires.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("repositoryName", self.repository_name.clone()),
            ("baseURL", self.base_url.clone()),
            ("protocolVersion", self.protocol_version.clone()),
        ];
        fields.extend(
            self.admin_emails
                .iter()
                .map(|email| ("adminEmail", email.clone())),
        );
        fields.push(("earliestDatestamp", self.earliest_datestamp.clone()));
        fields.push(("deletedRecord", self.deleted_record.to_string()));
        fields.push(("granularity", self.granularity.to_string()));
        fields
    }

    /// Check the identity is publishable.
    ///
    /// # Errors
    ///
    /// Returns [`OaiError::Configuration`] describing the first problem found.
    pub fn validate(&self) -> OaiResult<()> {
        if self.repository_name.trim().is_empty() {
            return Err(OaiError::configuration("Repository name cannot be empty"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(OaiError::configuration("Base URL must start with http:// or https://"));
        }

        if self.protocol_version != "2.0" {
            return Err(OaiError::configuration(format!(
                "Unsupported protocol version '{}'",
                self.protocol_version
            )));
        }

        if self.admin_emails.is_empty() {
            return Err(OaiError::configuration("At least one admin email is required"));
        }
        for email in &self.admin_emails {
            match email.split_once('@') {
                Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
                _ => {
                    return Err(OaiError::configuration(format!(
                        "Invalid admin email '{}'",
                        email
                    )));
                }
            }
        }

        let earliest: Datestamp = self.earliest_datestamp.parse().map_err(|_| {
            OaiError::configuration(format!(
                "Earliest datestamp '{}' is not a valid datestamp",
                self.earliest_datestamp
            ))
        })?;
        if earliest.granularity() != self.granularity {
            return Err(OaiError::configuration(format!(
                "Earliest datestamp must use the repository granularity {}",
                self.granularity
            )));
        }

        Ok(())
    }
}
