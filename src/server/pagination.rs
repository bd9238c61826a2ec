//! ListRecords and ListIdentifiers, including the resumption token cycle.
//!
//! A list request is either FRESH (selective-harvest arguments, cursor 0) or
//! CONTINUED (a single `resumptionToken` argument). Both end in the same page
//! production: count, fetch at most `max_records` from the cursor, emit, then
//! either issue a token for the remainder or close the list.

use crate::datestamp::Datestamp;
use crate::error::{OaiResult, ProtocolError};
use crate::providers::RecordSource;
use crate::record::RecordQuery;
use crate::request::Verb;
use crate::response::{ResponseAssembler, ResumptionTokenNode};
use crate::server::OaiPmhServer;
use crate::server::dispatch::RequestContext;
use crate::token::{Continuation, ResumptionTokenStore};
use chrono::Utc;
use log::{debug, warn};

const FRESH_ARGUMENTS: &[&str] = &["metadataPrefix", "from", "until", "set"];

/// Validated position in a list.
#[derive(Debug)]
struct ListState {
    continuation: Continuation,
    query: RecordQuery,
    continued: bool,
}

/// Resolve raw `from`/`until` strings into inclusive query bounds.
fn query_for(
    metadata_prefix: &str,
    from: Option<&Datestamp>,
    until: Option<&Datestamp>,
) -> RecordQuery {
    RecordQuery {
        metadata_prefix: metadata_prefix.to_string(),
        from: from.map(Datestamp::lower_bound),
        until: until.map(Datestamp::upper_bound),
    }
}

fn parse_stored(value: Option<&str>) -> Result<Option<Datestamp>, ProtocolError> {
    value.map(str::parse).transpose()
}

impl<S: RecordSource, T: ResumptionTokenStore> OaiPmhServer<S, T> {
    pub(super) async fn list_records(
        &self,
        context: &mut RequestContext<'_>,
        assembler: &mut ResponseAssembler,
    ) -> OaiResult<()> {
        let state = match context.argument("resumptionToken") {
            Some(token) => self.continued_state(context, token).await?,
            None => self.fresh_state(context).await,
        };
        let Some(state) = state else {
            return Ok(());
        };

        let Some(total) = context.fold(self.source.count_records(&state.query).await) else {
            return Ok(());
        };

        let cursor = state.continuation.cursor;
        let max_records = self.config.max_records;
        let Some(mut records) = context.fold(
            self.source
                .list_records(&state.query, cursor, max_records)
                .await,
        ) else {
            return Ok(());
        };
        if records.len() > max_records {
            warn!(
                "Record source returned {} records for a page of {}; truncating",
                records.len(),
                max_records
            );
            records.truncate(max_records);
        }

        let delivered = records.len();
        let headers_only = context.verb() == Verb::ListIdentifiers;
        for record in records {
            if headers_only {
                assembler.add_header(&record);
            } else {
                assembler.add_record(record);
            }
        }

        let next_cursor = cursor + delivered;
        if next_cursor < total && delivered > 0 {
            let continuation = Continuation {
                cursor: next_cursor,
                ..state.continuation
            };
            let expires_at = Utc::now() + self.config.token_validity();
            let issued = self.tokens.issue(continuation, expires_at).await?;
            debug!("Delivered {} of {} records", next_cursor, total);

            assembler.add_resumption_token(ResumptionTokenNode {
                token: Some(issued.token().to_string()),
                expiration_date: Some(issued.expires_at()),
                complete_list_size: Some(total),
                cursor: Some(next_cursor),
            });
            return Ok(());
        }

        if next_cursor < total {
            warn!(
                "Record source returned no records at cursor {} of {}; closing the list",
                cursor, total
            );
        }
        if state.continued {
            assembler.add_resumption_token(ResumptionTokenNode {
                complete_list_size: Some(total),
                cursor: Some(cursor),
                ..Default::default()
            });
        }
        Ok(())
    }

    async fn fresh_state(&self, context: &mut RequestContext<'_>) -> Option<ListState> {
        context.reject_unexpected(FRESH_ARGUMENTS);

        let prefix = context.required("metadataPrefix");
        if let Some(prefix) = prefix {
            self.require_supported_format(context, prefix).await;
        }

        let from = self.harvest_bound(context, "from");
        let until = self.harvest_bound(context, "until");
        if let (Some(from), Some(until)) = (&from, &until) {
            if from.granularity() != until.granularity() {
                context.fail(ProtocolError::bad_argument(
                    "'from' and 'until' must have the same granularity",
                ));
            } else if from.lower_bound() > until.lower_bound() {
                context.fail(ProtocolError::bad_argument("'from' must not be later than 'until'"));
            }
        }

        if context.argument("set").is_some() {
            context.fail(ProtocolError::no_set_hierarchy());
        }

        if context.has_errors() {
            return None;
        }
        let prefix = prefix?;

        Some(ListState {
            query: query_for(prefix, from.as_ref(), until.as_ref()),
            continuation: Continuation::new(
                0,
                prefix,
                context.argument("from").map(str::to_string),
                context.argument("until").map(str::to_string),
            ),
            continued: false,
        })
    }

    /// Parse a selective-harvest bound no finer than the repository granularity.
    fn harvest_bound(&self, context: &mut RequestContext<'_>, name: &str) -> Option<Datestamp> {
        let value = context.argument(name)?;
        match value.parse::<Datestamp>() {
            Ok(datestamp) if datestamp.granularity() > self.identity.granularity => {
                context.fail(ProtocolError::bad_argument(format!(
                    "'{}' is finer than the repository granularity {}",
                    value, self.identity.granularity
                )));
                None
            }
            Ok(datestamp) => Some(datestamp),
            Err(error) => {
                context.fail(error);
                None
            }
        }
    }

    async fn continued_state(
        &self,
        context: &mut RequestContext<'_>,
        token: &str,
    ) -> OaiResult<Option<ListState>> {
        context.reject_unexpected(&["resumptionToken"]);
        if context.has_errors() {
            return Ok(None);
        }

        let Some(continuation) = self.tokens.resolve(token).await? else {
            debug!("Resumption token {} is unknown or expired", token);
            context.fail(ProtocolError::bad_resumption_token());
            return Ok(None);
        };

        let bounds = parse_stored(continuation.from.as_deref())
            .and_then(|from| Ok((from, parse_stored(continuation.until.as_deref())?)));
        let (from, until) = match bounds {
            Ok(bounds) => bounds,
            Err(error) => {
                warn!("Resumption token {} holds unreadable bounds: {}", token, error);
                context.fail(ProtocolError::bad_resumption_token());
                return Ok(None);
            }
        };

        Ok(Some(ListState {
            query: query_for(&continuation.metadata_prefix, from.as_ref(), until.as_ref()),
            continuation,
            continued: true,
        }))
    }
}
