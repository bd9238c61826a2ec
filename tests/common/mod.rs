//! Common fixtures for OAI-PMH integration testing.
//!
//! Builds small repositories with predictable content: record `n` is
//! identified `oai:test.example.org:NNNN` and stamped `n` hours after
//! 2020-01-01T00:00:00Z.

use chrono::{DateTime, Duration, TimeZone, Utc};
use oai_pmh_server::providers::InMemoryRecordSource;
use oai_pmh_server::record::{MetadataFormat, MetadataFragment};
use oai_pmh_server::token::InMemoryTokenStore;
use oai_pmh_server::{
    OaiPmhServer, OaiPmhServerBuilder, OaiRequest, RepositoryIdentity, ResponseDocument,
    ResumptionTokenStore,
};

pub const BASE_URL: &str = "http://test.example.org/oai";

pub type MemoryServer = OaiPmhServer<InMemoryRecordSource, InMemoryTokenStore>;

/// Install a test logger once; repeated calls are harmless.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn identity() -> RepositoryIdentity {
    RepositoryIdentity::new(
        "Integration Test Repository",
        BASE_URL,
        "oai-admin@test.example.org",
        "2020-01-01T00:00:00Z",
    )
}

pub fn identifier(n: usize) -> String {
    format!("oai:test.example.org:{n:04}")
}

pub fn datestamp(n: usize) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap() + Duration::hours(n as i64)
}

pub fn dublin_core(title: &str) -> MetadataFragment {
    MetadataFragment::parse(&format!(
        "<oai_dc:dc xmlns:oai_dc=\"http://www.openarchives.org/OAI/2.0/oai_dc/\" \
         xmlns:dc=\"http://purl.org/dc/elements/1.1/\"><dc:title>{title}</dc:title></oai_dc:dc>"
    ))
    .unwrap()
}

/// A record source holding `count` Dublin Core records.
pub async fn repository(count: usize) -> InMemoryRecordSource {
    let source = InMemoryRecordSource::new();
    source.add_format(MetadataFormat::oai_dc()).await;
    for n in 0..count {
        source
            .put_record(identifier(n), datestamp(n), "oai_dc", dublin_core(&format!("Record {n}")))
            .await;
    }
    source
}

pub async fn server_with_tokens<T: ResumptionTokenStore>(
    count: usize,
    max_records: usize,
    tokens: T,
) -> OaiPmhServer<InMemoryRecordSource, T> {
    init_logging();
    OaiPmhServerBuilder::new(repository(count).await, tokens, identity())
        .with_max_records(max_records)
        .build()
        .expect("test server configuration is valid")
}

pub async fn server(count: usize, max_records: usize) -> MemoryServer {
    server_with_tokens(count, max_records, InMemoryTokenStore::new()).await
}

pub fn request(verb: &str) -> OaiRequest {
    OaiRequest::new(BASE_URL).with_verb(verb)
}

/// The live token of a page, `None` when absent or empty.
pub fn next_token(document: &ResponseDocument) -> Option<String> {
    document
        .resumption_token()
        .map(|node| node.text())
        .filter(|token| !token.is_empty())
}

/// Identifiers on a ListRecords or ListIdentifiers page, in order.
pub fn page_identifiers(document: &ResponseDocument) -> Vec<String> {
    let Some(body) = document.body() else {
        return Vec::new();
    };
    body.elements()
        .filter_map(|node| match node.name() {
            "record" => node.child("header"),
            "header" => Some(node),
            _ => None,
        })
        .filter_map(|header| header.child("identifier"))
        .map(|identifier| identifier.text())
        .collect()
}

/// Follow resumption tokens from `first` to the end of the list.
///
/// Returns every page in order.
pub async fn harvest<T: ResumptionTokenStore>(
    server: &OaiPmhServer<InMemoryRecordSource, T>,
    first: OaiRequest,
) -> Vec<ResponseDocument> {
    let verb = first.verb().unwrap_or_default().to_string();
    let mut pages = vec![server.handle(&first).await.expect("first page")];

    while let Some(token) = pages.last().and_then(next_token) {
        let follow = request(&verb).with_argument("resumptionToken", token);
        pages.push(server.handle(&follow).await.expect("follow-up page"));
        assert!(pages.len() < 10_000, "harvest does not terminate");
    }
    pages
}
