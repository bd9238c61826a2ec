//! Resumption token lifecycle against both token stores.

use crate::common::{self, harvest, identifier, next_token, page_identifiers, request};
use chrono::{Duration, Utc};
use oai_pmh_server::token::{Continuation, FileTokenStore, InMemoryTokenStore};
use oai_pmh_server::{OaiErrorCode, OaiPmhServerBuilder, ResumptionTokenStore};
use std::sync::Arc;

#[tokio::test]
async fn test_round_trip_then_not_found() {
    let store = InMemoryTokenStore::new();
    let continuation = Continuation::new(50, "oai_dc", None, None);
    let issued = store
        .issue(continuation.clone(), Utc::now() + Duration::hours(1))
        .await
        .unwrap();

    assert_eq!(store.resolve(issued.token()).await.unwrap(), Some(continuation));
    assert_eq!(store.resolve(issued.token()).await.unwrap(), None);
}

#[tokio::test]
async fn test_expired_token_never_yields_continuation() {
    let server = common::server(10, 5).await;
    let issued = server
        .tokens()
        .issue(
            Continuation::new(5, "oai_dc", None, None),
            Utc::now() - Duration::minutes(1),
        )
        .await
        .unwrap();

    let document = server
        .handle(&request("ListRecords").with_argument("resumptionToken", issued.token()))
        .await
        .unwrap();

    assert_eq!(document.error_codes(), vec![OaiErrorCode::BadResumptionToken]);
    assert!(page_identifiers(&document).is_empty());
}

#[tokio::test]
async fn test_zero_validity_window_is_rejected() {
    let result = OaiPmhServerBuilder::new(
        common::repository(1).await,
        InMemoryTokenStore::new(),
        common::identity(),
    )
    .with_token_validity(std::time::Duration::from_millis(500))
    .build();
    assert!(result.is_err());
}

#[tokio::test]
async fn test_concurrent_followers_get_one_page() {
    let server = Arc::new(common::server(10, 5).await);
    let first = server
        .handle(&request("ListRecords").with_argument("metadataPrefix", "oai_dc"))
        .await
        .unwrap();
    let token = next_token(&first).unwrap();

    let followers = (0..8).map(|_| {
        let server = Arc::clone(&server);
        let token = token.clone();
        tokio::spawn(async move {
            server
                .handle(&request("ListRecords").with_argument("resumptionToken", token))
                .await
                .unwrap()
        })
    });
    let documents: Vec<_> = futures::future::join_all(followers)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let served = documents.iter().filter(|document| !document.is_error()).count();
    assert_eq!(served, 1);
    assert!(documents
        .iter()
        .filter(|document| document.is_error())
        .all(|document| document.error_codes() == vec![OaiErrorCode::BadResumptionToken]));
}

#[tokio::test]
async fn test_file_store_harvest() {
    let directory = tempfile::tempdir().unwrap();
    let store = FileTokenStore::new(directory.path(), "oai-token-").unwrap();
    let server = common::server_with_tokens(12, 5, store).await;

    let pages = harvest(
        &server,
        request("ListRecords").with_argument("metadataPrefix", "oai_dc"),
    )
    .await;

    let harvested: Vec<String> = pages.iter().flat_map(page_identifiers).collect();
    assert_eq!(harvested, (0..12).map(identifier).collect::<Vec<_>>());
    assert_eq!(server.tokens().len().await.unwrap(), 0);
}

#[tokio::test]
async fn test_file_store_tokens_survive_a_restart() {
    let directory = tempfile::tempdir().unwrap();

    let token = {
        let store = FileTokenStore::new(directory.path(), "oai-token-").unwrap();
        let server = common::server_with_tokens(9, 4, store).await;
        let first = server
            .handle(&request("ListIdentifiers").with_argument("metadataPrefix", "oai_dc"))
            .await
            .unwrap();
        next_token(&first).unwrap()
    };

    let store = FileTokenStore::new(directory.path(), "oai-token-").unwrap();
    let server = common::server_with_tokens(9, 4, store).await;
    let second = server
        .handle(&request("ListIdentifiers").with_argument("resumptionToken", token))
        .await
        .unwrap();

    assert_eq!(
        page_identifiers(&second),
        (4..8).map(identifier).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_file_store_purge_through_server() {
    let directory = tempfile::tempdir().unwrap();
    let store = FileTokenStore::new(directory.path(), "oai-token-").unwrap();
    let server = common::server_with_tokens(0, 5, store).await;

    let past = Utc::now() - Duration::hours(1);
    let future = Utc::now() + Duration::hours(1);
    server
        .tokens()
        .issue(Continuation::new(5, "oai_dc", None, None), past)
        .await
        .unwrap();
    server
        .tokens()
        .issue(Continuation::new(10, "oai_dc", Some("2020-01-01".to_string()), None), future)
        .await
        .unwrap();

    assert_eq!(server.purge_expired_tokens().await.unwrap(), 1);
    assert_eq!(server.tokens().len().await.unwrap(), 1);
}
