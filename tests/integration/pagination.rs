//! Paging through ListRecords and ListIdentifiers.

use crate::common::{self, harvest, identifier, next_token, page_identifiers, request};
use oai_pmh_server::{OaiErrorCode, ResumptionTokenStore};
use proptest::prelude::*;
use std::collections::HashSet;

#[tokio::test]
async fn test_harvest_partitions_every_record() {
    let server = common::server(25, 10).await;
    let pages = harvest(
        &server,
        request("ListRecords").with_argument("metadataPrefix", "oai_dc"),
    )
    .await;

    let sizes: Vec<usize> = pages.iter().map(|page| page_identifiers(page).len()).collect();
    assert_eq!(sizes, vec![10, 10, 5]);

    let harvested: Vec<String> = pages.iter().flat_map(page_identifiers).collect();
    let expected: Vec<String> = (0..25).map(identifier).collect();
    assert_eq!(harvested, expected);

    let terminal = pages.last().unwrap().resumption_token().unwrap();
    assert!(terminal.text().is_empty());
    assert_eq!(terminal.attribute("completeListSize"), Some("25"));
    assert_eq!(terminal.attribute("cursor"), Some("20"));
}

#[tokio::test]
async fn test_token_attributes_track_progress() {
    let server = common::server(7, 3).await;
    let pages = harvest(
        &server,
        request("ListIdentifiers").with_argument("metadataPrefix", "oai_dc"),
    )
    .await;
    assert_eq!(pages.len(), 3);

    let cursors: Vec<Option<&str>> = pages
        .iter()
        .map(|page| page.resumption_token().and_then(|node| node.attribute("cursor")))
        .collect();
    assert_eq!(cursors, vec![Some("3"), Some("6"), Some("6")]);

    for page in &pages {
        let node = page.resumption_token().unwrap();
        assert_eq!(node.attribute("completeListSize"), Some("7"));
    }
    assert!(pages[0].resumption_token().unwrap().attribute("expirationDate").is_some());
}

#[tokio::test]
async fn test_exact_multiple_of_page_size() {
    let server = common::server(6, 3).await;
    let pages = harvest(
        &server,
        request("ListRecords").with_argument("metadataPrefix", "oai_dc"),
    )
    .await;

    assert_eq!(pages.len(), 2);
    assert_eq!(page_identifiers(&pages[1]).len(), 3);
    assert!(next_token(&pages[1]).is_none());
    assert!(pages[1].resumption_token().is_some());
}

#[tokio::test]
async fn test_selective_harvest_by_day() {
    let server = common::server(48, 100).await;
    let document = server
        .handle(
            &request("ListIdentifiers")
                .with_argument("metadataPrefix", "oai_dc")
                .with_argument("from", "2020-01-02")
                .with_argument("until", "2020-01-02"),
        )
        .await
        .unwrap();

    let identifiers = page_identifiers(&document);
    assert_eq!(identifiers.len(), 24);
    assert_eq!(identifiers.first(), Some(&identifier(24)));
    assert_eq!(identifiers.last(), Some(&identifier(47)));
}

#[tokio::test]
async fn test_records_changed_between_pages_do_not_break_the_list() {
    let server = common::server(6, 4).await;
    let first = server
        .handle(&request("ListRecords").with_argument("metadataPrefix", "oai_dc"))
        .await
        .unwrap();
    let token = next_token(&first).unwrap();

    server.source().clear().await;

    let second = server
        .handle(&request("ListRecords").with_argument("resumptionToken", token))
        .await
        .unwrap();
    assert_eq!(second.error_codes(), Vec::<OaiErrorCode>::new());
    assert!(page_identifiers(&second).is_empty());
    assert!(next_token(&second).is_none());
}

#[tokio::test]
async fn test_abandoned_harvest_leaves_one_token() {
    let server = common::server(30, 10).await;
    server
        .handle(&request("ListRecords").with_argument("metadataPrefix", "oai_dc"))
        .await
        .unwrap();
    assert_eq!(server.tokens().len().await.unwrap(), 1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_harvest_is_complete(total in 1usize..60, max_records in 1usize..15) {
        let pages = tokio_test::block_on(async {
            let server = common::server(total, max_records).await;
            harvest(
                &server,
                request("ListRecords").with_argument("metadataPrefix", "oai_dc"),
            )
            .await
        });

        let expected_pages = total.div_ceil(max_records);
        prop_assert_eq!(pages.len(), expected_pages);

        let harvested: Vec<String> = pages.iter().flat_map(page_identifiers).collect();
        prop_assert_eq!(harvested.len(), total);
        let unique: HashSet<&String> = harvested.iter().collect();
        prop_assert_eq!(unique.len(), total);

        let last = pages.last().unwrap();
        if expected_pages > 1 {
            let terminal = last.resumption_token().unwrap();
            prop_assert!(terminal.text().is_empty());
            let complete_list_size = total.to_string();
            prop_assert_eq!(terminal.attribute("completeListSize"), Some(complete_list_size.as_str()));
        } else {
            prop_assert!(last.resumption_token().is_none());
        }
    }

    #[test]
    fn prop_garbage_tokens_are_rejected(token in "[a-zA-Z0-9./%-]{1,64}") {
        let document = tokio_test::block_on(async {
            let server = common::server(5, 2).await;
            server
                .handle(&request("ListRecords").with_argument("resumptionToken", token.as_str()))
                .await
                .unwrap()
        });
        prop_assert_eq!(document.error_codes(), vec![OaiErrorCode::BadResumptionToken]);
    }
}
