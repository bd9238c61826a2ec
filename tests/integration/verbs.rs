//! Verb-level behaviour through the public API.

use crate::common::{self, BASE_URL, identifier, request};
use oai_pmh_server::{OaiErrorCode, OaiRequest, Verb};

#[tokio::test]
async fn test_missing_verb_yields_single_bad_verb() {
    let server = common::server(3, 10).await;

    let document = server
        .handle(&OaiRequest::from_pairs(BASE_URL, [("metadataPrefix", "oai_dc")]))
        .await
        .unwrap();

    assert_eq!(document.error_codes(), vec![OaiErrorCode::BadVerb]);
    assert!(document.body().is_none());
    assert!(document.request().arguments.is_empty());
}

#[tokio::test]
async fn test_every_legal_verb_is_dispatched() {
    let server = common::server(3, 10).await;

    for verb in Verb::ALL {
        let document = server.handle(&request(verb.as_str())).await.unwrap();
        assert!(
            !document.error_codes().contains(&OaiErrorCode::BadVerb),
            "{} was not recognised",
            verb
        );
        assert_eq!(document.request().verb, Some(verb));
    }
}

#[tokio::test]
async fn test_identify_without_arguments_always_succeeds() {
    let server = common::server(0, 10).await;
    let document = server.handle(&request("Identify")).await.unwrap();

    let body = document.body().expect("Identify succeeds");
    assert_eq!(
        body.child("repositoryName").unwrap().text(),
        "Integration Test Repository"
    );
    assert_eq!(body.child("baseURL").unwrap().text(), BASE_URL);
    assert_eq!(body.child("protocolVersion").unwrap().text(), "2.0");
    assert_eq!(body.child("earliestDatestamp").unwrap().text(), "2020-01-01T00:00:00Z");
    assert_eq!(body.child("deletedRecord").unwrap().text(), "no");
    assert_eq!(body.child("granularity").unwrap().text(), "YYYY-MM-DDThh:mm:ssZ");
}

#[tokio::test]
async fn test_identify_with_arguments_reports_each_key() {
    let server = common::server(0, 10).await;
    let document = server
        .handle(
            &OaiRequest::from_pairs(
                BASE_URL,
                [("verb", "Identify"), ("a", "1"), ("b", "2"), ("c", "3")],
            ),
        )
        .await
        .unwrap();

    assert_eq!(document.error_codes(), vec![OaiErrorCode::BadArgument; 3]);
    assert!(document.request().arguments.is_empty());
}

#[tokio::test]
async fn test_get_record_error_matrix() {
    let server = common::server(3, 10).await;

    let unknown = server
        .handle(
            &request("GetRecord")
                .with_argument("identifier", "oai:test.example.org:9999")
                .with_argument("metadataPrefix", "oai_dc"),
        )
        .await
        .unwrap();
    assert_eq!(unknown.error_codes(), vec![OaiErrorCode::IdDoesNotExist]);

    let unsupported = server
        .handle(
            &request("GetRecord")
                .with_argument("identifier", identifier(0))
                .with_argument("metadataPrefix", "mods"),
        )
        .await
        .unwrap();
    assert_eq!(unsupported.error_codes(), vec![OaiErrorCode::CannotDisseminateFormat]);

    let empty = server.handle(&request("GetRecord")).await.unwrap();
    assert_eq!(
        empty.error_codes(),
        vec![OaiErrorCode::BadArgument, OaiErrorCode::BadArgument]
    );
}

#[tokio::test]
async fn test_get_record_returns_metadata_unaltered() {
    let server = common::server(3, 10).await;
    let document = server
        .handle(
            &request("GetRecord")
                .with_argument("identifier", identifier(2))
                .with_argument("metadataPrefix", "oai_dc"),
        )
        .await
        .unwrap();

    let xml = document.to_xml().unwrap();
    assert!(xml.contains(common::dublin_core("Record 2").as_str()));
    assert!(xml.contains("<datestamp>2020-01-01T02:00:00Z</datestamp>"));
}

#[tokio::test]
async fn test_deleted_records_in_lists() {
    let server = common::server(3, 10).await;
    server.source().delete_record(&identifier(1), common::datestamp(1)).await;

    let document = server
        .handle(&request("ListRecords").with_argument("metadataPrefix", "oai_dc"))
        .await
        .unwrap();
    let records: Vec<_> = document
        .body()
        .unwrap()
        .elements()
        .filter(|node| node.name() == "record")
        .collect();

    assert_eq!(records.len(), 3);
    let deleted = records[1];
    assert_eq!(deleted.child("header").unwrap().attribute("status"), Some("deleted"));
    assert!(deleted.child("metadata").is_none());
    assert!(records[0].child("metadata").is_some());
}

#[tokio::test]
async fn test_list_sets_outcomes() {
    let server = common::server(3, 10).await;

    let bare = server.handle(&request("ListSets")).await.unwrap();
    assert_eq!(bare.error_codes(), vec![OaiErrorCode::NoSetHierarchy]);

    let mixed = server
        .handle(
            &request("ListSets")
                .with_argument("resumptionToken", "anything")
                .with_argument("set", "physics"),
        )
        .await
        .unwrap();
    assert_eq!(mixed.error_codes(), vec![OaiErrorCode::BadArgument]);
}

#[tokio::test]
async fn test_list_metadata_formats_for_item_without_formats() {
    let server = common::server(0, 10).await;
    server
        .source()
        .add_format(oai_pmh_server::MetadataFormat::new(
            "mods",
            "http://www.loc.gov/standards/mods/v3/mods-3-7.xsd",
            "http://www.loc.gov/mods/v3",
        ))
        .await;
    server
        .source()
        .put_record("oai:test.example.org:mods-only", common::datestamp(0), "mods", common::dublin_core("MODS"))
        .await;

    let document = server
        .handle(
            &request("ListMetadataFormats")
                .with_argument("identifier", "oai:test.example.org:mods-only"),
        )
        .await
        .unwrap();
    let prefixes: Vec<String> = document
        .body()
        .unwrap()
        .elements()
        .filter_map(|format| format.child("metadataPrefix"))
        .map(|prefix| prefix.text())
        .collect();
    assert_eq!(prefixes, vec!["mods"]);
}
