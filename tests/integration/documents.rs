//! Whole responses serialized to XML.

use crate::common::{self, BASE_URL, request};
use oai_pmh_server::response::OAI_NAMESPACE;
use oai_pmh_server::OaiRequest;
use quick_xml::Reader;
use quick_xml::events::Event;

/// Element names of a document in the order they open.
fn element_names(xml: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    let mut names = Vec::new();
    loop {
        match reader.read_event().expect("response is well-formed") {
            Event::Start(start) | Event::Empty(start) => {
                names.push(String::from_utf8(start.name().as_ref().to_vec()).unwrap());
            }
            Event::Eof => break,
            _ => {}
        }
    }
    names
}

#[tokio::test]
async fn test_success_document_layout() {
    let server = common::server(2, 10).await;
    let xml = server
        .handle(&request("ListIdentifiers").with_argument("metadataPrefix", "oai_dc"))
        .await
        .unwrap()
        .to_xml()
        .unwrap();

    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(xml.contains(&format!("xmlns=\"{}\"", OAI_NAMESPACE)));
    assert!(xml.contains(&format!(
        "<request verb=\"ListIdentifiers\" metadataPrefix=\"oai_dc\">{}</request>",
        BASE_URL
    )));

    let names = element_names(&xml);
    assert_eq!(
        &names[..4],
        &["OAI-PMH", "responseDate", "request", "ListIdentifiers"]
    );
    assert_eq!(names.iter().filter(|name| *name == "header").count(), 2);
}

#[tokio::test]
async fn test_error_document_lists_errors_in_order() {
    let server = common::server(2, 10).await;
    let xml = server
        .handle(
            &request("ListRecords")
                .with_argument("metadataPrefix", "unknown")
                .with_argument("set", "physics"),
        )
        .await
        .unwrap()
        .to_xml()
        .unwrap();

    let dissemination = xml.find("code=\"cannotDisseminateFormat\"").unwrap();
    let sets = xml.find("code=\"noSetHierarchy\"").unwrap();
    assert!(dissemination < sets);
    assert!(!xml.contains("<ListRecords"));
    assert!(xml.contains("set=\"physics\""));
}

#[tokio::test]
async fn test_echoed_arguments_are_escaped() {
    let server = common::server(0, 10).await;
    let request = OaiRequest::from_pairs(
        BASE_URL,
        [("verb", "GetRecord"), ("identifier", "<script>\"&"), ("metadataPrefix", "oai_dc")],
    );
    let xml = server.handle(&request).await.unwrap().to_xml().unwrap();

    assert!(xml.contains("identifier=\"&lt;script&gt;&quot;&amp;\""));
    assert!(xml.contains("code=\"idDoesNotExist\""));
    element_names(&xml);
}

#[tokio::test]
async fn test_bad_verb_document() {
    let server = common::server(0, 10).await;
    let request = OaiRequest::from_pairs(BASE_URL, [("verb", "Explode"), ("x", "y")]);
    let xml = server.handle(&request).await.unwrap().to_xml().unwrap();

    assert!(xml.contains(&format!("<request>{}</request>", BASE_URL)));
    assert!(xml.contains("<error code=\"badVerb\">"));
    assert_eq!(xml.matches("<error ").count(), 1);
}

#[tokio::test]
async fn test_unknown_argument_names_keep_document_well_formed() {
    let server = common::server(0, 10).await;
    let request = OaiRequest::from_pairs(
        BASE_URL,
        [
            ("verb", "Identify"),
            ("foo bar", "1"),
            ("a\"=\"b", "2"),
            ("xmlns", "urn:evil"),
            ("1x", "3"),
        ],
    );
    let document = server.handle(&request).await.unwrap();
    let xml = document.to_xml().unwrap();

    let names = element_names(&xml);
    assert_eq!(&names[..3], &["OAI-PMH", "responseDate", "request"]);
    assert!(xml.contains(&format!("<request verb=\"Identify\">{}</request>", BASE_URL)));
    assert!(!xml.contains("urn:evil"));
    assert_eq!(xml.matches("code=\"badArgument\"").count(), 4);
}
