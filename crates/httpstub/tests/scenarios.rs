//! End-to-end scenarios against a live stub server.

use httpstub::server::UNEXPECTED_MARKER_HEADER;
use httpstub::{RequestDescriptor, ResponseDescriptor, StubError, StubServer};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

#[tokio::test]
async fn serves_registered_response() {
    let server = StubServer::start().await.unwrap();
    server.expect(
        RequestDescriptor::get("/").build().unwrap(),
        ResponseDescriptor::ok().body("Content").build(),
    );

    let response = reqwest::get(server.base_url()).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "Content");

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn serves_configured_status_and_custom_header() {
    let server = StubServer::start().await.unwrap();
    server.expect(
        RequestDescriptor::get("/").build().unwrap(),
        ResponseDescriptor::status(409).header("X-foo", "barrr").build(),
    );

    let response = reqwest::get(server.base_url()).await.unwrap();
    assert_eq!(response.status(), 409);
    assert_eq!(response.headers().get("X-foo").unwrap(), "barrr");
    // A deliberately configured non-2xx response never carries the fault
    // marker.
    assert!(response.headers().get(UNEXPECTED_MARKER_HEADER).is_none());

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn unexpected_request_faults_the_call_and_fails_teardown() {
    let server = StubServer::start().await.unwrap();
    let registry = server.registry();
    let url = format!("{}/yarr?gooo=gredge", server.base_url());

    let response = reqwest::get(&url).await.unwrap();
    assert_eq!(response.status(), 500);
    assert_eq!(
        response.headers().get(UNEXPECTED_MARKER_HEADER).unwrap(),
        "true"
    );
    let fault_text = response.text().await.unwrap();
    assert!(fault_text.contains("/yarr?gooo=gredge"), "got: {fault_text}");

    // The deferred verification raises with the identical text.
    let deferred = registry.check_no_unexpected_requests().unwrap_err();
    assert_eq!(deferred.to_string(), fault_text);

    let err = server.shutdown().await.unwrap_err();
    assert!(matches!(err, StubError::UnexpectedRequest(_)));
    assert_eq!(err.to_string(), fault_text);
}

#[tokio::test]
async fn unconsumed_expectation_fails_teardown() {
    let server = StubServer::start().await.unwrap();
    server.expect(
        RequestDescriptor::get("/blah").build().unwrap(),
        ResponseDescriptor::ok().build(),
    );
    let registry = server.registry();

    // No traffic at all: no unexpected requests, one unmet expectation.
    assert!(registry.check_no_unexpected_requests().is_ok());

    let err = server.shutdown().await.unwrap_err();
    let text = err.to_string();
    assert!(text.contains("1 unmatched expectation(s)"), "got: {text}");
    assert!(text.contains("GET /blah"), "got: {text}");

    // The checks are idempotent: re-running yields the same verdict.
    assert_eq!(registry.check_all_expectations_met().unwrap_err().to_string(), text);
    assert_eq!(registry.check_all_expectations_met().unwrap_err().to_string(), text);
}

#[tokio::test]
async fn identical_paths_replay_in_registration_order() {
    let server = StubServer::start().await.unwrap();
    server.expect(
        RequestDescriptor::get("/blah").build().unwrap(),
        ResponseDescriptor::ok().body("OUCH!!").build(),
    );
    server.expect(
        RequestDescriptor::get("/blah").build().unwrap(),
        ResponseDescriptor::status(404).body("OUCH!!404").build(),
    );
    let url = format!("{}/blah", server.base_url());

    let first = reqwest::get(&url).await.unwrap();
    assert_eq!(first.status(), 200);
    assert_eq!(first.text().await.unwrap(), "OUCH!!");

    let second = reqwest::get(&url).await.unwrap();
    assert_eq!(second.status(), 404);
    assert_eq!(second.text().await.unwrap(), "OUCH!!404");

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn method_constrained_descriptor_rejects_other_methods() {
    let server = StubServer::start().await.unwrap();
    server.expect(
        RequestDescriptor::get("/resource").build().unwrap(),
        ResponseDescriptor::ok().build(),
    );
    let url = format!("{}/resource", server.base_url());

    // A POST to the same path is unexpected, not a match.
    let client = reqwest::Client::new();
    let post = client.post(&url).send().await.unwrap();
    assert_eq!(post.status(), 500);
    assert_eq!(post.headers().get(UNEXPECTED_MARKER_HEADER).unwrap(), "true");

    // The GET still consumes the expectation.
    let get = client.get(&url).send().await.unwrap();
    assert_eq!(get.status(), 200);

    let err = server.shutdown().await.unwrap_err();
    assert!(matches!(err, StubError::UnexpectedRequest(_)));
}

#[tokio::test]
async fn wildcard_method_descriptor_matches_any_method() {
    let server = StubServer::start().await.unwrap();
    server.expect(
        RequestDescriptor::any("/resource").build().unwrap(),
        ResponseDescriptor::ok().build(),
    );

    let client = reqwest::Client::new();
    let response = client
        .delete(format!("{}/resource", server.base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn configured_500_is_distinguishable_from_a_dispatch_fault() {
    let server = StubServer::start().await.unwrap();
    server.expect(
        RequestDescriptor::get("/boom").build().unwrap(),
        ResponseDescriptor::status(500).body("kaboom").build(),
    );

    let response = reqwest::get(format!("{}/boom", server.base_url())).await.unwrap();
    assert_eq!(response.status(), 500);
    assert!(response.headers().get(UNEXPECTED_MARKER_HEADER).is_none());
    assert_eq!(response.text().await.unwrap(), "kaboom");

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn body_matcher_consumes_only_the_matching_request() {
    let server = StubServer::start().await.unwrap();
    server.expect(
        RequestDescriptor::post("/submit")
            .content_type("application/json")
            .body_json(serde_json::json!({"item": "widget"}))
            .build()
            .unwrap(),
        ResponseDescriptor::status(201).body("created").build(),
    );

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/submit", server.base_url()))
        .header("content-type", "application/json; charset=utf-8")
        .body(r#"{ "item": "widget" }"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    assert_eq!(response.text().await.unwrap(), "created");

    server.shutdown().await.unwrap();
}

/// Observe the wire directly: every header line is finalized strictly before
/// the first body byte.
#[tokio::test]
async fn headers_are_written_before_the_body() {
    let server = StubServer::start().await.unwrap();
    server.expect(
        RequestDescriptor::get("/").build().unwrap(),
        ResponseDescriptor::ok().header("X-foo", "barrr").body("Content").build(),
    );

    let mut stream = TcpStream::connect(("127.0.0.1", server.port())).await.unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let raw = String::from_utf8(raw).unwrap();

    let (head, body) = raw.split_once("\r\n\r\n").expect("missing header/body separator");
    assert!(head.starts_with("HTTP/1.1 200"), "got: {head}");
    let head_lower = head.to_ascii_lowercase();
    assert!(head_lower.contains("content-type: text/plain"), "got: {head}");
    assert!(head_lower.contains("x-foo: barrr"), "got: {head}");
    assert_eq!(body, "Content");

    server.shutdown().await.unwrap();
}
