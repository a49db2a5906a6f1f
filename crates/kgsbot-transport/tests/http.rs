//! Integration tests for `ReqwestTransport` against a local mock servlet.

#![cfg(feature = "http")]

use kgsbot_transport::{Cookies, HttpTransport, ReqwestTransport};
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn access_url(server: &MockServer) -> String {
    format!("{}/jsonClient/access", server.uri())
}

#[tokio::test]
async fn test_post_sends_body_and_headers_and_collects_cookies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jsonClient/access"))
        .and(header("content-type", "application/json;charset=UTF-8"))
        .and(body_string(r#"{"type":"LOGIN"}"#))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "JSESSIONID=F00D; Path=/; HttpOnly"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new().expect("client should build");
    let resp = transport
        .post(
            &access_url(&server),
            br#"{"type":"LOGIN"}"#.to_vec(),
            &[("content-type", "application/json;charset=UTF-8")],
            None,
        )
        .await
        .expect("post should succeed");

    assert_eq!(resp.status, 200);
    assert_eq!(
        resp.cookies.get("JSESSIONID").map(String::as_str),
        Some("F00D")
    );
}

#[tokio::test]
async fn test_get_encodes_params_and_sends_cookie_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jsonClient/access"))
        .and(query_param("type", "HELLO"))
        .and(header("cookie", "sid=abc"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"messages":[]}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut cookies = Cookies::new();
    cookies.insert("sid".into(), "abc".into());

    let transport = ReqwestTransport::new().expect("client should build");
    let resp = transport
        .get(
            &access_url(&server),
            &[("type".to_string(), "HELLO".to_string())],
            Some(&cookies),
        )
        .await
        .expect("get should succeed");

    assert!(resp.is_success());
    assert_eq!(resp.body, br#"{"messages":[]}"#);
}

#[tokio::test]
async fn test_error_status_is_returned_not_raised() {
    // Status handling belongs to the session layer; the transport only
    // reports what the server said.
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new().expect("client should build");
    let resp = transport
        .get(&access_url(&server), &[], None)
        .await
        .expect("a 503 is still a response");

    assert_eq!(resp.status, 503);
    assert!(!resp.is_success());
}

#[tokio::test]
async fn test_invalid_header_name_is_rejected() {
    let server = MockServer::start().await;
    let transport = ReqwestTransport::new().expect("client should build");

    let result = transport
        .post(&access_url(&server), Vec::new(), &[("bad header", "x")], None)
        .await;

    assert!(matches!(
        result,
        Err(kgsbot_transport::TransportError::InvalidHeader(_))
    ));
}

#[tokio::test]
async fn test_unreachable_server_is_http_error() {
    // Port 9 (discard) on localhost is closed in test environments.
    let transport = ReqwestTransport::new().expect("client should build");
    let result = transport.get("http://127.0.0.1:9/", &[], None).await;
    assert!(matches!(result, Err(kgsbot_transport::TransportError::Http(_))));
}
