//! End-to-end tests: the full client against a mock servlet.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use kgsbot::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ACCESS_PATH: &str = "/jsonClient/access";

const HELLO_BATCH: &str = r#"{"messages":[{"type":"HELLO","versionMajor":3,"versionMinor":"8","versionBugfix":"0","jsonClientBuild":"1.0"}]}"#;

fn fast_config() -> ConnectionConfig {
    ConnectionConfig {
        pacing_interval: ConnectionConfig::MIN_PACING_INTERVAL,
        inactivity_threshold: Duration::from_secs(60),
        handshake_max_polls: Some(5),
        ..Default::default()
    }
}

/// A servlet that accepts the login, sets a session cookie and says HELLO
/// to any GET carrying it.
async fn servlet() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ACCESS_PATH))
        .and(body_partial_json(json!({"type": "LOGIN", "name": "OSRBot"})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "JSESSIONID=F00D; Path=/; HttpOnly"),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(ACCESS_PATH))
        .and(header("cookie", "JSESSIONID=F00D"))
        .respond_with(ResponseTemplate::new(200).set_body_string(HELLO_BATCH))
        .mount(&server)
        .await;

    server
}

async fn connect(server: &MockServer) -> KgsConnection {
    KgsClient::builder()
        .url(format!("{}{ACCESS_PATH}", server.uri()))
        .credentials("OSRBot", "")
        .config(fast_config())
        .connect()
        .await
        .expect("handshake should succeed")
}

#[tokio::test]
async fn test_handshake_captures_cookie_and_connects() {
    let server = servlet().await;

    let conn = connect(&server).await;

    assert_eq!(conn.state(), ConnectionState::Connected);
    assert_eq!(
        conn.session()
            .cookies()
            .and_then(|c| c.get("JSESSIONID"))
            .map(String::as_str),
        Some("F00D")
    );
}

#[tokio::test]
async fn test_subscribed_message_is_sent_and_dispatched() {
    let server = servlet().await;
    Mock::given(method("GET"))
        .and(path(ACCESS_PATH))
        .and(query_param("type", "ROOM_JOIN"))
        .and(query_param("channelId", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_string("joined"))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    let mut conn = connect(&server).await;
    let bodies = Arc::new(Mutex::new(Vec::new()));
    {
        let bodies = Arc::clone(&bodies);
        conn.subscribe(
            "ROOM_JOIN",
            callback(move |resp| bodies.lock().unwrap().push(resp.body.clone())),
        )
        .unwrap();
    }

    conn.enqueue(Message::new(MessageBody::RoomJoin(RoomJoinMessage {
        channel_id: 42,
        users: vec![],
    })))
    .unwrap();
    assert!(conn.step_loop().await.unwrap());

    assert_eq!(*bodies.lock().unwrap(), vec![b"joined".to_vec()]);
}

#[tokio::test]
async fn test_unsubscribed_message_is_not_sent() {
    let server = servlet().await;
    let mut conn = connect(&server).await;
    let before = server.received_requests().await.unwrap_or_default().len();

    conn.enqueue(Message::new(MessageBody::RoomJoin(RoomJoinMessage::default())))
        .unwrap();
    conn.step_loop().await.unwrap();

    let after = server.received_requests().await.unwrap_or_default().len();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_close_posts_logout_with_cookie() {
    let server = servlet().await;
    Mock::given(method("POST"))
        .and(path(ACCESS_PATH))
        .and(header("cookie", "JSESSIONID=F00D"))
        .and(body_partial_json(json!({"type": "LOGOUT"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut conn = connect(&server).await;
    conn.close().await.unwrap();

    assert_eq!(conn.state(), ConnectionState::Closed);
    assert!(conn.session().cookies().is_none());
    assert!(matches!(
        conn.enqueue(Message::wake_up()),
        Err(kgsbot::session::SessionError::SessionClosed)
    ));
}

#[tokio::test]
async fn test_refused_login_is_session_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = KgsClient::builder()
        .url(format!("{}{ACCESS_PATH}", server.uri()))
        .credentials("OSRBot", "wrong")
        .config(fast_config())
        .connect()
        .await;

    assert!(matches!(
        result,
        Err(KgsError::Session(
            kgsbot::session::SessionError::LoginRejected { status: 401 }
        ))
    ));
}

#[tokio::test]
async fn test_server_that_never_says_hello_exhausts_handshake() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"messages":[]}"#))
        .expect(5)
        .mount(&server)
        .await;

    let result = KgsClient::builder()
        .url(format!("{}{ACCESS_PATH}", server.uri()))
        .credentials("OSRBot", "")
        .config(fast_config())
        .connect()
        .await;

    assert!(matches!(
        result,
        Err(KgsError::Session(
            kgsbot::session::SessionError::HandshakeExhausted { polls: 5 }
        ))
    ));
}
