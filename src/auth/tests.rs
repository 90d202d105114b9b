//! Tests for the auth module

use super::*;
use crate::error::{Error, FailureKind};
use crate::http::EndpointTarget;
use crate::types::Scheme;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn authenticator_for(server: &MockServer) -> Authenticator {
    let addr = server.address();
    let target =
        EndpointTarget::with_scheme(Scheme::Http, &addr.ip().to_string(), addr.port()).unwrap();
    Authenticator::with_client(reqwest::Client::new(), target, Duration::from_secs(5))
}

fn creds() -> Credentials {
    Credentials::new("admin", "password123").unwrap()
}

#[tokio::test]
async fn test_login_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/login"))
        .and(header("Accept", "application/json"))
        .and(body_json(json!({
            "login": {"username": "admin", "password": "password123"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "login": {"token": "example-token-12345", "expire": "86400"},
            "resp": {"status": "success", "respCode": 0, "respMsg": "Operation success"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let token = authenticator_for(&mock_server).login(&creds()).await.unwrap();
    assert_eq!(token.token, "example-token-12345");
    assert_eq!(token.expires_in, Some(86400));
}

#[tokio::test]
async fn test_login_numeric_expires_field() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "login": {"token": "tok", "expires": 3600},
            "resp": {"status": "success", "respCode": 0, "respMsg": "Operation success"}
        })))
        .mount(&mock_server)
        .await;

    let token = authenticator_for(&mock_server).login(&creds()).await.unwrap();
    assert_eq!(token.expires_in, Some(3600));
}

#[tokio::test]
async fn test_login_401_is_invalid_credentials() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "resp": {"status": "failure", "respCode": 401, "respMsg": "Invalid credentials"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = authenticator_for(&mock_server)
        .login(&creds())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::InvalidCredentials);
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.message(), "Invalid credentials");
}

#[tokio::test]
async fn test_login_failure_envelope_is_invalid_credentials() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resp": {"status": "failure", "respCode": 401, "respMsg": "Invalid credentials"}
        })))
        .mount(&mock_server)
        .await;

    let err = authenticator_for(&mock_server)
        .login(&creds())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidCredentials { status: None, ref message } if message == "Invalid credentials"
    ));
}

#[tokio::test]
async fn test_login_plain_text_rejection_keeps_raw_text() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Bad credentials\n"))
        .mount(&mock_server)
        .await;

    let err = authenticator_for(&mock_server)
        .login(&creds())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::MalformedResponse);
    match err {
        Error::MalformedResponse { body, message, .. } => {
            assert_eq!(body.as_deref(), Some("Bad credentials"));
            assert!(message.contains("Bad credentials"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_login_unknown_garbage_is_generic_malformed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&mock_server)
        .await;

    let err = authenticator_for(&mock_server)
        .login(&creds())
        .await
        .unwrap_err();
    match err {
        Error::MalformedResponse { body, message, .. } => {
            assert!(body.is_none());
            assert_eq!(message, "invalid JSON response");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_login_missing_token_is_malformed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "login": {"expire": "86400"},
            "resp": {"status": "success", "respCode": 0, "respMsg": "Operation success"}
        })))
        .mount(&mock_server)
        .await;

    let err = authenticator_for(&mock_server)
        .login(&creds())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::MalformedResponse);
}

#[tokio::test]
async fn test_login_server_error_is_api_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/login"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = authenticator_for(&mock_server)
        .login(&creds())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Api);
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_login_connection_refused_is_transport_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let target = EndpointTarget::with_scheme(Scheme::Http, "127.0.0.1", port).unwrap();
    let auth = Authenticator::with_client(reqwest::Client::new(), target, Duration::from_secs(2));

    let err = auth.login(&creds()).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Transport);
}

#[tokio::test]
async fn test_login_timeout_is_transport_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/login"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&mock_server)
        .await;

    let addr = mock_server.address();
    let target =
        EndpointTarget::with_scheme(Scheme::Http, &addr.ip().to_string(), addr.port()).unwrap();
    let auth =
        Authenticator::with_client(reqwest::Client::new(), target, Duration::from_millis(50));

    let err = auth.login(&creds()).await.unwrap_err();
    assert!(matches!(err, Error::Timeout { timeout_ms: 50, .. }));
}

#[test]
fn test_parse_login_body_unparseable_expire_means_no_expiry() {
    let body = json!({
        "login": {"token": "tok", "expire": "never"},
        "resp": {"status": "success", "respCode": 0, "respMsg": "ok"}
    });
    let token = parse_login_body(&body.to_string()).unwrap();
    assert_eq!(token.token, "tok");
    assert_eq!(token.expires_in, None);
}

#[test]
fn test_parse_login_body_lockout_text() {
    let err = parse_login_body("Maximum of five login attempts exceeded").unwrap_err();
    assert!(matches!(err, Error::MalformedResponse { body: Some(_), .. }));
}
