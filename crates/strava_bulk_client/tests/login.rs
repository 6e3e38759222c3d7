use std::collections::HashMap;

use secrecy::SecretString;
use strava_bulk_client::{Authenticator, SessionClient, StravaError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOGIN_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta content="authenticity_token" name="csrf-param" />
  <meta content="Zm9vYmFy+/tok==" name="csrf-token" />
  <title>Log In | Strava</title>
</head>
<body><form action="/session" method="post"></form></body>
</html>"#;

async fn mount_login_page(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

fn password() -> SecretString {
    SecretString::new("hunter2".into())
}

#[tokio::test]
async fn authenticate_posts_form_and_returns_token() {
    let server = MockServer::start().await;
    mount_login_page(&server, LOGIN_PAGE).await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", "/dashboard")
                .insert_header("Set-Cookie", "_strava4_session=s3ss10n; Path=/"),
        )
        .expect(1)
        .mount(&server)
        .await;
    // The redirect must be handed back, not followed.
    Mock::given(method("GET"))
        .and(path("/dashboard"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = SessionClient::new(&server.uri()).expect("client");
    let token = Authenticator::new(&client)
        .authenticate("rider@example.com", &password())
        .await
        .expect("login");
    assert_eq!(token.as_str(), "Zm9vYmFy+/tok==");

    let received = server.received_requests().await.unwrap();
    let post = received
        .iter()
        .find(|r| r.method.as_str() == "POST")
        .expect("session POST");
    let content_type = post.headers.get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("application/x-www-form-urlencoded"));
    let form: Vec<(String, String)> = url::form_urlencoded::parse(&post.body)
        .into_owned()
        .collect();
    assert!(form.contains(&("email".into(), "rider@example.com".into())));
    assert!(form.contains(&("password".into(), "hunter2".into())));
    assert!(form.contains(&("authenticity_token".into(), "Zm9vYmFy+/tok==".into())));
}

#[tokio::test]
async fn login_page_without_token_is_token_not_found() {
    let server = MockServer::start().await;
    mount_login_page(&server, "<html><head><title>Maintenance</title></head></html>").await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(302))
        .expect(0)
        .mount(&server)
        .await;

    let client = SessionClient::new(&server.uri()).expect("client");
    let err = Authenticator::new(&client)
        .authenticate("rider@example.com", &password())
        .await
        .unwrap_err();
    assert!(matches!(err, StravaError::TokenNotFound));
}

#[tokio::test]
async fn non_redirect_login_response_is_rejected() {
    let server = MockServer::start().await;
    mount_login_page(&server, LOGIN_PAGE).await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>try again</html>"))
        .mount(&server)
        .await;

    let client = SessionClient::new(&server.uri()).expect("client");
    let err = Authenticator::new(&client)
        .authenticate("rider@example.com", &password())
        .await
        .unwrap_err();
    assert!(matches!(err, StravaError::AuthenticationFailed(200)));
}

#[tokio::test]
async fn other_redirect_classes_are_not_success() {
    let server = MockServer::start().await;
    mount_login_page(&server, LOGIN_PAGE).await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(303).insert_header("Location", "/login"))
        .mount(&server)
        .await;

    let client = SessionClient::new(&server.uri()).expect("client");
    let err = Authenticator::new(&client)
        .authenticate("rider@example.com", &password())
        .await
        .unwrap_err();
    assert!(matches!(err, StravaError::AuthenticationFailed(303)));
}

#[tokio::test]
async fn login_page_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = SessionClient::new(&server.uri()).expect("client");
    let err = Authenticator::new(&client)
        .authenticate("rider@example.com", &password())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StravaError::UnexpectedStatus { status: 503, .. }
    ));
}

#[tokio::test]
async fn unreachable_host_is_transport_error() {
    // Port 9 (discard) on localhost is closed in test environments.
    let client = SessionClient::new("http://127.0.0.1:9").expect("client");
    let err = Authenticator::new(&client)
        .authenticate("rider@example.com", &password())
        .await
        .unwrap_err();
    assert!(matches!(err, StravaError::Transport(_)));
}

#[tokio::test]
async fn reserved_characters_in_credentials_survive_form_encoding() {
    let server = MockServer::start().await;
    mount_login_page(&server, LOGIN_PAGE).await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/dashboard"))
        .expect(1)
        .mount(&server)
        .await;

    let client = SessionClient::new(&server.uri()).expect("client");
    let secret = SecretString::new("p@ss w&rd=100%+ü".into());
    Authenticator::new(&client)
        .authenticate("rider+strava@example.com", &secret)
        .await
        .expect("login");

    let received = server.received_requests().await.unwrap();
    let post = received
        .iter()
        .find(|r| r.method.as_str() == "POST")
        .expect("session POST");
    let form: HashMap<String, String> = url::form_urlencoded::parse(&post.body)
        .into_owned()
        .collect();
    assert_eq!(form.get("email").map(String::as_str), Some("rider+strava@example.com"));
    assert_eq!(form.get("password").map(String::as_str), Some("p@ss w&rd=100%+ü"));
    assert_eq!(
        form.get("authenticity_token").map(String::as_str),
        Some("Zm9vYmFy+/tok==")
    );
}
