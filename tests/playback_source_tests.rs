mod common;

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ampgate::auth::CredentialManager;
use ampgate::error::{AmpgateError, ErrorCategory};
use ampgate::source::{ActivitySource, SourceRole, SpotifyPlayback};

use common::{fresh_credential, InMemoryCredentialStore};

fn playback(server: &MockServer) -> SpotifyPlayback {
    let store = Arc::new(InMemoryCredentialStore::new());
    store.seed(fresh_credential("token-0"));
    let manager = Arc::new(CredentialManager::new(
        store,
        "id",
        "secret",
        "http://127.0.0.1:8888/callback",
    ));
    SpotifyPlayback::new(manager).with_api_base(server.uri())
}

#[tokio::test]
async fn playing_track_reports_active() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/player"))
        .and(header("authorization", "Bearer token-0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "is_playing": true,
            "device": { "name": "Living Room", "type": "Speaker" },
            "progress_ms": 44_361
        })))
        .expect(1)
        .mount(&server)
        .await;

    let source = playback(&server);
    assert!(source.is_active().await.expect("poll"));
}

#[tokio::test]
async fn paused_player_reports_inactive() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/player"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "is_playing": false })))
        .expect(1)
        .mount(&server)
        .await;

    let source = playback(&server);
    assert!(!source.is_active().await.expect("poll"));
}

#[tokio::test]
async fn no_active_device_204_reports_inactive() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/player"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let source = playback(&server);
    assert!(!source.is_active().await.expect("poll"));
}

#[tokio::test]
async fn missing_is_playing_field_defaults_to_inactive() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/player"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "device": {} })))
        .expect(1)
        .mount(&server)
        .await;

    let source = playback(&server);
    assert!(!source.is_active().await.expect("poll"));
}

#[tokio::test]
async fn rejected_token_is_a_fatal_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/player"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "status": 401, "message": "The access token expired" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let source = playback(&server);
    let err = source.is_active().await.expect_err("rejected token");

    assert_eq!(err.category(), ErrorCategory::Authentication);
    assert!(err.is_fatal());
}

#[tokio::test]
async fn non_json_body_is_a_malformed_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/player"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let source = playback(&server);
    let err = source.is_active().await.expect_err("html body");
    assert!(matches!(err, AmpgateError::MalformedResponse(_)), "{err:?}");
}

#[tokio::test]
async fn check_ready_fails_without_a_credential() {
    let server = MockServer::start().await;
    let store = Arc::new(InMemoryCredentialStore::new());
    let manager = Arc::new(CredentialManager::new(
        store,
        "id",
        "secret",
        "http://127.0.0.1:8888/callback",
    ));
    let source = SpotifyPlayback::new(manager).with_api_base(server.uri());

    let err = source.check_ready().await.expect_err("no credential");
    assert_eq!(err.category(), ErrorCategory::Authentication);
}

#[tokio::test]
async fn playback_source_is_a_keep_alive() {
    let server = MockServer::start().await;
    let source = playback(&server);
    assert_eq!(source.name(), "Spotify");
    assert_eq!(source.role(), SourceRole::KeepAlive);
}
