//! End-to-end tests for the authenticated session client: bearer
//! attachment, silent refresh-and-replay, and forced logout, driven
//! against a scripted HTTP server.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use joblane_core::auth::{FileStorage, MemoryStorage};
use joblane_core::{ApiClient, ApiError, Config, Role, Scope, SessionCredential, SessionStore};

fn credential(access: &str, refresh: &str) -> SessionCredential {
    SessionCredential {
        id: 1,
        name: "Asha Nair".to_string(),
        email: "asha@example.com".to_string(),
        role: Role::JobSeeker,
        access: access.to_string(),
        refresh: refresh.to_string(),
    }
}

fn config_for(server_uri: &str) -> Config {
    Config {
        api_base_url: server_uri.to_string(),
        login_path: "/login".to_string(),
        session_file: None,
    }
}

fn memory_store() -> Arc<SessionStore> {
    Arc::new(SessionStore::new(
        Box::new(MemoryStorage::new()),
        Box::new(MemoryStorage::new()),
    ))
}

/// Store whose durable scope is a real file, so tests can observe what
/// survives on disk.
fn file_store(test_name: &str) -> (Arc<SessionStore>, PathBuf) {
    let path = std::env::temp_dir().join(format!(
        "joblane-it-{}-{}.json",
        std::process::id(),
        test_name
    ));
    let _ = std::fs::remove_file(&path);
    let store = Arc::new(SessionStore::new(
        Box::new(FileStorage::new(path.clone())),
        Box::new(MemoryStorage::new()),
    ));
    (store, path)
}

struct NoAuthorizationHeader;

impl wiremock::Match for NoAuthorizationHeader {
    fn matches(&self, request: &Request) -> bool {
        !request.headers.contains_key("authorization")
    }
}

#[tokio::test]
async fn attaches_bearer_from_stored_credential() {
    let server = MockServer::start().await;
    let store = memory_store();
    store.login(&credential("A1", "R1"), true).unwrap();
    let client = ApiClient::new(&config_for(&server.uri()), store).unwrap();

    Mock::given(method("GET"))
        .and(path("/jobs/"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let jobs = client.fetch_jobs().await.unwrap();
    assert!(jobs.is_empty());
}

#[tokio::test]
async fn sends_without_header_when_no_credential() {
    let server = MockServer::start().await;
    let client = ApiClient::new(&config_for(&server.uri()), memory_store()).unwrap();

    Mock::given(method("GET"))
        .and(path("/jobs/"))
        .and(NoAuthorizationHeader)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let jobs = client.fetch_jobs().await.unwrap();
    assert!(jobs.is_empty());
}

#[tokio::test]
async fn refreshes_once_and_replays_with_new_token() {
    let server = MockServer::start().await;
    let (store, session_file) = file_store("refresh-replay");
    store.login(&credential("A1", "R1"), true).unwrap();
    let client = ApiClient::new(&config_for(&server.uri()), store.clone()).unwrap();

    // First attempt with the stale token is rejected
    Mock::given(method("GET"))
        .and(path("/jobs/"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/refresh/"))
        .and(body_json(json!({"refresh": "R1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A2"})))
        .expect(1)
        .mount(&server)
        .await;

    // Replay must carry the refreshed token
    Mock::given(method("GET"))
        .and(path("/jobs/"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 7,
            "title": "Frontend Developer",
            "company": "Acme",
            "location": "Bengaluru"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let jobs = client.fetch_jobs().await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].title, "Frontend Developer");

    // The durable scope now holds the refreshed token and nothing moved scopes
    assert_eq!(store.access_token().unwrap().as_deref(), Some("A2"));
    assert_eq!(store.refresh_token().unwrap().as_deref(), Some("R1"));
    assert_eq!(store.scope(), Some(Scope::Durable));
    let on_disk = std::fs::read_to_string(&session_file).unwrap();
    assert!(on_disk.contains("A2"));

    let _ = std::fs::remove_file(&session_file);
}

#[tokio::test]
async fn second_401_is_surfaced_without_a_third_attempt() {
    let server = MockServer::start().await;
    let store = memory_store();
    store.login(&credential("A1", "R1"), false).unwrap();
    let client = ApiClient::new(&config_for(&server.uri()), store).unwrap();

    // Both the original request and the replay are rejected
    Mock::given(method("GET"))
        .and(path("/jobs/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A2"})))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.fetch_jobs().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::Unauthorized)
    ));
}

#[tokio::test]
async fn rejected_refresh_clears_both_scopes_and_fires_hook() {
    let server = MockServer::start().await;
    let (store, session_file) = file_store("refresh-rejected");
    store.login(&credential("A1", "R1"), true).unwrap();

    let navigated_to: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    let hook_target = Arc::clone(&navigated_to);
    let client = ApiClient::new(&config_for(&server.uri()), store.clone())
        .unwrap()
        .on_session_expired(move |login_path| {
            *hook_target.lock().unwrap() = Some(login_path.to_string());
        });

    Mock::given(method("GET"))
        .and(path("/jobs/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/refresh/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "expired"})))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.fetch_jobs().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::RefreshRejected(_))
    ));

    // Session is gone from both scopes and the caller was pointed at login
    assert!(store.current().unwrap().is_none());
    assert!(!session_file.exists());
    assert_eq!(navigated_to.lock().unwrap().as_deref(), Some("/login"));
}

#[tokio::test]
async fn missing_refresh_credential_propagates_the_401() {
    let server = MockServer::start().await;
    let client = ApiClient::new(&config_for(&server.uri()), memory_store()).unwrap();

    Mock::given(method("GET"))
        .and(path("/jobs/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    // No refresh credential stored, so the refresh endpoint is never called
    Mock::given(method("POST"))
        .and(path("/refresh/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client.fetch_jobs().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::Unauthorized)
    ));
}

#[tokio::test]
async fn concurrent_401s_share_one_refresh() {
    let server = MockServer::start().await;
    let store = memory_store();
    store.login(&credential("A1", "R1"), true).unwrap();
    let client = ApiClient::new(&config_for(&server.uri()), store).unwrap();

    Mock::given(method("GET"))
        .and(path("/jobs/"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/jobs/"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    // Exactly one refresh despite two requests failing at the same time
    Mock::given(method("POST"))
        .and(path("/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A2"})))
        .expect(1)
        .mount(&server)
        .await;

    let (first, second) = tokio::join!(client.fetch_jobs(), client.fetch_jobs());
    assert!(first.is_ok());
    assert!(second.is_ok());
}

#[tokio::test]
async fn login_without_remember_stays_out_of_durable_storage() {
    let server = MockServer::start().await;
    let (store, session_file) = file_store("volatile-login");
    let client = ApiClient::new(&config_for(&server.uri()), store.clone()).unwrap();

    Mock::given(method("POST"))
        .and(path("/login/"))
        .and(body_json(json!({"username": "asha_n", "password": "Secret123"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "name": "Asha Nair",
            "email": "asha@example.com",
            "role": "jobseeker",
            "token": "A1",
            "refresh": "R1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let logged_in = client.login("asha_n", "Secret123", false).await.unwrap();
    assert_eq!(logged_in.access, "A1");
    assert_eq!(store.scope(), Some(Scope::Volatile));
    assert!(!session_file.exists());
}

#[tokio::test]
async fn otp_verification_logs_in_durably() {
    let server = MockServer::start().await;
    let (store, session_file) = file_store("otp-login");
    let client = ApiClient::new(&config_for(&server.uri()), store.clone()).unwrap();

    Mock::given(method("POST"))
        .and(path("/verify-otp/"))
        .and(body_json(json!({"email": "asha@example.com", "otp": "123456"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "name": "Asha Nair",
            "email": "asha@example.com",
            "role": "jobseeker",
            "access": "A1",
            "refresh": "R1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    client.verify_otp("asha@example.com", "123456").await.unwrap();
    assert_eq!(store.scope(), Some(Scope::Durable));
    assert!(session_file.exists());

    let _ = std::fs::remove_file(&session_file);
}

#[tokio::test]
async fn logout_clears_session_even_when_revoke_fails() {
    let server = MockServer::start().await;
    let store = memory_store();
    store.login(&credential("A1", "R1"), true).unwrap();
    let client = ApiClient::new(&config_for(&server.uri()), store.clone()).unwrap();

    Mock::given(method("POST"))
        .and(path("/logout/"))
        .and(header("authorization", "Bearer A1"))
        .and(body_json(json!({"refresh_token": "R1"})))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    client.logout().await.unwrap();
    assert!(store.current().unwrap().is_none());
    assert!(!store.is_logged_in());
}

#[tokio::test]
async fn non_401_errors_pass_through_unchanged() {
    let server = MockServer::start().await;
    let store = memory_store();
    store.login(&credential("A1", "R1"), true).unwrap();
    let client = ApiClient::new(&config_for(&server.uri()), store.clone()).unwrap();

    Mock::given(method("GET"))
        .and(path("/jobs/42/"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such job"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.fetch_job(42).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::NotFound(_))
    ));
    // The session is untouched by an ordinary failure
    assert!(store.is_logged_in());
}
