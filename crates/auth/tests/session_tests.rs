use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use greenloop_auth::{
    AuthApi, FileStore, LoginRequest, MemoryStore, RegisterRequest, SessionController,
    SessionStore, StoreError, User, UserPatch, AUTH_TOKEN_KEY, DEFAULT_SESSION_TTL, DEFAULT_TRUST_SCORE,
    USER_DATA_KEY,
};
use greenloop_fetch::{ApiClient, CancellationToken};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn login_payload(token: &str, email: &str) -> Value {
    json!({
        "success": true,
        "message": "Login successful",
        "data": {
            "token": token,
            "tokenType": "Bearer",
            "userId": 1,
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": email,
            "userType": "CONSUMER",
            "sustainabilityScore": 12.5,
            "emailVerified": true
        }
    })
}

fn controller_with(server_uri: &str, store: Arc<dyn SessionStore>) -> SessionController {
    let client = ApiClient::new(server_uri).unwrap();
    SessionController::new(AuthApi::new(client, store))
}

async fn mount_login(server: &MockServer, identifier: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "usernameOrEmail": identifier, "password": "pw" })))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_establishes_and_persists_session() {
    let server = MockServer::start().await;
    mount_login(
        &server,
        "a@b.com",
        ResponseTemplate::new(200).set_body_json(login_payload("T", "a@b.com")),
    )
    .await;

    let store = Arc::new(MemoryStore::new());
    let controller = controller_with(&server.uri(), store.clone());
    assert!(!controller.init().await.unwrap());

    let session = controller
        .login(&LoginRequest::new("a@b.com", "pw"), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(session.token, "T");
    assert_eq!(session.user.email, "a@b.com");
    assert_eq!(session.user.trust_score, DEFAULT_TRUST_SCORE);
    assert!(session.user.is_verified);
    assert!(session.expires_at.is_some());

    assert!(controller.is_authenticated().await);
    assert_eq!(controller.token().await.as_deref(), Some("T"));
    assert_eq!(controller.api().client().token().header_value().as_deref(), Some("Bearer T"));

    assert_eq!(store.get(AUTH_TOKEN_KEY).await.unwrap().as_deref(), Some("T"));
    let persisted: User = serde_json::from_str(&store.get(USER_DATA_KEY).await.unwrap().unwrap()).unwrap();
    assert_eq!(persisted.email, "a@b.com");
}

#[tokio::test]
async fn test_rejected_login_leaves_session_unchanged() {
    let server = MockServer::start().await;
    mount_login(
        &server,
        "a@b.com",
        ResponseTemplate::new(200).set_body_json(login_payload("T", "a@b.com")),
    )
    .await;
    mount_login(
        &server,
        "intruder",
        ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "message": "Invalid credentials"
        })),
    )
    .await;

    let store = Arc::new(MemoryStore::new());
    let controller = controller_with(&server.uri(), store.clone());
    let cancel = CancellationToken::new();

    controller.login(&LoginRequest::new("a@b.com", "pw"), &cancel).await.unwrap();
    let before = controller.session().await;

    let err = controller
        .login(&LoginRequest::new("intruder", "pw"), &cancel)
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "Invalid credentials");
    assert_eq!(controller.session().await, before);
    assert_eq!(store.get(AUTH_TOKEN_KEY).await.unwrap().as_deref(), Some("T"));
    assert!(!controller.is_loading());
}

/// Memory store whose user entry writes can be made to fail
#[derive(Default)]
struct FailingUserStore {
    inner: MemoryStore,
    fail_user_writes: AtomicBool,
}

#[async_trait]
impl SessionStore for FailingUserStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        if key == USER_DATA_KEY && self.fail_user_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )));
        }
        self.inner.set(key, value, ttl).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key).await
    }
}

#[tokio::test]
async fn test_failed_user_write_keeps_persisted_entries_paired() {
    let server = MockServer::start().await;
    mount_login(
        &server,
        "alice",
        ResponseTemplate::new(200).set_body_json(login_payload("ALICE", "alice@b.com")),
    )
    .await;
    mount_login(
        &server,
        "bob",
        ResponseTemplate::new(200).set_body_json(login_payload("BOB", "bob@b.com")),
    )
    .await;

    let store = Arc::new(FailingUserStore::default());
    let controller = controller_with(&server.uri(), store.clone());
    let cancel = CancellationToken::new();

    controller.login(&LoginRequest::new("alice", "pw"), &cancel).await.unwrap();

    store.fail_user_writes.store(true, Ordering::SeqCst);
    let err = controller
        .login(&LoginRequest::new("bob", "pw"), &cancel)
        .await
        .unwrap_err();
    assert!(!err.is_cancelled());

    assert_eq!(controller.token().await.as_deref(), Some("ALICE"));
    assert_eq!(store.get(AUTH_TOKEN_KEY).await.unwrap().as_deref(), Some("ALICE"));

    let restarted = controller_with(&server.uri(), store.clone());
    assert!(restarted.init().await.unwrap());
    assert_eq!(restarted.token().await.as_deref(), Some("ALICE"));
    assert_eq!(restarted.user().await.unwrap().email, "alice@b.com");
}

#[tokio::test]
async fn test_failed_first_login_persists_nothing() {
    let server = MockServer::start().await;
    mount_login(
        &server,
        "bob",
        ResponseTemplate::new(200).set_body_json(login_payload("BOB", "bob@b.com")),
    )
    .await;

    let store = Arc::new(FailingUserStore::default());
    store.fail_user_writes.store(true, Ordering::SeqCst);
    let controller = controller_with(&server.uri(), store.clone());

    assert!(controller
        .login(&LoginRequest::new("bob", "pw"), &CancellationToken::new())
        .await
        .is_err());

    assert!(!controller.is_authenticated().await);
    assert_eq!(store.get(AUTH_TOKEN_KEY).await.unwrap(), None);
    assert_eq!(store.get(USER_DATA_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_network_failure_leaves_logged_out_session_empty() {
    let store = Arc::new(MemoryStore::new());
    let controller = controller_with("http://127.0.0.1:9", store.clone());

    let err = controller
        .login(&LoginRequest::new("a@b.com", "pw"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(!err.user_message().is_empty());
    assert!(!controller.is_authenticated().await);
    assert_eq!(store.get(AUTH_TOKEN_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_logout_always_clears() {
    let server = MockServer::start().await;
    mount_login(
        &server,
        "a@b.com",
        ResponseTemplate::new(200).set_body_json(login_payload("T", "a@b.com")),
    )
    .await;

    let store = Arc::new(MemoryStore::new());
    let controller = controller_with(&server.uri(), store.clone());

    // logging out with nothing to clear is fine
    controller.logout().await.unwrap();

    controller
        .login(&LoginRequest::new("a@b.com", "pw"), &CancellationToken::new())
        .await
        .unwrap();
    controller.logout().await.unwrap();

    assert_eq!(controller.user().await, None);
    assert_eq!(controller.token().await, None);
    assert!(!controller.api().client().token().is_set());
    assert_eq!(store.get(AUTH_TOKEN_KEY).await.unwrap(), None);
    assert_eq!(store.get(USER_DATA_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_update_user_survives_restart() {
    let server = MockServer::start().await;
    mount_login(
        &server,
        "a@b.com",
        ResponseTemplate::new(200).set_body_json(login_payload("T", "a@b.com")),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("session.json");

    let controller = controller_with(&server.uri(), Arc::new(FileStore::new(&file)));
    controller
        .login(&LoginRequest::new("a@b.com", "pw"), &CancellationToken::new())
        .await
        .unwrap();

    let updated = controller
        .update_user(UserPatch {
            bio: Some("Swapping denim since 2019".into()),
            first_name: Some("Augusta".into()),
            ..Default::default()
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.first_name, "Augusta");
    controller.dispose();

    let restarted = controller_with(&server.uri(), Arc::new(FileStore::new(&file)));
    assert!(restarted.init().await.unwrap());

    let user = restarted.user().await.unwrap();
    assert_eq!(user.first_name, "Augusta");
    assert_eq!(user.bio, "Swapping denim since 2019");
    assert_eq!(user.email, "a@b.com");
    assert_eq!(restarted.api().client().token().token().as_deref(), Some("T"));
}

#[tokio::test]
async fn test_corrupt_user_data_resets_session() {
    let store = Arc::new(MemoryStore::new());
    store.set(AUTH_TOKEN_KEY, "T", DEFAULT_SESSION_TTL).await.unwrap();
    store.set(USER_DATA_KEY, "{not json", DEFAULT_SESSION_TTL).await.unwrap();

    let controller = controller_with("http://127.0.0.1:9", store.clone());
    assert!(!controller.init().await.unwrap());

    assert!(!controller.is_authenticated().await);
    assert_eq!(store.get(AUTH_TOKEN_KEY).await.unwrap(), None);
    assert_eq!(store.get(USER_DATA_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_expired_session_is_not_restored() {
    let server = MockServer::start().await;
    mount_login(
        &server,
        "a@b.com",
        ResponseTemplate::new(200).set_body_json(login_payload("T", "a@b.com")),
    )
    .await;

    let store = Arc::new(MemoryStore::new());
    let controller = controller_with(&server.uri(), store.clone()).with_ttl(Duration::ZERO);
    controller
        .login(&LoginRequest::new("a@b.com", "pw"), &CancellationToken::new())
        .await
        .unwrap();

    let restarted = controller_with(&server.uri(), store);
    assert!(!restarted.init().await.unwrap());
}

#[tokio::test]
async fn test_later_login_wins_over_slower_earlier_one() {
    let server = MockServer::start().await;
    mount_login(
        &server,
        "slow@b.com",
        ResponseTemplate::new(200)
            .set_delay(Duration::from_millis(400))
            .set_body_json(login_payload("SLOW", "slow@b.com")),
    )
    .await;
    mount_login(
        &server,
        "fast@b.com",
        ResponseTemplate::new(200).set_body_json(login_payload("FAST", "fast@b.com")),
    )
    .await;

    let controller = controller_with(&server.uri(), Arc::new(MemoryStore::new()));
    let cancel = CancellationToken::new();

    let request = LoginRequest::new("slow@b.com", "pw");
    let (slow, fast) = tokio::join!(
        controller.login(&request, &cancel),
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            controller.login(&LoginRequest::new("fast@b.com", "pw"), &cancel).await
        }
    );

    assert!(slow.unwrap_err().is_cancelled());
    assert_eq!(fast.unwrap().token, "FAST");
    assert_eq!(controller.token().await.as_deref(), Some("FAST"));
    assert_eq!(controller.user().await.unwrap().email, "fast@b.com");
}

#[tokio::test]
async fn test_dispose_cancels_in_flight_login() {
    let server = MockServer::start().await;
    mount_login(
        &server,
        "a@b.com",
        ResponseTemplate::new(200)
            .set_delay(Duration::from_secs(5))
            .set_body_json(login_payload("T", "a@b.com")),
    )
    .await;

    let store = Arc::new(MemoryStore::new());
    let controller = controller_with(&server.uri(), store.clone());

    let request = LoginRequest::new("a@b.com", "pw");
    let cancel = CancellationToken::new();
    let (result, was_loading) = tokio::join!(
        controller.login(&request, &cancel),
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let loading = controller.is_loading();
            controller.dispose();
            loading
        }
    );

    assert!(was_loading);
    assert!(result.unwrap_err().is_cancelled());
    assert!(!controller.is_authenticated().await);
    assert!(!controller.is_loading());
    assert_eq!(store.get(AUTH_TOKEN_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_caller_cancellation_leaves_session_alone() {
    let server = MockServer::start().await;
    mount_login(
        &server,
        "a@b.com",
        ResponseTemplate::new(200)
            .set_delay(Duration::from_secs(5))
            .set_body_json(login_payload("T", "a@b.com")),
    )
    .await;

    let controller = controller_with(&server.uri(), Arc::new(MemoryStore::new()));
    let cancel = CancellationToken::new();

    let request = LoginRequest::new("a@b.com", "pw");
    let (result, _) = tokio::join!(
        controller.login(&request, &cancel),
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        }
    );

    assert!(result.unwrap_err().is_cancelled());
    assert_eq!(controller.session().await, None);
    assert!(!controller.is_disposed());
}

#[tokio::test]
async fn test_register_does_not_log_in() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "data": {
                "userId": 2,
                "firstName": "Grace",
                "lastName": "Hopper",
                "email": "grace@example.com",
                "userType": "BRAND"
            }
        })))
        .mount(&server)
        .await;

    let controller = controller_with(&server.uri(), Arc::new(MemoryStore::new()));
    let request = RegisterRequest {
        first_name: "Grace".into(),
        last_name: "Hopper".into(),
        email: "grace@example.com".into(),
        password: "pw".into(),
        ..Default::default()
    };

    let profile = controller.register(&request, &CancellationToken::new()).await.unwrap();
    assert_eq!(profile.email, "grace@example.com");
    assert!(!controller.is_authenticated().await);
}

#[tokio::test]
async fn test_refresh_replaces_token_and_keeps_user() {
    let server = MockServer::start().await;
    mount_login(
        &server,
        "a@b.com",
        ResponseTemplate::new(200).set_body_json(login_payload("T", "a@b.com")),
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_payload("T2", "a@b.com")))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let controller = controller_with(&server.uri(), store.clone());
    let cancel = CancellationToken::new();

    controller.login(&LoginRequest::new("a@b.com", "pw"), &cancel).await.unwrap();
    controller
        .update_user(UserPatch {
            bio: Some("kept".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    let session = controller.refresh(&cancel).await.unwrap();

    assert_eq!(session.token, "T2");
    assert_eq!(session.user.bio, "kept");
    assert_eq!(store.get(AUTH_TOKEN_KEY).await.unwrap().as_deref(), Some("T2"));
    assert_eq!(controller.api().client().token().header_value().as_deref(), Some("Bearer T2"));
}
