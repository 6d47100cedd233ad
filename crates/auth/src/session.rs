//! The session controller: login state held in memory, mirrored to a store

use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use greenloop_fetch::{ApiError, CancellationToken, TokenSlot};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::api::AuthApi;
use crate::error::{AuthError, Result};
use crate::store::{SessionStore, AUTH_TOKEN_KEY, USER_DATA_KEY};
use crate::types::{LoginRequest, RegisterRequest, User, UserPatch, UserResponse};

/// How long a persisted session lives
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// An authenticated user and the token that proves it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub token_type: String,
    pub user: User,
    /// When the persisted copy expires; unknown for a session restored by `init`
    pub expires_at: Option<DateTime<Utc>>,
}

/// Counts operations in flight for `is_loading`
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Owns the client-side session.
///
/// The lifecycle is explicit: call [`SessionController::init`] once to
/// restore a persisted session and [`SessionController::dispose`] when the
/// owner goes away. After `dispose`, pending operations resolve to
/// [`ApiError::Cancelled`] without touching the session.
///
/// Logins are ordered by when they started: a login whose response arrives
/// after a newer login (or a logout) began is discarded.
pub struct SessionController {
    api: AuthApi,
    store: Arc<dyn SessionStore>,
    token: TokenSlot,
    ttl: Duration,
    state: RwLock<Option<Session>>,
    root: CancellationToken,
    generation: AtomicU64,
    in_flight: AtomicUsize,
}

impl SessionController {
    pub fn new(api: AuthApi) -> Self {
        Self {
            store: api.store().clone(),
            token: api.client().token().clone(),
            api,
            ttl: DEFAULT_SESSION_TTL,
            state: RwLock::new(None),
            root: CancellationToken::new(),
            generation: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Persist sessions for `ttl` instead of [`DEFAULT_SESSION_TTL`]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn api(&self) -> &AuthApi {
        &self.api
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Restore the persisted session, if any.
    ///
    /// Returns whether a session was restored. A user entry that no longer
    /// parses wipes both persisted entries.
    pub async fn init(&self) -> Result<bool> {
        let _busy = InFlight::enter(&self.in_flight);

        let token = self.store.get(AUTH_TOKEN_KEY).await?;
        let user_data = self.store.get(USER_DATA_KEY).await?;

        let (token, user_data) = match (token, user_data) {
            (Some(token), Some(user_data)) => (token, user_data),
            _ => {
                debug!("no persisted session");
                return Ok(false);
            }
        };

        let user: User = match serde_json::from_str(&user_data) {
            Ok(user) => user,
            Err(err) => {
                warn!("discarding corrupt persisted user: {}", err);
                self.store.remove(AUTH_TOKEN_KEY).await?;
                self.store.remove(USER_DATA_KEY).await?;
                return Ok(false);
            }
        };

        let mut state = self.state.write().await;
        if self.root.is_cancelled() {
            return Ok(false);
        }
        self.token.set("Bearer", &token);
        *state = Some(Session {
            token,
            token_type: "Bearer".to_string(),
            user,
            expires_at: None,
        });
        info!("restored session");
        Ok(true)
    }

    /// Log in and establish a session.
    ///
    /// On any failure the previous session, if any, is left as it was.
    pub async fn login(&self, credentials: &LoginRequest, cancel: &CancellationToken) -> Result<Session> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let response = self.guarded(cancel, self.api.login(credentials, cancel)).await?;

        let now = Utc::now();
        let session = Session {
            user: response.to_user(now),
            token: response.token,
            token_type: response.token_type,
            expires_at: chrono::Duration::from_std(self.ttl)
                .ok()
                .and_then(|ttl| now.checked_add_signed(ttl)),
        };

        let mut state = self.state.write().await;
        if self.generation.load(Ordering::SeqCst) != generation || self.root.is_cancelled() {
            debug!("discarding superseded login for {}", credentials.identifier);
            return Err(ApiError::Cancelled.into());
        }

        self.persist(&session, (*state).as_ref()).await?;
        self.token.set(&session.token_type, &session.token);
        *state = Some(session.clone());

        info!("logged in as {}", session.user.email);
        Ok(session)
    }

    /// Create an account. The new user still has to log in.
    pub async fn register(&self, request: &RegisterRequest, cancel: &CancellationToken) -> Result<UserResponse> {
        self.guarded(cancel, self.api.register(request, cancel)).await
    }

    /// Forget the session in memory and in the store.
    ///
    /// Memory is cleared even if the store fails. Logins still in flight
    /// will not re-establish a session.
    pub async fn logout(&self) -> Result<()> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        {
            let mut state = self.state.write().await;
            *state = None;
            self.token.clear();
        }
        info!("logged out");
        self.api.logout().await
    }

    /// Confirm an email address; returns the backend's message
    pub async fn verify_email(&self, token: &str, cancel: &CancellationToken) -> Result<String> {
        self.guarded(cancel, self.api.verify_email(token, cancel)).await
    }

    /// Merge `patch` into the current user and persist it.
    ///
    /// Nothing is sent to the server. Returns `None` when logged out.
    pub async fn update_user(&self, patch: UserPatch) -> Result<Option<User>> {
        let mut state = self.state.write().await;
        let session = match state.as_mut() {
            Some(session) => session,
            None => return Ok(None),
        };

        let mut user = session.user.clone();
        user.apply(patch);

        let user_data = serde_json::to_string(&user).map_err(crate::store::StoreError::from)?;
        self.store.set(USER_DATA_KEY, &user_data, self.ttl).await?;
        session.user = user.clone();
        Ok(Some(user))
    }

    /// Exchange the current token for a fresh one, keeping the user
    pub async fn refresh(&self, cancel: &CancellationToken) -> Result<Session> {
        let generation = self.generation.load(Ordering::SeqCst);
        if self.state.read().await.is_none() {
            return Err(AuthError::NotLoggedIn);
        }

        let response = self.guarded(cancel, self.api.refresh_token(cancel)).await?;

        let mut state = self.state.write().await;
        if self.generation.load(Ordering::SeqCst) != generation || self.root.is_cancelled() {
            debug!("discarding superseded token refresh");
            return Err(ApiError::Cancelled.into());
        }
        let session = state.as_mut().ok_or(AuthError::NotLoggedIn)?;

        self.store.set(AUTH_TOKEN_KEY, &response.token, self.ttl).await?;
        self.token.set(&response.token_type, &response.token);
        session.token = response.token;
        session.token_type = response.token_type;
        session.expires_at = chrono::Duration::from_std(self.ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl));

        debug!("refreshed token for {}", session.user.email);
        Ok(session.clone())
    }

    /// Cancel every operation still running through this controller.
    ///
    /// The session itself is kept; call [`SessionController::logout`] to drop it.
    pub fn dispose(&self) {
        debug!("disposing session controller");
        self.root.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.root.is_cancelled()
    }

    pub async fn session(&self) -> Option<Session> {
        self.state.read().await.clone()
    }

    pub async fn user(&self) -> Option<User> {
        self.state.read().await.as_ref().map(|s| s.user.clone())
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.as_ref().map(|s| s.token.clone())
    }

    /// Both a user and a token are present
    pub async fn is_authenticated(&self) -> bool {
        self.state
            .read()
            .await
            .as_ref()
            .map_or(false, |s| !s.token.is_empty())
    }

    /// Whether any controller operation is still running
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Write both entries for `session`.
    ///
    /// If the user entry cannot be written, the token entry is put back to
    /// `previous` (or both entries are removed) so the store never pairs one
    /// account's token with another account's user.
    async fn persist(&self, session: &Session, previous: Option<&Session>) -> Result<()> {
        let user_data = serde_json::to_string(&session.user).map_err(crate::store::StoreError::from)?;
        self.store.set(AUTH_TOKEN_KEY, &session.token, self.ttl).await?;

        if let Err(err) = self.store.set(USER_DATA_KEY, &user_data, self.ttl).await {
            warn!("could not persist user, rolling back token: {}", err);
            let restored = match previous {
                Some(previous) => self.store.set(AUTH_TOKEN_KEY, &previous.token, self.ttl).await,
                None => self.store.remove(AUTH_TOKEN_KEY).await,
            };
            if restored.is_err() {
                let _ = self.store.remove(AUTH_TOKEN_KEY).await;
                let _ = self.store.remove(USER_DATA_KEY).await;
            }
            return Err(err.into());
        }
        Ok(())
    }

    /// Run `operation` until it finishes or either the caller's token or
    /// `dispose` cancels it
    async fn guarded<T, F>(&self, cancel: &CancellationToken, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.root.is_cancelled() {
            return Err(ApiError::Cancelled.into());
        }
        let _busy = InFlight::enter(&self.in_flight);

        tokio::select! {
            biased;
            _ = self.root.cancelled() => Err(ApiError::Cancelled.into()),
            _ = cancel.cancelled() => Err(ApiError::Cancelled.into()),
            result = operation => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use greenloop_fetch::ApiClient;

    fn controller() -> (SessionController, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let client = ApiClient::new("http://127.0.0.1:9").unwrap();
        let api = AuthApi::new(client, store.clone());
        (SessionController::new(api), store)
    }

    #[tokio::test]
    async fn test_init_without_persisted_session() {
        let (controller, _) = controller();
        assert!(!controller.init().await.unwrap());
        assert!(!controller.is_authenticated().await);
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn test_token_without_user_is_not_a_session() {
        let (controller, store) = controller();
        store.set(AUTH_TOKEN_KEY, "T", DEFAULT_SESSION_TTL).await.unwrap();

        assert!(!controller.init().await.unwrap());
        assert_eq!(controller.token().await, None);
    }

    #[tokio::test]
    async fn test_update_user_when_logged_out_is_a_noop() {
        let (controller, store) = controller();
        let patch = UserPatch {
            bio: Some("hello".into()),
            ..Default::default()
        };

        assert_eq!(controller.update_user(patch).await.unwrap(), None);
        assert_eq!(store.get(USER_DATA_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_refresh_requires_a_session() {
        let (controller, _) = controller();
        let err = controller.refresh(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, AuthError::NotLoggedIn));
    }

    #[tokio::test]
    async fn test_disposed_controller_refuses_work() {
        let (controller, _) = controller();
        controller.dispose();
        assert!(controller.is_disposed());

        let err = controller
            .verify_email("abc", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(!controller.is_loading());
    }
}
