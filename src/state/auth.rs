use std::sync::Arc;

use greenloop_auth::{AuthApi, LoginRequest, RegisterRequest, Session, SessionController, UserResponse};
use greenloop_fetch::CancellationToken;

use super::RequestState;
use crate::error::Result;

/// Auth calls with loading and error tracking
#[derive(Clone)]
pub struct AuthActions {
    session: Arc<SessionController>,
    request: RequestState,
}

impl AuthActions {
    pub fn new(session: Arc<SessionController>) -> Self {
        Self {
            session,
            request: RequestState::new(),
        }
    }

    fn api(&self) -> &AuthApi {
        self.session.api()
    }

    pub fn is_loading(&self) -> bool {
        self.request.is_loading()
    }

    pub fn error(&self) -> Option<String> {
        self.request.error()
    }

    pub fn session(&self) -> &Arc<SessionController> {
        &self.session
    }

    pub async fn login(&self, credentials: &LoginRequest, cancel: &CancellationToken) -> Result<Session> {
        self.request
            .track(async { Ok(self.session.login(credentials, cancel).await?) })
            .await
    }

    pub async fn register(&self, request: &RegisterRequest, cancel: &CancellationToken) -> Result<UserResponse> {
        self.request
            .track(async { Ok(self.session.register(request, cancel).await?) })
            .await
    }

    /// Not tracked: logging out has nothing to wait for
    pub async fn logout(&self) -> Result<()> {
        self.request.clear_error();
        Ok(self.session.logout().await?)
    }

    pub async fn verify_email(&self, token: &str, cancel: &CancellationToken) -> Result<String> {
        self.request
            .track(async { Ok(self.session.verify_email(token, cancel).await?) })
            .await
    }

    pub async fn request_password_reset(&self, email: &str, cancel: &CancellationToken) -> Result<String> {
        self.request
            .track(async { Ok(self.api().request_password_reset(email, cancel).await?) })
            .await
    }

    pub async fn reset_password(&self, token: &str, new_password: &str, cancel: &CancellationToken) -> Result<String> {
        self.request
            .track(async { Ok(self.api().reset_password(token, new_password, cancel).await?) })
            .await
    }
}
