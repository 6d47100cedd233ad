//! Client for the `/api/auth` endpoints

use std::sync::Arc;

use greenloop_fetch::{ApiClient, CancellationToken};
use log::debug;
use serde_json::{json, Map, Value};

use crate::error::Result;
use crate::store::{SessionStore, AUTH_TOKEN_KEY, USER_DATA_KEY};
use crate::types::{LoginField, LoginRequest, LoginResponse, RegisterRequest, UserResponse};

/// Authentication API.
///
/// Stateless apart from [`AuthApi::logout`], which forgets the persisted
/// session entries.
#[derive(Clone)]
pub struct AuthApi {
    client: ApiClient,
    store: Arc<dyn SessionStore>,
    login_field: LoginField,
}

impl AuthApi {
    pub fn new(client: ApiClient, store: Arc<dyn SessionStore>) -> Self {
        Self {
            client,
            store,
            login_field: LoginField::default(),
        }
    }

    /// Send the login identifier under another field name
    pub fn with_login_field(mut self, login_field: LoginField) -> Self {
        self.login_field = login_field;
        self
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn login_field(&self) -> LoginField {
        self.login_field
    }

    /// `POST /api/auth/login`
    pub async fn login(&self, credentials: &LoginRequest, cancel: &CancellationToken) -> Result<LoginResponse> {
        debug!("logging in as {}", credentials.identifier);

        let mut body = Map::new();
        body.insert(
            self.login_field.as_str().to_string(),
            Value::String(credentials.identifier.clone()),
        );
        body.insert("password".to_string(), Value::String(credentials.password.clone()));

        let response = self
            .client
            .post("/api/auth/login")
            .json(&body)?
            .cancel_on(cancel)
            .execute()
            .await?;
        Ok(response)
    }

    /// `POST /api/auth/register`
    pub async fn register(&self, request: &RegisterRequest, cancel: &CancellationToken) -> Result<UserResponse> {
        let user = self
            .client
            .post("/api/auth/register")
            .json(request)?
            .cancel_on(cancel)
            .execute()
            .await?;
        Ok(user)
    }

    /// `GET /api/auth/verify?token=`; returns the backend's message
    pub async fn verify_email(&self, token: &str, cancel: &CancellationToken) -> Result<String> {
        let message = self
            .client
            .get("/api/auth/verify")
            .query_pair("token", token)
            .cancel_on(cancel)
            .execute_message()
            .await?;
        Ok(message)
    }

    /// `POST /api/auth/refresh`, authenticated with the current token
    pub async fn refresh_token(&self, cancel: &CancellationToken) -> Result<LoginResponse> {
        let response = self
            .client
            .post("/api/auth/refresh")
            .cancel_on(cancel)
            .execute()
            .await?;
        Ok(response)
    }

    /// `POST /api/auth/forgot-password`
    pub async fn request_password_reset(&self, email: &str, cancel: &CancellationToken) -> Result<String> {
        let message = self
            .client
            .post("/api/auth/forgot-password")
            .json(&json!({ "email": email }))?
            .cancel_on(cancel)
            .execute_message()
            .await?;
        Ok(message)
    }

    /// `POST /api/auth/reset-password`
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let message = self
            .client
            .post("/api/auth/reset-password")
            .json(&json!({ "token": token, "newPassword": new_password }))?
            .cancel_on(cancel)
            .execute_message()
            .await?;
        Ok(message)
    }

    /// Forget the persisted session. No request is sent.
    pub async fn logout(&self) -> Result<()> {
        self.store.remove(AUTH_TOKEN_KEY).await?;
        self.store.remove(USER_DATA_KEY).await?;
        Ok(())
    }
}
