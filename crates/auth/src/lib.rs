//! GreenLoop authentication
//!
//! [`AuthApi`] maps the `/api/auth` endpoints one to one. On top of it,
//! [`SessionController`] keeps the logged-in user in memory, mirrors it to a
//! [`SessionStore`] and feeds the bearer token to the shared transport.
//!
//! ```no_run
//! use std::sync::Arc;
//! use greenloop_auth::{AuthApi, LoginRequest, MemoryStore, SessionController};
//! use greenloop_fetch::{ApiClient, CancellationToken};
//!
//! # async fn run() -> Result<(), greenloop_auth::AuthError> {
//! let client = ApiClient::new("http://localhost:8080")?;
//! let api = AuthApi::new(client, Arc::new(MemoryStore::new()));
//! let session = SessionController::new(api);
//!
//! session.init().await?;
//! let cancel = CancellationToken::new();
//! session.login(&LoginRequest::new("ada@example.com", "secret"), &cancel).await?;
//! # Ok(())
//! # }
//! ```

mod api;
mod error;
mod session;
mod store;
mod types;

pub use api::AuthApi;
pub use error::{AuthError, Result};
pub use session::{Session, SessionController, DEFAULT_SESSION_TTL};
pub use store::{FileStore, MemoryStore, SessionStore, StoreError, AUTH_TOKEN_KEY, USER_DATA_KEY};
pub use types::{
    LoginField, LoginRequest, LoginResponse, RegisterRequest, User, UserId, UserPatch, UserResponse,
    UserType, DEFAULT_TRUST_SCORE,
};
