use greenloop_fetch::ApiError;
use thiserror::Error;

use crate::store::StoreError;

/// Errors from the auth client and the session controller
#[derive(Error, Debug)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Not logged in")]
    NotLoggedIn,
}

impl AuthError {
    /// Message fit for display next to a form. Never empty.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Api(err) => err.user_message(),
            other => other.to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, AuthError::Api(ApiError::Cancelled))
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
