//! Error handling for the GreenLoop client

use std::fmt;

use greenloop_auth::{AuthError, StoreError};
use greenloop_fetch::ApiError;
use thiserror::Error;

/// Unified error type for the GreenLoop client
#[derive(Error, Debug)]
pub enum Error {
    /// A failed API call
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Session store failures
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Not logged in")]
    NotLoggedIn,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// The message shown to a user. Never empty.
    pub fn user_message(&self) -> String {
        match self {
            Error::Api(err) => err.user_message(),
            other => other.to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Api(ApiError::Cancelled))
    }
}

impl From<AuthError> for Error {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Api(err) => Error::Api(err),
            AuthError::Store(err) => Error::Store(err),
            AuthError::NotLoggedIn => Error::NotLoggedIn,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
