//! Configuration options for the GreenLoop client

use std::env;
use std::time::Duration;

use greenloop_auth::{LoginField, DEFAULT_SESSION_TTL};
use greenloop_fetch::TransportOptions;

use crate::error::Error;

/// Backend used when no URL is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

pub const ENV_API_URL: &str = "GREENLOOP_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "GREENLOOP_TIMEOUT_SECS";
pub const ENV_SESSION_TTL_DAYS: &str = "GREENLOOP_SESSION_TTL_DAYS";
pub const ENV_LOGIN_FIELD: &str = "GREENLOOP_LOGIN_FIELD";

/// Configuration options for the GreenLoop client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL of the backend, e.g. `https://api.greenloop.example`
    pub base_url: String,

    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// How long a persisted session lives
    pub session_ttl: Duration,

    /// Wire name of the login identifier
    pub login_field: LoginField,

    /// Value of the `X-Client-Info` header
    pub client_info: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        let transport = TransportOptions::default();
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            request_timeout: transport.timeout,
            session_ttl: DEFAULT_SESSION_TTL,
            login_field: LoginField::default(),
            client_info: transport.client_info,
        }
    }
}

impl ClientOptions {
    /// Read options from `GREENLOOP_*` environment variables.
    ///
    /// Unset variables keep their defaults; set but unparsable ones are an
    /// error.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();

        if let Some(url) = lookup(ENV_API_URL) {
            options.base_url = url;
        }

        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|_| Error::config(format!("{} must be a number of seconds, got `{}`", ENV_TIMEOUT_SECS, secs)))?;
            // 0 disables the timeout
            options.request_timeout = if secs == 0 { None } else { Some(Duration::from_secs(secs)) };
        }

        if let Some(days) = lookup(ENV_SESSION_TTL_DAYS) {
            let days: u64 = days
                .trim()
                .parse()
                .map_err(|_| Error::config(format!("{} must be a number of days, got `{}`", ENV_SESSION_TTL_DAYS, days)))?;
            options.session_ttl = Duration::from_secs(days.saturating_mul(24 * 60 * 60));
        }

        if let Some(field) = lookup(ENV_LOGIN_FIELD) {
            options.login_field = field.trim().parse().map_err(Error::config)?;
        }

        Ok(options)
    }

    pub fn with_base_url(mut self, value: &str) -> Self {
        self.base_url = value.to_string();
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    pub fn with_session_ttl(mut self, value: Duration) -> Self {
        self.session_ttl = value;
        self
    }

    pub fn with_login_field(mut self, value: LoginField) -> Self {
        self.login_field = value;
        self
    }

    pub fn with_client_info(mut self, value: &str) -> Self {
        self.client_info = value.to_string();
        self
    }

    pub(crate) fn transport(&self) -> TransportOptions {
        TransportOptions {
            timeout: self.request_timeout,
            client_info: self.client_info.clone(),
        }
    }
}
