//! The configured HTTP client shared by every GreenLoop API

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method};
use url::Url;

use crate::error::{ApiError, Result};
use crate::fetch::FetchBuilder;

/// Transport configuration
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Per-request timeout; `None` waits forever
    pub timeout: Option<Duration>,

    /// Value of the `X-Client-Info` header
    pub client_info: String,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            client_info: concat!("greenloop-rust/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct BearerToken {
    token_type: String,
    token: String,
}

/// Shared cell holding the current bearer token.
///
/// The session controller writes it, the transport reads it on every
/// request. Clones share the same cell.
#[derive(Debug, Clone, Default)]
pub struct TokenSlot {
    inner: Arc<RwLock<Option<BearerToken>>>,
}

impl TokenSlot {
    pub fn set(&self, token_type: &str, token: &str) {
        let token_type = match token_type.trim() {
            "" => "Bearer",
            other => other,
        };
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(BearerToken {
            token_type: token_type.to_string(),
            token: token.to_string(),
        });
    }

    pub fn clear(&self) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }

    /// The raw token, without its type prefix
    pub fn token(&self) -> Option<String> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().map(|t| t.token.clone())
    }

    /// The `Authorization` header value, e.g. `Bearer abc.def`
    pub fn header_value(&self) -> Option<String> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .map(|t| format!("{} {}", t.token_type, t.token))
    }

    pub fn is_set(&self) -> bool {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.is_some()
    }
}

/// HTTP client bound to one GreenLoop backend.
///
/// Cloning is cheap: the connection pool and the token slot are shared.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http: Client,
    token: TokenSlot,
}

impl ApiClient {
    /// Create a client with default options and an empty token slot
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_options(base_url, TransportOptions::default(), TokenSlot::default())
    }

    pub fn with_options(base_url: &str, options: TransportOptions, token: TokenSlot) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        // Url::join replaces the last segment unless the path ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut headers = HeaderMap::new();
        let client_info = HeaderValue::from_str(&options.client_info)
            .map_err(|e| ApiError::InvalidRequest(format!("invalid client info header: {}", e)))?;
        headers.insert("X-Client-Info", client_info);

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            base_url,
            http,
            token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn token(&self) -> &TokenSlot {
        &self.token
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// Resolve an endpoint path such as `/api/items/3` against the base URL
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    pub fn request(&self, method: Method, path: &str) -> FetchBuilder<'_> {
        FetchBuilder::new(self, method, path)
    }

    pub fn get(&self, path: &str) -> FetchBuilder<'_> {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> FetchBuilder<'_> {
        self.request(Method::POST, path)
    }

    pub fn put(&self, path: &str) -> FetchBuilder<'_> {
        self.request(Method::PUT, path)
    }

    pub fn delete(&self, path: &str) -> FetchBuilder<'_> {
        self.request(Method::DELETE, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = ApiClient::new("https://api.greenloop.example/v1").unwrap();
        assert_eq!(
            client.endpoint("/api/items/3").unwrap().as_str(),
            "https://api.greenloop.example/v1/api/items/3"
        );

        let client = ApiClient::new("http://localhost:8080").unwrap();
        assert_eq!(
            client.endpoint("api/categories").unwrap().as_str(),
            "http://localhost:8080/api/categories"
        );
    }

    #[test]
    fn test_rejects_unusable_base_url() {
        assert!(matches!(ApiClient::new("not a url"), Err(ApiError::Url(_))));
        assert!(matches!(ApiClient::new("mailto:team@greenloop.example"), Err(ApiError::Url(_))));
    }

    #[test]
    fn test_token_slot_is_shared_between_clones() {
        let slot = TokenSlot::default();
        let client = ApiClient::with_options(
            "http://localhost:8080",
            TransportOptions::default(),
            slot.clone(),
        )
        .unwrap();

        assert!(!client.token().is_set());
        slot.set("", "abc");
        assert_eq!(client.token().header_value().as_deref(), Some("Bearer abc"));
        assert_eq!(client.token().token().as_deref(), Some("abc"));

        client.token().clear();
        assert!(!slot.is_set());
    }
}
