//! Request building and envelope decoding

use log::debug;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::client::ApiClient;
use crate::envelope::Envelope;
use crate::error::{ApiError, Result};
use crate::query::encode_query;

/// Returned by [`FetchBuilder::execute_message`] when the backend sent no text
pub const SUCCESS_MESSAGE: &str = "Request completed successfully";

/// A file sent as one part of a multipart upload
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.to_string(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }
}

enum Body {
    Json(Vec<u8>),
    Multipart { field: String, files: Vec<UploadFile> },
}

/// Helper for building and executing one API request
pub struct FetchBuilder<'a> {
    client: &'a ApiClient,
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Body>,
    cancel: Option<CancellationToken>,
}

impl<'a> FetchBuilder<'a> {
    pub(crate) fn new(client: &'a ApiClient, method: Method, path: &str) -> Self {
        Self {
            client,
            method,
            path: path.to_string(),
            query: Vec::new(),
            body: None,
            cancel: None,
        }
    }

    /// Append query parameters flattened from `params`
    pub fn query<T: Serialize + ?Sized>(mut self, params: &T) -> Result<Self> {
        self.query.extend(encode_query(params)?);
        Ok(self)
    }

    pub fn query_pair(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Add a JSON body to the request
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = Some(Body::Json(serde_json::to_vec(body)?));
        Ok(self)
    }

    /// Send `files` as a multipart form, each under the same `field` name
    pub fn multipart(mut self, field: &str, files: Vec<UploadFile>) -> Self {
        self.body = Some(Body::Multipart {
            field: field.to_string(),
            files,
        });
        self
    }

    /// Abort the request as soon as `token` is cancelled
    pub fn cancel_on(mut self, token: &CancellationToken) -> Self {
        self.cancel = Some(token.clone());
        self
    }

    async fn send(self) -> Result<(StatusCode, String)> {
        let url = self.client.endpoint(&self.path)?;
        debug!("{} {}", self.method, url);

        let mut req = self.client.http().request(self.method, url);

        if !self.query.is_empty() {
            req = req.query(&self.query);
        }

        if let Some(auth) = self.client.token().header_value() {
            req = req.header(AUTHORIZATION, auth);
        }

        req = match self.body {
            Some(Body::Json(bytes)) => req.header(CONTENT_TYPE, "application/json").body(bytes),
            Some(Body::Multipart { field, files }) => req.multipart(build_form(&field, files)?),
            None => req,
        };

        let exchange = async move {
            let response = req.send().await?;
            let status = response.status();
            let text = response.text().await?;
            Ok::<_, ApiError>((status, text))
        };

        match self.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(ApiError::Cancelled),
                    result = exchange => result,
                }
            }
            None => exchange.await,
        }
    }

    /// Execute the request and unwrap the envelope's `data`
    pub async fn execute<T: DeserializeOwned>(self) -> Result<T> {
        let (status, body) = self.send().await?;
        decode_envelope::<T>(status, &body)?.into_data(status.as_u16())
    }

    /// Execute a request whose successful envelope carries no payload
    pub async fn execute_empty(self) -> Result<()> {
        let (status, body) = self.send().await?;
        if status == StatusCode::NO_CONTENT && body.trim().is_empty() {
            return Ok(());
        }
        decode_envelope::<IgnoredAny>(status, &body)?.into_result(status.as_u16())?;
        Ok(())
    }

    /// Execute a request answered with a human-readable message.
    ///
    /// The message is taken from `data` when it is a string, otherwise from
    /// the envelope's `message`, otherwise [`SUCCESS_MESSAGE`]. Never empty.
    pub async fn execute_message(self) -> Result<String> {
        let (status, body) = self.send().await?;
        let envelope = decode_envelope::<Value>(status, &body)?;
        let message = envelope.message.clone();
        let text = match envelope.into_result(status.as_u16())? {
            Some(Value::String(text)) if !text.trim().is_empty() => Some(text),
            _ => message.filter(|m| !m.trim().is_empty()),
        };
        Ok(text.unwrap_or_else(|| SUCCESS_MESSAGE.to_string()))
    }
}

fn build_form(field: &str, files: Vec<UploadFile>) -> Result<Form> {
    let mut form = Form::new();
    for file in files {
        let mut part = Part::bytes(file.bytes).file_name(file.file_name);
        if let Some(content_type) = file.content_type {
            part = part.mime_str(&content_type)?;
        }
        form = form.part(field.to_string(), part);
    }
    Ok(form)
}

/// Decode a response body under the envelope contract.
///
/// Non-2xx statuses become [`ApiError::Rejected`] when the body is a failed
/// envelope and [`ApiError::Http`] otherwise. A 2xx body that is not an
/// envelope is [`ApiError::Malformed`].
pub(crate) fn decode_envelope<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<Envelope<T>> {
    if !status.is_success() {
        return Err(failure_from_body(status, body));
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| ApiError::Malformed(format!("response body is not JSON: {}", e)))?;

    if !value.get("success").map_or(false, Value::is_boolean) {
        return Err(ApiError::Malformed(
            "response body is not a {success, data, message} envelope".to_string(),
        ));
    }

    Ok(serde_json::from_value(value)?)
}

fn failure_from_body(status: StatusCode, body: &str) -> ApiError {
    let code = status.as_u16();
    debug!("request failed with status {}: {}", code, body);

    let payload = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map,
        _ => {
            return ApiError::Http {
                status: code,
                message: String::new(),
            }
        }
    };

    let message = payload
        .get("message")
        .or_else(|| payload.get("error"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if payload.get("success").and_then(Value::as_bool) == Some(false) {
        ApiError::Rejected {
            status: code,
            message,
            errors: payload.get("errors").cloned(),
        }
    } else {
        ApiError::Http {
            status: code,
            message,
        }
    }
}
