//! Response envelope used by every GreenLoop endpoint

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, Result};

/// `{success, message, data, errors, timestamp}` wrapper around a payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl<T> Envelope<T> {
    /// Check the business outcome and hand back the (possibly absent) payload.
    pub fn into_result(self, status: u16) -> Result<Option<T>> {
        if self.success {
            Ok(self.data)
        } else {
            Err(ApiError::Rejected {
                status,
                message: self.message.unwrap_or_default(),
                errors: self.errors,
            })
        }
    }

    /// Like [`Envelope::into_result`], but a successful envelope must carry data.
    pub fn into_data(self, status: u16) -> Result<T> {
        self.into_result(status)?
            .ok_or_else(|| ApiError::Malformed("successful envelope carried no data".to_string()))
    }
}

/// One page of a listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl<T> Paginated<T> {
    pub fn is_last_page(&self) -> bool {
        self.page >= self.total_pages
    }
}
