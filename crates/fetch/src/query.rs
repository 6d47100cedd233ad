//! Query string encoding for listing and search parameters

use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, Result};

/// Flatten a parameter struct into query pairs.
///
/// `None` fields are dropped and sequences repeat their key, so
/// `listingType: [SALE, SWAP]` becomes `listingType=SALE&listingType=SWAP`.
pub fn encode_query<T: Serialize + ?Sized>(params: &T) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();

    match serde_json::to_value(params)? {
        Value::Null => {}
        Value::Object(map) => {
            for (key, value) in map {
                match value {
                    Value::Array(values) => {
                        for value in values {
                            if let Some(value) = scalar(&key, value)? {
                                pairs.push((key.clone(), value));
                            }
                        }
                    }
                    value => {
                        if let Some(value) = scalar(&key, value)? {
                            pairs.push((key, value));
                        }
                    }
                }
            }
        }
        other => {
            return Err(ApiError::InvalidRequest(format!(
                "query parameters must be a struct or map, got {}",
                other
            )))
        }
    }

    Ok(pairs)
}

fn scalar(key: &str, value: Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::String(s) => Ok(Some(s)),
        Value::Array(_) | Value::Object(_) => Err(ApiError::InvalidRequest(format!(
            "query parameter `{}` is nested too deeply",
            key
        ))),
    }
}
