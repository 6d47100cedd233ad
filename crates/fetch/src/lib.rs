//! GreenLoop HTTP transport
//!
//! This crate holds the pieces every GreenLoop domain client shares: the
//! configured [`ApiClient`] that attaches the base URL and bearer token,
//! the [`Envelope`] contract the backend wraps its bodies in, and the
//! [`ApiError`] normalizer that turns any failure into one message fit for
//! display.

mod client;
mod envelope;
mod error;
mod fetch;
mod query;

pub use client::{ApiClient, TokenSlot, TransportOptions};
pub use envelope::{Envelope, Paginated};
pub use error::{handle_api_error, ApiError, Result, FALLBACK_MESSAGE};
pub use fetch::{FetchBuilder, UploadFile, SUCCESS_MESSAGE};
pub use query::encode_query;
pub use tokio_util::sync::CancellationToken;
