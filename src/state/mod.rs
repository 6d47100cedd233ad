//! Tracked state for UI-style consumers
//!
//! Each wrapper pairs a set of API calls with an `is_loading` flag, the last
//! error message and cached results, so a front end can render straight
//! from it. Wrappers are per consumer; create one per screen.

mod auth;
mod items;
mod marketplace;

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use crate::error::Result;

pub use auth::AuthActions;
pub use items::ItemsState;
pub use marketplace::MarketplaceState;

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct Status {
    in_flight: AtomicUsize,
    error: RwLock<Option<String>>,
}

/// Loading flag and last error shared by the calls of one consumer
#[derive(Debug, Clone, Default)]
pub struct RequestState {
    status: Arc<Status>,
}

struct Loading<'a>(&'a AtomicUsize);

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RequestState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a tracked call is running
    pub fn is_loading(&self) -> bool {
        self.status.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Message of the last failed call, cleared when the next one starts
    pub fn error(&self) -> Option<String> {
        read(&self.status.error).clone()
    }

    pub fn clear_error(&self) {
        *write(&self.status.error) = None;
    }

    /// Run `operation` with the loading flag raised.
    ///
    /// The error slot is cleared first and receives the normalized message
    /// if the call fails. Cancellation is not recorded as an error.
    pub async fn track<T, F>(&self, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.status.in_flight.fetch_add(1, Ordering::SeqCst);
        let _loading = Loading(&self.status.in_flight);
        self.clear_error();

        match operation.await {
            Ok(value) => Ok(value),
            Err(err) if err.is_cancelled() => {
                debug!("tracked call cancelled");
                Err(err)
            }
            Err(err) => {
                let message = err.user_message();
                warn!(error = %message, "tracked call failed");
                *write(&self.status.error) = Some(message);
                Err(err)
            }
        }
    }
}
