//! GreenLoop Rust Client Library
//!
//! A Rust client for the GreenLoop sustainable fashion marketplace API,
//! providing authentication with a persisted session, items, categories,
//! brands, marketplace listings and user profiles.
//!
//! ```no_run
//! use greenloop::prelude::*;
//!
//! # async fn run() -> Result<(), Error> {
//! let greenloop = GreenLoop::new("http://localhost:8080")?;
//! greenloop.init().await?;
//!
//! let cancel = CancellationToken::new();
//! greenloop
//!     .session()
//!     .login(&LoginRequest::new("ada@example.com", "secret"), &cancel)
//!     .await?;
//!
//! let featured = greenloop.marketplace().get_featured_listings(None, &cancel).await?;
//! println!("{} featured listings", featured.len());
//!
//! greenloop.dispose();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod state;

use std::sync::Arc;

use greenloop_auth::{AuthApi, MemoryStore, SessionController, SessionStore};
use greenloop_fetch::{ApiClient, TokenSlot};
use greenloop_items::{BrandsApi, CategoriesApi, ItemsApi};
use greenloop_marketplace::MarketplaceApi;
use greenloop_users::UsersApi;
use tracing::info;

use crate::config::ClientOptions;
use crate::error::Result;
use crate::state::{AuthActions, ItemsState, MarketplaceState};

pub use greenloop_auth as auth;
pub use greenloop_fetch as fetch;
pub use greenloop_items as items;
pub use greenloop_marketplace as marketplace;
pub use greenloop_users as users;

/// The main entry point for the GreenLoop client.
///
/// Every domain client shares one connection pool and one token slot, so
/// logging in through [`GreenLoop::session`] authenticates all of them.
pub struct GreenLoop {
    client: ApiClient,
    session: Arc<SessionController>,
    items: ItemsApi,
    categories: CategoriesApi,
    brands: BrandsApi,
    marketplace: MarketplaceApi,
    users: UsersApi,
    options: ClientOptions,
}

impl GreenLoop {
    /// Create a client for `base_url` with default options and an
    /// in-memory session store
    pub fn new(base_url: &str) -> Result<Self> {
        Self::new_with_options(
            ClientOptions::default().with_base_url(base_url),
            Arc::new(MemoryStore::new()),
        )
    }

    /// Create a client with custom options, persisting the session in `store`
    pub fn new_with_options(options: ClientOptions, store: Arc<dyn SessionStore>) -> Result<Self> {
        let client = ApiClient::with_options(&options.base_url, options.transport(), TokenSlot::default())?;

        let auth = AuthApi::new(client.clone(), store).with_login_field(options.login_field);
        let session = SessionController::new(auth).with_ttl(options.session_ttl);

        info!(base_url = %client.base_url(), "GreenLoop client created");

        Ok(Self {
            session: Arc::new(session),
            items: ItemsApi::new(client.clone()),
            categories: CategoriesApi::new(client.clone()),
            brands: BrandsApi::new(client.clone()),
            marketplace: MarketplaceApi::new(client.clone()),
            users: UsersApi::new(client.clone()),
            client,
            options,
        })
    }

    /// Create a client configured from `GREENLOOP_*` environment variables
    pub fn from_env(store: Arc<dyn SessionStore>) -> Result<Self> {
        Self::new_with_options(ClientOptions::from_env()?, store)
    }

    /// Restore a persisted session; returns whether one was found
    pub async fn init(&self) -> Result<bool> {
        Ok(self.session.init().await?)
    }

    /// Cancel everything still running through the session controller
    pub fn dispose(&self) {
        self.session.dispose();
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn session(&self) -> &Arc<SessionController> {
        &self.session
    }

    pub fn auth(&self) -> &AuthApi {
        self.session.api()
    }

    pub fn items(&self) -> &ItemsApi {
        &self.items
    }

    pub fn categories(&self) -> &CategoriesApi {
        &self.categories
    }

    pub fn brands(&self) -> &BrandsApi {
        &self.brands
    }

    pub fn marketplace(&self) -> &MarketplaceApi {
        &self.marketplace
    }

    pub fn users(&self) -> &UsersApi {
        &self.users
    }

    /// Fresh tracked auth actions over the shared session
    pub fn auth_actions(&self) -> AuthActions {
        AuthActions::new(self.session.clone())
    }

    /// Fresh tracked items state with empty caches
    pub fn items_state(&self) -> ItemsState {
        ItemsState::new(self.items.clone(), self.categories.clone(), self.brands.clone())
    }

    /// Fresh tracked marketplace state with empty caches
    pub fn marketplace_state(&self) -> MarketplaceState {
        MarketplaceState::new(self.marketplace.clone())
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::config::ClientOptions;
    pub use crate::error::Error;
    pub use crate::state::{AuthActions, ItemsState, MarketplaceState, RequestState};
    pub use crate::GreenLoop;
    pub use greenloop_auth::{
        FileStore, LoginField, LoginRequest, MemoryStore, RegisterRequest, Session, SessionStore,
        User, UserId, UserPatch, UserType,
    };
    pub use greenloop_fetch::{handle_api_error, ApiError, CancellationToken, Paginated, UploadFile};
}
