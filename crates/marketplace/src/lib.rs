//! GreenLoop marketplace client
//!
//! Listings, search, featured and similar listings, and favorites, all
//! under `/api/marketplace`.

mod types;

use greenloop_auth::UserId;
use greenloop_fetch::{ApiClient, CancellationToken, Paginated, Result};
use greenloop_items::PageQuery;
use log::debug;

pub use types::{
    CreateListingRequest, ListingId, ListingStatus, ListingType, MarketplaceListing,
    MarketplaceSearchParams, SortBy, SortOrder, UpdateListingRequest,
};

/// Number of featured listings fetched when the caller has no preference
pub const DEFAULT_FEATURED_LIMIT: u32 = 10;

/// Number of similar listings fetched when the caller has no preference
pub const DEFAULT_SIMILAR_LIMIT: u32 = 5;

#[derive(Debug, Clone)]
pub struct MarketplaceApi {
    client: ApiClient,
}

impl MarketplaceApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// `GET /api/marketplace/listings`
    pub async fn get_listings(
        &self,
        params: &MarketplaceSearchParams,
        cancel: &CancellationToken,
    ) -> Result<Paginated<MarketplaceListing>> {
        self.client
            .get("/api/marketplace/listings")
            .query(params)?
            .cancel_on(cancel)
            .execute()
            .await
    }

    pub async fn get_listing(&self, id: ListingId, cancel: &CancellationToken) -> Result<MarketplaceListing> {
        self.client
            .get(&format!("/api/marketplace/listings/{}", id))
            .cancel_on(cancel)
            .execute()
            .await
    }

    pub async fn create_listing(
        &self,
        listing: &CreateListingRequest,
        cancel: &CancellationToken,
    ) -> Result<MarketplaceListing> {
        debug!("listing item {} as {:?}", listing.item_id, listing.listing_type);
        self.client
            .post("/api/marketplace/listings")
            .json(listing)?
            .cancel_on(cancel)
            .execute()
            .await
    }

    pub async fn update_listing(
        &self,
        id: ListingId,
        update: &UpdateListingRequest,
        cancel: &CancellationToken,
    ) -> Result<MarketplaceListing> {
        self.client
            .put(&format!("/api/marketplace/listings/{}", id))
            .json(update)?
            .cancel_on(cancel)
            .execute()
            .await
    }

    pub async fn delete_listing(&self, id: ListingId, cancel: &CancellationToken) -> Result<()> {
        self.client
            .delete(&format!("/api/marketplace/listings/{}", id))
            .cancel_on(cancel)
            .execute_empty()
            .await
    }

    /// `GET /api/marketplace/listings/seller/{id}`
    pub async fn get_listings_by_seller(
        &self,
        seller: &UserId,
        page: PageQuery,
        cancel: &CancellationToken,
    ) -> Result<Paginated<MarketplaceListing>> {
        self.client
            .get(&format!("/api/marketplace/listings/seller/{}", seller))
            .query(&page)?
            .cancel_on(cancel)
            .execute()
            .await
    }

    /// `GET /api/marketplace/search`
    pub async fn search_listings(
        &self,
        params: &MarketplaceSearchParams,
        cancel: &CancellationToken,
    ) -> Result<Paginated<MarketplaceListing>> {
        self.client
            .get("/api/marketplace/search")
            .query(params)?
            .cancel_on(cancel)
            .execute()
            .await
    }

    /// Featured listings; `None` asks for [`DEFAULT_FEATURED_LIMIT`]
    pub async fn get_featured_listings(
        &self,
        limit: Option<u32>,
        cancel: &CancellationToken,
    ) -> Result<Vec<MarketplaceListing>> {
        self.client
            .get("/api/marketplace/featured")
            .query_pair("limit", limit.unwrap_or(DEFAULT_FEATURED_LIMIT))
            .cancel_on(cancel)
            .execute()
            .await
    }

    /// Listings similar to `id`; `None` asks for [`DEFAULT_SIMILAR_LIMIT`]
    pub async fn get_similar_listings(
        &self,
        id: ListingId,
        limit: Option<u32>,
        cancel: &CancellationToken,
    ) -> Result<Vec<MarketplaceListing>> {
        self.client
            .get(&format!("/api/marketplace/listings/{}/similar", id))
            .query_pair("limit", limit.unwrap_or(DEFAULT_SIMILAR_LIMIT))
            .cancel_on(cancel)
            .execute()
            .await
    }

    pub async fn add_to_favorites(&self, id: ListingId, cancel: &CancellationToken) -> Result<()> {
        self.client
            .post(&format!("/api/marketplace/listings/{}/favorite", id))
            .cancel_on(cancel)
            .execute_empty()
            .await
    }

    pub async fn remove_from_favorites(&self, id: ListingId, cancel: &CancellationToken) -> Result<()> {
        self.client
            .delete(&format!("/api/marketplace/listings/{}/favorite", id))
            .cancel_on(cancel)
            .execute_empty()
            .await
    }

    /// The current user's favorites
    pub async fn get_favorite_listings(
        &self,
        page: PageQuery,
        cancel: &CancellationToken,
    ) -> Result<Paginated<MarketplaceListing>> {
        self.client
            .get("/api/marketplace/favorites")
            .query(&page)?
            .cancel_on(cancel)
            .execute()
            .await
    }
}
