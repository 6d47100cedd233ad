use std::sync::{Arc, RwLock};

use greenloop_auth::UserId;
use greenloop_fetch::{CancellationToken, Paginated};
use greenloop_items::PageQuery;
use greenloop_marketplace::{
    CreateListingRequest, ListingId, MarketplaceApi, MarketplaceListing, MarketplaceSearchParams,
    UpdateListingRequest,
};

use super::{read, write, RequestState};
use crate::error::Result;

#[derive(Debug, Default)]
struct MarketplaceCache {
    listings: Vec<MarketplaceListing>,
    listing: Option<MarketplaceListing>,
    featured: Vec<MarketplaceListing>,
    favorites: Vec<MarketplaceListing>,
}

/// Marketplace calls with cached listings, featured listings and favorites
#[derive(Clone)]
pub struct MarketplaceState {
    api: MarketplaceApi,
    request: RequestState,
    cache: Arc<RwLock<MarketplaceCache>>,
}

impl MarketplaceState {
    pub fn new(api: MarketplaceApi) -> Self {
        Self {
            api,
            request: RequestState::new(),
            cache: Arc::default(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.request.is_loading()
    }

    pub fn error(&self) -> Option<String> {
        self.request.error()
    }

    pub fn listings(&self) -> Vec<MarketplaceListing> {
        read(&self.cache).listings.clone()
    }

    pub fn listing(&self) -> Option<MarketplaceListing> {
        read(&self.cache).listing.clone()
    }

    pub fn featured(&self) -> Vec<MarketplaceListing> {
        read(&self.cache).featured.clone()
    }

    pub fn favorites(&self) -> Vec<MarketplaceListing> {
        read(&self.cache).favorites.clone()
    }

    pub async fn fetch_listings(
        &self,
        params: &MarketplaceSearchParams,
        cancel: &CancellationToken,
    ) -> Result<Paginated<MarketplaceListing>> {
        let page = self
            .request
            .track(async { Ok(self.api.get_listings(params, cancel).await?) })
            .await?;
        write(&self.cache).listings = page.data.clone();
        Ok(page)
    }

    pub async fn fetch_listing(&self, id: ListingId, cancel: &CancellationToken) -> Result<MarketplaceListing> {
        let listing = self
            .request
            .track(async { Ok(self.api.get_listing(id, cancel).await?) })
            .await?;
        write(&self.cache).listing = Some(listing.clone());
        Ok(listing)
    }

    pub async fn create_listing(
        &self,
        request: &CreateListingRequest,
        cancel: &CancellationToken,
    ) -> Result<MarketplaceListing> {
        let listing = self
            .request
            .track(async { Ok(self.api.create_listing(request, cancel).await?) })
            .await?;
        write(&self.cache).listings.push(listing.clone());
        Ok(listing)
    }

    pub async fn update_listing(
        &self,
        id: ListingId,
        update: &UpdateListingRequest,
        cancel: &CancellationToken,
    ) -> Result<MarketplaceListing> {
        let listing = self
            .request
            .track(async { Ok(self.api.update_listing(id, update, cancel).await?) })
            .await?;

        let mut cache = write(&self.cache);
        for cached in cache.listings.iter_mut().filter(|l| l.listing_id == id) {
            *cached = listing.clone();
        }
        if cache.listing.as_ref().map_or(false, |l| l.listing_id == id) {
            cache.listing = Some(listing.clone());
        }
        Ok(listing)
    }

    pub async fn delete_listing(&self, id: ListingId, cancel: &CancellationToken) -> Result<()> {
        self.request
            .track(async { Ok(self.api.delete_listing(id, cancel).await?) })
            .await?;

        let mut cache = write(&self.cache);
        cache.listings.retain(|l| l.listing_id != id);
        if cache.listing.as_ref().map_or(false, |l| l.listing_id == id) {
            cache.listing = None;
        }
        Ok(())
    }

    pub async fn search_listings(
        &self,
        params: &MarketplaceSearchParams,
        cancel: &CancellationToken,
    ) -> Result<Paginated<MarketplaceListing>> {
        let page = self
            .request
            .track(async { Ok(self.api.search_listings(params, cancel).await?) })
            .await?;
        write(&self.cache).listings = page.data.clone();
        Ok(page)
    }

    pub async fn fetch_featured_listings(
        &self,
        limit: Option<u32>,
        cancel: &CancellationToken,
    ) -> Result<Vec<MarketplaceListing>> {
        let featured = self
            .request
            .track(async { Ok(self.api.get_featured_listings(limit, cancel).await?) })
            .await?;
        write(&self.cache).featured = featured.clone();
        Ok(featured)
    }

    /// Similar listings are returned, not cached
    pub async fn fetch_similar_listings(
        &self,
        id: ListingId,
        limit: Option<u32>,
        cancel: &CancellationToken,
    ) -> Result<Vec<MarketplaceListing>> {
        self.request
            .track(async { Ok(self.api.get_similar_listings(id, limit, cancel).await?) })
            .await
    }

    pub async fn add_to_favorites(&self, id: ListingId, cancel: &CancellationToken) -> Result<()> {
        self.request
            .track(async { Ok(self.api.add_to_favorites(id, cancel).await?) })
            .await
    }

    pub async fn remove_from_favorites(&self, id: ListingId, cancel: &CancellationToken) -> Result<()> {
        self.request
            .track(async { Ok(self.api.remove_from_favorites(id, cancel).await?) })
            .await?;
        write(&self.cache).favorites.retain(|l| l.listing_id != id);
        Ok(())
    }

    pub async fn fetch_favorite_listings(
        &self,
        page: PageQuery,
        cancel: &CancellationToken,
    ) -> Result<Paginated<MarketplaceListing>> {
        let page = self
            .request
            .track(async { Ok(self.api.get_favorite_listings(page, cancel).await?) })
            .await?;
        write(&self.cache).favorites = page.data.clone();
        Ok(page)
    }

    pub async fn fetch_listings_by_seller(
        &self,
        seller: &UserId,
        page: PageQuery,
        cancel: &CancellationToken,
    ) -> Result<Paginated<MarketplaceListing>> {
        let page = self
            .request
            .track(async { Ok(self.api.get_listings_by_seller(seller, page, cancel).await?) })
            .await?;
        write(&self.cache).listings = page.data.clone();
        Ok(page)
    }
}
