use std::sync::{Arc, RwLock};

use greenloop_auth::UserId;
use greenloop_fetch::{CancellationToken, Paginated, UploadFile};
use greenloop_items::{
    Brand, BrandsApi, CategoriesApi, Category, CreateItemRequest, Item, ItemId, ItemQuery, ItemsApi,
    PageQuery, UpdateItemRequest,
};

use super::{read, write, RequestState};
use crate::error::Result;

#[derive(Debug, Default)]
struct ItemsCache {
    items: Vec<Item>,
    item: Option<Item>,
    categories: Vec<Category>,
    brands: Vec<Brand>,
}

/// Items, categories and brands with cached results.
///
/// Fetching a list replaces `items`; creating appends, updating replaces in
/// place, deleting removes. The selected `item` follows updates and deletes.
#[derive(Clone)]
pub struct ItemsState {
    items_api: ItemsApi,
    categories_api: CategoriesApi,
    brands_api: BrandsApi,
    request: RequestState,
    cache: Arc<RwLock<ItemsCache>>,
}

impl ItemsState {
    pub fn new(items_api: ItemsApi, categories_api: CategoriesApi, brands_api: BrandsApi) -> Self {
        Self {
            items_api,
            categories_api,
            brands_api,
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

    pub fn items(&self) -> Vec<Item> {
        read(&self.cache).items.clone()
    }

    pub fn item(&self) -> Option<Item> {
        read(&self.cache).item.clone()
    }

    pub fn categories(&self) -> Vec<Category> {
        read(&self.cache).categories.clone()
    }

    pub fn brands(&self) -> Vec<Brand> {
        read(&self.cache).brands.clone()
    }

    pub async fn fetch_items(&self, query: &ItemQuery, cancel: &CancellationToken) -> Result<Paginated<Item>> {
        let page = self
            .request
            .track(async { Ok(self.items_api.get_items(query, cancel).await?) })
            .await?;
        write(&self.cache).items = page.data.clone();
        Ok(page)
    }

    pub async fn fetch_item(&self, id: ItemId, cancel: &CancellationToken) -> Result<Item> {
        let item = self
            .request
            .track(async { Ok(self.items_api.get_item(id, cancel).await?) })
            .await?;
        write(&self.cache).item = Some(item.clone());
        Ok(item)
    }

    pub async fn create_item(&self, request: &CreateItemRequest, cancel: &CancellationToken) -> Result<Item> {
        let item = self
            .request
            .track(async { Ok(self.items_api.create_item(request, cancel).await?) })
            .await?;
        write(&self.cache).items.push(item.clone());
        Ok(item)
    }

    pub async fn update_item(
        &self,
        id: ItemId,
        update: &UpdateItemRequest,
        cancel: &CancellationToken,
    ) -> Result<Item> {
        let item = self
            .request
            .track(async { Ok(self.items_api.update_item(id, update, cancel).await?) })
            .await?;

        let mut cache = write(&self.cache);
        for cached in cache.items.iter_mut().filter(|i| i.item_id == id) {
            *cached = item.clone();
        }
        if cache.item.as_ref().map_or(false, |i| i.item_id == id) {
            cache.item = Some(item.clone());
        }
        Ok(item)
    }

    pub async fn delete_item(&self, id: ItemId, cancel: &CancellationToken) -> Result<()> {
        self.request
            .track(async { Ok(self.items_api.delete_item(id, cancel).await?) })
            .await?;

        let mut cache = write(&self.cache);
        cache.items.retain(|i| i.item_id != id);
        if cache.item.as_ref().map_or(false, |i| i.item_id == id) {
            cache.item = None;
        }
        Ok(())
    }

    pub async fn fetch_items_by_owner(
        &self,
        owner: &UserId,
        page: PageQuery,
        cancel: &CancellationToken,
    ) -> Result<Paginated<Item>> {
        let page = self
            .request
            .track(async { Ok(self.items_api.get_items_by_owner(owner, page, cancel).await?) })
            .await?;
        write(&self.cache).items = page.data.clone();
        Ok(page)
    }

    /// Upload images; the cache is left alone until the item is fetched again
    pub async fn upload_images(
        &self,
        id: ItemId,
        files: Vec<UploadFile>,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        self.request
            .track(async move { Ok(self.items_api.upload_images(id, files, cancel).await?) })
            .await
    }

    pub async fn fetch_categories(&self, cancel: &CancellationToken) -> Result<Vec<Category>> {
        let categories = self
            .request
            .track(async { Ok(self.categories_api.get_categories(cancel).await?) })
            .await?;
        write(&self.cache).categories = categories.clone();
        Ok(categories)
    }

    pub async fn fetch_brands(&self, cancel: &CancellationToken) -> Result<Vec<Brand>> {
        let brands = self
            .request
            .track(async { Ok(self.brands_api.get_brands(cancel).await?) })
            .await?;
        write(&self.cache).brands = brands.clone();
        Ok(brands)
    }
}
