//! GreenLoop items client
//!
//! Wraps `/api/items`, `/api/categories` and `/api/brands`.

mod catalog;
mod types;

use greenloop_auth::UserId;
use greenloop_fetch::{ApiClient, CancellationToken, Paginated, Result, UploadFile};
use log::debug;

pub use catalog::{BrandsApi, CategoriesApi};
pub use types::{
    Brand, BrandId, Category, CategoryId, CreateItemRequest, Item, ItemId, ItemQuery, ItemStatus,
    PageQuery, UpdateItemRequest,
};

/// Multipart field the backend reads item images from
pub const IMAGES_FIELD: &str = "images";

#[derive(Debug, Clone)]
pub struct ItemsApi {
    client: ApiClient,
}

impl ItemsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// `GET /api/items`
    pub async fn get_items(&self, query: &ItemQuery, cancel: &CancellationToken) -> Result<Paginated<Item>> {
        self.client
            .get("/api/items")
            .query(query)?
            .cancel_on(cancel)
            .execute()
            .await
    }

    pub async fn get_item(&self, id: ItemId, cancel: &CancellationToken) -> Result<Item> {
        self.client
            .get(&format!("/api/items/{}", id))
            .cancel_on(cancel)
            .execute()
            .await
    }

    pub async fn create_item(&self, item: &CreateItemRequest, cancel: &CancellationToken) -> Result<Item> {
        debug!("creating item {}", item.name);
        self.client
            .post("/api/items")
            .json(item)?
            .cancel_on(cancel)
            .execute()
            .await
    }

    pub async fn update_item(
        &self,
        id: ItemId,
        update: &UpdateItemRequest,
        cancel: &CancellationToken,
    ) -> Result<Item> {
        self.client
            .put(&format!("/api/items/{}", id))
            .json(update)?
            .cancel_on(cancel)
            .execute()
            .await
    }

    pub async fn delete_item(&self, id: ItemId, cancel: &CancellationToken) -> Result<()> {
        self.client
            .delete(&format!("/api/items/{}", id))
            .cancel_on(cancel)
            .execute_empty()
            .await
    }

    /// `GET /api/items/owner/{id}`
    pub async fn get_items_by_owner(
        &self,
        owner: &UserId,
        page: PageQuery,
        cancel: &CancellationToken,
    ) -> Result<Paginated<Item>> {
        self.client
            .get(&format!("/api/items/owner/{}", owner))
            .query(&page)?
            .cancel_on(cancel)
            .execute()
            .await
    }

    /// Upload images for an item; returns the stored image URLs
    pub async fn upload_images(
        &self,
        id: ItemId,
        files: Vec<UploadFile>,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        debug!("uploading {} image(s) for item {}", files.len(), id);
        self.client
            .post(&format!("/api/items/{}/images", id))
            .multipart(IMAGES_FIELD, files)
            .cancel_on(cancel)
            .execute()
            .await
    }
}
