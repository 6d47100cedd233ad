//! Category and brand lookups

use greenloop_fetch::{ApiClient, CancellationToken, Result};

use crate::types::{Brand, BrandId, Category, CategoryId};

#[derive(Debug, Clone)]
pub struct CategoriesApi {
    client: ApiClient,
}

impl CategoriesApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn get_categories(&self, cancel: &CancellationToken) -> Result<Vec<Category>> {
        self.client.get("/api/categories").cancel_on(cancel).execute().await
    }

    pub async fn get_category(&self, id: CategoryId, cancel: &CancellationToken) -> Result<Category> {
        self.client
            .get(&format!("/api/categories/{}", id))
            .cancel_on(cancel)
            .execute()
            .await
    }
}

#[derive(Debug, Clone)]
pub struct BrandsApi {
    client: ApiClient,
}

impl BrandsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn get_brands(&self, cancel: &CancellationToken) -> Result<Vec<Brand>> {
        self.client.get("/api/brands").cancel_on(cancel).execute().await
    }

    pub async fn get_brand(&self, id: BrandId, cancel: &CancellationToken) -> Result<Brand> {
        self.client
            .get(&format!("/api/brands/{}", id))
            .cancel_on(cancel)
            .execute()
            .await
    }
}
