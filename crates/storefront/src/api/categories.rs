//! Menu category endpoints.

use fastbite_core::Category;
use reqwest::Method;
use tracing::instrument;

use super::cache::CacheValue;
use super::{ApiClient, ApiError};

impl ApiClient {
    /// All active categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_categories(&self) -> Result<Vec<Category>, ApiError> {
        let cache_key = "categories".to_string();
        if let Some(CacheValue::Categories(categories)) = self.cached(&cache_key).await {
            return Ok(categories);
        }

        let request = self.request(Method::GET, "categories").await?;
        let categories: Vec<Category> = self
            .execute::<Vec<Category>>(request)
            .await?
            .data
            .unwrap_or_default();

        self.store(cache_key, CacheValue::Categories(categories.clone()))
            .await;
        Ok(categories)
    }
}
