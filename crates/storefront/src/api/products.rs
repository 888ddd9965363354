//! Catalog product endpoints.

use fastbite_core::{CategoryId, Page, Product, ProductId};
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use super::cache::CacheValue;
use super::{ApiClient, ApiError};

/// Sort orders accepted by `GET /products`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Rating,
    Name,
}

/// Filters for the product listing.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_vegetarian: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<ProductSort>,
}

impl ProductQuery {
    /// Deterministic cache key for this query.
    fn cache_key(&self) -> String {
        format!(
            "products:{}:{}:{}:{}:{:?}:{:?}",
            self.page.unwrap_or(1),
            self.limit.unwrap_or(0),
            self.category.as_ref().map_or("", |c| c.as_str()),
            self.search.as_deref().unwrap_or(""),
            self.is_vegetarian,
            self.sort,
        )
    }
}

impl ApiClient {
    /// List products, one page at a time.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_products(&self, query: &ProductQuery) -> Result<Page<Product>, ApiError> {
        let cache_key = query.cache_key();
        if let Some(CacheValue::Products(page)) = self.cached(&cache_key).await {
            return Ok(page);
        }

        let request = self.request(Method::GET, "products").await?.query(query);
        let envelope = self.execute::<Vec<Product>>(request).await?;
        let items = envelope.data.unwrap_or_default();
        let page = match envelope.pagination {
            Some(pagination) => Page { items, pagination },
            None => Page::single(items),
        };

        self.store(cache_key, CacheValue::Products(page.clone()))
            .await;
        Ok(page)
    }

    /// Fetch one product by ID.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let cache_key = format!("product:{id}");
        if let Some(CacheValue::Product(product)) = self.cached(&cache_key).await {
            return Ok(*product);
        }

        let request = self.request(Method::GET, &format!("products/{id}")).await?;
        let product: Product = self.execute_data(request, "product").await?;

        self.store(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// Featured products for the home page.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_featured_products(&self) -> Result<Vec<Product>, ApiError> {
        let cache_key = "products:featured".to_string();
        if let Some(CacheValue::Products(page)) = self.cached(&cache_key).await {
            return Ok(page.items);
        }

        let request = self.request(Method::GET, "products/featured").await?;
        let products: Vec<Product> = self
            .execute::<Vec<Product>>(request)
            .await?
            .data
            .unwrap_or_default();

        self.store(
            cache_key,
            CacheValue::Products(Page::single(products.clone())),
        )
        .await;
        Ok(products)
    }
}
