//! Product review endpoints.

use fastbite_core::{NewReview, Page, ProductId, Review};
use reqwest::Method;
use tracing::instrument;

use super::{ApiClient, ApiError};

impl ApiClient {
    /// Published reviews of a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product_reviews(
        &self,
        product_id: &ProductId,
        page: u32,
    ) -> Result<Page<Review>, ApiError> {
        let request = self
            .request(Method::GET, &format!("products/{product_id}/reviews"))
            .await?
            .query(&[("page", page)]);
        let envelope = self.execute::<Vec<Review>>(request).await?;
        let items = envelope.data.unwrap_or_default();
        Ok(match envelope.pagination {
            Some(pagination) => Page { items, pagination },
            None => Page::single(items),
        })
    }

    /// Submit a review. Callers validate with [`NewReview::validate`] first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the review (e.g. the
    /// product was never ordered).
    #[instrument(skip(self, review), fields(product_id = %review.product_id, rating = review.rating))]
    pub async fn create_review(&self, review: &NewReview) -> Result<Review, ApiError> {
        let request = self.request(Method::POST, "reviews").await?.json(review);
        let created: Review = self.execute_data(request, "review").await?;

        // Rating and review count on the product changed.
        self.inner
            .cache
            .invalidate(&format!("product:{}", review.product_id))
            .await;
        Ok(created)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::api::test_client;

    #[tokio::test]
    async fn test_create_review() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/reviews").json_body(json!({
                "productId": "p1",
                "rating": 5,
                "comment": "Gà giòn, nóng hổi"
            }));
            then.status(201).json_body(json!({
                "success": true,
                "data": {"_id": "r1", "product": "p1", "rating": 5, "comment": "Gà giòn, nóng hổi"}
            }));
        });

        let review = test_client(&server)
            .create_review(&NewReview {
                product_id: ProductId::new("p1"),
                order_id: None,
                rating: 5,
                comment: "Gà giòn, nóng hổi".to_string(),
            })
            .await
            .unwrap();
        mock.assert();
        assert_eq!(review.rating, 5);
    }

    #[tokio::test]
    async fn test_get_product_reviews() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/products/p1/reviews");
            then.status(200).json_body(json!({
                "success": true,
                "data": [
                    {"_id": "r1", "product": "p1", "rating": 4, "comment": "Ngon"},
                    {"_id": "r2", "product": "p1", "rating": 2, "comment": "Hơi nguội"}
                ],
                "pagination": {"page": 1, "limit": 10, "total": 2, "totalPages": 1}
            }));
        });

        let page = test_client(&server)
            .get_product_reviews(&ProductId::new("p1"), 1)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(!page.has_next());
    }
}
