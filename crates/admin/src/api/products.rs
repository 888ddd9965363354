//! Product management endpoints.

use fastbite_core::{Page, Product, ProductId};
use reqwest::Method;
use tracing::instrument;

use super::{AdminApiError, AdminClient, multipart_form};
use crate::forms::ProductPayload;

impl AdminClient {
    /// One page of products, inactive ones included.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        page: u32,
        limit: u32,
        search: Option<&str>,
    ) -> Result<Page<Product>, AdminApiError> {
        let mut request = self
            .request(Method::GET, "products")?
            .query(&[("page", page), ("limit", limit)])
            .query(&[("includeInactive", "true")]);
        if let Some(search) = search.filter(|s| !s.trim().is_empty()) {
            request = request.query(&[("search", search.trim())]);
        }
        self.execute_page(request).await
    }

    /// # Errors
    ///
    /// Returns `AdminApiError::NotFound` if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, AdminApiError> {
        let request = self.request(Method::GET, &format!("products/{id}"))?;
        self.execute_data(request, "product").await
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the product.
    #[instrument(skip(self, payload), fields(name = %payload.name))]
    pub async fn create_product(&self, payload: &ProductPayload) -> Result<Product, AdminApiError> {
        let form = multipart_form(payload.fields(), payload.image.as_ref())?;
        let request = self.request(Method::POST, "products")?.multipart(form);
        self.execute_data(request, "product").await
    }

    /// Update a product; the image is replaced only when one is attached.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    #[instrument(skip(self, payload), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: &ProductId,
        payload: &ProductPayload,
    ) -> Result<Product, AdminApiError> {
        let form = multipart_form(payload.fields(), payload.image.as_ref())?;
        let request = self
            .request(Method::PUT, &format!("products/{id}"))?
            .multipart(form);
        self.execute_data(request, "product").await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), AdminApiError> {
        let request = self.request(Method::DELETE, &format!("products/{id}"))?;
        self.execute_unit(request).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::api::test_client;
    use crate::forms::{FormMode, ProductForm, Upload};
    use fastbite_core::CurrencyCode;

    #[tokio::test]
    async fn test_list_products_sends_admin_token() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/products")
                .query_param("page", "2")
                .query_param("includeInactive", "true")
                .query_param("search", "gà")
                .header("authorization", "Bearer admin-test-token");
            then.status(200).json_body(json!({
                "success": true,
                "data": [{"_id": "p1", "name": "Gà rán", "price": 35000, "category": "c1", "isActive": false}],
                "pagination": {"page": 2, "limit": 10, "total": 11, "totalPages": 2}
            }));
        });

        let page = test_client(&server)
            .list_products(2, 10, Some(" gà "))
            .await
            .unwrap();
        mock.assert();
        assert_eq!(page.items.len(), 1);
        assert!(!page.items[0].is_active);
        assert!(page.has_previous());
    }

    #[tokio::test]
    async fn test_create_product_is_multipart_with_image() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/products")
                .header_exists("content-type")
                .body_includes("name=\"name\"")
                .body_includes("Burger gà")
                .body_includes("filename=\"burger.jpg\"")
                .body_includes("image/jpeg");
            then.status(201).json_body(json!({
                "success": true,
                "data": {"_id": "p9", "name": "Burger gà", "price": 39000, "category": "c1"}
            }));
        });

        let payload = ProductForm {
            name: "Burger gà".to_string(),
            price: "39000".to_string(),
            stock: "12".to_string(),
            category_id: "c1".to_string(),
            image: Some(Upload::new("burger.jpg", vec![0xff, 0xd8, 0xff])),
            ..ProductForm::default()
        }
        .validate(FormMode::Create, 1024, CurrencyCode::VND)
        .unwrap();

        let created = test_client(&server).create_product(&payload).await.unwrap();
        mock.assert();
        assert_eq!(created.id, ProductId::new("p9"));
    }

    #[tokio::test]
    async fn test_delete_accepts_empty_body() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(DELETE).path("/products/p1");
            then.status(204);
        });

        test_client(&server)
            .delete_product(&ProductId::new("p1"))
            .await
            .unwrap();
    }
}
