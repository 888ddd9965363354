//! Server-side cart endpoints for signed-in users.

use fastbite_core::{Cart, CartItem, Product, ProductId, ProductSnapshot};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{ApiClient, ApiError};

#[derive(Debug, Deserialize)]
struct ServerCart {
    #[serde(default)]
    items: Vec<ServerCartItem>,
}

#[derive(Debug, Deserialize)]
struct ServerCartItem {
    /// `null` when the product was deleted after being added.
    #[serde(default)]
    product: Option<Product>,
    quantity: u32,
}

impl From<ServerCart> for Cart {
    fn from(cart: ServerCart) -> Self {
        let items = cart
            .items
            .into_iter()
            .filter_map(|line| {
                let Some(product) = line.product else {
                    debug!("Dropping cart line for deleted product");
                    return None;
                };
                Some(CartItem {
                    product_id: product.id.clone(),
                    quantity: line.quantity,
                    product: ProductSnapshot::from(&product),
                })
            })
            .collect();
        Self::new(items)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CartLineRequest<'a> {
    product_id: &'a ProductId,
    quantity: u32,
}

#[derive(Debug, Serialize)]
struct QuantityRequest {
    quantity: u32,
}

impl ApiClient {
    /// The signed-in user's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_cart(&self) -> Result<Cart, ApiError> {
        let request = self.request(Method::GET, "cart").await?;
        let cart: Option<ServerCart> = self.execute::<ServerCart>(request).await?.data;
        Ok(cart.map(Cart::from).unwrap_or_default())
    }

    /// Add units of a product; the backend merges with an existing line.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the line (e.g. out of stock).
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_cart_item(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        let request = self
            .request(Method::POST, "cart")
            .await?
            .json(&CartLineRequest {
                product_id,
                quantity,
            });
        self.execute_cart(request).await
    }

    /// Set the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_cart_item(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        let request = self
            .request(Method::PUT, &format!("cart/{product_id}"))
            .await?
            .json(&QuantityRequest { quantity });
        self.execute_cart(request).await
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_cart_item(&self, product_id: &ProductId) -> Result<Cart, ApiError> {
        let request = self
            .request(Method::DELETE, &format!("cart/{product_id}"))
            .await?;
        self.execute_cart(request).await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn clear_server_cart(&self) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, "cart").await?;
        self.execute_unit(request).await
    }

    /// Mutations usually echo the cart; fetch it when they don't.
    async fn execute_cart(&self, request: reqwest::RequestBuilder) -> Result<Cart, ApiError> {
        match self.execute::<ServerCart>(request).await?.data {
            Some(cart) => Ok(cart.into()),
            None => self.get_cart().await,
        }
    }
}
