//! Server-side recommendation and behavior tracking endpoints.

use fastbite_core::{CategoryId, Product, ProductId};
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use super::{ApiClient, ApiError};

/// Kinds of behavior reported to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorAction {
    View,
    AddToCart,
    Purchase,
    Search,
}

/// One behavior event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorEvent {
    pub action: BehaviorAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Guest session ID when not signed in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl ApiClient {
    /// Personalized recommendations computed by the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_recommendations(
        &self,
        session_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<Product>, ApiError> {
        let mut request = self
            .request(Method::GET, "recommendations")
            .await?
            .query(&[("limit", limit)]);
        if let Some(session_id) = session_id {
            request = request.query(&[("sessionId", session_id)]);
        }
        Ok(self
            .execute::<Vec<Product>>(request)
            .await?
            .data
            .unwrap_or_default())
    }

    /// Report a behavior event. Fire and forget from the caller's view.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, event), fields(action = ?event.action))]
    pub async fn track_behavior(&self, event: &BehaviorEvent) -> Result<(), ApiError> {
        let request = self
            .request(Method::POST, "recommendations/track")
            .await?
            .json(event);
        self.execute_unit(request).await
    }
}
