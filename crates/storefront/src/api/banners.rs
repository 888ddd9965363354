//! Banner endpoints.

use fastbite_core::{Banner, BannerPosition};
use reqwest::Method;
use tracing::instrument;

use super::cache::CacheValue;
use super::{ApiClient, ApiError};

impl ApiClient {
    /// Active banners, optionally for one placement.
    ///
    /// Returned as received; cached entries can outlive a banner's
    /// `end_date`, so display goes through
    /// [`BannerService`](crate::services::BannerService).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_banners(
        &self,
        position: Option<BannerPosition>,
    ) -> Result<Vec<Banner>, ApiError> {
        let cache_key = format!("banners:{}", position.map_or("all", |p| p.as_str()));
        if let Some(CacheValue::Banners(banners)) = self.cached(&cache_key).await {
            return Ok(banners);
        }

        let mut request = self.request(Method::GET, "banners/active").await?;
        if let Some(position) = position {
            request = request.query(&[("position", position.as_str())]);
        }
        let banners: Vec<Banner> = self
            .execute::<Vec<Banner>>(request)
            .await?
            .data
            .unwrap_or_default();

        self.store(cache_key, CacheValue::Banners(banners.clone()))
            .await;
        Ok(banners)
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
    async fn test_get_banners_by_position() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/banners/active")
                .query_param("position", "home_hero");
            then.status(200).json_body(json!({
                "success": true,
                "data": [{
                    "_id": "b1",
                    "title": "Combo trưa 49k",
                    "position": "home_hero",
                    "type": "promotion",
                    "displayOrder": 1
                }]
            }));
        });

        let banners = test_client(&server)
            .get_banners(Some(BannerPosition::HomeHero))
            .await
            .unwrap();
        mock.assert();
        assert_eq!(banners.len(), 1);
        assert_eq!(banners[0].title, "Combo trưa 49k");
    }
}
