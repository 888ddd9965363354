//! Banners ready for display.

use chrono::{DateTime, Utc};
use fastbite_core::{Banner, BannerPosition};
use tracing::debug;

use crate::error::StorefrontError;
use crate::services::session::Session;

#[derive(Debug, Clone)]
pub struct BannerService {
    session: Session,
}

impl BannerService {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    /// Banners to show now, optionally for one placement.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn visible(
        &self,
        position: Option<BannerPosition>,
    ) -> Result<Vec<Banner>, StorefrontError> {
        self.visible_at(position, Utc::now()).await
    }

    /// Same as [`Self::visible`] with an explicit clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn visible_at(
        &self,
        position: Option<BannerPosition>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Banner>, StorefrontError> {
        let banners = self.session.api().get_banners(position).await?;
        let shown: Vec<Banner> = match position {
            Some(position) => Banner::select_for(&banners, position, now),
            None => Banner::visible(&banners, now),
        }
        .into_iter()
        .cloned()
        .collect();

        if shown.len() < banners.len() {
            debug!(
                received = banners.len(),
                shown = shown.len(),
                "Hid inactive or out-of-schedule banners"
            );
        }
        Ok(shown)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::services::session::test_session;

    #[tokio::test]
    async fn test_hides_expired_and_inactive_banners() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/banners/active");
            then.status(200).json_body(json!({
                "success": true,
                "data": [
                    {"_id": "b1", "title": "Old", "position": "home_hero", "endDate": "2020-01-01T00:00:00Z"},
                    {"_id": "b2", "title": "Off", "position": "home_hero", "isActive": false},
                    {"_id": "b3", "title": "Combo trưa", "position": "home_hero", "displayOrder": 2},
                    {"_id": "b4", "title": "Gà giòn", "position": "sidebar", "displayOrder": 1}
                ]
            }));
        });

        let (session, _storage) = test_session(&server);
        let titles: Vec<String> = BannerService::new(session)
            .visible(None)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, vec!["Gà giòn", "Combo trưa"]);
    }

    #[tokio::test]
    async fn test_position_filter_applies_schedule() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET)
                .path("/banners/active")
                .query_param("position", "popup");
            then.status(200).json_body(json!({
                "success": true,
                "data": [
                    {"_id": "b1", "title": "Sắp tới", "position": "popup", "startDate": "2026-06-01T00:00:00Z"},
                    {"_id": "b2", "title": "Hè", "position": "popup", "startDate": "2026-05-01T00:00:00Z"}
                ]
            }));
        });

        let (session, _storage) = test_session(&server);
        let now = "2026-05-15T00:00:00Z".parse().unwrap();
        let shown = BannerService::new(session)
            .visible_at(Some(BannerPosition::Popup), now)
            .await
            .unwrap();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].title, "Hè");
    }
}
