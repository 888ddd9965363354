//! Banner management endpoints.

use fastbite_core::{Banner, BannerId, Page};
use reqwest::Method;
use tracing::instrument;

use super::{AdminApiError, AdminClient, multipart_form};
use crate::forms::BannerPayload;

impl AdminClient {
    /// One page of banners, scheduled and inactive ones included.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_banners(&self, page: u32, limit: u32) -> Result<Page<Banner>, AdminApiError> {
        let request = self
            .request(Method::GET, "banners")?
            .query(&[("page", page), ("limit", limit)]);
        self.execute_page(request).await
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the banner.
    #[instrument(skip(self, payload), fields(title = %payload.title))]
    pub async fn create_banner(&self, payload: &BannerPayload) -> Result<Banner, AdminApiError> {
        let form = multipart_form(payload.fields(), payload.image.as_ref())?;
        let request = self.request(Method::POST, "banners")?.multipart(form);
        self.execute_data(request, "banner").await
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    #[instrument(skip(self, payload), fields(banner_id = %id))]
    pub async fn update_banner(
        &self,
        id: &BannerId,
        payload: &BannerPayload,
    ) -> Result<Banner, AdminApiError> {
        let form = multipart_form(payload.fields(), payload.image.as_ref())?;
        let request = self
            .request(Method::PUT, &format!("banners/{id}"))?
            .multipart(form);
        self.execute_data(request, "banner").await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(banner_id = %id))]
    pub async fn delete_banner(&self, id: &BannerId) -> Result<(), AdminApiError> {
        let request = self.request(Method::DELETE, &format!("banners/{id}"))?;
        self.execute_unit(request).await
    }
}
