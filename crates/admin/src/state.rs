//! Admin dashboard state shared by every screen.

use std::sync::Arc;

use fastbite_core::{Banner, BannerId, Product, ProductId, Promotion, PromotionId};
use tracing::instrument;

use crate::api::AdminClient;
use crate::components::{BannersResource, CouponsResource, ListScreen, ProductsResource};
use crate::config::AdminConfig;
use crate::error::{AdminError, add_breadcrumb};
use crate::forms::{BannerForm, CouponForm, FormMode, ProductForm};
use crate::notifications::NotificationClient;

/// Config plus the REST client.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct Admin {
    inner: Arc<AdminInner>,
}

struct AdminInner {
    config: AdminConfig,
    client: AdminClient,
}

impl std::fmt::Debug for Admin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Admin")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

const fn mode_for<T>(id: Option<&T>) -> FormMode {
    if id.is_some() {
        FormMode::Edit
    } else {
        FormMode::Create
    }
}

impl Admin {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: AdminConfig) -> Result<Self, AdminError> {
        let client = AdminClient::new(&config)?;
        Ok(Self {
            inner: Arc::new(AdminInner { config, client }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn client(&self) -> &AdminClient {
        &self.inner.client
    }

    #[must_use]
    pub fn products_screen(&self, search: Option<&str>) -> ListScreen<ProductsResource> {
        let mut resource = ProductsResource::new(self.client().clone());
        if let Some(search) = search {
            resource = resource.with_search(search);
        }
        ListScreen::new(resource, self.config().page_size)
    }

    #[must_use]
    pub fn banners_screen(&self) -> ListScreen<BannersResource> {
        ListScreen::new(BannersResource(self.client().clone()), self.config().page_size)
    }

    #[must_use]
    pub fn coupons_screen(&self) -> ListScreen<CouponsResource> {
        ListScreen::new(CouponsResource(self.client().clone()), self.config().page_size)
    }

    #[must_use]
    pub fn notifications(&self) -> NotificationClient {
        NotificationClient::new(self.config())
    }

    /// Validate and submit a product form. `id` selects update over create.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Form` without contacting the backend when the
    /// form is invalid.
    #[instrument(skip(self, form))]
    pub async fn save_product(
        &self,
        id: Option<&ProductId>,
        form: &ProductForm,
    ) -> Result<Product, AdminError> {
        let config = self.config();
        let payload = form.validate(mode_for(id), config.max_upload_bytes, config.currency)?;
        let product = match id {
            Some(id) => self.client().update_product(id, &payload).await?,
            None => self.client().create_product(&payload).await?,
        };
        add_breadcrumb("products", "Saved product", Some(product.id.as_str()));
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns `AdminError::Form` for invalid input, otherwise the backend error.
    #[instrument(skip(self, form))]
    pub async fn save_banner(
        &self,
        id: Option<&BannerId>,
        form: &BannerForm,
    ) -> Result<Banner, AdminError> {
        let payload = form.validate(mode_for(id), self.config().max_upload_bytes)?;
        let banner = match id {
            Some(id) => self.client().update_banner(id, &payload).await?,
            None => self.client().create_banner(&payload).await?,
        };
        add_breadcrumb("banners", "Saved banner", Some(banner.id.as_str()));
        Ok(banner)
    }

    /// # Errors
    ///
    /// Returns `AdminError::Form` for invalid input, otherwise the backend error.
    #[instrument(skip(self, form))]
    pub async fn save_coupon(
        &self,
        id: Option<&PromotionId>,
        form: &CouponForm,
    ) -> Result<Promotion, AdminError> {
        let payload = form.validate(self.config().currency)?;
        let coupon = match id {
            Some(id) => self.client().update_coupon(id, &payload).await?,
            None => self.client().create_coupon(&payload).await?,
        };
        add_breadcrumb("coupons", "Saved coupon", Some(coupon.id.as_str()));
        Ok(coupon)
    }
}
