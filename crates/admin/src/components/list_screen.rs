//! Paginated CRUD list with selection and optimistic deletes.

use std::collections::BTreeSet;
use std::fmt::Display;

use async_trait::async_trait;
use fastbite_core::{Banner, BannerId, Page, Pagination, Product, ProductId, Promotion, PromotionId};
use tracing::{debug, info, instrument, warn};

use crate::api::{AdminApiError, AdminClient};

/// A backend collection that a list screen can page through and delete from.
#[async_trait]
pub trait CrudResource: Send + Sync {
    type Item: Clone + Send + Sync;
    type Id: Clone + Ord + Display + Send + Sync;

    /// Short name used in logs.
    const NAME: &'static str;

    fn id(item: &Self::Item) -> &Self::Id;

    async fn list(&self, page: u32, limit: u32) -> Result<Page<Self::Item>, AdminApiError>;

    async fn delete(&self, id: &Self::Id) -> Result<(), AdminApiError>;
}

/// Products, inactive ones included.
#[derive(Debug, Clone)]
pub struct ProductsResource {
    client: AdminClient,
    search: Option<String>,
}

impl ProductsResource {
    #[must_use]
    pub const fn new(client: AdminClient) -> Self {
        Self {
            client,
            search: None,
        }
    }

    /// Restrict the list to products matching `search`.
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }
}

#[async_trait]
impl CrudResource for ProductsResource {
    type Item = Product;
    type Id = ProductId;
    const NAME: &'static str = "products";

    fn id(item: &Product) -> &ProductId {
        &item.id
    }

    async fn list(&self, page: u32, limit: u32) -> Result<Page<Product>, AdminApiError> {
        self.client
            .list_products(page, limit, self.search.as_deref())
            .await
    }

    async fn delete(&self, id: &ProductId) -> Result<(), AdminApiError> {
        self.client.delete_product(id).await
    }
}

#[derive(Debug, Clone)]
pub struct BannersResource(pub AdminClient);

#[async_trait]
impl CrudResource for BannersResource {
    type Item = Banner;
    type Id = BannerId;
    const NAME: &'static str = "banners";

    fn id(item: &Banner) -> &BannerId {
        &item.id
    }

    async fn list(&self, page: u32, limit: u32) -> Result<Page<Banner>, AdminApiError> {
        self.0.list_banners(page, limit).await
    }

    async fn delete(&self, id: &BannerId) -> Result<(), AdminApiError> {
        self.0.delete_banner(id).await
    }
}

#[derive(Debug, Clone)]
pub struct CouponsResource(pub AdminClient);

#[async_trait]
impl CrudResource for CouponsResource {
    type Item = Promotion;
    type Id = PromotionId;
    const NAME: &'static str = "coupons";

    fn id(item: &Promotion) -> &PromotionId {
        &item.id
    }

    async fn list(&self, page: u32, limit: u32) -> Result<Page<Promotion>, AdminApiError> {
        self.0.list_coupons(page, limit).await
    }

    async fn delete(&self, id: &PromotionId) -> Result<(), AdminApiError> {
        self.0.delete_coupon(id).await
    }
}

/// Outcome of a bulk delete, one entry per selected id.
#[derive(Debug)]
pub struct BulkDeleteReport<Id> {
    pub deleted: Vec<Id>,
    pub failed: Vec<(Id, AdminApiError)>,
}

impl<Id> Default for BulkDeleteReport<Id> {
    fn default() -> Self {
        Self {
            deleted: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<Id> BulkDeleteReport<Id> {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Toast text for the operator.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.failed.is_empty() {
            format!("Đã xóa {} mục", self.deleted.len())
        } else {
            format!(
                "Đã xóa {} mục, {} mục không xóa được",
                self.deleted.len(),
                self.failed.len()
            )
        }
    }
}

/// State behind one admin list page.
pub struct ListScreen<R: CrudResource> {
    resource: R,
    items: Vec<R::Item>,
    pagination: Option<Pagination>,
    page: u32,
    page_size: u32,
    selected: BTreeSet<R::Id>,
}

impl<R: CrudResource> std::fmt::Debug for ListScreen<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListScreen")
            .field("resource", &R::NAME)
            .field("items", &self.items.len())
            .field("page", &self.page)
            .field("page_size", &self.page_size)
            .field("selected", &self.selected.len())
            .finish_non_exhaustive()
    }
}

impl<R: CrudResource> ListScreen<R> {
    #[must_use]
    pub fn new(resource: R, page_size: u32) -> Self {
        Self {
            resource,
            items: Vec::new(),
            pagination: None,
            page: 1,
            page_size: page_size.max(1),
            selected: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn items(&self) -> &[R::Item] {
        &self.items
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn pagination(&self) -> Option<&Pagination> {
        self.pagination.as_ref()
    }

    #[must_use]
    pub const fn selected(&self) -> &BTreeSet<R::Id> {
        &self.selected
    }

    #[must_use]
    pub fn is_selected(&self, id: &R::Id) -> bool {
        self.selected.contains(id)
    }

    /// Fetch the current page, replacing the visible items.
    ///
    /// Selected ids that are no longer on the page are dropped.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the previous items are kept.
    #[instrument(skip(self), fields(resource = R::NAME, page = self.page))]
    pub async fn load(&mut self) -> Result<(), AdminApiError> {
        let page = self.resource.list(self.page, self.page_size).await?;
        self.items = page.items;
        self.pagination = Some(page.pagination);
        let visible: BTreeSet<&R::Id> = self.items.iter().map(R::id).collect();
        self.selected.retain(|id| visible.contains(id));
        debug!(count = self.items.len(), "List loaded");
        Ok(())
    }

    /// Jump to `page` (1-based) and load it.
    ///
    /// # Errors
    ///
    /// Returns the backend error and stays on the previous page.
    pub async fn go_to(&mut self, page: u32) -> Result<(), AdminApiError> {
        let previous = self.page;
        self.page = page.max(1);
        let result = self.load().await;
        if result.is_err() {
            self.page = previous;
        }
        result
    }

    /// Load the next page if there is one. Returns whether the page changed.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    pub async fn next_page(&mut self) -> Result<bool, AdminApiError> {
        let has_next = self
            .pagination
            .is_some_and(|p| p.page < p.total_pages);
        if !has_next {
            return Ok(false);
        }
        self.go_to(self.page + 1).await.map(|()| true)
    }

    /// Load the previous page if there is one.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    pub async fn prev_page(&mut self) -> Result<bool, AdminApiError> {
        if self.page <= 1 {
            return Ok(false);
        }
        self.go_to(self.page - 1).await.map(|()| true)
    }

    /// Flip the selection of one visible row. Returns whether it is now selected.
    pub fn toggle_select(&mut self, id: &R::Id) -> bool {
        if self.selected.remove(id) {
            return false;
        }
        if self.items.iter().any(|item| R::id(item) == id) {
            self.selected.insert(id.clone());
            return true;
        }
        false
    }

    /// Select every row on the current page.
    pub fn select_all(&mut self) {
        self.selected = self.items.iter().map(|item| R::id(item).clone()).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Delete one row, removing it locally before the backend answers.
    ///
    /// On failure the row goes back to its original position and selection.
    ///
    /// # Errors
    ///
    /// Returns the backend error after rolling back.
    #[instrument(skip(self, id), fields(resource = R::NAME, id = %id))]
    pub async fn delete(&mut self, id: &R::Id) -> Result<(), AdminApiError> {
        let position = self.items.iter().position(|item| R::id(item) == id);
        let removed = position.map(|index| (index, self.items.remove(index)));
        let was_selected = self.selected.remove(id);

        match self.resource.delete(id).await {
            Ok(()) => {
                if removed.is_some()
                    && let Some(pagination) = self.pagination.as_mut()
                {
                    pagination.total = pagination.total.saturating_sub(1);
                }
                info!("Deleted");
                Ok(())
            }
            Err(e) => {
                if let Some((index, item)) = removed {
                    self.items.insert(index.min(self.items.len()), item);
                }
                if was_selected {
                    self.selected.insert(id.clone());
                }
                warn!(error = %e, "Delete failed, row restored");
                Err(e)
            }
        }
    }

    /// Delete every selected row, one request at a time.
    ///
    /// Rows that fail stay in the list and stay selected.
    pub async fn bulk_delete(&mut self) -> BulkDeleteReport<R::Id> {
        let ids: Vec<R::Id> = self.selected.iter().cloned().collect();
        let mut report = BulkDeleteReport::default();

        for id in ids {
            match self.delete(&id).await {
                Ok(()) => report.deleted.push(id),
                Err(e) => report.failed.push((id, e)),
            }
        }

        info!(
            resource = R::NAME,
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "Bulk delete finished"
        );
        report
    }
}
