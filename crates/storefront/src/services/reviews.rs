//! Product reviews.

use fastbite_core::{NewReview, Page, ProductId, RatingSummary, Review};
use tracing::instrument;

use crate::error::{StorefrontError, add_breadcrumb};
use crate::services::auth::AuthError;
use crate::services::session::Session;

/// A page of reviews with the summary of that page.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductReviews {
    pub reviews: Page<Review>,
    pub summary: RatingSummary,
}

#[derive(Debug, Clone)]
pub struct ReviewService {
    session: Session,
}

impl ReviewService {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list(
        &self,
        product_id: &ProductId,
        page: u32,
    ) -> Result<ProductReviews, StorefrontError> {
        let reviews = self
            .session
            .api()
            .get_product_reviews(product_id, page)
            .await?;
        let summary = RatingSummary::from_reviews(&reviews.items);
        Ok(ProductReviews { reviews, summary })
    }

    /// Validate locally, then submit.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Review` for invalid input (no request is
    /// made), `AuthError::NotSignedIn` for guests, or the backend's
    /// rejection.
    #[instrument(skip(self, review), fields(product_id = %review.product_id))]
    pub async fn submit(&self, review: &NewReview) -> Result<Review, StorefrontError> {
        review.validate()?;
        if self.session.user()?.is_none() {
            return Err(AuthError::NotSignedIn.into());
        }

        let created = self.session.api().create_review(review).await?;
        add_breadcrumb(
            "review",
            "Submitted review",
            Some(&[("product_id", review.product_id.as_str())]),
        );
        Ok(created)
    }
}
