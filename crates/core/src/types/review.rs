//! Product reviews.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::{OrderId, ProductId, ReviewId};

/// Validation failures for a review submission.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("rating must be between 1 and 5 (got {0})")]
    RatingOutOfRange(u8),
    #[error("comment cannot be empty")]
    EmptyComment,
    #[error("comment must be at most {max} characters")]
    CommentTooLong { max: usize },
}

/// A published review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(alias = "_id")]
    pub id: ReviewId,
    #[serde(alias = "product")]
    pub product_id: ProductId,
    #[serde(default)]
    pub user_name: Option<String>,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A review the customer is about to submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub product_id: ProductId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    pub rating: u8,
    pub comment: String,
}

impl NewReview {
    pub const MAX_COMMENT_CHARS: usize = 1000;

    /// # Errors
    ///
    /// Returns the first rule the submission breaks.
    pub fn validate(&self) -> Result<(), ReviewError> {
        if !(1..=5).contains(&self.rating) {
            return Err(ReviewError::RatingOutOfRange(self.rating));
        }
        let comment = self.comment.trim();
        if comment.is_empty() {
            return Err(ReviewError::EmptyComment);
        }
        if comment.chars().count() > Self::MAX_COMMENT_CHARS {
            return Err(ReviewError::CommentTooLong {
                max: Self::MAX_COMMENT_CHARS,
            });
        }
        Ok(())
    }
}

/// Aggregate of a product's reviews.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSummary {
    pub average: f64,
    pub count: usize,
    /// Number of reviews per star, index 0 is one star.
    pub histogram: [usize; 5],
}

impl RatingSummary {
    #[must_use]
    pub fn from_reviews(reviews: &[Review]) -> Self {
        let mut histogram = [0usize; 5];
        let mut sum = 0u32;
        let mut count = 0usize;

        for review in reviews {
            if let Some(slot) = usize::from(review.rating)
                .checked_sub(1)
                .and_then(|i| histogram.get_mut(i))
            {
                *slot += 1;
                sum += u32::from(review.rating);
                count += 1;
            }
        }

        #[allow(clippy::cast_precision_loss)] // review counts stay far below f64 precision
        let average = if count == 0 {
            0.0
        } else {
            f64::from(sum) / count as f64
        };

        Self {
            average,
            count,
            histogram,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: u8) -> Review {
        Review {
            id: ReviewId::new(format!("r{rating}")),
            product_id: ProductId::new("p1"),
            user_name: None,
            rating,
            comment: "ngon".to_string(),
            created_at: None,
        }
    }

    #[test]
    fn test_validate() {
        let mut new = NewReview {
            product_id: ProductId::new("p1"),
            order_id: None,
            rating: 5,
            comment: "Gà giòn, nóng hổi".to_string(),
        };
        assert!(new.validate().is_ok());

        new.rating = 0;
        assert_eq!(new.validate(), Err(ReviewError::RatingOutOfRange(0)));

        new.rating = 4;
        new.comment = "   ".to_string();
        assert_eq!(new.validate(), Err(ReviewError::EmptyComment));

        new.comment = "a".repeat(1001);
        assert!(matches!(new.validate(), Err(ReviewError::CommentTooLong { .. })));
    }

    #[test]
    fn test_rating_summary() {
        let summary = RatingSummary::from_reviews(&[review(5), review(4), review(5), review(9)]);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.histogram, [0, 0, 0, 1, 2]);
        assert!((summary.average - 14.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_rating_summary_empty() {
        let summary = RatingSummary::from_reviews(&[]);
        assert_eq!(summary.count, 0);
        assert!(summary.average.abs() < f64::EPSILON);
    }
}
