//! Product recommendations.
//!
//! The backend's `/recommendations` endpoint is asked first. When it fails
//! or returns nothing, products are ranked locally with fixed additive
//! weights over the visitor's signals:
//!
//! | Signal                                   | Weight        |
//! |------------------------------------------|---------------|
//! | product was recently viewed              | 0.80          |
//! | category is a favorite                   | 0.75          |
//! | category was ordered before              | 0.70          |
//! | vegetarian product for vegetarian user   | 0.50          |
//! | featured                                 | 0.30          |
//! | rating >= 4.5                            | 0.20          |
//! | tag shared with viewed products          | 0.15 each (3) |
//!
//! Products that are inactive or out of stock are never recommended.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use fastbite_core::{CategoryId, Product, ProductId, User};
use tracing::{debug, instrument, warn};

use crate::api::{BehaviorAction, BehaviorEvent, ProductQuery};
use crate::error::StorefrontError;
use crate::services::session::Session;
use crate::storage::{StorageError, StorageExt, keys};

pub mod weights {
    pub const RECENTLY_VIEWED: f64 = 0.8;
    pub const FAVORITE_CATEGORY: f64 = 0.75;
    pub const ORDERED_CATEGORY: f64 = 0.7;
    pub const DIETARY_MATCH: f64 = 0.5;
    pub const FEATURED: f64 = 0.3;
    pub const HIGH_RATING: f64 = 0.2;
    pub const HIGH_RATING_THRESHOLD: f64 = 4.5;
    pub const SHARED_TAG: f64 = 0.15;
    pub const MAX_SHARED_TAGS: usize = 3;
}

/// How many recently viewed products are remembered.
const RECENTLY_VIEWED_CAP: usize = 20;

/// Most-viewed categories treated as favorites.
const TOP_VIEWED_CATEGORIES: usize = 3;

/// Catalog size scanned for local ranking.
const CATALOG_SCAN_LIMIT: u32 = 100;

/// What we know about the visitor's taste.
#[derive(Debug, Clone, Default)]
pub struct Signals {
    pub recently_viewed: HashSet<ProductId>,
    pub favorite_categories: HashSet<CategoryId>,
    pub ordered_categories: HashSet<CategoryId>,
    pub vegetarian: bool,
    /// Lower-cased tags of recently viewed products.
    pub preferred_tags: HashSet<String>,
}

/// A product with its local score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredProduct {
    pub product: Product,
    pub score: f64,
}

/// Additive heuristic score of one product.
#[must_use]
pub fn score(product: &Product, signals: &Signals) -> f64 {
    let category = product.category.id();
    let mut score = 0.0;

    if signals.recently_viewed.contains(&product.id) {
        score += weights::RECENTLY_VIEWED;
    }
    if signals.favorite_categories.contains(category) {
        score += weights::FAVORITE_CATEGORY;
    }
    if signals.ordered_categories.contains(category) {
        score += weights::ORDERED_CATEGORY;
    }
    if signals.vegetarian && product.is_vegetarian {
        score += weights::DIETARY_MATCH;
    }
    if product.is_featured {
        score += weights::FEATURED;
    }
    if product
        .rating
        .is_some_and(|r| r >= weights::HIGH_RATING_THRESHOLD)
    {
        score += weights::HIGH_RATING;
    }

    let shared = product
        .tags
        .iter()
        .filter(|t| signals.preferred_tags.contains(&t.to_lowercase()))
        .count()
        .min(weights::MAX_SHARED_TAGS);
    #[allow(clippy::cast_precision_loss)] // at most MAX_SHARED_TAGS
    {
        score += weights::SHARED_TAG * shared as f64;
    }

    score
}

/// Purchasable products ordered by score (highest first), ties by name.
#[must_use]
pub fn rank(products: &[Product], signals: &Signals, limit: usize) -> Vec<ScoredProduct> {
    let mut scored: Vec<ScoredProduct> = products
        .iter()
        .filter(|p| p.is_purchasable())
        .map(|p| ScoredProduct {
            score: score(p, signals),
            product: p.clone(),
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.product.name.cmp(&b.product.name))
    });
    scored.truncate(limit);
    scored
}

/// Browsing history kept in local storage, per user or guest session.
#[derive(Debug, Clone)]
pub struct BehaviorTracker {
    session: Session,
}

impl BehaviorTracker {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    /// Remember a product view.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    pub fn record_view(&self, owner: &str, product: &Product) -> Result<(), StorageError> {
        let storage = self.session.storage();

        let key = keys::recently_viewed(owner);
        let mut viewed: Vec<ProductId> = storage.get_json(&key)?.unwrap_or_default();
        viewed.retain(|id| id != &product.id);
        viewed.insert(0, product.id.clone());
        viewed.truncate(RECENTLY_VIEWED_CAP);
        storage.set_json(&key, &viewed)?;

        let key = keys::viewed_categories(owner);
        let mut counts: BTreeMap<CategoryId, u32> = storage.get_json(&key)?.unwrap_or_default();
        *counts.entry(product.category.id().clone()).or_default() += 1;
        storage.set_json(&key, &counts)
    }

    /// Recently viewed products, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn recently_viewed(&self, owner: &str) -> Result<Vec<ProductId>, StorageError> {
        Ok(self
            .session
            .storage()
            .get_json(&keys::recently_viewed(owner))?
            .unwrap_or_default())
    }

    /// Categories by view count, most viewed first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn top_categories(&self, owner: &str, n: usize) -> Result<Vec<CategoryId>, StorageError> {
        let counts: BTreeMap<CategoryId, u32> = self
            .session
            .storage()
            .get_json(&keys::viewed_categories(owner))?
            .unwrap_or_default();
        let mut counts: Vec<(CategoryId, u32)> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(counts.into_iter().take(n).map(|(id, _)| id).collect())
    }
}

/// Recommendation service.
#[derive(Debug, Clone)]
pub struct RecommendationService {
    session: Session,
    tracker: BehaviorTracker,
}

impl RecommendationService {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            tracker: BehaviorTracker::new(session.clone()),
            session,
        }
    }

    /// Record that the visitor opened a product page.
    ///
    /// The local history is always updated; the backend is told on a best
    /// effort basis.
    ///
    /// # Errors
    ///
    /// Returns an error if the local store fails.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn record_view(&self, product: &Product) -> Result<(), StorefrontError> {
        let owner = self.session.owner_id()?;
        self.tracker.record_view(&owner, product)?;

        let session_id = match self.session.user()? {
            Some(_) => None,
            None => Some(owner),
        };
        let event = BehaviorEvent {
            action: BehaviorAction::View,
            product_id: Some(product.id.clone()),
            category_id: Some(product.category.id().clone()),
            query: None,
            session_id,
        };
        if let Err(e) = self.session.api().track_behavior(&event).await {
            debug!(error = %e, "Behavior tracking failed");
        }
        Ok(())
    }

    /// Up to `limit` products for the visitor.
    ///
    /// With `vegetarian_only`, only vegetarian products are returned.
    ///
    /// # Errors
    ///
    /// Returns an error only if both the backend and the local fallback
    /// fail.
    #[instrument(skip(self))]
    pub async fn recommend(
        &self,
        limit: usize,
        vegetarian_only: bool,
    ) -> Result<Vec<Product>, StorefrontError> {
        let user = self.session.user()?;
        let owner = self.session.owner_id()?;
        let session_id = user.is_none().then_some(owner.as_str());
        let remote_limit = u32::try_from(limit).unwrap_or(u32::MAX);

        match self
            .session
            .api()
            .get_recommendations(session_id, remote_limit)
            .await
        {
            Ok(products) => {
                let products: Vec<Product> = products
                    .into_iter()
                    .filter(|p| p.is_purchasable() && (!vegetarian_only || p.is_vegetarian))
                    .take(limit)
                    .collect();
                if !products.is_empty() {
                    return Ok(products);
                }
                debug!("Backend returned no recommendations, ranking locally");
            }
            Err(e) => warn!(error = %e, "Remote recommendations failed, ranking locally"),
        }

        self.recommend_locally(user.as_ref(), &owner, limit, vegetarian_only)
            .await
    }

    async fn recommend_locally(
        &self,
        user: Option<&User>,
        owner: &str,
        limit: usize,
        vegetarian_only: bool,
    ) -> Result<Vec<Product>, StorefrontError> {
        let query = ProductQuery {
            limit: Some(CATALOG_SCAN_LIMIT),
            is_vegetarian: vegetarian_only.then_some(true),
            ..ProductQuery::default()
        };
        let catalog = self.session.api().get_products(&query).await?.items;
        let signals = self.signals(user, owner, &catalog).await?;

        Ok(rank(&catalog, &signals, limit)
            .into_iter()
            .filter(|s| !vegetarian_only || s.product.is_vegetarian)
            .map(|s| s.product)
            .collect())
    }

    /// Collect the visitor's signals, resolving products against `catalog`.
    async fn signals(
        &self,
        user: Option<&User>,
        owner: &str,
        catalog: &[Product],
    ) -> Result<Signals, StorageError> {
        let by_id: HashMap<&ProductId, &Product> = catalog.iter().map(|p| (&p.id, p)).collect();

        let recently_viewed = self.tracker.recently_viewed(owner)?;
        let preferred_tags = recently_viewed
            .iter()
            .filter_map(|id| by_id.get(id))
            .flat_map(|p| p.tags.iter().map(|t| t.to_lowercase()))
            .collect();

        let mut favorite_categories: HashSet<CategoryId> = self
            .tracker
            .top_categories(owner, TOP_VIEWED_CATEGORIES)?
            .into_iter()
            .collect();
        if let Some(user) = user {
            favorite_categories.extend(user.favorite_categories.iter().cloned());
        }

        let mut ordered_categories = HashSet::new();
        if user.is_some() {
            match self.session.api().get_my_orders(1, 10).await {
                Ok(page) => {
                    ordered_categories.extend(
                        page.items
                            .iter()
                            .flat_map(|o| o.items.iter())
                            .filter_map(|item| by_id.get(&item.product_id))
                            .map(|p| p.category.id().clone()),
                    );
                }
                Err(e) => debug!(error = %e, "Order history unavailable for recommendations"),
            }
        }

        Ok(Signals {
            recently_viewed: recently_viewed.into_iter().collect(),
            favorite_categories,
            ordered_categories,
            vegetarian: user.is_some_and(|u| u.is_vegetarian),
            preferred_tags,
        })
    }
}
