//! Storefront state shared by every front end.

use std::sync::Arc;

use crate::ai::AiClient;
use crate::api::ApiClient;
use crate::config::StorefrontConfig;
use crate::error::StorefrontError;
use crate::services::{
    AuthService, BannerService, CartService, ChatbotService, CheckoutService, RecommendationService,
    ReviewService, Session,
};
use crate::storage::{FileStorage, Storage};

/// Wiring of config, REST client, local storage and services.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: StorefrontConfig,
    session: Session,
    auth: AuthService,
    banners: BannerService,
    cart: CartService,
    checkout: CheckoutService,
    recommendations: RecommendationService,
    chatbot: ChatbotService,
    reviews: ReviewService,
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl Storefront {
    /// Build the storefront with file storage under `config.data_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created or a
    /// client cannot be built.
    pub fn open(config: StorefrontConfig) -> Result<Self, StorefrontError> {
        let storage = FileStorage::open(&config.data_dir)?;
        Self::with_storage(config, Arc::new(storage))
    }

    /// Build the storefront over any storage backend.
    ///
    /// # Errors
    ///
    /// Returns an error if a client cannot be built.
    pub fn with_storage(
        config: StorefrontConfig,
        storage: Arc<dyn Storage>,
    ) -> Result<Self, StorefrontError> {
        let api = ApiClient::new(&config)?;
        let ai = config.ai.as_ref().map(AiClient::new).transpose()?;
        let session = Session::new(api, storage);

        let recommendations = RecommendationService::new(session.clone());
        let chatbot = ChatbotService::new(
            session.clone(),
            recommendations.clone(),
            ai,
            config.currency,
        );

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                auth: AuthService::new(session.clone()),
                banners: BannerService::new(session.clone()),
                cart: CartService::new(session.clone()),
                checkout: CheckoutService::new(session.clone(), config.shipping_fee),
                reviews: ReviewService::new(session.clone()),
                recommendations,
                chatbot,
                session,
                config,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        self.inner.session.api()
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    #[must_use]
    pub fn banners(&self) -> &BannerService {
        &self.inner.banners
    }

    #[must_use]
    pub fn cart(&self) -> &CartService {
        &self.inner.cart
    }

    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }

    #[must_use]
    pub fn recommendations(&self) -> &RecommendationService {
        &self.inner.recommendations
    }

    #[must_use]
    pub fn chatbot(&self) -> &ChatbotService {
        &self.inner.chatbot
    }

    #[must_use]
    pub fn reviews(&self) -> &ReviewService {
        &self.inner.reviews
    }
}
