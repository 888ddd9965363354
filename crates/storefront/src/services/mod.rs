//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `session` - Stored token and user record shared by every service
//! - `auth` - Login, registration, token refresh and logout
//! - `banners` - Banners filtered by schedule for display
//! - `cart` - Guest and per-user carts with backend sync
//! - `checkout` - Quotes, order placement, payments and order tracking
//! - `recommendations` - Behavior tracking and product ranking
//! - `chatbot` - Keyword intents with AI pass-through
//! - `reviews` - Product reviews and rating summaries

pub mod auth;
pub mod banners;
pub mod cart;
pub mod chatbot;
pub mod checkout;
pub mod recommendations;
pub mod reviews;
pub mod session;

pub use auth::{AuthError, AuthService, SignedIn};
pub use banners::BannerService;
pub use cart::{CartService, MergeReport};
pub use chatbot::{ChatReply, ChatbotService, Intent};
pub use checkout::{CheckoutError, CheckoutForm, CheckoutService, PlacedOrder, Quote};
pub use recommendations::{BehaviorTracker, RecommendationService};
pub use reviews::{ProductReviews, ReviewService};
pub use session::Session;
