//! Core types for FastBite.
//!
//! Records mirror the backend's JSON documents (camelCase on the wire).

pub mod banner;
pub mod cart;
pub mod email;
pub mod id;
pub mod order;
pub mod page;
pub mod price;
pub mod product;
pub mod promotion;
pub mod review;
pub mod status;
pub mod user;

pub use banner::{Banner, BannerPosition, BannerType};
pub use cart::{Cart, CartError, CartItem, CartUpdate, ProductSnapshot, StockWarning};
pub use email::{Email, EmailError};
pub use id::*;
pub use order::{Order, OrderItem, OrderTotals, ShippingAddress};
pub use page::{Page, Pagination};
pub use price::{CurrencyCode, Price};
pub use product::{Category, CategoryRef, Product};
pub use promotion::{CouponRejection, DiscountType, Promotion};
pub use review::{NewReview, RatingSummary, Review, ReviewError};
pub use status::*;
pub use user::{User, UserRole};
