//! FastBite storefront library.
//!
//! Everything a customer-facing front end needs: a cached REST client for
//! the FastBite backend, local key-value storage for the session and guest
//! cart, and services for auth, cart, checkout, reviews, recommendations
//! and the shop assistant chatbot.
//!
//! [`state::Storefront`] wires them together from a [`config::StorefrontConfig`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod ai;
pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod storage;

pub use error::{Result, StorefrontError};
pub use state::Storefront;
