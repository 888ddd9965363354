//! FastBite admin dashboard library.
//!
//! Client-side core of the dashboard: an authenticated REST client with
//! multipart uploads, paginated CRUD list screens with optimistic deletes,
//! form validation, and the Socket.IO notification channel.
//!
//! # Modules
//!
//! - [`api`] - REST client for products, banners, coupons and orders
//! - [`components`] - list screen state (selection, paging, bulk delete)
//! - [`forms`] - form validation into submit-ready payloads
//! - [`notifications`] - real-time admin events over WebSocket

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod components;
pub mod config;
pub mod error;
pub mod forms;
pub mod notifications;
pub mod state;

pub use error::{AdminError, Result};
pub use state::Admin;
