//! FastBite Core - Shared types and business rules.
//!
//! This crate provides the domain types used across all FastBite components:
//! - `storefront` - Customer-facing client library (catalog, cart, checkout)
//! - `admin` - Admin dashboard client library (CRUD screens, live notifications)
//! - `cli` - Command-line front end over both libraries
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no storage. Every rule that can be decided without talking to the
//! backend (stock clamping, coupon maths, banner scheduling, order totals)
//! lives here so it can be unit tested in isolation.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, and the records mirrored from the backend

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
