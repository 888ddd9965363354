//! Cache types for catalog responses.

use fastbite_core::{Banner, Category, Page, Product};

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Page<Product>),
    Categories(Vec<Category>),
    Banners(Vec<Banner>),
}
