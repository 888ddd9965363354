//! Catalog records: products and categories.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId};

/// A menu item as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub stock: u32,
    pub category: CategoryRef,
    #[serde(default)]
    pub is_vegetarian: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub num_reviews: u32,
}

const fn default_true() -> bool {
    true
}

impl Product {
    /// Active and in stock.
    #[must_use]
    pub const fn is_purchasable(&self) -> bool {
        self.is_active && self.stock > 0
    }

    /// Case-insensitive tag lookup.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// A product's category, either populated or as a bare reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryRef {
    Populated {
        #[serde(alias = "_id")]
        id: CategoryId,
        name: String,
    },
    Id(CategoryId),
}

impl CategoryRef {
    #[must_use]
    pub const fn id(&self) -> &CategoryId {
        match self {
            Self::Populated { id, .. } | Self::Id(id) => id,
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Populated { name, .. } => Some(name),
            Self::Id(_) => None,
        }
    }
}

/// A menu category (burgers, chicken, drinks...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(alias = "_id")]
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_backend_product() {
        let json = r#"{
            "_id": "p1",
            "name": "Burger Bò Phô Mai",
            "price": 59000,
            "stock": 12,
            "category": {"_id": "c1", "name": "Burger"},
            "isFeatured": true,
            "tags": ["beef", "cheese"],
            "image": "/uploads/burger.jpg"
        }"#;

        let product: Product = serde_json::from_str(json).expect("deserialize");
        assert_eq!(product.id.as_str(), "p1");
        assert_eq!(product.price, Decimal::from(59_000));
        assert!(product.is_active);
        assert!(!product.is_vegetarian);
        assert_eq!(product.category.name(), Some("Burger"));
        assert_eq!(product.image_url.as_deref(), Some("/uploads/burger.jpg"));
        assert!(product.has_tag("CHEESE"));
    }

    #[test]
    fn test_category_ref_bare_id() {
        let cat: CategoryRef = serde_json::from_str("\"c9\"").expect("deserialize");
        assert_eq!(cat.id().as_str(), "c9");
        assert_eq!(cat.name(), None);
    }

    #[test]
    fn test_purchasable() {
        let json = r#"{"id":"p2","name":"Pepsi","price":"15000","stock":0,"category":"c2"}"#;
        let product: Product = serde_json::from_str(json).expect("deserialize");
        assert!(!product.is_purchasable());
    }
}
