//! Catalog entities: products, their collections and size/color variants.
//!
//! The product's category is the `collection_id` foreign key. Reads join the
//! collection in as `collection`; writes only ever send the id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::inventory::{StockStatus, DEFAULT_LOW_STOCK_THRESHOLD};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Inactive,
    #[default]
    Draft,
}

impl ProductStatus {
    pub const ALL: [ProductStatus; 3] = [Self::Active, Self::Inactive, Self::Draft];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Inactive => "inactive",
            ProductStatus::Draft => "draft",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProductStatus::Active),
            "inactive" => Ok(ProductStatus::Inactive),
            "draft" => Ok(ProductStatus::Draft),
            other => Err(format!("Unknown product status: {}", other)),
        }
    }
}

/// The collection a product belongs to, as joined on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionRef {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCollection {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub display_order: i64,
    #[serde(default)]
    pub product_count: i64,
}

/// The six categories every catalog starts with: `(slug, name)`.
pub const DEFAULT_COLLECTIONS: [(&str, &str); 6] = [
    ("apparel", "Apparel"),
    ("educational", "Educational Materials"),
    ("accessories", "Accessories"),
    ("stationery", "Stationery"),
    ("toys", "Toys & Games"),
    ("other", "Other"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub price: f64,
    pub sale_price: Option<f64>,
    /// Public image URLs. The first entry is the primary image.
    #[serde(default)]
    pub images: Vec<String>,
    pub stock_quantity: u32,
    pub low_stock_threshold: u32,
    pub track_inventory: bool,
    pub status: ProductStatus,
    pub featured: bool,
    pub collection_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<CollectionRef>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn in_stock(&self) -> bool {
        self.stock_quantity > 0
    }

    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// The price a customer pays: the sale price when one is set and positive.
    pub fn effective_price(&self) -> f64 {
        match self.sale_price {
            Some(sale) if sale > 0.0 => sale,
            _ => self.price,
        }
    }

    pub fn stock_status(&self) -> StockStatus {
        StockStatus::classify(self.stock_quantity, self.low_stock_threshold)
    }

    /// Builds an in-memory product with catalog defaults. Mostly useful in
    /// tests and when seeding.
    pub fn draft(id: i64, name: &str, price: f64, stock_quantity: u32) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.to_string(),
            slug: slugify(name),
            sku: None,
            description: None,
            short_description: None,
            price,
            sale_price: None,
            images: Vec::new(),
            stock_quantity,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            track_inventory: true,
            status: ProductStatus::Draft,
            featured: false,
            collection_id: None,
            collection: None,
            tags: Vec::new(),
            sizes: Vec::new(),
            colors: Vec::new(),
            metadata: serde_json::Value::Null,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: i64,
    pub product_id: i64,
    pub size: String,
    pub color: String,
    pub sku: String,
    pub price: f64,
    pub inventory_quantity: u32,
    pub is_active: bool,
}

/// Lower-cases `text` and joins its alphanumeric runs with `-`.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
