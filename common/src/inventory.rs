//! Stock classification, dashboard totals and variant stock planning.
//!
//! A product with no stock is out of stock. A product at or under its
//! low-stock threshold is low. Everything else is in stock. A threshold of
//! zero means "not configured" and falls back to
//! [`DEFAULT_LOW_STOCK_THRESHOLD`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::product::Product;

pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "quantity", rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    LowStock(u32),
    InStock(u32),
}

impl StockStatus {
    pub fn classify(stock_quantity: u32, low_stock_threshold: u32) -> Self {
        let threshold = effective_threshold(low_stock_threshold);
        match stock_quantity {
            0 => StockStatus::OutOfStock,
            n if n <= threshold => StockStatus::LowStock(n),
            n => StockStatus::InStock(n),
        }
    }

    /// CSS modifier used by the dashboard badge.
    pub fn badge_class(&self) -> &'static str {
        match self {
            StockStatus::OutOfStock => "stock-out",
            StockStatus::LowStock(_) => "stock-low",
            StockStatus::InStock(_) => "stock-ok",
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockStatus::OutOfStock => write!(f, "Out of Stock"),
            StockStatus::LowStock(n) => write!(f, "Low Stock ({})", n),
            StockStatus::InStock(n) => write!(f, "In Stock ({})", n),
        }
    }
}

pub fn effective_threshold(low_stock_threshold: u32) -> u32 {
    if low_stock_threshold == 0 {
        DEFAULT_LOW_STOCK_THRESHOLD
    } else {
        low_stock_threshold
    }
}

/// Applies a `+n`/`-n` nudge from the dashboard. Stock never goes below zero.
pub fn adjust_stock(current: u32, delta: i64) -> u32 {
    (i64::from(current) + delta).clamp(0, i64::from(u32::MAX)) as u32
}

/// Headline numbers shown above the admin product table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_products: usize,
    pub low_stock: usize,
    pub out_of_stock: usize,
    pub total_value: f64,
}

impl DashboardStats {
    /// Single pass over the product list. Out-of-stock products still count
    /// towards `total_products` and contribute zero value.
    pub fn from_products(products: &[Product]) -> Self {
        products.iter().fold(Self::default(), |mut stats, product| {
            stats.total_products += 1;
            match product.stock_status() {
                StockStatus::OutOfStock => stats.out_of_stock += 1,
                StockStatus::LowStock(_) => stats.low_stock += 1,
                StockStatus::InStock(_) => {}
            }
            stats.total_value += product.price * f64::from(product.stock_quantity);
            stats
        })
    }
}

/// Availability of one requested line, as answered by the stock check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockCheckItem {
    pub product_id: i64,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_quantity: Option<u32>,
}

/// Checks a requested quantity against a product that may not exist.
/// Products that do not track inventory are always available.
pub fn check_availability(product_id: i64, product: Option<&Product>, quantity: u32) -> StockCheckItem {
    let (available, reason, available_quantity) = match product {
        None => (false, Some("Product not found".to_string()), None),
        Some(p) if !p.track_inventory || p.stock_quantity >= quantity => (true, None, None),
        Some(p) => (
            false,
            Some("Insufficient stock".to_string()),
            Some(p.stock_quantity),
        ),
    };
    StockCheckItem {
        product_id,
        available,
        reason,
        available_quantity,
    }
}

/// One size/color combination to be created for a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantPlan {
    pub size: String,
    pub color: String,
    pub sku: String,
    pub quantity: u32,
}

/// `{SKU}-{SIZE}-{COLOR}`, upper-cased with all whitespace removed.
pub fn variant_sku(base_sku: &str, size: &str, color: &str) -> String {
    format!("{}-{}-{}", base_sku, size, color)
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Splits `total_stock` across the size x color cross product.
///
/// Every variant gets `total / n` units and the first `total % n` variants get
/// one more, so the variants always add back up to the product's stock.
/// Without sizes or colors there is nothing to cross and no variants are planned.
pub fn plan_variants(
    base_sku: &str,
    sizes: &[String],
    colors: &[String],
    total_stock: u32,
) -> Vec<VariantPlan> {
    let count = sizes.len() * colors.len();
    if count == 0 {
        return Vec::new();
    }
    let count = count as u32;
    let base = total_stock / count;
    let remainder = total_stock % count;

    sizes
        .iter()
        .flat_map(|size| colors.iter().map(move |color| (size, color)))
        .enumerate()
        .map(|(index, (size, color))| VariantPlan {
            size: size.clone(),
            color: color.clone(),
            sku: variant_sku(base_sku, size, color),
            quantity: base + u32::from((index as u32) < remainder),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price: f64, stock: u32, threshold: u32) -> Product {
        let mut p = Product::draft(1, "Sample", price, stock);
        p.low_stock_threshold = threshold;
        p
    }

    #[test]
    fn zero_stock_is_out_of_stock_for_any_threshold() {
        for threshold in [0, 1, 10, 500] {
            assert_eq!(StockStatus::classify(0, threshold), StockStatus::OutOfStock);
        }
        assert_eq!(StockStatus::OutOfStock.to_string(), "Out of Stock");
    }

    #[test]
    fn at_or_under_threshold_is_low_with_exact_quantity() {
        for stock in 1..=10 {
            let status = StockStatus::classify(stock, 10);
            assert_eq!(status, StockStatus::LowStock(stock));
            assert_eq!(status.to_string(), format!("Low Stock ({})", stock));
        }
    }

    #[test]
    fn over_threshold_is_in_stock() {
        assert_eq!(StockStatus::classify(11, 10), StockStatus::InStock(11));
        assert_eq!(StockStatus::classify(6, 5).to_string(), "In Stock (6)");
    }

    #[test]
    fn unset_threshold_defaults_to_ten() {
        assert_eq!(StockStatus::classify(10, 0), StockStatus::LowStock(10));
        assert_eq!(StockStatus::classify(11, 0), StockStatus::InStock(11));
    }

    #[test]
    fn stats_count_and_value_in_one_pass() {
        let products = vec![
            product(10.0, 0, 10),
            product(2.5, 4, 10),
            product(4.0, 25, 10),
            product(100.0, 1, 0),
        ];
        let stats = DashboardStats::from_products(&products);
        assert_eq!(stats.total_products, 4);
        assert_eq!(stats.out_of_stock, 1);
        assert_eq!(stats.low_stock, 2);
        assert_eq!(stats.total_value, 2.5 * 4.0 + 4.0 * 25.0 + 100.0);
    }

    #[test]
    fn stats_of_empty_catalog_are_zero() {
        assert_eq!(DashboardStats::from_products(&[]), DashboardStats::default());
    }

    #[test]
    fn adjust_stock_clamps_at_zero() {
        assert_eq!(adjust_stock(3, -1), 2);
        assert_eq!(adjust_stock(0, -1), 0);
        assert_eq!(adjust_stock(2, -10), 0);
        assert_eq!(adjust_stock(2, 5), 7);
    }

    #[test]
    fn availability_honors_tracking_flag() {
        let mut p = product(5.0, 2, 10);
        assert!(check_availability(1, Some(&p), 2).available);

        let short = check_availability(1, Some(&p), 3);
        assert!(!short.available);
        assert_eq!(short.reason.as_deref(), Some("Insufficient stock"));
        assert_eq!(short.available_quantity, Some(2));

        p.track_inventory = false;
        assert!(check_availability(1, Some(&p), 99).available);

        let missing = check_availability(7, None, 1);
        assert_eq!(missing.reason.as_deref(), Some("Product not found"));
    }

    #[test]
    fn variant_sku_is_upper_and_compact() {
        assert_eq!(variant_sku("isp-tee", "X Large", "Forest green"), "ISP-TEE-XLARGE-FORESTGREEN");
    }

    #[test]
    fn variant_plan_preserves_total_stock() {
        let sizes = vec!["S".to_string(), "M".to_string(), "L".to_string()];
        let colors = vec!["Red".to_string(), "Blue".to_string()];
        let plan = plan_variants("TEE", &sizes, &colors, 20);

        assert_eq!(plan.len(), 6);
        assert_eq!(plan.iter().map(|v| v.quantity).sum::<u32>(), 20);
        assert_eq!(plan[0].quantity, 4);
        assert_eq!(plan[1].quantity, 4);
        assert_eq!(plan[5].quantity, 3);
        assert_eq!(plan[0].sku, "TEE-S-RED");
        assert_eq!(plan[5].sku, "TEE-L-BLUE");
    }

    #[test]
    fn variant_plan_without_sizes_is_empty() {
        assert!(plan_variants("TEE", &[], &["Red".to_string()], 5).is_empty());
    }
}
