//! Typed quick-edit form for one product row.
//!
//! Inputs are held as text while the admin types and only parsed on save.
//! The category is the collection id; nothing is written into metadata.

use common::model::product::{Product, ProductStatus};
use common::requests::ProductUpdate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickEditField {
    Name,
    Sku,
    Price,
    SalePrice,
    StockQuantity,
    LowStockThreshold,
    Status,
    Collection,
    Description,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickEditForm {
    pub product_id: i64,
    pub name: String,
    pub sku: String,
    pub price: String,
    pub sale_price: String,
    pub stock_quantity: String,
    pub low_stock_threshold: String,
    pub status: ProductStatus,
    pub featured: bool,
    pub collection_id: Option<i64>,
    pub description: String,
}

fn parse_amount(label: &str, raw: &str) -> Result<f64, String> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| format!("{} must be a non-negative number", label))
}

fn parse_count(label: &str, raw: &str) -> Result<u32, String> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| format!("{} must be a whole number", label))
}

impl QuickEditForm {
    pub fn from_product(product: &Product) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            sku: product.sku.clone().unwrap_or_default(),
            price: format!("{:.2}", product.price),
            sale_price: product.sale_price.map(|p| format!("{:.2}", p)).unwrap_or_default(),
            stock_quantity: product.stock_quantity.to_string(),
            low_stock_threshold: product.low_stock_threshold.to_string(),
            status: product.status,
            featured: product.featured,
            collection_id: product.collection_id,
            description: product.description.clone().unwrap_or_default(),
        }
    }

    pub fn set(&mut self, field: QuickEditField, value: &str) {
        match field {
            QuickEditField::Name => self.name = value.to_string(),
            QuickEditField::Sku => self.sku = value.to_string(),
            QuickEditField::Price => self.price = value.to_string(),
            QuickEditField::SalePrice => self.sale_price = value.to_string(),
            QuickEditField::StockQuantity => self.stock_quantity = value.to_string(),
            QuickEditField::LowStockThreshold => self.low_stock_threshold = value.to_string(),
            QuickEditField::Status => {
                if let Ok(status) = value.parse() {
                    self.status = status;
                }
            }
            QuickEditField::Collection => self.collection_id = value.parse().ok(),
            QuickEditField::Description => self.description = value.to_string(),
        }
    }

    /// Fingerprint of the current values, for dirty tracking.
    pub fn fingerprint(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Builds the update sent to `PUT /api/products/{id}`. An empty sale
    /// price or SKU clears it.
    pub fn to_update(&self) -> Result<ProductUpdate, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Product name is required".to_string());
        }
        let sale_price = match self.sale_price.trim() {
            "" => None,
            raw => Some(parse_amount("Sale price", raw)?),
        };
        let update = ProductUpdate {
            name: Some(name.to_string()),
            sku: Some(self.sku.trim().to_string()),
            description: Some(self.description.trim().to_string()),
            price: Some(parse_amount("Price", &self.price)?),
            sale_price: Some(sale_price),
            stock_quantity: Some(parse_count("Stock", &self.stock_quantity)?),
            low_stock_threshold: Some(parse_count("Low stock threshold", &self.low_stock_threshold)?),
            status: Some(self.status),
            featured: Some(self.featured),
            collection_id: Some(self.collection_id),
            ..ProductUpdate::default()
        };
        update.validate().map_err(|e| e.to_string())?;
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> QuickEditForm {
        let mut product = Product::draft(3, "Kente Scarf", 15.0, 4);
        product.collection_id = Some(2);
        QuickEditForm::from_product(&product)
    }

    #[test]
    fn update_carries_collection_id_and_clears_empty_sale_price() {
        let mut form = form();
        form.set(QuickEditField::Price, "18.5");
        form.set(QuickEditField::Collection, "5");
        let update = form.to_update().unwrap();
        assert_eq!(update.price, Some(18.5));
        assert_eq!(update.collection_id, Some(Some(5)));
        assert_eq!(update.sale_price, Some(None));
        assert_eq!(update.stock_quantity, Some(4));
    }

    #[test]
    fn emptied_sku_is_sent_as_a_clear() {
        let mut form = form();
        form.set(QuickEditField::Sku, " KS-01 ");
        assert_eq!(form.to_update().unwrap().sku.as_deref(), Some("KS-01"));
        form.set(QuickEditField::Sku, "   ");
        assert_eq!(form.to_update().unwrap().sku.as_deref(), Some(""));
    }

    #[test]
    fn uncategorised_selection_clears_the_collection() {
        let mut form = form();
        form.set(QuickEditField::Collection, "");
        assert_eq!(form.to_update().unwrap().collection_id, Some(None));
    }

    #[test]
    fn bad_numbers_are_reported_before_any_request() {
        let mut form = form();
        form.set(QuickEditField::StockQuantity, "-2");
        assert_eq!(form.to_update().unwrap_err(), "Stock must be a whole number");
        form.set(QuickEditField::StockQuantity, "2");
        form.set(QuickEditField::Price, "abc");
        assert_eq!(form.to_update().unwrap_err(), "Price must be a non-negative number");
    }

    #[test]
    fn fingerprint_changes_with_any_field() {
        let mut form = form();
        let before = form.fingerprint();
        form.featured = !form.featured;
        assert_ne!(before, form.fingerprint());
    }
}
