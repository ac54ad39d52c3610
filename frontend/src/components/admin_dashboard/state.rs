//! Runtime state of the product dashboard.

use common::inventory::DashboardStats;
use common::model::product::{Product, ProductCollection};
use yew::prelude::*;

use super::quick_edit::QuickEditForm;
use crate::dirty::compute_md5;

pub struct AdminDashboard {
    pub products: Vec<Product>,
    pub collections: Vec<ProductCollection>,
    pub loading: bool,
    pub search: String,
    /// Product ids with a stock request in flight; their buttons are disabled.
    pub pending_stock: Vec<i64>,
    pub edit_sheet_ref: NodeRef,
    pub editing: Option<QuickEditForm>,
    /// MD5 of the form as opened, compared against the live form.
    pub edit_md5: Option<String>,
    pub saving: bool,
}

impl AdminDashboard {
    pub fn new() -> Self {
        Self {
            products: Vec::new(),
            collections: Vec::new(),
            loading: true,
            search: String::new(),
            pending_stock: Vec::new(),
            edit_sheet_ref: NodeRef::default(),
            editing: None,
            edit_md5: None,
            saving: false,
        }
    }

    /// Recomputed from whatever rows are loaded, so a stock nudge shows up
    /// in the cards without another round trip.
    pub fn stats(&self) -> DashboardStats {
        DashboardStats::from_products(&self.products)
    }

    pub fn visible_products(&self) -> Vec<&Product> {
        let needle = self.search.trim().to_lowercase();
        self.products
            .iter()
            .filter(|p| {
                needle.is_empty()
                    || p.name.to_lowercase().contains(&needle)
                    || p.sku.as_deref().is_some_and(|s| s.to_lowercase().contains(&needle))
            })
            .collect()
    }

    pub fn replace_product(&mut self, product: Product) {
        match self.products.iter_mut().find(|p| p.id == product.id) {
            Some(slot) => *slot = product,
            None => self.products.insert(0, product),
        }
    }

    pub fn is_edit_dirty(&self) -> bool {
        match (&self.editing, &self.edit_md5) {
            (Some(form), Some(original)) => compute_md5(&form.fingerprint()) != *original,
            _ => false,
        }
    }
}
