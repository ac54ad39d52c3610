use common::model::product::{Product, ProductCollection};

use super::quick_edit::QuickEditField;

pub enum Msg {
    Refresh,
    ProductsLoaded(Vec<Product>),
    CollectionsLoaded(Vec<ProductCollection>),
    RequestFailed(crate::api::ApiError),
    SetSearch(String),
    /// Adds `delta` to a product's stock, server side.
    NudgeStock(i64, i64),
    ProductChanged(Product),
    OpenQuickEdit(i64),
    EditField(QuickEditField, String),
    ToggleFeatured(bool),
    SaveQuickEdit,
    CloseQuickEdit,
}
