//! Request payloads exchanged between the client and the REST backend.
//!
//! Every payload that carries user input has a `validate()` that the client
//! calls before sending and the server calls again on receipt.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::cart::PromoCode;
use crate::inventory::StockCheckItem;
use crate::model::order::{Address, OrderStatus, PaymentStatus};
use crate::model::product::ProductStatus;
use crate::model::user::Role;
use crate::validation::{check_email, check_new_password, require, ValidationError, MIN_PASSWORD_LEN};

/// Distinguishes "field absent" (`None`) from "field set to null" (`Some(None)`).
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ---- auth -----------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildDetails {
    pub child_first_name: String,
    pub child_last_name: String,
    pub child_age: u8,
    pub language_interest: String,
    pub current_level: String,
    #[serde(default)]
    pub goals: Option<String>,
    #[serde(default)]
    pub preferred_schedule: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducatorDetails {
    pub language_interest: String,
}

/// What kind of account is being opened, with the details that kind needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "account_type", rename_all = "lowercase")]
pub enum AccountDetails {
    Customer,
    Parent(ChildDetails),
    Educator(EducatorDetails),
}

impl AccountDetails {
    pub fn role(&self) -> Role {
        match self {
            AccountDetails::Customer => Role::Customer,
            AccountDetails::Parent(_) => Role::Parent,
            AccountDetails::Educator(_) => Role::Educator,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub how_heard: Option<String>,
    #[serde(default)]
    pub subscribe_newsletter: bool,
    pub account: AccountDetails,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&[
            ("email", &self.email),
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
        ])?;
        check_email(&self.email)?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort);
        }
        match &self.account {
            AccountDetails::Customer => Ok(()),
            AccountDetails::Parent(child) => require(&[
                ("child_first_name", &child.child_first_name),
                ("child_last_name", &child.child_last_name),
                ("language_interest", &child.language_interest),
                ("current_level", &child.current_level),
            ]),
            AccountDetails::Educator(educator) => {
                require(&[("language_interest", &educator.language_interest)])
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&[("email", &self.email), ("password", &self.password)])?;
        check_email(&self.email)
    }
}

/// Partial profile update. Absent fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [("first_name", &self.first_name), ("last_name", &self.last_name)] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(ValidationError::MissingFields(vec![field]));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    /// Checked when present; the API accepts requests without it.
    #[serde(default)]
    pub confirm_password: Option<String>,
}

impl ChangePasswordRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&[("current_password", &self.current_password)])?;
        let confirmation = self.confirm_password.as_deref().unwrap_or(&self.new_password);
        check_new_password(&self.new_password, confirmation)
    }
}

// ---- catalog --------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    Featured,
    PriceAsc,
    PriceDesc,
    Newest,
    Name,
}

impl ProductSort {
    pub fn order_by(&self) -> &'static str {
        match self {
            ProductSort::Featured => "p.featured DESC, p.created_at DESC",
            ProductSort::PriceAsc => "p.price ASC",
            ProductSort::PriceDesc => "p.price DESC",
            ProductSort::Newest => "p.created_at DESC",
            ProductSort::Name => "p.name ASC",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductQuery {
    /// Collection slug.
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub status: Option<ProductStatus>,
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: Option<ProductSort>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

fn check_price(field: &str, price: f64) -> Result<(), ValidationError> {
    if price.is_finite() && price >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::Invalid(format!("{} must be a non-negative number", field)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    /// Derived from the name when left empty.
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub short_description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub sale_price: Option<f64>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub stock_quantity: u32,
    #[serde(default)]
    pub low_stock_threshold: Option<u32>,
    #[serde(default = "default_true")]
    pub track_inventory: bool,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub collection_id: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

fn default_true() -> bool {
    true
}

impl ProductInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&[("name", &self.name)])?;
        check_price("price", self.price)?;
        if let Some(sale) = self.sale_price {
            check_price("sale_price", sale)?;
        }
        Ok(())
    }
}

/// Quick-edit payload. Only the fields present are written; last write wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub sale_price: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_stock_threshold: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_inventory: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProductStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub collection_id: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
}

impl ProductUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ValidationError::MissingFields(vec!["name"]));
        }
        if let Some(price) = self.price {
            check_price("price", price)?;
        }
        if let Some(Some(sale)) = self.sale_price {
            check_price("sale_price", sale)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustRequest {
    pub delta: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkStatusRequest {
    pub ids: Vec<i64>,
    pub status: ProductStatus,
}

impl BulkStatusRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.ids.is_empty() {
            return Err(ValidationError::Invalid("No products selected".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockCheckLine {
    pub product_id: i64,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockCheckRequest {
    pub items: Vec<StockCheckLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockCheckResponse {
    pub all_available: bool,
    pub items: Vec<StockCheckItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionInput {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub display_order: Option<i64>,
}

impl CollectionInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&[("name", &self.name)])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryImageRequest {
    pub url: String,
}

/// A product to seed, placed in a collection by slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedProduct {
    #[serde(flatten)]
    pub product: ProductInput,
    #[serde(default)]
    pub collection: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedCatalogRequest {
    pub products: Vec<SeedProduct>,
}

// ---- media ----------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub folder: Option<String>,
    /// MIME prefix such as `image` or `image/png`.
    #[serde(default, rename = "type")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub folder: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadUrlRequest {
    pub url: String,
    #[serde(default)]
    pub folder: Option<String>,
}

impl UploadUrlRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let url = self.url.trim();
        if url.starts_with("http://") || url.starts_with("https://") {
            Ok(())
        } else {
            Err(ValidationError::Invalid("A valid http(s) URL is required".to_string()))
        }
    }
}

// ---- blog -----------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogQuery {
    /// Category slug.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlogPostInput {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
}

impl BlogPostInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&[("title", &self.title), ("slug", &self.slug)])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlogPostUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<i64>>,
    #[serde(default)]
    pub is_published: Option<bool>,
    #[serde(default)]
    pub is_featured: Option<bool>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogCategoryInput {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl BlogCategoryInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&[("name", &self.name)])
    }
}

// ---- orders ---------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Card,
    Paypal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: i64,
    pub quantity: u32,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_email: String,
    pub customer_first_name: String,
    pub customer_last_name: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    pub shipping_address: Address,
    #[serde(default)]
    pub billing_address: Option<Address>,
    pub items: Vec<OrderLineRequest>,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

impl CreateOrderRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let address = &self.shipping_address;
        require(&[
            ("customer_email", &self.customer_email),
            ("customer_first_name", &self.customer_first_name),
            ("customer_last_name", &self.customer_last_name),
            ("address", &address.address),
            ("city", &address.city),
            ("state", &address.state),
            ("zip_code", &address.zip_code),
        ])?;
        check_email(&self.customer_email)?;
        if self.items.is_empty() {
            return Err(ValidationError::Invalid("Your cart is empty".to_string()));
        }
        if self.items.iter().any(|item| item.quantity == 0) {
            return Err(ValidationError::Invalid("Item quantities must be at least 1".to_string()));
        }
        self.promo()?;
        Ok(())
    }

    pub fn promo(&self) -> Result<Option<PromoCode>, ValidationError> {
        self.coupon_code
            .as_deref()
            .filter(|code| !code.trim().is_empty())
            .map(str::parse)
            .transpose()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
    #[serde(default)]
    pub tracking_number: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatusUpdate {
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackOrderQuery {
    pub email: String,
}

// ---- portal ---------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemRequest {
    pub reward_id: String,
}

/// Admin credit for lessons a member completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonCreditRequest {
    pub lessons: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> CreateOrderRequest {
        CreateOrderRequest {
            customer_email: "parent@example.com".into(),
            customer_first_name: "Ada".into(),
            customer_last_name: "Obi".into(),
            customer_phone: None,
            shipping_address: Address {
                address: "1 Market St".into(),
                apartment: None,
                city: "Lagos".into(),
                state: "LA".into(),
                zip_code: "100001".into(),
                country: "NG".into(),
            },
            billing_address: None,
            items: vec![OrderLineRequest { product_id: 1, quantity: 2, size: None, color: None }],
            coupon_code: None,
            payment_method: PaymentMethod::Card,
        }
    }

    #[test]
    fn order_requires_items_and_known_coupon() {
        assert!(order().validate().is_ok());

        let mut empty = order();
        empty.items.clear();
        assert!(empty.validate().is_err());

        let mut coupon = order();
        coupon.coupon_code = Some("learn15".into());
        assert_eq!(coupon.promo(), Ok(Some(PromoCode::Learn15)));
        coupon.coupon_code = Some("BOGUS".into());
        assert!(coupon.validate().is_err());
        coupon.coupon_code = Some("  ".into());
        assert_eq!(coupon.promo(), Ok(None));
    }

    #[test]
    fn register_request_is_tagged_by_account_type() {
        let json = r#"{
            "email": "educator@example.com",
            "password": "supersecret",
            "first_name": "Kofi",
            "last_name": "Mensah",
            "account": { "account_type": "educator", "language_interest": "twi" }
        }"#;
        let request: RegisterRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.account.role(), Role::Educator);
        assert!(request.validate().is_ok());

        let mut short = request.clone();
        short.password = "short".into();
        assert_eq!(short.validate(), Err(ValidationError::PasswordTooShort));
    }

    #[test]
    fn product_update_distinguishes_null_from_absent() {
        let clear: ProductUpdate = serde_json::from_str(r#"{"collection_id": null}"#).unwrap();
        assert_eq!(clear.collection_id, Some(None));

        let untouched: ProductUpdate = serde_json::from_str(r#"{"price": 12.5}"#).unwrap();
        assert_eq!(untouched.collection_id, None);
        assert_eq!(untouched.price, Some(12.5));

        let negative = ProductUpdate { price: Some(-1.0), ..Default::default() };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn password_change_checks_confirmation_when_given() {
        let mut request = ChangePasswordRequest {
            current_password: "oldpassword".into(),
            new_password: "newpassword".into(),
            confirm_password: None,
        };
        assert!(request.validate().is_ok());
        request.confirm_password = Some("other".into());
        assert_eq!(request.validate(), Err(ValidationError::PasswordMismatch));
    }
}
