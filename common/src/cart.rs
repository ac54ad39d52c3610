//! Shopping cart and the order pricing rules shared with the server.
//!
//! `price_order` is the only place totals are computed. The browser calls it
//! to render the cart summary and the server calls it again when the order is
//! placed, so the customer is charged what they were shown.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::validation::ValidationError;

pub const FREE_SHIPPING_THRESHOLD: f64 = 50.0;
pub const FLAT_SHIPPING: f64 = 5.99;
pub const TAX_RATE: f64 = 0.08;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PromoCode {
    Welcome10,
    Learn15,
    Freeship,
}

impl PromoCode {
    pub fn code(&self) -> &'static str {
        match self {
            PromoCode::Welcome10 => "WELCOME10",
            PromoCode::Learn15 => "LEARN15",
            PromoCode::Freeship => "FREESHIP",
        }
    }

    pub fn percent_off(&self) -> f64 {
        match self {
            PromoCode::Welcome10 => 10.0,
            PromoCode::Learn15 => 15.0,
            PromoCode::Freeship => 0.0,
        }
    }

    pub fn free_shipping(&self) -> bool {
        matches!(self, PromoCode::Freeship)
    }
}

impl fmt::Display for PromoCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for PromoCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WELCOME10" => Ok(PromoCode::Welcome10),
            "LEARN15" => Ok(PromoCode::Learn15),
            "FREESHIP" => Ok(PromoCode::Freeship),
            _ => Err(ValidationError::Invalid("Invalid promo code".to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub subtotal: f64,
    pub discount: f64,
    pub shipping: f64,
    pub tax: f64,
    pub total: f64,
    /// How much more the customer must spend for free shipping.
    pub free_shipping_remaining: f64,
    /// Progress towards free shipping in `0.0..=1.0`.
    pub free_shipping_progress: f64,
}

pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Prices an order from its merchandise subtotal.
///
/// Shipping is free from $50 or with `FREESHIP`, otherwise flat. Tax applies to
/// the discounted subtotal. An empty cart costs nothing, shipping included.
pub fn price_order(subtotal: f64, promo: Option<PromoCode>) -> PriceBreakdown {
    let subtotal = round_cents(subtotal.max(0.0));
    let discount = round_cents(promo.map_or(0.0, |p| subtotal * p.percent_off() / 100.0));
    let ships_free = subtotal >= FREE_SHIPPING_THRESHOLD || promo.is_some_and(|p| p.free_shipping());
    let shipping = if subtotal == 0.0 || ships_free { 0.0 } else { FLAT_SHIPPING };
    let tax = round_cents((subtotal - discount) * TAX_RATE);
    let total = round_cents(subtotal - discount + shipping + tax);

    PriceBreakdown {
        subtotal,
        discount,
        shipping,
        tax,
        total,
        free_shipping_remaining: round_cents((FREE_SHIPPING_THRESHOLD - subtotal).max(0.0)),
        free_shipping_progress: (subtotal / FREE_SHIPPING_THRESHOLD).min(1.0),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: i64,
    pub name: String,
    pub unit_price: f64,
    pub quantity: u32,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl CartLine {
    fn same_item(&self, product_id: i64, size: Option<&str>, color: Option<&str>) -> bool {
        self.product_id == product_id && self.size.as_deref() == size && self.color.as_deref() == color
    }

    pub fn line_total(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

/// Lines are keyed by product, size and color.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
    pub promo: Option<PromoCode>,
}

impl Cart {
    /// Adds a line, merging quantities with an existing line for the same item.
    pub fn add(&mut self, line: CartLine) {
        if line.quantity == 0 {
            return;
        }
        match self
            .lines
            .iter_mut()
            .find(|l| l.same_item(line.product_id, line.size.as_deref(), line.color.as_deref()))
        {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
            None => self.lines.push(line),
        }
    }

    /// Sets the quantity of a line. Zero removes it.
    pub fn set_quantity(&mut self, product_id: i64, size: Option<&str>, color: Option<&str>, quantity: u32) {
        if quantity == 0 {
            self.remove(product_id, size, color);
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.same_item(product_id, size, color)) {
            line.quantity = quantity;
        }
    }

    pub fn remove(&mut self, product_id: i64, size: Option<&str>, color: Option<&str>) {
        self.lines.retain(|l| !l.same_item(product_id, size, color));
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.promo = None;
    }

    pub fn apply_promo(&mut self, code: &str) -> Result<PromoCode, ValidationError> {
        let promo = code.parse::<PromoCode>()?;
        self.promo = Some(promo);
        Ok(promo)
    }

    pub fn remove_promo(&mut self) {
        self.promo = None;
    }

    pub fn item_count(&self) -> u32 {
        self.lines.iter().fold(0u32, |count, l| count.saturating_add(l.quantity))
    }

    pub fn subtotal(&self) -> f64 {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn totals(&self) -> PriceBreakdown {
        price_order(self.subtotal(), self.promo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: i64, price: f64, quantity: u32, size: Option<&str>) -> CartLine {
        CartLine {
            product_id,
            name: format!("Product {}", product_id),
            unit_price: price,
            quantity,
            size: size.map(str::to_string),
            color: None,
            image: None,
        }
    }

    #[test]
    fn adding_same_item_merges_quantities() {
        let mut cart = Cart::default();
        cart.add(line(1, 10.0, 1, Some("M")));
        cart.add(line(1, 10.0, 2, Some("M")));
        cart.add(line(1, 10.0, 1, Some("L")));
        assert_eq!(cart.lines.len(), 2);
        assert_eq!(cart.item_count(), 4);
    }

    #[test]
    fn merged_quantity_saturates() {
        let mut cart = Cart::default();
        cart.add(line(1, 10.0, u32::MAX - 1, None));
        cart.add(line(1, 10.0, 5, None));
        assert_eq!(cart.lines[0].quantity, u32::MAX);
    }

    #[test]
    fn zero_quantity_removes_line() {
        let mut cart = Cart::default();
        cart.add(line(1, 10.0, 1, None));
        cart.set_quantity(1, None, None, 3);
        assert_eq!(cart.item_count(), 3);
        cart.set_quantity(1, None, None, 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn small_order_pays_flat_shipping_and_tax() {
        let totals = price_order(20.0, None);
        assert_eq!(totals.shipping, FLAT_SHIPPING);
        assert_eq!(totals.tax, 1.6);
        assert_eq!(totals.total, 27.59);
        assert_eq!(totals.free_shipping_remaining, 30.0);
        assert_eq!(totals.free_shipping_progress, 0.4);
    }

    #[test]
    fn fifty_dollars_ships_free() {
        let totals = price_order(50.0, None);
        assert_eq!(totals.shipping, 0.0);
        assert_eq!(totals.free_shipping_remaining, 0.0);
        assert_eq!(totals.free_shipping_progress, 1.0);
    }

    #[test]
    fn percentage_promo_discounts_before_tax() {
        let totals = price_order(100.0, Some(PromoCode::Learn15));
        assert_eq!(totals.discount, 15.0);
        assert_eq!(totals.tax, 6.8);
        assert_eq!(totals.total, 91.8);
    }

    #[test]
    fn freeship_promo_waives_shipping_only() {
        let totals = price_order(10.0, Some(PromoCode::Freeship));
        assert_eq!(totals.shipping, 0.0);
        assert_eq!(totals.discount, 0.0);
    }

    #[test]
    fn empty_cart_costs_nothing() {
        assert_eq!(Cart::default().totals().total, 0.0);
    }

    #[test]
    fn promo_codes_parse_case_insensitively() {
        let mut cart = Cart::default();
        assert_eq!(cart.apply_promo(" welcome10 "), Ok(PromoCode::Welcome10));
        assert!(cart.apply_promo("HALFOFF").is_err());
        assert_eq!(cart.promo, Some(PromoCode::Welcome10));
    }
}
