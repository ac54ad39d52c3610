//! Checkout and order endpoints.
//!
//! Anyone can place an order; a signed-in caller gets it linked to their
//! account. Totals are always recomputed on the server from current prices
//! and stock is taken in the same transaction.
//!
//! - `POST /api/orders`: place an order, `201` with the stored order.
//! - `GET /api/orders/track/{order_number}?email=`: guest lookup.
//! - `GET /api/orders/mine`: the caller's orders, newest first.
//! - `GET /api/orders/{id}`: the owner or an admin.
//! - `PUT /api/orders/{id}/status`, `PUT /api/orders/{id}/payment`: admin.

use actix_web::web::{get, post, put, scope};
use actix_web::Scope;

mod checkout;
mod manage;

const API_PATH: &str = "/api/orders";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", post().to(checkout::process))
        .route("/track/{order_number}", get().to(checkout::track))
        .route("/mine", get().to(checkout::mine))
        .route("/{id}", get().to(manage::get_one))
        .route("/{id}/status", put().to(manage::set_status))
        .route("/{id}/payment", put().to(manage::set_payment))
}
