//! Admin back office under `/api/admin`. Every route needs an admin token.
//!
//! - `GET /dashboard`: stock headline numbers, order counts by status,
//!   revenue from paid orders and the five latest orders.
//! - `GET /orders`: every order, newest first.
//! - `GET /products`: every product in every status, without paging.
//! - `POST /products/bulk-status`: `{ids, status}` for many products at once.
//! - `POST /seed`: load a starter catalog; existing slugs are skipped.
//! - `POST /users/{id}/lessons`: credit completed lessons as loyalty points.

use actix_web::web::{get, post, scope};
use actix_web::Scope;

mod catalog;
mod dashboard;
mod members;

const API_PATH: &str = "/api/admin";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/dashboard", get().to(dashboard::process))
        .route("/orders", get().to(dashboard::orders))
        .route("/products", get().to(dashboard::products))
        .route("/products/bulk-status", post().to(catalog::bulk_status))
        .route("/seed", post().to(catalog::seed))
        .route("/users/{id}/lessons", post().to(members::credit_lessons))
}
