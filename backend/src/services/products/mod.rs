//! Product catalog endpoints.
//!
//! Reads are public and see active products only; admins (by bearer token)
//! see every status. Writes require an admin.
//!
//! - `GET /api/products`: filter by `collection` slug, `status`, `featured`,
//!   `search`, sorted by `sort`, paged with `limit`/`offset`.
//! - `GET /api/products/slug/{slug}`: one product with up to four related
//!   products from its collection.
//! - `POST /api/products/check-stock`: availability of each requested line.
//! - `POST/PUT/DELETE /api/products[/{id}]`: create, quick-edit, delete.
//! - `PATCH /api/products/{id}/stock`: apply a `±delta`, clamped at zero.
//! - `/api/products/{id}/images`: upload through the compression pipeline,
//!   remove, and choose the primary image.
//! - `/api/products/{id}/variants`: list and regenerate size x color variants.

use actix_web::web::{delete, get, patch, post, put, scope};
use actix_web::Scope;

mod images;
mod list;
pub(crate) mod save;
mod variants;

const API_PATH: &str = "/api/products";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list::process))
        .route("", post().to(save::create))
        .route("/check-stock", post().to(list::check_stock))
        .route("/slug/{slug}", get().to(list::by_slug))
        .route("/{id}", get().to(list::get_one))
        .route("/{id}", put().to(save::update))
        .route("/{id}", delete().to(save::remove))
        .route("/{id}/stock", patch().to(save::adjust_stock))
        .route("/{id}/images", post().to(images::upload))
        .route("/{id}/images", delete().to(images::remove))
        .route("/{id}/images/primary", put().to(images::set_primary))
        .route("/{id}/variants", get().to(variants::process))
        .route("/{id}/variants/regenerate", post().to(variants::regenerate))
}
