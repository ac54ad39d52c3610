//! Blog endpoints.
//!
//! Public reads only ever see published posts. Reading a post by slug counts
//! a view. Everything under `/admin` and every write needs an admin.
//!
//! - `GET /api/blog`: published posts, newest first, `category` slug,
//!   `search`, `page`, `limit`.
//! - `GET /api/blog/featured`: up to three featured posts.
//! - `GET /api/blog/slug/{slug}`: one post plus up to three related posts.
//! - `GET/POST /api/blog/categories`: categories with post counts.
//! - `GET /api/blog/admin/all`, `GET /api/blog/admin/{id}`: drafts included.
//! - `POST /api/blog`, `PUT/DELETE /api/blog/{id}`: write posts.

use actix_web::web::{delete, get, post, put, scope};
use actix_web::Scope;

mod admin;
mod posts;

const API_PATH: &str = "/api/blog";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(posts::process))
        .route("", post().to(admin::create))
        .route("/featured", get().to(posts::featured))
        .route("/slug/{slug}", get().to(posts::by_slug))
        .route("/categories", get().to(posts::categories))
        .route("/categories", post().to(admin::create_category))
        .route("/admin/all", get().to(admin::all))
        .route("/admin/{id}", get().to(admin::get_one))
        .route("/{id}", put().to(admin::update))
        .route("/{id}", delete().to(admin::remove))
}
