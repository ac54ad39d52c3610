//! Media library endpoints.
//!
//! Listing and fetching are public; everything else needs an admin. Files
//! live in the `media` bucket under `{folder}/{timestamp}-{tag}-{name}` and every
//! upload goes through the same compression pipeline as the browser runs.
//!
//! - `GET /api/media`: search, folder and MIME prefix filters, paged.
//! - `GET /api/media/folders`: folder names with item counts.
//! - `GET /api/media/policy`: the configured upload policy.
//! - `POST /api/media/upload`: multipart `file` plus optional `folder`.
//! - `POST /api/media/upload-url`: import an image from a URL.
//! - `GET/PUT/DELETE /api/media/{id}`: fetch, edit metadata, delete.
//! - `POST /api/media/{id}/analyze`: AI metadata suggestion as a background
//!   job. Answers `202` with the job id.
//! - `POST /api/media/scan-imports`: background job that adds rows for files
//!   already in the bucket.

use actix_web::web::{delete, get, post, put, scope};
use actix_web::Scope;

mod analyze;
mod edit;
mod list;
mod upload;

const API_PATH: &str = "/api/media";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list::process))
        .route("/folders", get().to(list::folders))
        .route("/policy", get().to(list::policy))
        .route("/upload", post().to(upload::process))
        .route("/upload-url", post().to(upload::from_url))
        .route("/scan-imports", post().to(analyze::scan_imports))
        .route("/{id}", get().to(list::get_one))
        .route("/{id}", put().to(edit::process))
        .route("/{id}", delete().to(edit::remove))
        .route("/{id}/analyze", post().to(analyze::process))
}
