//! Account endpoints.
//!
//! - `POST /api/auth/register`: creates a customer, parent or educator account
//!   from a tagged `RegisterRequest` and signs it in (`201` + `AuthSession`).
//! - `POST /api/auth/login`: exchanges email and password for a bearer token.
//! - `GET /api/auth/me` / `PUT /api/auth/me`: the signed-in user and partial
//!   profile updates.
//! - `PUT /api/auth/password`: verifies the current password, stores the new
//!   one and ends the user's other sessions.
//! - `POST /api/auth/logout`: ends the current session.

use actix_web::web::{get, post, put, scope};
use actix_web::Scope;

mod login;
pub(crate) mod me;
pub(crate) mod password;
mod register;

const API_PATH: &str = "/api/auth";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/register", post().to(register::process))
        .route("/login", post().to(login::process))
        .route("/logout", post().to(login::logout))
        .route("/me", get().to(me::process))
        .route("/me", put().to(me::update))
        .route("/password", put().to(password::process))
}
