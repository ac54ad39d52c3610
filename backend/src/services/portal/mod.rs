//! Student portal under `/api/portal/student`.
//!
//! Every route needs a bearer token for a student, parent or admin.
//!
//! - `GET/PUT /profile`: account details plus notification preferences.
//! - `GET/PUT /preferences`: notification preferences alone.
//! - `PUT /password`: change password; other sessions are signed out.
//! - `GET /notifications`: latest notifications with the unread count.
//! - `PUT /notifications/{id}/read`, `PUT /notifications/read-all`.
//! - `GET /loyalty`: tier, balance, progress and the reward catalog.
//! - `POST /loyalty/redeem`: spend points on a reward.

use actix_web::web::{get, post, put, scope};
use actix_web::Scope;

mod loyalty;
mod notifications;
mod profile;

const API_PATH: &str = "/api/portal/student";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/profile", get().to(profile::process))
        .route("/profile", put().to(profile::update))
        .route("/preferences", get().to(profile::preferences))
        .route("/preferences", put().to(profile::update_preferences))
        .route("/password", put().to(profile::change_password))
        .route("/notifications", get().to(notifications::process))
        .route("/notifications/read-all", put().to(notifications::read_all))
        .route("/notifications/{id}/read", put().to(notifications::read_one))
        .route("/loyalty", get().to(loyalty::process))
        .route("/loyalty/redeem", post().to(loyalty::redeem))
}
