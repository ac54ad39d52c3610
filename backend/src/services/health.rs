use actix_web::{HttpResponse, Responder};
use serde_json::json;

/// `GET /health`
pub(crate) async fn process() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
