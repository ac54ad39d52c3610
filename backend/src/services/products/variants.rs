use actix_web::{web, HttpResponse, Responder, ResponseError};
use log::info;

use crate::auth::AdminUser;
use crate::db::{products, Db};

/// `GET /api/products/{id}/variants`
pub(crate) async fn process(db: web::Data<Db>, _admin: AdminUser, path: web::Path<i64>) -> impl Responder {
    let id = path.into_inner();
    let result = db
        .run(move |conn| {
            products::get(conn, id)?;
            products::list_variants(conn, id)
        })
        .await;
    match result {
        Ok(variants) => HttpResponse::Ok().json(variants),
        Err(err) => err.error_response(),
    }
}

/// `POST /api/products/{id}/variants/regenerate`
///
/// Replaces every variant with the current size x color cross product.
pub(crate) async fn regenerate(db: web::Data<Db>, _admin: AdminUser, path: web::Path<i64>) -> impl Responder {
    let id = path.into_inner();
    match db.run(move |conn| products::regenerate_variants(conn, id)).await {
        Ok(variants) => {
            info!("Regenerated {} variants for product {}", variants.len(), id);
            HttpResponse::Ok().json(variants)
        }
        Err(err) => err.error_response(),
    }
}
