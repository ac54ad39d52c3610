//! Product collections (categories).
//!
//! - `GET /api/collections`: every collection with its product count, in
//!   display order. Public.
//! - `POST /api/collections`, `PUT/DELETE /api/collections/{id}`: admin only.
//!   Deleting a collection leaves its products uncategorised.

use actix_web::web::{delete, get, post, put, scope};
use actix_web::{web, HttpResponse, Responder, ResponseError, Scope};
use common::model::product::ProductCollection;
use common::requests::CollectionInput;

use crate::auth::AdminUser;
use crate::db::{products, Db};
use crate::error::ApiResult;

const API_PATH: &str = "/api/collections";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list))
        .route("", post().to(create))
        .route("/{id}", put().to(update))
        .route("/{id}", delete().to(remove))
}

async fn list(db: web::Data<Db>) -> impl Responder {
    match db.run(|conn| products::list_collections(conn)).await {
        Ok(collections) => HttpResponse::Ok().json(collections),
        Err(err) => err.error_response(),
    }
}

async fn save(db: web::Data<Db>, id: Option<i64>, input: CollectionInput) -> ApiResult<ProductCollection> {
    input.validate()?;
    db.run(move |conn| match id {
        Some(id) => products::update_collection(conn, id, &input),
        None => products::insert_collection(conn, &input),
    })
    .await
}

async fn create(db: web::Data<Db>, _admin: AdminUser, payload: web::Json<CollectionInput>) -> impl Responder {
    match save(db, None, payload.into_inner()).await {
        Ok(collection) => HttpResponse::Created().json(collection),
        Err(err) => err.error_response(),
    }
}

async fn update(
    db: web::Data<Db>,
    _admin: AdminUser,
    path: web::Path<i64>,
    payload: web::Json<CollectionInput>,
) -> impl Responder {
    match save(db, Some(path.into_inner()), payload.into_inner()).await {
        Ok(collection) => HttpResponse::Ok().json(collection),
        Err(err) => err.error_response(),
    }
}

async fn remove(db: web::Data<Db>, _admin: AdminUser, path: web::Path<i64>) -> impl Responder {
    let id = path.into_inner();
    match db.run(move |conn| products::delete_collection(conn, id)).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => err.error_response(),
    }
}

#[cfg(test)]
mod tests {
    use crate::services::test_support::{context, test_app};
    use actix_web::test;
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn default_collections_are_seeded_and_slugs_are_unique() {
        let ctx = context();
        let app = test_app!(ctx, super::configure_routes()).await;

        let req = test::TestRequest::get().uri("/api/collections").to_request();
        let seeded: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert!(seeded.iter().any(|c| c["slug"] == "apparel"));

        let req = test::TestRequest::post()
            .uri("/api/collections")
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .set_json(json!({ "name": "Apparel" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 409);

        let req = test::TestRequest::post()
            .uri("/api/collections")
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .set_json(json!({ "name": "Music & Drums", "display_order": 9 }))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(created["slug"], "music-drums");
        assert_eq!(created["product_count"], 0);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/collections/{}", created["id"]))
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 204);
    }
}
