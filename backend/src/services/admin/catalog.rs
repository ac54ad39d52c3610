use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::requests::{BulkStatusRequest, SeedCatalogRequest};
use serde_json::json;

use crate::auth::AdminUser;
use crate::db::Db;
use crate::services::products::save;

/// `POST /api/admin/products/bulk-status`
pub(crate) async fn bulk_status(
    db: web::Data<Db>,
    _admin: AdminUser,
    payload: web::Json<BulkStatusRequest>,
) -> impl Responder {
    match save::bulk_status(db, payload.into_inner()).await {
        Ok(updated) => HttpResponse::Ok().json(json!({ "updated": updated })),
        Err(err) => err.error_response(),
    }
}

/// `POST /api/admin/seed`
pub(crate) async fn seed(
    db: web::Data<Db>,
    _admin: AdminUser,
    payload: web::Json<SeedCatalogRequest>,
) -> impl Responder {
    match save::seed_catalog(db, payload.into_inner()).await {
        Ok(created) => HttpResponse::Created().json(created),
        Err(err) => err.error_response(),
    }
}

#[cfg(test)]
mod tests {
    use crate::services::test_support::{context, test_app};
    use actix_web::test;
    use serde_json::{json, Value};

    fn catalog() -> Value {
        json!({
            "products": [
                { "name": "Adinkra Tee", "price": 24.99, "stock_quantity": 12,
                  "status": "active", "collection": "apparel",
                  "sizes": ["S", "M"], "colors": ["Gold"] },
                { "name": "Story Cards", "price": 9.5, "stock_quantity": 40, "status": "draft" }
            ]
        })
    }

    #[actix_web::test]
    async fn seeding_twice_skips_existing_products() {
        let ctx = context();
        let app = test_app!(ctx, crate::services::admin::configure_routes()).await;

        let req = test::TestRequest::post()
            .uri("/api/admin/seed")
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .set_json(catalog())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let created: Vec<Value> = test::read_body_json(resp).await;
        assert_eq!(created.len(), 2);
        assert_eq!(created[0]["slug"], "adinkra-tee");
        assert_eq!(created[0]["collection"]["slug"], "apparel");

        let req = test::TestRequest::post()
            .uri("/api/admin/seed")
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .set_json(catalog())
            .to_request();
        let again: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert!(again.is_empty());

        let ids: Vec<i64> = created.iter().map(|p| p["id"].as_i64().unwrap()).collect();
        let req = test::TestRequest::post()
            .uri("/api/admin/products/bulk-status")
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .set_json(json!({ "ids": ids, "status": "inactive" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["updated"], 2);
    }

    #[actix_web::test]
    async fn seeding_into_an_unknown_collection_is_404() {
        let ctx = context();
        let app = test_app!(ctx, crate::services::admin::configure_routes()).await;
        let req = test::TestRequest::post()
            .uri("/api/admin/seed")
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .set_json(json!({ "products": [
                { "name": "Lost Hat", "price": 5.0, "collection": "hats" }
            ] }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }

    #[actix_web::test]
    async fn bulk_status_needs_a_selection() {
        let ctx = context();
        let app = test_app!(ctx, crate::services::admin::configure_routes()).await;
        let req = test::TestRequest::post()
            .uri("/api/admin/products/bulk-status")
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .set_json(json!({ "ids": [], "status": "active" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "No products selected");
    }
}
