use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::model::product::Product;
use common::requests::{BulkStatusRequest, ProductInput, ProductUpdate, SeedCatalogRequest, StockAdjustRequest};
use log::{info, warn};
use rusqlite::Connection;

use crate::auth::AdminUser;
use crate::db::{products, Db};
use crate::error::{ApiError, ApiResult};
use crate::storage::{BucketStore, PRODUCT_BUCKET};

/// Inserts a product and, when it has both sizes and colors, its variants.
fn insert_with_variants(conn: &mut Connection, input: &ProductInput) -> ApiResult<Product> {
    let product = products::insert(conn, input)?;
    if !product.sizes.is_empty() && !product.colors.is_empty() {
        let variants = products::regenerate_variants(conn, product.id)?;
        info!("Generated {} variants for {}", variants.len(), product.slug);
    }
    Ok(product)
}

/// `POST /api/products`
pub(crate) async fn create(
    db: web::Data<Db>,
    _admin: AdminUser,
    payload: web::Json<ProductInput>,
) -> impl Responder {
    let input = payload.into_inner();
    if let Err(err) = input.validate() {
        return ApiError::from(err).error_response();
    }
    match db.run(move |conn| insert_with_variants(conn, &input)).await {
        Ok(product) => HttpResponse::Created().json(product),
        Err(err) => err.error_response(),
    }
}

/// `PUT /api/products/{id}`
pub(crate) async fn update(
    db: web::Data<Db>,
    _admin: AdminUser,
    path: web::Path<i64>,
    payload: web::Json<ProductUpdate>,
) -> impl Responder {
    match update_product(db, path.into_inner(), payload.into_inner()).await {
        Ok(product) => HttpResponse::Ok().json(product),
        Err(err) => err.error_response(),
    }
}

async fn update_product(db: web::Data<Db>, id: i64, update: ProductUpdate) -> ApiResult<Product> {
    update.validate()?;
    let reshaped = update.sizes.is_some() || update.colors.is_some();
    db.run(move |conn| {
        let product = products::update(conn, id, &update)?;
        if reshaped {
            products::regenerate_variants(conn, id)?;
        }
        Ok(product)
    })
    .await
}

/// `DELETE /api/products/{id}`
///
/// Images stored in the product bucket go with the product; external URLs
/// are left alone.
pub(crate) async fn remove(
    db: web::Data<Db>,
    store: web::Data<BucketStore>,
    _admin: AdminUser,
    path: web::Path<i64>,
) -> impl Responder {
    let id = path.into_inner();
    let product = match db.run(move |conn| products::delete(conn, id)).await {
        Ok(product) => product,
        Err(err) => return err.error_response(),
    };
    for url in &product.images {
        if let Some(key) = store.key_from_url(PRODUCT_BUCKET, url) {
            if let Err(e) = store.remove(PRODUCT_BUCKET, key) {
                warn!("Could not remove image {} of deleted product {}: {}", key, id, e);
            }
        }
    }
    info!("Deleted product {} ({})", product.id, product.slug);
    HttpResponse::NoContent().finish()
}

/// `PATCH /api/products/{id}/stock`
pub(crate) async fn adjust_stock(
    db: web::Data<Db>,
    _admin: AdminUser,
    path: web::Path<i64>,
    payload: web::Json<StockAdjustRequest>,
) -> impl Responder {
    let id = path.into_inner();
    let delta = payload.delta;
    match db.run(move |conn| products::adjust(conn, id, delta)).await {
        Ok(product) => HttpResponse::Ok().json(product),
        Err(err) => err.error_response(),
    }
}

/// Sets the status of many products at once and returns how many changed.
pub(crate) async fn bulk_status(db: web::Data<Db>, request: BulkStatusRequest) -> ApiResult<usize> {
    request.validate()?;
    db.run(move |conn| {
        let tx = conn.transaction()?;
        let changed = products::set_status(&tx, &request.ids, request.status)?;
        tx.commit()?;
        info!("Set {} products to {}", changed, request.status.as_str());
        Ok(changed)
    })
    .await
}

/// Loads a starter catalog. Collections are given by slug; a product whose
/// slug already exists is skipped.
pub(crate) async fn seed_catalog(db: web::Data<Db>, request: SeedCatalogRequest) -> ApiResult<Vec<Product>> {
    for seed in &request.products {
        seed.product.validate()?;
    }
    db.run(move |conn| {
        let mut created = Vec::new();
        for seed in request.products {
            let mut input = seed.product;
            if let Some(slug) = seed.collection.as_deref() {
                input.collection_id = Some(
                    products::collection_id_by_slug(conn, slug)?
                        .ok_or(ApiError::NotFound("Collection"))?,
                );
            }
            match insert_with_variants(conn, &input) {
                Ok(product) => created.push(product),
                Err(ApiError::Conflict(_)) => warn!("Skipping existing product {}", input.name),
                Err(err) => return Err(err),
            }
        }
        info!("Seeded {} products", created.len());
        Ok(created)
    })
    .await
}

#[cfg(test)]
mod tests {
    use crate::services::test_support::{context, test_app};
    use actix_web::test;
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn students_cannot_write_products() {
        let ctx = context();
        let app = test_app!(ctx, crate::services::products::configure_routes()).await;
        let req = test::TestRequest::post()
            .uri("/api/products")
            .insert_header(("Authorization", ctx.student_token.as_str()))
            .set_json(json!({ "name": "Nope", "price": 1.0 }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 403);

        let req = test::TestRequest::post()
            .uri("/api/products")
            .set_json(json!({ "name": "Nope", "price": 1.0 }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 401);
    }

    fn stock_total(variants: &[Value]) -> i64 {
        variants
            .iter()
            .map(|v| v["inventory_quantity"].as_i64().unwrap())
            .sum()
    }

    #[actix_web::test]
    async fn unknown_collection_is_a_bad_request() {
        let ctx = context();
        let app = test_app!(ctx, crate::services::products::configure_routes()).await;
        let req = test::TestRequest::post()
            .uri("/api/products")
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .set_json(json!({ "name": "Lost Tee", "price": 10.0, "collection_id": 9999 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Unknown collection");

        let req = test::TestRequest::post()
            .uri("/api/products")
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .set_json(json!({ "name": "Found Tee", "price": 10.0 }))
            .to_request();
        let product: Value = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::put()
            .uri(&format!("/api/products/{}", product["id"]))
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .set_json(json!({ "collection_id": 9999 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Unknown collection");
    }

    #[actix_web::test]
    async fn variant_stock_follows_product_stock() {
        let ctx = context();
        let app = test_app!(ctx, crate::services::products::configure_routes()).await;
        let req = test::TestRequest::post()
            .uri("/api/products")
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .set_json(json!({
                "name": "Kente Cap",
                "price": 18.0,
                "stock_quantity": 7,
                "sizes": ["S", "M"],
                "colors": ["Red", "Blue"]
            }))
            .to_request();
        let product: Value = test::call_and_read_body_json(&app, req).await;
        let id = product["id"].as_i64().unwrap();
        let variants_uri = format!("/api/products/{}/variants", id);

        let req = test::TestRequest::get()
            .uri(&variants_uri)
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .to_request();
        let before: Vec<Value> = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::put()
            .uri(&format!("/api/products/{}", id))
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .set_json(json!({ "stock_quantity": 100, "price": 20.0 }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);

        let req = test::TestRequest::get()
            .uri(&variants_uri)
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .to_request();
        let after: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(stock_total(&after), 100);
        assert_eq!(after[0]["id"], before[0]["id"]);
        assert_eq!(after[0]["price"], 20.0);

        let req = test::TestRequest::patch()
            .uri(&format!("/api/products/{}/stock", id))
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .set_json(json!({ "delta": -1 }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);

        let req = test::TestRequest::get()
            .uri(&variants_uri)
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .to_request();
        let nudged: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(stock_total(&nudged), 99);
    }

    #[actix_web::test]
    async fn create_generates_variants_and_stock_clamps_at_zero() {
        let ctx = context();
        let app = test_app!(ctx, crate::services::products::configure_routes()).await;
        let req = test::TestRequest::post()
            .uri("/api/products")
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .set_json(json!({
                "name": "Ankara Hoodie",
                "sku": "ank-hd",
                "price": 45.0,
                "stock_quantity": 7,
                "sizes": ["S", "M"],
                "colors": ["Blue", "Gold"]
            }))
            .to_request();
        let product: Value = test::call_and_read_body_json(&app, req).await;
        let id = product["id"].as_i64().unwrap();

        let req = test::TestRequest::get()
            .uri(&format!("/api/products/{}/variants", id))
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .to_request();
        let variants: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        let quantities: Vec<i64> = variants
            .iter()
            .map(|v| v["inventory_quantity"].as_i64().unwrap())
            .collect();
        assert_eq!(quantities, vec![2, 2, 2, 1]);
        assert_eq!(variants[0]["sku"], "ANK-HD-S-BLUE");

        let req = test::TestRequest::patch()
            .uri(&format!("/api/products/{}/stock", id))
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .set_json(json!({ "delta": -10 }))
            .to_request();
        let adjusted: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(adjusted["stock_quantity"], 0);

        let req = test::TestRequest::put()
            .uri(&format!("/api/products/{}", id))
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .set_json(json!({ "price": -1.0 }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/products/{}", id))
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 204);

        let req = test::TestRequest::get()
            .uri(&format!("/api/products/{}", id))
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }
}
