use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use chrono::Utc;
use common::model::product::Product;
use common::requests::PrimaryImageRequest;
use log::info;
use serde::Deserialize;

use crate::auth::AdminUser;
use crate::config::ServerConfig;
use crate::db::{products, Db};
use crate::error::{ApiError, ApiResult};
use crate::storage::{unique_tag, BucketStore, PRODUCT_BUCKET};
use crate::uploads;

#[derive(Deserialize)]
pub(crate) struct ImageQuery {
    url: String,
}

/// `POST /api/products/{id}/images`
pub(crate) async fn upload(
    db: web::Data<Db>,
    store: web::Data<BucketStore>,
    config: web::Data<ServerConfig>,
    _admin: AdminUser,
    path: web::Path<i64>,
    payload: Multipart,
) -> impl Responder {
    match upload_image(db, store, config, path.into_inner(), payload).await {
        Ok(product) => HttpResponse::Created().json(product),
        Err(err) => err.error_response(),
    }
}

async fn upload_image(
    db: web::Data<Db>,
    store: web::Data<BucketStore>,
    config: web::Data<ServerConfig>,
    id: i64,
    payload: Multipart,
) -> ApiResult<Product> {
    let product = db.run(move |conn| products::get(conn, id)).await?;
    let policy = config.upload_policy();
    let form = uploads::read_form(payload, &policy, config.max_request_bytes()).await?;
    let image = uploads::prepare(policy, form.bytes, form.content_type).await?;

    let key = format!(
        "products/{}-{}-{}.{}",
        product.slug,
        Utc::now().timestamp_millis(),
        unique_tag(),
        image.extension()
    );
    let slug = product.slug;
    web::block(move || {
        store.put_recorded(PRODUCT_BUCKET, &key, &image.bytes, |url| {
            info!("Stored image {} for product {}", url, slug);
            db.run_blocking(|conn| {
                let mut images = products::get(conn, id)?.images;
                images.push(url);
                products::set_images(conn, id, &images)
            })
        })
    })
    .await?
}

/// `DELETE /api/products/{id}/images?url=`
pub(crate) async fn remove(
    db: web::Data<Db>,
    store: web::Data<BucketStore>,
    _admin: AdminUser,
    path: web::Path<i64>,
    query: web::Query<ImageQuery>,
) -> impl Responder {
    match remove_image(db, store, path.into_inner(), query.into_inner().url).await {
        Ok(product) => HttpResponse::Ok().json(product),
        Err(err) => err.error_response(),
    }
}

async fn remove_image(
    db: web::Data<Db>,
    store: web::Data<BucketStore>,
    id: i64,
    url: String,
) -> ApiResult<Product> {
    let removed = url.clone();
    let product = db
        .run(move |conn| {
            let product = products::get(conn, id)?;
            if !product.images.contains(&removed) {
                return Err(ApiError::NotFound("Image"));
            }
            let images: Vec<String> = product.images.into_iter().filter(|u| *u != removed).collect();
            products::set_images(conn, id, &images)
        })
        .await?;

    if let Some(key) = store.key_from_url(PRODUCT_BUCKET, &url) {
        store.remove(PRODUCT_BUCKET, key)?;
    }
    Ok(product)
}

/// `PUT /api/products/{id}/images/primary`
pub(crate) async fn set_primary(
    db: web::Data<Db>,
    _admin: AdminUser,
    path: web::Path<i64>,
    payload: web::Json<PrimaryImageRequest>,
) -> impl Responder {
    let id = path.into_inner();
    let url = payload.into_inner().url;
    let result = db
        .run(move |conn| {
            let mut images = products::get(conn, id)?.images;
            let position = images
                .iter()
                .position(|u| *u == url)
                .ok_or_else(|| ApiError::BadRequest("Image does not belong to this product".to_string()))?;
            let primary = images.remove(position);
            images.insert(0, primary);
            products::set_images(conn, id, &images)
        })
        .await;
    match result {
        Ok(product) => HttpResponse::Ok().json(product),
        Err(err) => err.error_response(),
    }
}

#[cfg(test)]
mod tests {
    use crate::services::test_support::{context, multipart_body, test_app};
    use actix_web::test;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use serde_json::{json, Value};
    use std::io::Cursor;

    fn tiny_png() -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::new(3, 2))
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[actix_web::test]
    async fn upload_appends_and_primary_reorders() {
        let ctx = context();
        let app = test_app!(ctx, crate::services::products::configure_routes()).await;
        let req = test::TestRequest::post()
            .uri("/api/products")
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .set_json(json!({ "name": "Story Book", "price": 15.0, "images": ["https://cdn.example.com/cover.jpg"] }))
            .to_request();
        let product: Value = test::call_and_read_body_json(&app, req).await;
        let id = product["id"].as_i64().unwrap();

        let (content_type, body) = multipart_body("page.png", "image/png", &tiny_png());
        let req = test::TestRequest::post()
            .uri(&format!("/api/products/{}/images", id))
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .insert_header(("Content-Type", content_type))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let updated: Value = test::read_body_json(resp).await;
        let images = updated["images"].as_array().unwrap();
        assert_eq!(images.len(), 2);
        let stored = images[1].as_str().unwrap().to_string();
        assert!(stored.starts_with("/uploads/ispeak-products/products/story-book-"));
        assert!(stored.ends_with(".png"));

        let req = test::TestRequest::put()
            .uri(&format!("/api/products/{}/images/primary", id))
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .set_json(json!({ "url": stored }))
            .to_request();
        let reordered: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(reordered["images"][0], stored.as_str());

        let req = test::TestRequest::delete()
            .uri(&format!("/api/products/{}/images?url={}", id, stored))
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .to_request();
        let trimmed: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(trimmed["images"], json!(["https://cdn.example.com/cover.jpg"]));
        let key = stored.trim_start_matches("/uploads/ispeak-products/");
        assert!(!ctx.store.root().join("ispeak-products").join(key).exists());
    }

    #[actix_web::test]
    async fn unsupported_type_is_refused_before_storing() {
        let ctx = context();
        let app = test_app!(ctx, crate::services::products::configure_routes()).await;
        let req = test::TestRequest::post()
            .uri("/api/products")
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .set_json(json!({ "name": "Flag", "price": 5.0 }))
            .to_request();
        let product: Value = test::call_and_read_body_json(&app, req).await;

        let (content_type, body) = multipart_body("flag.gif", "image/gif", b"GIF89a");
        let req = test::TestRequest::post()
            .uri(&format!("/api/products/{}/images", product["id"]))
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .insert_header(("Content-Type", content_type))
            .set_payload(body)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 415);
        assert!(ctx.store.list("ispeak-products").unwrap().is_empty());
    }
}
