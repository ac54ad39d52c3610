use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::inventory::check_availability;
use common::model::product::{Product, ProductStatus};
use common::model::user::Role;
use common::requests::{ProductQuery, StockCheckRequest, StockCheckResponse};
use serde::Serialize;

use crate::auth::OptionalUser;
use crate::db::{products, Db};
use crate::error::{ApiError, ApiResult};

const RELATED_LIMIT: u32 = 4;

#[derive(Serialize)]
struct ProductDetail {
    #[serde(flatten)]
    product: Product,
    related: Vec<Product>,
}

fn is_admin(caller: &OptionalUser) -> bool {
    caller.0.as_ref().is_some_and(|user| user.role == Role::Admin)
}

/// `GET /api/products`
pub(crate) async fn process(
    db: web::Data<Db>,
    caller: OptionalUser,
    query: web::Query<ProductQuery>,
) -> impl Responder {
    let public = !is_admin(&caller);
    let query = query.into_inner();
    match db.run(move |conn| products::list(conn, &query, public)).await {
        Ok(products) => HttpResponse::Ok().json(products),
        Err(err) => err.error_response(),
    }
}

/// `GET /api/products/{id}`
pub(crate) async fn get_one(
    db: web::Data<Db>,
    caller: OptionalUser,
    path: web::Path<i64>,
) -> impl Responder {
    let admin = is_admin(&caller);
    let id = path.into_inner();
    let result = db
        .run(move |conn| {
            let product = products::get(conn, id)?;
            if !admin && product.status != ProductStatus::Active {
                return Err(ApiError::NotFound("Product"));
            }
            Ok(product)
        })
        .await;
    match result {
        Ok(product) => HttpResponse::Ok().json(product),
        Err(err) => err.error_response(),
    }
}

/// `GET /api/products/slug/{slug}`
pub(crate) async fn by_slug(db: web::Data<Db>, path: web::Path<String>) -> impl Responder {
    match product_detail(db, path.into_inner()).await {
        Ok(detail) => HttpResponse::Ok().json(detail),
        Err(err) => err.error_response(),
    }
}

async fn product_detail(db: web::Data<Db>, slug: String) -> ApiResult<ProductDetail> {
    db.run(move |conn| {
        let product =
            products::find_active_by_slug(conn, &slug)?.ok_or(ApiError::NotFound("Product"))?;
        let related = products::related(conn, &product, RELATED_LIMIT)?;
        Ok(ProductDetail { product, related })
    })
    .await
}

/// `POST /api/products/check-stock`
pub(crate) async fn check_stock(
    db: web::Data<Db>,
    payload: web::Json<StockCheckRequest>,
) -> impl Responder {
    match stock_check(db, payload.into_inner()).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(err) => err.error_response(),
    }
}

async fn stock_check(db: web::Data<Db>, request: StockCheckRequest) -> ApiResult<StockCheckResponse> {
    if request.items.is_empty() {
        return Err(ApiError::BadRequest("No items to check".to_string()));
    }
    db.run(move |conn| {
        let mut items = Vec::with_capacity(request.items.len());
        for line in &request.items {
            let product = products::find(conn, line.product_id)?
                .filter(|p| p.status == ProductStatus::Active);
            items.push(check_availability(line.product_id, product.as_ref(), line.quantity));
        }
        Ok(StockCheckResponse {
            all_available: items.iter().all(|item| item.available),
            items,
        })
    })
    .await
}

#[cfg(test)]
mod tests {
    use crate::services::test_support::{context, test_app};
    use actix_web::test;
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn drafts_are_hidden_from_the_public_but_not_from_admins() {
        let ctx = context();
        let app = test_app!(ctx, crate::services::products::configure_routes()).await;

        for (name, status) in [("Adire Scarf", "active"), ("Secret Drop", "draft")] {
            let req = test::TestRequest::post()
                .uri("/api/products")
                .insert_header(("Authorization", ctx.admin_token.as_str()))
                .set_json(json!({ "name": name, "price": 12.5, "status": status }))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), 201);
        }

        let req = test::TestRequest::get().uri("/api/products").to_request();
        let public: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(public.len(), 1);
        assert_eq!(public[0]["slug"], "adire-scarf");

        let req = test::TestRequest::get()
            .uri("/api/products")
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .to_request();
        let all: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(all.len(), 2);

        let draft_id = all.iter().find(|p| p["slug"] == "secret-drop").unwrap()["id"].clone();
        let req = test::TestRequest::get()
            .uri(&format!("/api/products/{}", draft_id))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);

        let req = test::TestRequest::get().uri("/api/products/slug/adire-scarf").to_request();
        let detail: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(detail["name"], "Adire Scarf");
        assert!(detail["related"].as_array().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn stock_check_reports_each_line() {
        let ctx = context();
        let app = test_app!(ctx, crate::services::products::configure_routes()).await;
        let req = test::TestRequest::post()
            .uri("/api/products")
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .set_json(json!({ "name": "Talking Drum", "price": 40.0, "stock_quantity": 2, "status": "active" }))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/api/products/check-stock")
            .set_json(json!({ "items": [
                { "product_id": created["id"], "quantity": 3 },
                { "product_id": 9999, "quantity": 1 }
            ] }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["all_available"], false);
        assert_eq!(body["items"][0]["reason"], "Insufficient stock");
        assert_eq!(body["items"][0]["available_quantity"], 2);
        assert_eq!(body["items"][1]["reason"], "Product not found");
    }
}
