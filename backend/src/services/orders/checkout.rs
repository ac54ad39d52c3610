use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::model::order::Order;
use common::requests::{CreateOrderRequest, TrackOrderQuery};
use log::info;

use crate::auth::{AuthUser, OptionalUser};
use crate::db::{orders, Db};
use crate::error::ApiResult;

/// `POST /api/orders`
pub(crate) async fn process(
    db: web::Data<Db>,
    caller: OptionalUser,
    payload: web::Json<CreateOrderRequest>,
) -> impl Responder {
    let user_id = caller.0.map(|user| user.id);
    match place_order(db, user_id, payload.into_inner()).await {
        Ok(order) => HttpResponse::Created().json(order),
        Err(err) => err.error_response(),
    }
}

async fn place_order(db: web::Data<Db>, user_id: Option<i64>, request: CreateOrderRequest) -> ApiResult<Order> {
    request.validate()?;
    let order = db
        .run(move |conn| orders::create(conn, &request, user_id))
        .await?;
    info!(
        "Order {} placed: {} items, total {:.2}",
        order.order_number,
        order.items.len(),
        order.total_amount
    );
    Ok(order)
}

/// `GET /api/orders/track/{order_number}?email=`
pub(crate) async fn track(
    db: web::Data<Db>,
    path: web::Path<String>,
    query: web::Query<TrackOrderQuery>,
) -> impl Responder {
    let number = path.into_inner();
    let email = query.into_inner().email;
    match db.run(move |conn| orders::track(conn, &number, &email)).await {
        Ok(order) => HttpResponse::Ok().json(order),
        Err(err) => err.error_response(),
    }
}

/// `GET /api/orders/mine`
pub(crate) async fn mine(db: web::Data<Db>, caller: AuthUser) -> impl Responder {
    let user_id = caller.user.id;
    match db.run(move |conn| orders::for_user(conn, user_id)).await {
        Ok(orders) => HttpResponse::Ok().json(orders),
        Err(err) => err.error_response(),
    }
}

#[cfg(test)]
mod tests {
    use crate::services::test_support::{context, test_app};
    use actix_web::test;
    use serde_json::{json, Value};

    fn order_body(product_id: &Value, quantity: u32, coupon: Option<&str>) -> Value {
        json!({
            "customer_email": "Buyer@Example.com",
            "customer_first_name": "Ada",
            "customer_last_name": "Obi",
            "shipping_address": {
                "address": "12 Palm Ave",
                "city": "Houston",
                "state": "TX",
                "zip_code": "77001"
            },
            "items": [{ "product_id": product_id, "quantity": quantity }],
            "coupon_code": coupon,
            "payment_method": "card"
        })
    }

    #[actix_web::test]
    async fn checkout_prices_on_the_server_and_takes_stock() {
        let ctx = context();
        let app = test_app!(
            ctx,
            crate::services::products::configure_routes(),
            crate::services::orders::configure_routes(),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/api/products")
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .set_json(json!({ "name": "Flash Cards", "price": 12.5, "stock_quantity": 3, "status": "active" }))
            .to_request();
        let product: Value = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .insert_header(("Authorization", ctx.student_token.as_str()))
            .set_json(order_body(&product["id"], 2, Some("welcome10")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let order: Value = test::read_body_json(resp).await;
        assert_eq!(order["subtotal"], 25.0);
        assert_eq!(order["total_amount"], 30.29);
        assert_eq!(order["payment_status"], "pending");
        assert_eq!(order["coupon_code"], "WELCOME10");

        let req = test::TestRequest::get()
            .uri(&format!("/api/products/{}", product["id"]))
            .to_request();
        let after: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(after["stock_quantity"], 1);

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .set_json(order_body(&product["id"], 2, None))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        let number = order["order_number"].as_str().unwrap();
        let req = test::TestRequest::get()
            .uri(&format!("/api/orders/track/{}?email=buyer@example.com", number))
            .to_request();
        let tracked: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(tracked["id"], order["id"]);

        let req = test::TestRequest::get()
            .uri(&format!("/api/orders/track/{}?email=someone@else.com", number))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);

        let req = test::TestRequest::get()
            .uri("/api/orders/mine")
            .insert_header(("Authorization", ctx.student_token.as_str()))
            .to_request();
        let mine: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(mine.len(), 1);
    }

    #[actix_web::test]
    async fn unknown_promo_code_is_rejected() {
        let ctx = context();
        let app = test_app!(ctx, crate::services::orders::configure_routes()).await;
        let req = test::TestRequest::post()
            .uri("/api/orders")
            .set_json(order_body(&json!(1), 1, Some("BOGUS")))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);
    }
}
