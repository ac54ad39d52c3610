use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::model::user::Role;
use common::requests::{OrderStatusUpdate, PaymentStatusUpdate};
use log::info;

use crate::auth::{AdminUser, AuthUser};
use crate::db::{orders, Db};
use crate::error::ApiError;

/// `GET /api/orders/{id}`
///
/// Someone else's order answers 404 rather than 403.
pub(crate) async fn get_one(db: web::Data<Db>, caller: AuthUser, path: web::Path<i64>) -> impl Responder {
    let id = path.into_inner();
    let user = caller.user;
    let result = db
        .run(move |conn| {
            let order = orders::get(conn, id)?;
            if user.role != Role::Admin && order.user_id != Some(user.id) {
                return Err(ApiError::NotFound("Order"));
            }
            Ok(order)
        })
        .await;
    match result {
        Ok(order) => HttpResponse::Ok().json(order),
        Err(err) => err.error_response(),
    }
}

/// `PUT /api/orders/{id}/status`
pub(crate) async fn set_status(
    db: web::Data<Db>,
    _admin: AdminUser,
    path: web::Path<i64>,
    payload: web::Json<OrderStatusUpdate>,
) -> impl Responder {
    let id = path.into_inner();
    let update = payload.into_inner();
    let result = db
        .run(move |conn| {
            let tracking = update
                .tracking_number
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty());
            orders::set_status(conn, id, update.status, tracking)
        })
        .await;
    match result {
        Ok(order) => {
            info!("Order {} set to {}", order.order_number, order.status);
            HttpResponse::Ok().json(order)
        }
        Err(err) => err.error_response(),
    }
}

/// `PUT /api/orders/{id}/payment`
pub(crate) async fn set_payment(
    db: web::Data<Db>,
    _admin: AdminUser,
    path: web::Path<i64>,
    payload: web::Json<PaymentStatusUpdate>,
) -> impl Responder {
    let id = path.into_inner();
    let status = payload.payment_status;
    match db.run(move |conn| orders::set_payment_status(conn, id, status)).await {
        Ok(order) => HttpResponse::Ok().json(order),
        Err(err) => err.error_response(),
    }
}

#[cfg(test)]
mod tests {
    use crate::services::test_support::{context, test_app};
    use actix_web::test;
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn shipping_stamps_once_and_guests_cannot_read_orders() {
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
            .set_json(json!({ "name": "Beaded Bracelet", "price": 60.0, "status": "active", "track_inventory": false }))
            .to_request();
        let product: Value = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .set_json(json!({
                "customer_email": "guest@example.com",
                "customer_first_name": "Kemi",
                "customer_last_name": "Ade",
                "shipping_address": { "address": "1 Main", "city": "Austin", "state": "TX", "zip_code": "73301" },
                "items": [{ "product_id": product["id"], "quantity": 1 }],
                "payment_method": "paypal"
            }))
            .to_request();
        let order: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(order["shipping_cost"], 0.0);
        assert_eq!(order["payment_status"], "pending");
        let id = order["id"].as_i64().unwrap();

        let req = test::TestRequest::get()
            .uri(&format!("/api/orders/{}", id))
            .insert_header(("Authorization", ctx.student_token.as_str()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);

        let req = test::TestRequest::put()
            .uri(&format!("/api/orders/{}/status", id))
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .set_json(json!({ "status": "shipped", "tracking_number": "1Z999" }))
            .to_request();
        let shipped: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(shipped["tracking_number"], "1Z999");
        let stamped = shipped["shipped_at"].clone();
        assert!(!stamped.is_null());

        let req = test::TestRequest::put()
            .uri(&format!("/api/orders/{}/status", id))
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .set_json(json!({ "status": "shipped" }))
            .to_request();
        let again: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(again["shipped_at"], stamped);
        assert_eq!(again["tracking_number"], "1Z999");

        let req = test::TestRequest::put()
            .uri(&format!("/api/orders/{}/payment", id))
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .set_json(json!({ "payment_status": "paid" }))
            .to_request();
        let paid: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(paid["payment_status"], "paid");
    }
}
