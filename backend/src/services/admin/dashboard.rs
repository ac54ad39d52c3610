use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::inventory::DashboardStats;
use common::model::order::{AdminDashboard, StatusCount};

use crate::auth::AdminUser;
use crate::db::{orders, products, Db};

const RECENT_ORDERS: u32 = 5;

/// `GET /api/admin/dashboard`
pub(crate) async fn process(db: web::Data<Db>, _admin: AdminUser) -> impl Responder {
    let result = db
        .run(|conn| {
            let catalog = products::all(conn)?;
            Ok(AdminDashboard {
                products: DashboardStats::from_products(&catalog),
                orders_by_status: orders::counts_by_status(conn)?
                    .into_iter()
                    .map(|(status, count)| StatusCount { status, count })
                    .collect(),
                revenue: orders::revenue(conn)?,
                recent_orders: orders::recent(conn, RECENT_ORDERS)?,
            })
        })
        .await;
    match result {
        Ok(dashboard) => HttpResponse::Ok().json(dashboard),
        Err(err) => err.error_response(),
    }
}

/// `GET /api/admin/orders`
pub(crate) async fn orders(db: web::Data<Db>, _admin: AdminUser) -> impl Responder {
    match db.run(|conn| orders::all(conn)).await {
        Ok(orders) => HttpResponse::Ok().json(orders),
        Err(err) => err.error_response(),
    }
}

/// `GET /api/admin/products`
pub(crate) async fn products(db: web::Data<Db>, _admin: AdminUser) -> impl Responder {
    match db.run(|conn| products::all(conn)).await {
        Ok(catalog) => HttpResponse::Ok().json(catalog),
        Err(err) => err.error_response(),
    }
}

#[cfg(test)]
mod tests {
    use crate::db::products;
    use crate::services::test_support::{context, test_app};
    use actix_web::test;
    use common::model::product::ProductStatus;
    use common::requests::ProductInput;
    use serde_json::{json, Value};

    fn input(name: &str, price: f64, stock: u32) -> ProductInput {
        serde_json::from_value(json!({
            "name": name,
            "price": price,
            "stock_quantity": stock,
            "status": "active"
        }))
        .unwrap()
    }

    #[actix_web::test]
    async fn dashboard_counts_stock_and_orders() {
        let ctx = context();
        ctx.db
            .run_blocking(|conn| {
                products::insert(conn, &input("Adinkra Tee", 20.0, 25))?;
                products::insert(conn, &input("Kente Scarf", 15.0, 2))?;
                products::insert(conn, &input("Drum Keychain", 5.0, 0))
            })
            .unwrap();
        let app = test_app!(ctx, crate::services::admin::configure_routes()).await;

        let req = test::TestRequest::get()
            .uri("/api/admin/dashboard")
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .to_request();
        let dashboard: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(dashboard["products"]["total_products"], 3);
        assert_eq!(dashboard["products"]["low_stock"], 1);
        assert_eq!(dashboard["products"]["out_of_stock"], 1);
        assert_eq!(dashboard["products"]["total_value"], 530.0);
        assert_eq!(dashboard["revenue"], 0.0);
        assert_eq!(dashboard["recent_orders"], json!([]));

        let req = test::TestRequest::get()
            .uri("/api/admin/orders")
            .insert_header(("Authorization", ctx.student_token.as_str()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 403);
    }

    #[actix_web::test]
    async fn admin_product_listing_is_not_paged() {
        let ctx = context();
        let count = products::DEFAULT_PAGE_SIZE + 7;
        ctx.db
            .run_blocking(move |conn| {
                for n in 0..count {
                    let mut item = input(&format!("Workbook {}", n), 4.0, n);
                    if n == 0 {
                        item.status = ProductStatus::Draft;
                    }
                    products::insert(conn, &item)?;
                }
                Ok(())
            })
            .unwrap();
        let app = test_app!(ctx, crate::services::admin::configure_routes()).await;

        let req = test::TestRequest::get()
            .uri("/api/admin/products")
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .to_request();
        let listed: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed.len() as u32, count);
        assert!(listed.iter().any(|p| p["status"] == "draft"));

        let req = test::TestRequest::get()
            .uri("/api/admin/products")
            .insert_header(("Authorization", ctx.student_token.as_str()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 403);
    }
}
