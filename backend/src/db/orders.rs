//! Orders. Totals are always recomputed here from current product prices.

use chrono::{DateTime, Utc};
use common::cart::{price_order, round_cents};
use common::inventory::check_availability;
use common::model::order::{order_number, Order, OrderItem, OrderStatus, PaymentStatus};
use common::requests::{CreateOrderRequest, PaymentMethod};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{json_column, parsed_column, products, to_json, users};
use crate::error::{ApiError, ApiResult};

const ORDER_SELECT: &str = "SELECT id, order_number, user_id, customer_email, \
    customer_first_name, customer_last_name, customer_phone, shipping_address, \
    billing_address, items, subtotal, shipping_cost, tax_amount, discount_amount, \
    total_amount, coupon_code, status, payment_status, tracking_number, created_at, \
    shipped_at, delivered_at FROM orders";

fn order_from_row(row: &Row<'_>) -> rusqlite::Result<Order> {
    Ok(Order {
        id: row.get("id")?,
        order_number: row.get("order_number")?,
        user_id: row.get("user_id")?,
        customer_email: row.get("customer_email")?,
        customer_first_name: row.get("customer_first_name")?,
        customer_last_name: row.get("customer_last_name")?,
        customer_phone: row.get("customer_phone")?,
        shipping_address: json_column(row, "shipping_address")?,
        billing_address: json_column(row, "billing_address")?,
        items: json_column(row, "items")?,
        subtotal: row.get("subtotal")?,
        shipping_cost: row.get("shipping_cost")?,
        tax_amount: row.get("tax_amount")?,
        discount_amount: row.get("discount_amount")?,
        total_amount: row.get("total_amount")?,
        coupon_code: row.get("coupon_code")?,
        status: parsed_column(row, "status")?,
        payment_status: parsed_column(row, "payment_status")?,
        tracking_number: row.get("tracking_number")?,
        created_at: row.get("created_at")?,
        shipped_at: row.get("shipped_at")?,
        delivered_at: row.get("delivered_at")?,
    })
}

fn query_orders(conn: &Connection, sql: &str, arg: Option<&dyn rusqlite::ToSql>) -> ApiResult<Vec<Order>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = match arg {
        Some(arg) => stmt.query_map([arg], order_from_row)?,
        None => stmt.query_map([], order_from_row)?,
    };
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn payment_method_name(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Card => "card",
        PaymentMethod::Paypal => "paypal",
    }
}

/// Next `ISP-YYYYMMDD-NNNN` number for the day of `now`.
fn next_order_number(conn: &Connection, now: DateTime<Utc>) -> ApiResult<String> {
    let prefix = format!("ISP-{}-%", now.format("%Y%m%d"));
    let today: i64 = conn.query_row(
        "SELECT COUNT(*) FROM orders WHERE order_number LIKE ?1",
        [prefix],
        |row| row.get(0),
    )?;
    Ok(order_number(now, today as u32 + 1))
}

/// Prices the request against the catalog, takes tracked stock and stores
/// the order. Every order starts with payment pending until an admin marks
/// it paid.
pub fn create(
    conn: &mut Connection,
    request: &CreateOrderRequest,
    user_id: Option<i64>,
) -> ApiResult<Order> {
    let promo = request.promo()?;
    let tx = conn.transaction()?;

    let mut items = Vec::with_capacity(request.items.len());
    for line in &request.items {
        let product = products::find(&tx, line.product_id)?
            .filter(|p| p.status == common::model::product::ProductStatus::Active);
        let availability = check_availability(line.product_id, product.as_ref(), line.quantity);
        let Some(product) = product.filter(|_| availability.available) else {
            let reason = availability.reason.unwrap_or_default();
            return Err(ApiError::BadRequest(format!(
                "Product {} is unavailable: {}",
                line.product_id, reason
            )));
        };
        let price = product.effective_price();
        items.push(OrderItem {
            product_id: product.id,
            product_name: product.name.clone(),
            size: line.size.clone(),
            color: line.color.clone(),
            quantity: line.quantity,
            price,
            total: round_cents(price * f64::from(line.quantity)),
        });
        if product.track_inventory {
            tx.execute(
                "UPDATE products SET stock_quantity = stock_quantity - ?2, updated_at = ?3 \
                 WHERE id = ?1",
                params![product.id, line.quantity, Utc::now()],
            )?;
            products::rebalance_variants(&tx, &products::get(&tx, product.id)?)?;
        }
    }

    let subtotal: f64 = items.iter().map(|item| item.total).sum();
    let totals = price_order(subtotal, promo);
    let now = Utc::now();
    let number = next_order_number(&tx, now)?;
    let billing = request
        .billing_address
        .clone()
        .unwrap_or_else(|| request.shipping_address.clone());

    tx.execute(
        "INSERT INTO orders (order_number, user_id, customer_email, customer_first_name, \
         customer_last_name, customer_phone, shipping_address, billing_address, items, \
         subtotal, shipping_cost, tax_amount, discount_amount, total_amount, coupon_code, \
         payment_method, status, payment_status, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, \
         ?17, ?18, ?19, ?19)",
        params![
            number,
            user_id,
            request.customer_email.trim().to_lowercase(),
            request.customer_first_name.trim(),
            request.customer_last_name.trim(),
            request.customer_phone,
            to_json(&request.shipping_address)?,
            to_json(&billing)?,
            to_json(&items)?,
            totals.subtotal,
            totals.shipping,
            totals.tax,
            totals.discount,
            totals.total,
            promo.map(|p| p.code()),
            payment_method_name(request.payment_method),
            OrderStatus::Pending.as_str(),
            PaymentStatus::Pending.as_str(),
            now,
        ],
    )?;
    let id = tx.last_insert_rowid();
    if let Some(user_id) = user_id {
        users::notify(
            &tx,
            user_id,
            "Order received",
            &format!("Your order {} has been placed.", number),
            "order",
        )?;
    }
    tx.commit()?;
    get(conn, id)
}

pub fn get(conn: &Connection, id: i64) -> ApiResult<Order> {
    conn.query_row(&format!("{} WHERE id = ?1", ORDER_SELECT), [id], order_from_row)
        .optional()?
        .ok_or(ApiError::NotFound("Order"))
}

/// Looks an order up by number; the email must match the customer's.
pub fn track(conn: &Connection, number: &str, email: &str) -> ApiResult<Order> {
    conn.query_row(
        &format!(
            "{} WHERE order_number = ?1 AND customer_email = ?2 COLLATE NOCASE",
            ORDER_SELECT
        ),
        params![number.trim(), email.trim()],
        order_from_row,
    )
    .optional()?
    .ok_or(ApiError::NotFound("Order"))
}

pub fn for_user(conn: &Connection, user_id: i64) -> ApiResult<Vec<Order>> {
    query_orders(
        conn,
        &format!("{} WHERE user_id = ?1 ORDER BY created_at DESC, id DESC", ORDER_SELECT),
        Some(&user_id),
    )
}

pub fn all(conn: &Connection) -> ApiResult<Vec<Order>> {
    query_orders(conn, &format!("{} ORDER BY created_at DESC, id DESC", ORDER_SELECT), None)
}

pub fn recent(conn: &Connection, limit: u32) -> ApiResult<Vec<Order>> {
    query_orders(
        conn,
        &format!("{} ORDER BY created_at DESC, id DESC LIMIT ?1", ORDER_SELECT),
        Some(&limit),
    )
}

/// Order counts by status, in `OrderStatus` declaration order.
pub fn counts_by_status(conn: &Connection) -> ApiResult<Vec<(OrderStatus, u64)>> {
    let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM orders GROUP BY status")?;
    let mut counts = Vec::new();
    let rows = stmt.query_map([], |row| Ok((parsed_column(row, "status")?, row.get::<_, i64>(1)?)))?;
    for row in rows {
        let (status, count): (OrderStatus, i64) = row?;
        counts.push((status, count as u64));
    }
    counts.sort_by_key(|(status, _)| *status as u8);
    Ok(counts)
}

pub fn revenue(conn: &Connection) -> ApiResult<f64> {
    let total: Option<f64> = conn.query_row(
        "SELECT SUM(total_amount) FROM orders WHERE payment_status = 'paid'",
        [],
        |row| row.get(0),
    )?;
    Ok(round_cents(total.unwrap_or(0.0)))
}

/// Sets the status; shipping and delivery are stamped the first time.
pub fn set_status(
    conn: &Connection,
    id: i64,
    status: OrderStatus,
    tracking_number: Option<&str>,
) -> ApiResult<Order> {
    let now = Utc::now();
    let changed = conn.execute(
        "UPDATE orders SET status = ?2, tracking_number = COALESCE(?3, tracking_number), \
         shipped_at = CASE WHEN ?2 = 'shipped' AND shipped_at IS NULL THEN ?4 ELSE shipped_at END, \
         delivered_at = CASE WHEN ?2 = 'delivered' AND delivered_at IS NULL THEN ?4 \
         ELSE delivered_at END, updated_at = ?4 WHERE id = ?1",
        params![id, status.as_str(), tracking_number, now],
    )?;
    if changed == 0 {
        return Err(ApiError::NotFound("Order"));
    }
    let order = get(conn, id)?;
    if let Some(user_id) = order.user_id {
        users::notify(
            conn,
            user_id,
            "Order update",
            &format!("Order {} is now {}.", order.order_number, status),
            "order",
        )?;
    }
    Ok(order)
}

pub fn set_payment_status(conn: &Connection, id: i64, status: PaymentStatus) -> ApiResult<Order> {
    let changed = conn.execute(
        "UPDATE orders SET payment_status = ?2, updated_at = ?3 WHERE id = ?1",
        params![id, status.as_str(), Utc::now()],
    )?;
    if changed == 0 {
        return Err(ApiError::NotFound("Order"));
    }
    get(conn, id)
}
