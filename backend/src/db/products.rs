//! Products, collections and variants.

use chrono::Utc;
use common::inventory::{adjust_stock, plan_variants, DEFAULT_LOW_STOCK_THRESHOLD};
use common::model::product::{
    slugify, CollectionRef, Product, ProductCollection, ProductStatus, ProductVariant,
};
use common::requests::{CollectionInput, ProductInput, ProductQuery, ProductSort, ProductUpdate};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::{json_column, like_pattern, parsed_column, to_json};
use crate::error::{ApiError, ApiResult};

const PRODUCT_SELECT: &str = "SELECT p.id, p.name, p.slug, p.sku, p.description, \
    p.short_description, p.price, p.sale_price, p.images, p.stock_quantity, \
    p.low_stock_threshold, p.track_inventory, p.status, p.featured, p.collection_id, \
    p.tags, p.sizes, p.colors, p.metadata, p.created_at, p.updated_at, \
    c.name AS collection_name, c.slug AS collection_slug \
    FROM products p LEFT JOIN product_collections c ON c.id = p.collection_id";

pub const DEFAULT_PAGE_SIZE: u32 = 50;

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    let collection_id: Option<i64> = row.get("collection_id")?;
    let name: Option<String> = row.get("collection_name")?;
    let slug: Option<String> = row.get("collection_slug")?;
    let collection = match (collection_id, name, slug) {
        (Some(id), Some(name), Some(slug)) => Some(CollectionRef { id, name, slug }),
        _ => None,
    };
    Ok(Product {
        id: row.get("id")?,
        name: row.get("name")?,
        slug: row.get("slug")?,
        sku: row.get("sku")?,
        description: row.get("description")?,
        short_description: row.get("short_description")?,
        price: row.get("price")?,
        sale_price: row.get("sale_price")?,
        images: json_column(row, "images")?,
        stock_quantity: row.get("stock_quantity")?,
        low_stock_threshold: row.get("low_stock_threshold")?,
        track_inventory: row.get("track_inventory")?,
        status: parsed_column(row, "status")?,
        featured: row.get("featured")?,
        collection_id,
        collection,
        tags: json_column(row, "tags")?,
        sizes: json_column(row, "sizes")?,
        colors: json_column(row, "colors")?,
        metadata: json_column(row, "metadata")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Maps a UNIQUE violation to `409 Conflict` and leaves other errors alone.
pub fn conflict_on_unique(err: rusqlite::Error, message: &str) -> ApiError {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            ApiError::Conflict(message.to_string())
        }
        other => ApiError::Database(other),
    }
}

/// Maps constraint failures on a product write: a duplicate slug is a
/// conflict and a dangling `collection_id` is a bad request.
fn product_write_error(err: rusqlite::Error) -> ApiError {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
        {
            ApiError::BadRequest("Unknown collection".to_string())
        }
        other => conflict_on_unique(other, "A product with this slug already exists"),
    }
}

/// Lists products. `public` restricts the listing to active products unless
/// a status filter is given by an admin.
pub fn list(conn: &Connection, query: &ProductQuery, public: bool) -> ApiResult<Vec<Product>> {
    let mut sql = format!("{} WHERE 1 = 1", PRODUCT_SELECT);
    let mut args: Vec<Value> = Vec::new();

    match (query.status, public) {
        (_, true) => {
            sql.push_str(" AND p.status = ?");
            args.push(Value::Text(ProductStatus::Active.as_str().to_string()));
        }
        (Some(status), false) => {
            sql.push_str(" AND p.status = ?");
            args.push(Value::Text(status.as_str().to_string()));
        }
        (None, false) => {}
    }
    if let Some(collection) = query.collection.as_deref().filter(|c| !c.is_empty()) {
        sql.push_str(" AND c.slug = ?");
        args.push(Value::Text(collection.to_string()));
    }
    if let Some(featured) = query.featured {
        sql.push_str(" AND p.featured = ?");
        args.push(Value::Integer(i64::from(featured)));
    }
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        sql.push_str(
            " AND (p.name LIKE ? ESCAPE '\\' OR p.description LIKE ? ESCAPE '\\' \
             OR p.sku LIKE ? ESCAPE '\\')",
        );
        let pattern = like_pattern(search);
        args.extend(std::iter::repeat_n(Value::Text(pattern), 3));
    }

    let sort = query.sort.unwrap_or(ProductSort::Featured);
    sql.push_str(&format!(" ORDER BY {}, p.id DESC LIMIT ? OFFSET ?", sort.order_by()));
    args.push(Value::Integer(i64::from(query.limit.unwrap_or(DEFAULT_PAGE_SIZE))));
    args.push(Value::Integer(i64::from(query.offset.unwrap_or(0))));

    let mut stmt = conn.prepare(&sql)?;
    let products = stmt
        .query_map(params_from_iter(args), product_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(products)
}

pub fn all(conn: &Connection) -> ApiResult<Vec<Product>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY p.created_at DESC", PRODUCT_SELECT))?;
    let products = stmt
        .query_map([], product_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(products)
}

pub fn find(conn: &Connection, id: i64) -> ApiResult<Option<Product>> {
    Ok(conn
        .query_row(&format!("{} WHERE p.id = ?1", PRODUCT_SELECT), [id], product_from_row)
        .optional()?)
}

pub fn get(conn: &Connection, id: i64) -> ApiResult<Product> {
    find(conn, id)?.ok_or(ApiError::NotFound("Product"))
}

pub fn find_active_by_slug(conn: &Connection, slug: &str) -> ApiResult<Option<Product>> {
    Ok(conn
        .query_row(
            &format!("{} WHERE p.slug = ?1 AND p.status = 'active'", PRODUCT_SELECT),
            [slug],
            product_from_row,
        )
        .optional()?)
}

/// Up to `limit` other active products from the same collection.
pub fn related(conn: &Connection, product: &Product, limit: u32) -> ApiResult<Vec<Product>> {
    let Some(collection_id) = product.collection_id else {
        return Ok(Vec::new());
    };
    let mut stmt = conn.prepare(&format!(
        "{} WHERE p.collection_id = ?1 AND p.id != ?2 AND p.status = 'active' \
         ORDER BY p.featured DESC, p.created_at DESC LIMIT ?3",
        PRODUCT_SELECT
    ))?;
    let products = stmt
        .query_map(params![collection_id, product.id, limit], product_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(products)
}

pub fn insert(conn: &Connection, input: &ProductInput) -> ApiResult<Product> {
    let slug = input
        .slug
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(slugify)
        .unwrap_or_else(|| slugify(&input.name));
    let now = Utc::now();
    conn.execute(
        "INSERT INTO products (name, slug, sku, description, short_description, price, \
         sale_price, images, stock_quantity, low_stock_threshold, track_inventory, status, \
         featured, collection_id, tags, sizes, colors, metadata, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, \
         ?18, ?19, ?19)",
        params![
            input.name.trim(),
            slug,
            input.sku,
            input.description,
            input.short_description,
            input.price,
            input.sale_price,
            to_json(&input.images)?,
            input.stock_quantity,
            input.low_stock_threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD),
            input.track_inventory,
            input.status.as_str(),
            input.featured,
            input.collection_id,
            to_json(&input.tags)?,
            to_json(&input.sizes)?,
            to_json(&input.colors)?,
            to_json(&input.metadata)?,
            now,
        ],
    )
    .map_err(product_write_error)?;
    get(conn, conn.last_insert_rowid())
}

/// Writes every field of `product` back. Used after applying a partial update.
fn save(conn: &Connection, product: &Product) -> ApiResult<()> {
    conn.execute(
        "UPDATE products SET name = ?2, slug = ?3, sku = ?4, description = ?5, \
         price = ?6, sale_price = ?7, images = ?8, stock_quantity = ?9, \
         low_stock_threshold = ?10, track_inventory = ?11, status = ?12, featured = ?13, \
         collection_id = ?14, tags = ?15, sizes = ?16, colors = ?17, updated_at = ?18 \
         WHERE id = ?1",
        params![
            product.id,
            product.name,
            product.slug,
            product.sku,
            product.description,
            product.price,
            product.sale_price,
            to_json(&product.images)?,
            product.stock_quantity,
            product.low_stock_threshold,
            product.track_inventory,
            product.status.as_str(),
            product.featured,
            product.collection_id,
            to_json(&product.tags)?,
            to_json(&product.sizes)?,
            to_json(&product.colors)?,
            Utc::now(),
        ],
    )
    .map_err(product_write_error)?;
    Ok(())
}

pub fn update(conn: &Connection, id: i64, update: &ProductUpdate) -> ApiResult<Product> {
    let mut product = get(conn, id)?;
    if let Some(name) = &update.name {
        product.name = name.trim().to_string();
    }
    if let Some(slug) = update.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        product.slug = slugify(slug);
    }
    if let Some(sku) = &update.sku {
        product.sku = Some(sku.clone()).filter(|s| !s.trim().is_empty());
    }
    if let Some(description) = &update.description {
        product.description = Some(description.clone());
    }
    if let Some(price) = update.price {
        product.price = price;
    }
    if let Some(sale_price) = update.sale_price {
        product.sale_price = sale_price;
    }
    if let Some(stock) = update.stock_quantity {
        product.stock_quantity = stock;
    }
    if let Some(threshold) = update.low_stock_threshold {
        product.low_stock_threshold = threshold;
    }
    if let Some(track) = update.track_inventory {
        product.track_inventory = track;
    }
    if let Some(status) = update.status {
        product.status = status;
    }
    if let Some(featured) = update.featured {
        product.featured = featured;
    }
    if let Some(collection_id) = update.collection_id {
        product.collection_id = collection_id;
    }
    if let Some(images) = &update.images {
        product.images = images.clone();
    }
    if let Some(tags) = &update.tags {
        product.tags = tags.clone();
    }
    if let Some(sizes) = &update.sizes {
        product.sizes = sizes.clone();
    }
    if let Some(colors) = &update.colors {
        product.colors = colors.clone();
    }
    save(conn, &product)?;
    rebalance_variants(conn, &product)?;
    get(conn, id)
}

pub fn set_images(conn: &Connection, id: i64, images: &[String]) -> ApiResult<Product> {
    let changed = conn.execute(
        "UPDATE products SET images = ?2, updated_at = ?3 WHERE id = ?1",
        params![id, to_json(&images)?, Utc::now()],
    )?;
    if changed == 0 {
        return Err(ApiError::NotFound("Product"));
    }
    get(conn, id)
}

/// Applies a stock delta clamped at zero.
pub fn adjust(conn: &Connection, id: i64, delta: i64) -> ApiResult<Product> {
    let product = get(conn, id)?;
    conn.execute(
        "UPDATE products SET stock_quantity = ?2, updated_at = ?3 WHERE id = ?1",
        params![id, adjust_stock(product.stock_quantity, delta), Utc::now()],
    )?;
    let product = get(conn, id)?;
    rebalance_variants(conn, &product)?;
    Ok(product)
}

pub fn set_status(conn: &Connection, ids: &[i64], status: ProductStatus) -> ApiResult<usize> {
    let now = Utc::now();
    let mut stmt =
        conn.prepare("UPDATE products SET status = ?2, updated_at = ?3 WHERE id = ?1")?;
    let mut changed = 0;
    for id in ids {
        changed += stmt.execute(params![id, status.as_str(), now])?;
    }
    Ok(changed)
}

pub fn delete(conn: &Connection, id: i64) -> ApiResult<Product> {
    let product = get(conn, id)?;
    conn.execute("DELETE FROM products WHERE id = ?1", [id])?;
    Ok(product)
}

// ---- collections ----------------------------------------------------------

fn collection_from_row(row: &Row<'_>) -> rusqlite::Result<ProductCollection> {
    Ok(ProductCollection {
        id: row.get("id")?,
        name: row.get("name")?,
        slug: row.get("slug")?,
        description: row.get("description")?,
        display_order: row.get("display_order")?,
        product_count: row.get("product_count")?,
    })
}

const COLLECTION_SELECT: &str = "SELECT c.id, c.name, c.slug, c.description, c.display_order, \
    (SELECT COUNT(*) FROM products p WHERE p.collection_id = c.id) AS product_count \
    FROM product_collections c";

pub fn list_collections(conn: &Connection) -> ApiResult<Vec<ProductCollection>> {
    let mut stmt = conn.prepare(&format!(
        "{} ORDER BY c.display_order ASC, c.name ASC",
        COLLECTION_SELECT
    ))?;
    let collections = stmt
        .query_map([], collection_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(collections)
}

pub fn get_collection(conn: &Connection, id: i64) -> ApiResult<ProductCollection> {
    conn.query_row(&format!("{} WHERE c.id = ?1", COLLECTION_SELECT), [id], collection_from_row)
        .optional()?
        .ok_or(ApiError::NotFound("Collection"))
}

pub fn collection_id_by_slug(conn: &Connection, slug: &str) -> ApiResult<Option<i64>> {
    Ok(conn
        .query_row("SELECT id FROM product_collections WHERE slug = ?1", [slug], |row| {
            row.get(0)
        })
        .optional()?)
}

fn collection_slug(input: &CollectionInput) -> String {
    input
        .slug
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(slugify)
        .unwrap_or_else(|| slugify(&input.name))
}

pub fn insert_collection(conn: &Connection, input: &CollectionInput) -> ApiResult<ProductCollection> {
    conn.execute(
        "INSERT INTO product_collections (name, slug, description, display_order) \
         VALUES (?1, ?2, ?3, ?4)",
        params![
            input.name.trim(),
            collection_slug(input),
            input.description,
            input.display_order.unwrap_or(0)
        ],
    )
    .map_err(|e| conflict_on_unique(e, "A collection with this slug already exists"))?;
    get_collection(conn, conn.last_insert_rowid())
}

pub fn update_collection(
    conn: &Connection,
    id: i64,
    input: &CollectionInput,
) -> ApiResult<ProductCollection> {
    let changed = conn
        .execute(
            "UPDATE product_collections SET name = ?2, slug = ?3, \
             description = COALESCE(?4, description), \
             display_order = COALESCE(?5, display_order) WHERE id = ?1",
            params![
                id,
                input.name.trim(),
                collection_slug(input),
                input.description,
                input.display_order
            ],
        )
        .map_err(|e| conflict_on_unique(e, "A collection with this slug already exists"))?;
    if changed == 0 {
        return Err(ApiError::NotFound("Collection"));
    }
    get_collection(conn, id)
}

/// Deletes a collection; its products keep existing without one.
pub fn delete_collection(conn: &Connection, id: i64) -> ApiResult<()> {
    let changed = conn.execute("DELETE FROM product_collections WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(ApiError::NotFound("Collection"));
    }
    Ok(())
}

// ---- variants -------------------------------------------------------------

fn variant_from_row(row: &Row<'_>) -> rusqlite::Result<ProductVariant> {
    Ok(ProductVariant {
        id: row.get("id")?,
        product_id: row.get("product_id")?,
        size: row.get("size")?,
        color: row.get("color")?,
        sku: row.get("sku")?,
        price: row.get("price")?,
        inventory_quantity: row.get("inventory_quantity")?,
        is_active: row.get("is_active")?,
    })
}

pub fn list_variants(conn: &Connection, product_id: i64) -> ApiResult<Vec<ProductVariant>> {
    let mut stmt = conn.prepare(
        "SELECT id, product_id, size, color, sku, price, inventory_quantity, is_active \
         FROM product_variants WHERE product_id = ?1 ORDER BY id",
    )?;
    let variants = stmt
        .query_map([product_id], variant_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(variants)
}

/// Re-splits the product's stock over the variants it already has and
/// copies its price onto them. Variant ids are kept; a product without
/// variants is left alone.
pub fn rebalance_variants(conn: &Connection, product: &Product) -> ApiResult<()> {
    let base_sku = product.sku.as_deref().unwrap_or(&product.slug);
    let plan = plan_variants(base_sku, &product.sizes, &product.colors, product.stock_quantity);
    let mut stmt = conn.prepare(
        "UPDATE product_variants SET inventory_quantity = ?4, price = ?5 \
         WHERE product_id = ?1 AND size = ?2 AND color = ?3",
    )?;
    for variant in &plan {
        stmt.execute(params![
            product.id,
            variant.size,
            variant.color,
            variant.quantity,
            product.price
        ])?;
    }
    Ok(())
}

/// Replaces the product's variants with the size x color cross product,
/// splitting its stock across them.
pub fn regenerate_variants(conn: &mut Connection, product_id: i64) -> ApiResult<Vec<ProductVariant>> {
    let product = get(conn, product_id)?;
    let base_sku = product
        .sku
        .clone()
        .unwrap_or_else(|| product.slug.clone());
    let plan = plan_variants(&base_sku, &product.sizes, &product.colors, product.stock_quantity);

    let tx = conn.transaction()?;
    tx.execute("DELETE FROM product_variants WHERE product_id = ?1", [product_id])?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO product_variants (product_id, size, color, sku, price, \
             inventory_quantity, is_active) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)",
        )?;
        for variant in &plan {
            stmt.execute(params![
                product_id,
                variant.size,
                variant.color,
                variant.sku,
                product.price,
                variant.quantity
            ])?;
        }
    }
    tx.commit()?;
    list_variants(conn, product_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Db;

    fn input(name: &str, price: f64, stock: u32) -> ProductInput {
        serde_json::from_value(serde_json::json!({
            "name": name,
            "price": price,
            "stock_quantity": stock,
            "status": "active"
        }))
        .unwrap()
    }

    #[test]
    fn empty_sku_in_an_update_clears_it() {
        let db = Db::open_in_memory().unwrap();
        db.run_blocking(|conn| {
            let mut item = input("Story Cards", 6.0, 3);
            item.sku = Some("SC-1".to_string());
            let id = insert(conn, &item)?.id;
            let cleared = update(
                conn,
                id,
                &ProductUpdate {
                    sku: Some(String::new()),
                    ..ProductUpdate::default()
                },
            )?;
            assert_eq!(cleared.sku, None);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn insert_joins_collection_and_derives_slug() {
        let db = Db::open_in_memory().unwrap();
        db.run_blocking(|conn| {
            let apparel = collection_id_by_slug(conn, "apparel")?.unwrap();
            let mut tee = input("Kente Tee (Kids)", 19.99, 12);
            tee.collection_id = Some(apparel);
            let product = insert(conn, &tee)?;
            assert_eq!(product.slug, "kente-tee-kids");
            assert_eq!(product.collection.as_ref().map(|c| c.slug.as_str()), Some("apparel"));
            assert_eq!(product.low_stock_threshold, DEFAULT_LOW_STOCK_THRESHOLD);

            let duplicate = insert(conn, &tee).unwrap_err();
            assert!(matches!(duplicate, ApiError::Conflict(_)));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn public_listing_hides_drafts_and_filters_by_collection() {
        let db = Db::open_in_memory().unwrap();
        db.run_blocking(|conn| {
            let toys = collection_id_by_slug(conn, "toys")?;
            let mut drum = input("Talking Drum", 30.0, 4);
            drum.collection_id = toys;
            insert(conn, &drum)?;
            let mut draft = input("Unfinished", 5.0, 1);
            draft.status = ProductStatus::Draft;
            insert(conn, &draft)?;

            let public = list(conn, &ProductQuery::default(), true)?;
            assert_eq!(public.len(), 1);

            let admin = list(conn, &ProductQuery::default(), false)?;
            assert_eq!(admin.len(), 2);

            let query = ProductQuery { collection: Some("apparel".into()), ..Default::default() };
            assert!(list(conn, &query, true)?.is_empty());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn stock_adjustments_clamp_at_zero() {
        let db = Db::open_in_memory().unwrap();
        db.run_blocking(|conn| {
            let product = insert(conn, &input("Flash Cards", 9.5, 2))?;
            assert_eq!(adjust(conn, product.id, -5)?.stock_quantity, 0);
            assert_eq!(adjust(conn, product.id, 1)?.stock_quantity, 1);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn deleting_a_collection_keeps_its_products() {
        let db = Db::open_in_memory().unwrap();
        db.run_blocking(|conn| {
            let other = collection_id_by_slug(conn, "other")?.unwrap();
            let mut sticker = input("Sticker Pack", 3.0, 40);
            sticker.collection_id = Some(other);
            let product = insert(conn, &sticker)?;
            delete_collection(conn, other)?;
            let reloaded = get(conn, product.id)?;
            assert_eq!(reloaded.collection_id, None);
            assert!(reloaded.collection.is_none());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn regenerated_variants_add_up_to_stock() {
        let db = Db::open_in_memory().unwrap();
        db.run_blocking(|conn| {
            let mut tee = input("Adinkra Tee", 18.0, 10);
            tee.sku = Some("adk tee".into());
            tee.sizes = vec!["S".into(), "M".into(), "L".into()];
            tee.colors = vec!["Gold".into()];
            let product = insert(conn, &tee)?;
            let variants = regenerate_variants(conn, product.id)?;
            assert_eq!(variants.len(), 3);
            assert_eq!(variants[0].sku, "ADKTEE-S-GOLD");
            let total: u32 = variants.iter().map(|v| v.inventory_quantity).sum();
            assert_eq!(total, 10);

            update(conn, product.id, &ProductUpdate { sizes: Some(Vec::new()), ..Default::default() })?;
            assert!(regenerate_variants(conn, product.id)?.is_empty());
            Ok(())
        })
        .unwrap();
    }
}
