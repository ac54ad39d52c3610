//! Versioned migrations, tracked with `PRAGMA user_version`.

use common::model::product::DEFAULT_COLLECTIONS;
use log::info;
use rusqlite::{params, Connection};

const MIGRATIONS: &[&str] = &[
    // 1: accounts
    r#"
    CREATE TABLE users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE COLLATE NOCASE,
        password_hash TEXT NOT NULL,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        phone TEXT,
        role TEXT NOT NULL DEFAULT 'customer',
        timezone TEXT NOT NULL DEFAULT 'Africa/Lagos',
        date_of_birth TEXT,
        avatar_url TEXT,
        how_heard TEXT,
        subscribe_newsletter INTEGER NOT NULL DEFAULT 0,
        registration TEXT NOT NULL DEFAULT '{"account_type":"customer"}',
        preferences TEXT NOT NULL DEFAULT '{"email_lesson_reminders":true,"email_progress_reports":true,"email_promotions":false,"push_lesson_reminders":true,"push_messages":true}',
        loyalty_points INTEGER NOT NULL DEFAULT 0,
        lifetime_points INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE TABLE sessions (
        token TEXT PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at TEXT NOT NULL,
        expires_at TEXT NOT NULL
    );
    CREATE INDEX idx_sessions_user ON sessions(user_id);
    CREATE TABLE notifications (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        message TEXT NOT NULL,
        kind TEXT NOT NULL DEFAULT 'info',
        is_read INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    );
    CREATE INDEX idx_notifications_user ON notifications(user_id, is_read);
    CREATE TABLE loyalty_redemptions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        reward_id TEXT NOT NULL,
        points INTEGER NOT NULL,
        created_at TEXT NOT NULL
    );
    "#,
    // 2: catalog
    r#"
    CREATE TABLE product_collections (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        slug TEXT NOT NULL UNIQUE,
        description TEXT,
        display_order INTEGER NOT NULL DEFAULT 0
    );
    CREATE TABLE products (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        slug TEXT NOT NULL UNIQUE,
        sku TEXT,
        description TEXT,
        short_description TEXT,
        price REAL NOT NULL CHECK (price >= 0),
        sale_price REAL,
        images TEXT NOT NULL DEFAULT '[]',
        stock_quantity INTEGER NOT NULL DEFAULT 0 CHECK (stock_quantity >= 0),
        low_stock_threshold INTEGER NOT NULL DEFAULT 10,
        track_inventory INTEGER NOT NULL DEFAULT 1,
        status TEXT NOT NULL DEFAULT 'draft',
        featured INTEGER NOT NULL DEFAULT 0,
        collection_id INTEGER REFERENCES product_collections(id) ON DELETE SET NULL,
        tags TEXT NOT NULL DEFAULT '[]',
        sizes TEXT NOT NULL DEFAULT '[]',
        colors TEXT NOT NULL DEFAULT '[]',
        metadata TEXT NOT NULL DEFAULT 'null',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX idx_products_collection ON products(collection_id);
    CREATE INDEX idx_products_status ON products(status);
    CREATE TABLE product_variants (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
        size TEXT NOT NULL,
        color TEXT NOT NULL,
        sku TEXT NOT NULL,
        price REAL NOT NULL,
        inventory_quantity INTEGER NOT NULL DEFAULT 0,
        is_active INTEGER NOT NULL DEFAULT 1,
        UNIQUE (product_id, size, color)
    );
    "#,
    // 3: media library
    r#"
    CREATE TABLE media_library (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        filename TEXT NOT NULL,
        original_name TEXT NOT NULL,
        bucket TEXT NOT NULL,
        object_key TEXT NOT NULL,
        url TEXT NOT NULL,
        mime_type TEXT NOT NULL,
        file_size INTEGER NOT NULL,
        width INTEGER,
        height INTEGER,
        title TEXT,
        alt_text TEXT,
        description TEXT,
        folder TEXT NOT NULL DEFAULT 'uploads',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (bucket, object_key)
    );
    CREATE INDEX idx_media_folder ON media_library(folder);
    "#,
    // 4: blog
    r#"
    CREATE TABLE blog_categories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        slug TEXT NOT NULL UNIQUE,
        description TEXT,
        color TEXT NOT NULL DEFAULT '#0d9488'
    );
    CREATE TABLE blog_posts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        slug TEXT NOT NULL UNIQUE,
        excerpt TEXT,
        content TEXT NOT NULL DEFAULT '',
        featured_image TEXT,
        category_id INTEGER REFERENCES blog_categories(id) ON DELETE SET NULL,
        author_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
        is_published INTEGER NOT NULL DEFAULT 0,
        is_featured INTEGER NOT NULL DEFAULT 0,
        published_at TEXT,
        views INTEGER NOT NULL DEFAULT 0,
        tags TEXT NOT NULL DEFAULT '[]',
        meta_title TEXT,
        meta_description TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX idx_blog_posts_published ON blog_posts(is_published, published_at);
    "#,
    // 5: orders
    r#"
    CREATE TABLE orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        order_number TEXT NOT NULL UNIQUE,
        user_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
        customer_email TEXT NOT NULL,
        customer_first_name TEXT NOT NULL,
        customer_last_name TEXT NOT NULL,
        customer_phone TEXT,
        shipping_address TEXT NOT NULL,
        billing_address TEXT NOT NULL,
        items TEXT NOT NULL,
        subtotal REAL NOT NULL,
        shipping_cost REAL NOT NULL,
        tax_amount REAL NOT NULL,
        discount_amount REAL NOT NULL DEFAULT 0,
        total_amount REAL NOT NULL,
        coupon_code TEXT,
        payment_method TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending',
        payment_status TEXT NOT NULL DEFAULT 'pending',
        tracking_number TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        shipped_at TEXT,
        delivered_at TEXT
    );
    CREATE INDEX idx_orders_user ON orders(user_id);
    CREATE INDEX idx_orders_email ON orders(customer_email COLLATE NOCASE);
    "#,
];

pub(super) fn run_migrations(conn: &Connection) -> rusqlite::Result<()> {
    let current: usize = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    for (index, sql) in MIGRATIONS.iter().enumerate().skip(current) {
        let version = index + 1;
        conn.execute_batch(&format!("BEGIN;\n{}\nCOMMIT;", sql))?;
        conn.pragma_update(None, "user_version", version as i64)?;
        if version == 2 {
            seed_collections(conn)?;
        }
        info!("Applied migration {}", version);
    }
    Ok(())
}

fn seed_collections(conn: &Connection) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO product_collections (name, slug, display_order) VALUES (?1, ?2, ?3)",
    )?;
    for (order, (slug, name)) in DEFAULT_COLLECTIONS.iter().enumerate() {
        stmt.execute(params![name, slug, order as i64])?;
    }
    info!("Seeded {} default collections", DEFAULT_COLLECTIONS.len());
    Ok(())
}
