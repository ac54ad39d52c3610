//! Blog posts and categories.

use chrono::Utc;
use common::model::blog::{BlogCategory, BlogPage, BlogPost, DEFAULT_CATEGORY_COLOR};
use common::model::product::slugify;
use common::requests::{BlogCategoryInput, BlogPostInput, BlogPostUpdate, BlogQuery};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::products::conflict_on_unique;
use super::{json_column, like_pattern, to_json};
use crate::error::{ApiError, ApiResult};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

const POST_SELECT: &str = "SELECT b.id, b.title, b.slug, b.excerpt, b.content, \
    b.featured_image, b.category_id, c.name AS category_name, b.author_id, \
    TRIM(u.first_name || ' ' || u.last_name) AS author_name, b.is_published, b.is_featured, \
    b.published_at, b.views, b.tags, b.meta_title, b.meta_description, b.created_at, \
    b.updated_at FROM blog_posts b \
    LEFT JOIN blog_categories c ON c.id = b.category_id \
    LEFT JOIN users u ON u.id = b.author_id";

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<BlogPost> {
    Ok(BlogPost {
        id: row.get("id")?,
        title: row.get("title")?,
        slug: row.get("slug")?,
        excerpt: row.get("excerpt")?,
        content: row.get("content")?,
        featured_image: row.get("featured_image")?,
        category_id: row.get("category_id")?,
        category_name: row.get("category_name")?,
        author_id: row.get("author_id")?,
        author_name: row.get("author_name")?,
        is_published: row.get("is_published")?,
        is_featured: row.get("is_featured")?,
        published_at: row.get("published_at")?,
        views: row.get("views")?,
        tags: json_column(row, "tags")?,
        meta_title: row.get("meta_title")?,
        meta_description: row.get("meta_description")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn query_posts(conn: &Connection, sql: &str, args: &[Value]) -> ApiResult<Vec<BlogPost>> {
    let mut stmt = conn.prepare(sql)?;
    let posts = stmt
        .query_map(params_from_iter(args.iter()), post_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(posts)
}

/// Published posts, newest first, paginated from page 1.
pub fn published(conn: &Connection, query: &BlogQuery) -> ApiResult<BlogPage> {
    let mut filter = String::from(" WHERE b.is_published = 1");
    let mut args: Vec<Value> = Vec::new();
    if let Some(category) = query.category.as_deref().filter(|c| !c.is_empty()) {
        filter.push_str(" AND c.slug = ?");
        args.push(Value::Text(category.to_string()));
    }
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        filter.push_str(
            " AND (b.title LIKE ? ESCAPE '\\' OR b.excerpt LIKE ? ESCAPE '\\' \
             OR b.content LIKE ? ESCAPE '\\')",
        );
        args.extend(std::iter::repeat_n(Value::Text(like_pattern(search)), 3));
    }

    let total: i64 = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM blog_posts b \
             LEFT JOIN blog_categories c ON c.id = b.category_id{}",
            filter
        ),
        params_from_iter(args.iter()),
        |row| row.get(0),
    )?;

    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
    let page = query.page.unwrap_or(1).max(1);
    args.push(Value::Integer(i64::from(limit)));
    args.push(Value::Integer(i64::from((page - 1) * limit)));
    let posts = query_posts(
        conn,
        &format!(
            "{}{} ORDER BY b.published_at DESC, b.id DESC LIMIT ? OFFSET ?",
            POST_SELECT, filter
        ),
        &args,
    )?;

    let total = total as u64;
    Ok(BlogPage {
        posts,
        total,
        page: u64::from(page),
        total_pages: total.div_ceil(u64::from(limit)),
    })
}

pub fn featured(conn: &Connection, limit: u32) -> ApiResult<Vec<BlogPost>> {
    query_posts(
        conn,
        &format!(
            "{} WHERE b.is_published = 1 AND b.is_featured = 1 \
             ORDER BY b.published_at DESC LIMIT ?",
            POST_SELECT
        ),
        &[Value::Integer(i64::from(limit))],
    )
}

/// Every post including drafts, for the admin list.
pub fn all(conn: &Connection) -> ApiResult<Vec<BlogPost>> {
    query_posts(conn, &format!("{} ORDER BY b.created_at DESC, b.id DESC", POST_SELECT), &[])
}

pub fn get(conn: &Connection, id: i64) -> ApiResult<BlogPost> {
    conn.query_row(&format!("{} WHERE b.id = ?1", POST_SELECT), [id], post_from_row)
        .optional()?
        .ok_or(ApiError::NotFound("Post"))
}

/// A published post by slug. Each read counts as a view.
pub fn view_by_slug(conn: &Connection, slug: &str) -> ApiResult<BlogPost> {
    let changed = conn.execute(
        "UPDATE blog_posts SET views = views + 1 WHERE slug = ?1 AND is_published = 1",
        [slug],
    )?;
    if changed == 0 {
        return Err(ApiError::NotFound("Post"));
    }
    conn.query_row(&format!("{} WHERE b.slug = ?1", POST_SELECT), [slug], post_from_row)
        .optional()?
        .ok_or(ApiError::NotFound("Post"))
}

pub fn related(conn: &Connection, post: &BlogPost, limit: u32) -> ApiResult<Vec<BlogPost>> {
    let Some(category_id) = post.category_id else {
        return Ok(Vec::new());
    };
    query_posts(
        conn,
        &format!(
            "{} WHERE b.is_published = 1 AND b.category_id = ? AND b.id != ? \
             ORDER BY b.published_at DESC LIMIT ?",
            POST_SELECT
        ),
        &[
            Value::Integer(category_id),
            Value::Integer(post.id),
            Value::Integer(i64::from(limit)),
        ],
    )
}

pub fn insert(conn: &Connection, input: &BlogPostInput, author_id: Option<i64>) -> ApiResult<BlogPost> {
    let now = Utc::now();
    let published_at = input.is_published.then_some(now);
    conn.execute(
        "INSERT INTO blog_posts (title, slug, excerpt, content, featured_image, category_id, \
         author_id, is_published, is_featured, published_at, tags, meta_title, \
         meta_description, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)",
        params![
            input.title.trim(),
            slugify(&input.slug),
            input.excerpt,
            input.content,
            input.featured_image,
            input.category_id,
            author_id,
            input.is_published,
            input.is_featured,
            published_at,
            to_json(&input.tags)?,
            input.meta_title,
            input.meta_description,
            now,
        ],
    )
    .map_err(|e| conflict_on_unique(e, "A post with this slug already exists"))?;
    get(conn, conn.last_insert_rowid())
}

/// Applies a partial update. Publishing for the first time stamps
/// `published_at`; unpublishing keeps the old stamp.
pub fn update(conn: &Connection, id: i64, update: &BlogPostUpdate) -> ApiResult<BlogPost> {
    let mut post = get(conn, id)?;
    if let Some(title) = &update.title {
        post.title = title.trim().to_string();
    }
    if let Some(slug) = update.slug.as_deref().filter(|s| !s.trim().is_empty()) {
        post.slug = slugify(slug);
    }
    if let Some(excerpt) = &update.excerpt {
        post.excerpt = Some(excerpt.clone());
    }
    if let Some(content) = &update.content {
        post.content = content.clone();
    }
    if let Some(image) = &update.featured_image {
        post.featured_image = Some(image.clone()).filter(|i| !i.is_empty());
    }
    if let Some(category_id) = update.category_id {
        post.category_id = category_id;
    }
    if let Some(featured) = update.is_featured {
        post.is_featured = featured;
    }
    if let Some(tags) = &update.tags {
        post.tags = tags.clone();
    }
    if let Some(meta_title) = &update.meta_title {
        post.meta_title = Some(meta_title.clone());
    }
    if let Some(meta_description) = &update.meta_description {
        post.meta_description = Some(meta_description.clone());
    }
    if let Some(published) = update.is_published {
        if published && post.published_at.is_none() {
            post.published_at = Some(Utc::now());
        }
        post.is_published = published;
    }
    if post.title.is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }

    conn.execute(
        "UPDATE blog_posts SET title = ?2, slug = ?3, excerpt = ?4, content = ?5, \
         featured_image = ?6, category_id = ?7, is_published = ?8, is_featured = ?9, \
         published_at = ?10, tags = ?11, meta_title = ?12, meta_description = ?13, \
         updated_at = ?14 WHERE id = ?1",
        params![
            id,
            post.title,
            post.slug,
            post.excerpt,
            post.content,
            post.featured_image,
            post.category_id,
            post.is_published,
            post.is_featured,
            post.published_at,
            to_json(&post.tags)?,
            post.meta_title,
            post.meta_description,
            Utc::now(),
        ],
    )
    .map_err(|e| conflict_on_unique(e, "A post with this slug already exists"))?;
    get(conn, id)
}

pub fn delete(conn: &Connection, id: i64) -> ApiResult<()> {
    let changed = conn.execute("DELETE FROM blog_posts WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(ApiError::NotFound("Post"));
    }
    Ok(())
}

// ---- categories -----------------------------------------------------------

pub fn categories(conn: &Connection) -> ApiResult<Vec<BlogCategory>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.name, c.slug, c.description, c.color, \
         (SELECT COUNT(*) FROM blog_posts b WHERE b.category_id = c.id AND b.is_published = 1) \
         AS post_count FROM blog_categories c ORDER BY c.name",
    )?;
    let categories = stmt
        .query_map([], |row| {
            Ok(BlogCategory {
                id: row.get("id")?,
                name: row.get("name")?,
                slug: row.get("slug")?,
                description: row.get("description")?,
                color: row.get("color")?,
                post_count: row.get("post_count")?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(categories)
}

pub fn insert_category(conn: &Connection, input: &BlogCategoryInput) -> ApiResult<BlogCategory> {
    let slug = input
        .slug
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(slugify)
        .unwrap_or_else(|| slugify(&input.name));
    let color = input
        .color
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or(DEFAULT_CATEGORY_COLOR);
    conn.execute(
        "INSERT INTO blog_categories (name, slug, description, color) VALUES (?1, ?2, ?3, ?4)",
        params![input.name.trim(), slug, input.description, color],
    )
    .map_err(|e| conflict_on_unique(e, "A category with this slug already exists"))?;
    Ok(BlogCategory {
        id: conn.last_insert_rowid(),
        name: input.name.trim().to_string(),
        slug,
        description: input.description.clone(),
        color: color.to_string(),
        post_count: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Db;

    fn post(title: &str, slug: &str, published: bool) -> BlogPostInput {
        BlogPostInput {
            title: title.into(),
            slug: slug.into(),
            content: "# Hello".into(),
            is_published: published,
            ..Default::default()
        }
    }

    #[test]
    fn only_published_posts_are_listed_and_viewed() {
        let db = Db::open_in_memory().unwrap();
        db.run_blocking(|conn| {
            insert(conn, &post("Why Yoruba?", "why-yoruba", true), None)?;
            insert(conn, &post("Draft", "draft", false), None)?;

            let page = published(conn, &BlogQuery::default())?;
            assert_eq!(page.total, 1);
            assert_eq!(page.posts[0].slug, "why-yoruba");

            assert_eq!(view_by_slug(conn, "why-yoruba")?.views, 1);
            assert_eq!(view_by_slug(conn, "why-yoruba")?.views, 2);
            assert!(matches!(view_by_slug(conn, "draft"), Err(ApiError::NotFound(_))));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn first_publish_stamps_published_at_once() {
        let db = Db::open_in_memory().unwrap();
        db.run_blocking(|conn| {
            let draft = insert(conn, &post("Draft", "draft", false), None)?;
            assert!(draft.published_at.is_none());

            let publish = BlogPostUpdate { is_published: Some(true), ..Default::default() };
            let live = update(conn, draft.id, &publish)?;
            let stamp = live.published_at;
            assert!(stamp.is_some());

            let hide = BlogPostUpdate { is_published: Some(false), ..Default::default() };
            update(conn, draft.id, &hide)?;
            assert_eq!(update(conn, draft.id, &publish)?.published_at, stamp);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn duplicate_slugs_conflict() {
        let db = Db::open_in_memory().unwrap();
        db.run_blocking(|conn| {
            insert(conn, &post("One", "same", true), None)?;
            let err = insert(conn, &post("Two", "same", true), None).unwrap_err();
            assert!(matches!(err, ApiError::Conflict(_)));
            Ok(())
        })
        .unwrap();
    }
}
