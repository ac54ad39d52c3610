//! Rows of the media library.

use chrono::Utc;
use common::model::media::{FolderCount, Media, MediaPage, MediaSuggestion, DEFAULT_FOLDER};
use common::requests::{MediaQuery, MediaUpdate};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::like_pattern;
use crate::error::{ApiError, ApiResult};

pub const DEFAULT_LIMIT: u32 = 20;

const MEDIA_SELECT: &str = "SELECT id, filename, original_name, url, mime_type, file_size, \
    width, height, title, alt_text, description, folder, created_at, updated_at \
    FROM media_library";

fn media_from_row(row: &Row<'_>) -> rusqlite::Result<Media> {
    let file_size: i64 = row.get("file_size")?;
    Ok(Media {
        id: row.get("id")?,
        filename: row.get("filename")?,
        original_name: row.get("original_name")?,
        url: row.get("url")?,
        mime_type: row.get("mime_type")?,
        file_size: file_size.max(0) as u64,
        width: row.get("width")?,
        height: row.get("height")?,
        title: row.get("title")?,
        alt_text: row.get("alt_text")?,
        description: row.get("description")?,
        folder: row.get("folder")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// A stored object about to get its library row.
#[derive(Debug, Clone)]
pub struct NewMedia<'a> {
    pub filename: &'a str,
    pub original_name: &'a str,
    pub bucket: &'a str,
    pub object_key: &'a str,
    pub url: &'a str,
    pub mime_type: &'a str,
    pub file_size: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub title: Option<&'a str>,
    pub folder: &'a str,
}

pub fn insert(conn: &Connection, media: &NewMedia<'_>) -> ApiResult<Media> {
    let now = Utc::now();
    let folder = if media.folder.trim().is_empty() {
        DEFAULT_FOLDER
    } else {
        media.folder.trim()
    };
    conn.execute(
        "INSERT INTO media_library (filename, original_name, bucket, object_key, url, \
         mime_type, file_size, width, height, title, folder, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
        params![
            media.filename,
            media.original_name,
            media.bucket,
            media.object_key,
            media.url,
            media.mime_type,
            media.file_size as i64,
            media.width,
            media.height,
            media.title,
            folder,
            now,
        ],
    )?;
    get(conn, conn.last_insert_rowid())
}

pub fn find(conn: &Connection, id: i64) -> ApiResult<Option<Media>> {
    Ok(conn
        .query_row(&format!("{} WHERE id = ?1", MEDIA_SELECT), [id], media_from_row)
        .optional()?)
}

pub fn get(conn: &Connection, id: i64) -> ApiResult<Media> {
    find(conn, id)?.ok_or(ApiError::NotFound("Media"))
}

/// Bucket and key of the stored object behind a row.
pub fn location(conn: &Connection, id: i64) -> ApiResult<(String, String)> {
    conn.query_row(
        "SELECT bucket, object_key FROM media_library WHERE id = ?1",
        [id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()?
    .ok_or(ApiError::NotFound("Media"))
}

pub fn known_keys(conn: &Connection, bucket: &str) -> ApiResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT object_key FROM media_library WHERE bucket = ?1")?;
    let keys = stmt
        .query_map([bucket], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(keys)
}

/// Filtered, newest-first page of the library.
pub fn search(conn: &Connection, query: &MediaQuery) -> ApiResult<MediaPage> {
    let mut filter = String::from(" WHERE 1 = 1");
    let mut args: Vec<Value> = Vec::new();

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        filter.push_str(
            " AND (title LIKE ?1 ESCAPE '\\' OR alt_text LIKE ?1 ESCAPE '\\' \
             OR original_name LIKE ?1 ESCAPE '\\' OR description LIKE ?1 ESCAPE '\\')",
        );
        args.push(Value::Text(like_pattern(search)));
    }
    if let Some(folder) = query.folder.as_deref().filter(|f| !f.is_empty()) {
        filter.push_str(&format!(" AND folder = ?{}", args.len() + 1));
        args.push(Value::Text(folder.to_string()));
    }
    if let Some(mime) = query.mime_type.as_deref().filter(|m| !m.is_empty()) {
        filter.push_str(&format!(" AND mime_type LIKE ?{} ESCAPE '\\'", args.len() + 1));
        let prefix = mime.replace('%', "\\%").replace('_', "\\_");
        args.push(Value::Text(format!("{}%", prefix)));
    }

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM media_library{}", filter),
        params_from_iter(args.iter()),
        |row| row.get(0),
    )?;

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).max(1);
    let offset = query.offset.unwrap_or(0);
    let sql = format!(
        "{}{} ORDER BY created_at DESC, id DESC LIMIT ?{} OFFSET ?{}",
        MEDIA_SELECT,
        filter,
        args.len() + 1,
        args.len() + 2
    );
    args.push(Value::Integer(i64::from(limit)));
    args.push(Value::Integer(i64::from(offset)));

    let mut stmt = conn.prepare(&sql)?;
    let media = stmt
        .query_map(params_from_iter(args.iter()), media_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(MediaPage::new(media, total as u64, u64::from(limit), u64::from(offset)))
}

pub fn folders(conn: &Connection) -> ApiResult<Vec<FolderCount>> {
    let mut stmt = conn.prepare(
        "SELECT folder, COUNT(*) FROM media_library GROUP BY folder ORDER BY folder",
    )?;
    let folders = stmt
        .query_map([], |row| {
            let count: i64 = row.get(1)?;
            Ok(FolderCount {
                folder: row.get(0)?,
                count: count as u64,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(folders)
}

/// Updates the given metadata fields and keeps the others.
pub fn update(conn: &Connection, id: i64, update: &MediaUpdate) -> ApiResult<Media> {
    let changed = conn.execute(
        "UPDATE media_library SET title = COALESCE(?2, title), \
         alt_text = COALESCE(?3, alt_text), description = COALESCE(?4, description), \
         folder = COALESCE(?5, folder), updated_at = ?6 WHERE id = ?1",
        params![
            id,
            update.title,
            update.alt_text,
            update.description,
            update.folder.as_deref().map(str::trim).filter(|f| !f.is_empty()),
            Utc::now(),
        ],
    )?;
    if changed == 0 {
        return Err(ApiError::NotFound("Media"));
    }
    get(conn, id)
}

/// Fills in what the analysis suggested. The stored filename never changes;
/// a suggested filename becomes the title.
pub fn apply_suggestion(conn: &Connection, id: i64, suggestion: &MediaSuggestion) -> ApiResult<Media> {
    update(
        conn,
        id,
        &MediaUpdate {
            title: suggestion.filename.clone(),
            alt_text: suggestion.alt.clone(),
            description: suggestion.description.clone(),
            folder: None,
        },
    )
}

pub fn delete(conn: &Connection, id: i64) -> ApiResult<()> {
    let changed = conn.execute("DELETE FROM media_library WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(ApiError::NotFound("Media"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Db;

    fn new_media<'a>(key: &'a str, name: &'a str, folder: &'a str, mime: &'a str) -> NewMedia<'a> {
        NewMedia {
            filename: key,
            original_name: name,
            bucket: "media",
            object_key: key,
            url: key,
            mime_type: mime,
            file_size: 1024,
            width: Some(10),
            height: Some(10),
            title: None,
            folder,
        }
    }

    #[test]
    fn search_matches_names_and_filters_by_folder_and_type() {
        let db = Db::open_in_memory().unwrap();
        db.run_blocking(|conn| {
            insert(conn, &new_media("a.jpg", "drum_circle.jpg", "events", "image/jpeg"))?;
            insert(conn, &new_media("b.png", "alphabet.png", "uploads", "image/png"))?;
            insert(conn, &new_media("c.png", "drum_kit.png", "", "image/png"))?;

            let query = MediaQuery { search: Some("drum".into()), ..Default::default() };
            assert_eq!(search(conn, &query)?.total, 2);

            let query = MediaQuery { folder: Some("uploads".into()), ..Default::default() };
            let page = search(conn, &query)?;
            assert_eq!(page.total, 2);
            assert_eq!(page.media[0].filename, "c.png");

            let query = MediaQuery {
                search: Some("drum".into()),
                mime_type: Some("image/png".into()),
                ..Default::default()
            };
            assert_eq!(search(conn, &query)?.total, 1);

            let folders = folders(conn)?;
            assert_eq!(
                folders,
                vec![
                    FolderCount { folder: "events".into(), count: 1 },
                    FolderCount { folder: "uploads".into(), count: 2 },
                ]
            );
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn partial_update_keeps_absent_fields() {
        let db = Db::open_in_memory().unwrap();
        db.run_blocking(|conn| {
            let media = insert(conn, &new_media("a.jpg", "a.jpg", "uploads", "image/jpeg"))?;
            update(conn, media.id, &MediaUpdate { title: Some("Drums".into()), ..Default::default() })?;
            let updated = update(
                conn,
                media.id,
                &MediaUpdate { alt_text: Some("Children drumming".into()), ..Default::default() },
            )?;
            assert_eq!(updated.title.as_deref(), Some("Drums"));
            assert_eq!(updated.alt_text.as_deref(), Some("Children drumming"));
            assert_eq!(updated.folder, "uploads");
            Ok(())
        })
        .unwrap();
    }
}
