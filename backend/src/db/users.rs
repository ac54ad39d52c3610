//! Accounts, sessions, notifications and loyalty points.

use chrono::{DateTime, Utc};
use common::loyalty::{PointsAccount, Reward};
use common::model::user::{Notification, NotificationPreferences, Role, User, DEFAULT_TIMEZONE};
use common::requests::{AccountDetails, ProfileUpdate, RegisterRequest};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::products::conflict_on_unique;
use super::{json_column, parsed_column, to_json};
use crate::error::{ApiError, ApiResult};

const USER_SELECT: &str = "SELECT id, email, first_name, last_name, phone, role, timezone, \
    date_of_birth, avatar_url, loyalty_points, created_at FROM users";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        email: row.get("email")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        phone: row.get("phone")?,
        role: parsed_column(row, "role")?,
        timezone: row.get("timezone")?,
        date_of_birth: row.get("date_of_birth")?,
        avatar_url: row.get("avatar_url")?,
        loyalty_points: row.get("loyalty_points")?,
        created_at: row.get("created_at")?,
    })
}

pub fn find(conn: &Connection, id: i64) -> ApiResult<Option<User>> {
    Ok(conn
        .query_row(&format!("{} WHERE id = ?1", USER_SELECT), [id], user_from_row)
        .optional()?)
}

pub fn get(conn: &Connection, id: i64) -> ApiResult<User> {
    find(conn, id)?.ok_or(ApiError::NotFound("User"))
}

/// Looks a user up by email and returns it with its password hash.
pub fn find_with_hash(conn: &Connection, email: &str) -> ApiResult<Option<(User, String)>> {
    Ok(conn
        .query_row(
            "SELECT id, email, first_name, last_name, phone, role, timezone, date_of_birth, \
             avatar_url, loyalty_points, created_at, password_hash \
             FROM users WHERE email = ?1",
            [email.trim()],
            |row| Ok((user_from_row(row)?, row.get("password_hash")?)),
        )
        .optional()?)
}

pub fn password_hash(conn: &Connection, id: i64) -> ApiResult<String> {
    conn.query_row("SELECT password_hash FROM users WHERE id = ?1", [id], |row| row.get(0))
        .optional()?
        .ok_or(ApiError::NotFound("User"))
}

pub fn insert(
    conn: &Connection,
    request: &RegisterRequest,
    role: Role,
    password_hash: &str,
) -> ApiResult<User> {
    let now = Utc::now();
    let timezone = request
        .timezone
        .as_deref()
        .filter(|tz| !tz.trim().is_empty())
        .unwrap_or(DEFAULT_TIMEZONE);
    conn.execute(
        "INSERT INTO users (email, password_hash, first_name, last_name, phone, role, \
         timezone, how_heard, subscribe_newsletter, registration, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
        params![
            request.email.trim().to_lowercase(),
            password_hash,
            request.first_name.trim(),
            request.last_name.trim(),
            request.phone,
            role.as_str(),
            timezone,
            request.how_heard,
            request.subscribe_newsletter,
            to_json(&request.account)?,
            now,
        ],
    )
    .map_err(|e| conflict_on_unique(e, "An account with this email already exists"))?;
    get(conn, conn.last_insert_rowid())
}

pub fn registration(conn: &Connection, id: i64) -> ApiResult<AccountDetails> {
    conn.query_row("SELECT registration FROM users WHERE id = ?1", [id], |row| {
        json_column(row, "registration")
    })
    .optional()?
    .ok_or(ApiError::NotFound("User"))
}

pub fn update_profile(conn: &Connection, id: i64, update: &ProfileUpdate) -> ApiResult<User> {
    let changed = conn.execute(
        "UPDATE users SET first_name = COALESCE(?2, first_name), \
         last_name = COALESCE(?3, last_name), phone = COALESCE(?4, phone), \
         timezone = COALESCE(?5, timezone), date_of_birth = COALESCE(?6, date_of_birth), \
         avatar_url = COALESCE(?7, avatar_url), updated_at = ?8 WHERE id = ?1",
        params![
            id,
            update.first_name.as_deref().map(str::trim),
            update.last_name.as_deref().map(str::trim),
            update.phone,
            update.timezone,
            update.date_of_birth,
            update.avatar_url,
            Utc::now(),
        ],
    )?;
    if changed == 0 {
        return Err(ApiError::NotFound("User"));
    }
    get(conn, id)
}

pub fn set_password_hash(conn: &Connection, id: i64, hash: &str) -> ApiResult<()> {
    conn.execute(
        "UPDATE users SET password_hash = ?2, updated_at = ?3 WHERE id = ?1",
        params![id, hash, Utc::now()],
    )?;
    Ok(())
}

pub fn set_role(conn: &Connection, id: i64, role: Role) -> ApiResult<()> {
    conn.execute("UPDATE users SET role = ?2 WHERE id = ?1", params![id, role.as_str()])?;
    Ok(())
}

pub fn preferences(conn: &Connection, id: i64) -> ApiResult<NotificationPreferences> {
    conn.query_row("SELECT preferences FROM users WHERE id = ?1", [id], |row| {
        json_column(row, "preferences")
    })
    .optional()?
    .ok_or(ApiError::NotFound("User"))
}

pub fn set_preferences(
    conn: &Connection,
    id: i64,
    preferences: &NotificationPreferences,
) -> ApiResult<()> {
    conn.execute(
        "UPDATE users SET preferences = ?2, updated_at = ?3 WHERE id = ?1",
        params![id, to_json(preferences)?, Utc::now()],
    )?;
    Ok(())
}

// ---- sessions -------------------------------------------------------------

pub fn insert_session(
    conn: &Connection,
    token: &str,
    user_id: i64,
    expires_at: DateTime<Utc>,
) -> ApiResult<()> {
    conn.execute(
        "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
        params![token, user_id, Utc::now(), expires_at],
    )?;
    Ok(())
}

/// Resolves a bearer token to its user. Expired sessions are removed.
pub fn user_for_token(conn: &Connection, token: &str) -> ApiResult<Option<User>> {
    let session: Option<(i64, DateTime<Utc>)> = conn
        .query_row(
            "SELECT user_id, expires_at FROM sessions WHERE token = ?1",
            [token],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    match session {
        Some((_, expires_at)) if expires_at <= Utc::now() => {
            delete_session(conn, token)?;
            Ok(None)
        }
        Some((user_id, _)) => find(conn, user_id),
        None => Ok(None),
    }
}

pub fn delete_session(conn: &Connection, token: &str) -> ApiResult<()> {
    conn.execute("DELETE FROM sessions WHERE token = ?1", [token])?;
    Ok(())
}

/// Drops every session of a user except `keep`.
pub fn delete_other_sessions(conn: &Connection, user_id: i64, keep: &str) -> ApiResult<usize> {
    Ok(conn.execute(
        "DELETE FROM sessions WHERE user_id = ?1 AND token != ?2",
        params![user_id, keep],
    )?)
}

// ---- notifications --------------------------------------------------------

fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: row.get("id")?,
        title: row.get("title")?,
        message: row.get("message")?,
        kind: row.get("kind")?,
        is_read: row.get("is_read")?,
        created_at: row.get("created_at")?,
    })
}

pub fn notify(conn: &Connection, user_id: i64, title: &str, message: &str, kind: &str) -> ApiResult<()> {
    conn.execute(
        "INSERT INTO notifications (user_id, title, message, kind, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![user_id, title, message, kind, Utc::now()],
    )?;
    Ok(())
}

pub fn notifications(conn: &Connection, user_id: i64, limit: u32) -> ApiResult<Vec<Notification>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, message, kind, is_read, created_at FROM notifications \
         WHERE user_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2",
    )?;
    let notifications = stmt
        .query_map(params![user_id, limit], notification_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(notifications)
}

pub fn unread_count(conn: &Connection, user_id: i64) -> ApiResult<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND is_read = 0",
        [user_id],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

pub fn mark_read(conn: &Connection, user_id: i64, id: i64) -> ApiResult<()> {
    let changed = conn.execute(
        "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    if changed == 0 {
        return Err(ApiError::NotFound("Notification"));
    }
    Ok(())
}

pub fn mark_all_read(conn: &Connection, user_id: i64) -> ApiResult<usize> {
    Ok(conn.execute(
        "UPDATE notifications SET is_read = 1 WHERE user_id = ?1 AND is_read = 0",
        [user_id],
    )?)
}

// ---- loyalty --------------------------------------------------------------

pub fn points(conn: &Connection, user_id: i64) -> ApiResult<PointsAccount> {
    conn.query_row(
        "SELECT loyalty_points, lifetime_points FROM users WHERE id = ?1",
        [user_id],
        |row| {
            Ok(PointsAccount {
                balance: row.get(0)?,
                lifetime: row.get(1)?,
            })
        },
    )
    .optional()?
    .ok_or(ApiError::NotFound("User"))
}

fn store_points(conn: &Connection, user_id: i64, account: &PointsAccount) -> ApiResult<()> {
    conn.execute(
        "UPDATE users SET loyalty_points = ?2, lifetime_points = ?3, updated_at = ?4 \
         WHERE id = ?1",
        params![user_id, account.balance, account.lifetime, Utc::now()],
    )?;
    Ok(())
}

/// Awards points for completed lessons at the member's tier rate.
pub fn credit_lessons(conn: &Connection, user_id: i64, lessons: u32) -> ApiResult<PointsAccount> {
    let mut account = points(conn, user_id)?;
    let earned = account.credit_lessons(lessons);
    store_points(conn, user_id, &account)?;
    notify(
        conn,
        user_id,
        "Points earned",
        &format!("You earned {} points for {} completed lessons.", earned, lessons),
        "loyalty",
    )?;
    Ok(account)
}

/// Spends points on a reward and records the redemption.
pub fn redeem(conn: &mut Connection, user_id: i64, reward: &Reward) -> ApiResult<PointsAccount> {
    let tx = conn.transaction()?;
    let mut account = points(&tx, user_id)?;
    account
        .redeem(reward)
        .map_err(|refusal| ApiError::BadRequest(refusal.to_string()))?;
    store_points(&tx, user_id, &account)?;
    tx.execute(
        "INSERT INTO loyalty_redemptions (user_id, reward_id, points, created_at) \
         VALUES (?1, ?2, ?3, ?4)",
        params![user_id, reward.id, reward.points, Utc::now()],
    )?;
    notify(
        &tx,
        user_id,
        "Reward redeemed",
        &format!("You redeemed {} for {} points.", reward.name, reward.points),
        "loyalty",
    )?;
    tx.commit()?;
    Ok(account)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Db;
    use common::loyalty::find_reward;

    fn register(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "password123".to_string(),
            first_name: "Amara".to_string(),
            last_name: "Eze".to_string(),
            phone: None,
            timezone: None,
            how_heard: None,
            subscribe_newsletter: false,
            account: AccountDetails::Customer,
        }
    }

    #[test]
    fn emails_are_unique_case_insensitively() {
        let db = Db::open_in_memory().unwrap();
        db.run_blocking(|conn| {
            let user = insert(conn, &register("Amara@Example.com"), Role::Customer, "hash")?;
            assert_eq!(user.email, "amara@example.com");
            assert_eq!(user.timezone, DEFAULT_TIMEZONE);
            let err = insert(conn, &register("amara@example.com"), Role::Customer, "hash")
                .unwrap_err();
            assert!(matches!(err, ApiError::Conflict(_)));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn expired_sessions_resolve_to_nobody() {
        let db = Db::open_in_memory().unwrap();
        db.run_blocking(|conn| {
            let user = insert(conn, &register("kid@example.com"), Role::Student, "hash")?;
            insert_session(conn, "live", user.id, Utc::now() + chrono::Duration::hours(1))?;
            insert_session(conn, "stale", user.id, Utc::now() - chrono::Duration::hours(1))?;
            assert_eq!(user_for_token(conn, "live")?.map(|u| u.id), Some(user.id));
            assert!(user_for_token(conn, "stale")?.is_none());
            assert!(user_for_token(conn, "missing")?.is_none());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn notifications_track_unread_count() {
        let db = Db::open_in_memory().unwrap();
        db.run_blocking(|conn| {
            let user = insert(conn, &register("kid@example.com"), Role::Student, "hash")?;
            notify(conn, user.id, "Welcome", "Hello!", "info")?;
            notify(conn, user.id, "Lesson", "Tomorrow at 5", "lesson")?;
            assert_eq!(unread_count(conn, user.id)?, 2);
            let first = notifications(conn, user.id, 10)?[0].id;
            mark_read(conn, user.id, first)?;
            assert_eq!(unread_count(conn, user.id)?, 1);
            assert_eq!(mark_all_read(conn, user.id)?, 1);
            assert!(matches!(mark_read(conn, user.id + 1, first), Err(ApiError::NotFound(_))));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn redeeming_spends_balance_but_keeps_lifetime() {
        let db = Db::open_in_memory().unwrap();
        db.run_blocking(|conn| {
            let user = insert(conn, &register("kid@example.com"), Role::Student, "hash")?;
            credit_lessons(conn, user.id, 40)?;
            let lesson = find_reward("bonus-lesson").unwrap();
            let account = redeem(conn, user.id, lesson)?;
            assert_eq!(account.balance, 200 - lesson.points);
            assert_eq!(account.lifetime, 200);
            assert_eq!(points(conn, user.id)?, account);

            let err = redeem(conn, user.id, lesson).unwrap_err();
            assert!(matches!(err, ApiError::BadRequest(_)));
            Ok(())
        })
        .unwrap();
    }
}
