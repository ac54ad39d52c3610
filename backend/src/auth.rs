//! Password hashing, bearer sessions and the extractors that guard routes.
//!
//! Tokens are opaque random strings stored in the `sessions` table with an
//! expiry. Handlers ask for the caller they need:
//!
//! - [`AuthUser`]: any signed-in user, 401 otherwise.
//! - [`PortalUser`]: a student, parent or admin, 403 for other roles.
//! - [`AdminUser`]: an admin, 403 for other roles.
//! - [`OptionalUser`]: the user when a valid token is present, never fails.

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use common::model::user::{AuthSession, Role, User};
use common::requests::{AccountDetails, RegisterRequest};
use futures_util::future::LocalBoxFuture;
use log::{info, warn};
use rusqlite::Connection;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::db::{users, Db};
use crate::error::{ApiError, ApiResult};

pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

/// Opens a session for `user` valid for `ttl_hours`.
pub fn start_session(conn: &Connection, user: User, ttl_hours: i64) -> ApiResult<AuthSession> {
    let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
    let expires_at = Utc::now() + Duration::hours(ttl_hours);
    users::insert_session(conn, &token, user.id, expires_at)?;
    Ok(AuthSession {
        user,
        token,
        expires_at,
    })
}

/// Checks email and password. Unknown emails and wrong passwords get the
/// same answer.
pub fn authenticate(conn: &Connection, email: &str, password: &str) -> ApiResult<User> {
    let invalid = || ApiError::BadRequest("Invalid email or password".to_string());
    let (user, hash) = users::find_with_hash(conn, email)?.ok_or_else(invalid)?;
    if verify_password(password, &hash) {
        Ok(user)
    } else {
        Err(invalid())
    }
}

pub fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

async fn resolve(req: &HttpRequest) -> ApiResult<Option<(User, String)>> {
    let Some(token) = bearer_token(req) else {
        return Ok(None);
    };
    let db = req
        .app_data::<web::Data<Db>>()
        .cloned()
        .ok_or_else(|| ApiError::Internal("database not configured".to_string()))?;
    let lookup = token.clone();
    let user = db
        .run(move |conn| users::user_for_token(conn, &lookup))
        .await?;
    Ok(user.map(|user| (user, token)))
}

pub struct AuthUser {
    pub user: User,
    pub token: String,
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let (user, token) = resolve(&req).await?.ok_or(ApiError::Unauthorized)?;
            Ok(AuthUser { user, token })
        })
    }
}

pub struct PortalUser {
    pub user: User,
    pub token: String,
}

impl FromRequest for PortalUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let (user, token) = resolve(&req).await?.ok_or(ApiError::Unauthorized)?;
            if !user.role.has_portal() {
                return Err(ApiError::Forbidden(
                    "The student portal is only available to students and parents".to_string(),
                ));
            }
            Ok(PortalUser { user, token })
        })
    }
}

pub struct AdminUser(pub User);

impl FromRequest for AdminUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let (user, _) = resolve(&req).await?.ok_or(ApiError::Unauthorized)?;
            if user.role != Role::Admin {
                return Err(ApiError::Forbidden("Admin access required".to_string()));
            }
            Ok(AdminUser(user))
        })
    }
}

pub struct OptionalUser(pub Option<User>);

impl FromRequest for OptionalUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move { Ok(OptionalUser(resolve(&req).await?.map(|(user, _)| user))) })
    }
}

/// Creates the admin account named by `ADMIN_EMAIL`/`ADMIN_PASSWORD`, or
/// promotes it when the email is already registered.
pub fn bootstrap_admin(db: &Db, config: &ServerConfig) -> ApiResult<()> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(());
    };
    db.run_blocking(|conn| {
        if let Some((user, _)) = users::find_with_hash(conn, email)? {
            if user.role != Role::Admin {
                users::set_role(conn, user.id, Role::Admin)?;
                info!("Promoted {} to admin", email);
            }
            return Ok(());
        }
        let request = RegisterRequest {
            email: email.clone(),
            password: password.clone(),
            first_name: "Site".to_string(),
            last_name: "Admin".to_string(),
            phone: None,
            timezone: None,
            how_heard: None,
            subscribe_newsletter: false,
            account: AccountDetails::Customer,
        };
        request.validate()?;
        users::insert(conn, &request, Role::Admin, &hash_password(password)?)?;
        info!("Created admin account {}", email);
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn hashes_verify_only_the_original_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("battery staple", &hash));
        assert!(!verify_password("correct horse", "not-a-phc-string"));
    }

    #[test]
    fn bearer_token_requires_the_scheme() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer abc123"))
            .to_http_request();
        assert_eq!(bearer_token(&req).as_deref(), Some("abc123"));

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Basic abc123"))
            .to_http_request();
        assert_eq!(bearer_token(&req), None);
    }

    #[test]
    fn bootstrap_promotes_an_existing_account() {
        let db = Db::open_in_memory().unwrap();
        let config = ServerConfig::from_lookup(|key| match key {
            "ADMIN_EMAIL" => Some("owner@example.com".to_string()),
            "ADMIN_PASSWORD" => Some("a-long-password".to_string()),
            _ => None,
        });
        bootstrap_admin(&db, &config).unwrap();
        bootstrap_admin(&db, &config).unwrap();
        let user = db
            .run_blocking(|conn| authenticate(conn, "owner@example.com", "a-long-password"))
            .unwrap();
        assert_eq!(user.role, Role::Admin);
    }
}
