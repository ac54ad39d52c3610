use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::model::user::AuthSession;
use common::requests::LoginRequest;
use log::info;

use crate::auth::{start_session, verify_password, AuthUser};
use crate::config::ServerConfig;
use crate::db::{users, Db};
use crate::error::{ApiError, ApiResult};

/// `POST /api/auth/login`
pub(crate) async fn process(
    db: web::Data<Db>,
    config: web::Data<ServerConfig>,
    payload: web::Json<LoginRequest>,
) -> impl Responder {
    match login(db, config, payload.into_inner()).await {
        Ok(session) => HttpResponse::Ok().json(session),
        Err(err) => err.error_response(),
    }
}

async fn login(
    db: web::Data<Db>,
    config: web::Data<ServerConfig>,
    request: LoginRequest,
) -> ApiResult<AuthSession> {
    request.validate()?;
    let invalid = || ApiError::BadRequest("Invalid email or password".to_string());

    let email = request.email.clone();
    let (user, hash) = db
        .run(move |conn| users::find_with_hash(conn, &email))
        .await?
        .ok_or_else(invalid)?;
    let password = request.password;
    if !web::block(move || verify_password(&password, &hash)).await? {
        return Err(invalid());
    }

    let ttl_hours = config.session_ttl_hours;
    let session = db.run(move |conn| start_session(conn, user, ttl_hours)).await?;
    info!("{} signed in", session.user.email);
    Ok(session)
}

/// `POST /api/auth/logout`
pub(crate) async fn logout(db: web::Data<Db>, caller: AuthUser) -> impl Responder {
    let token = caller.token;
    match db.run(move |conn| users::delete_session(conn, &token)).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => err.error_response(),
    }
}
