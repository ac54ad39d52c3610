use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::requests::ChangePasswordRequest;
use log::info;
use serde_json::json;

use crate::auth::{hash_password, verify_password, AuthUser};
use crate::db::{users, Db};
use crate::error::{ApiError, ApiResult};

/// `PUT /api/auth/password`
pub(crate) async fn process(
    db: web::Data<Db>,
    caller: AuthUser,
    payload: web::Json<ChangePasswordRequest>,
) -> impl Responder {
    match change_password(db, caller.user.id, caller.token, payload.into_inner()).await {
        Ok(()) => HttpResponse::Ok().json(json!({ "message": "Password updated successfully" })),
        Err(err) => err.error_response(),
    }
}

/// Verifies the current password, stores the new one and signs out every
/// other session of the user. The session identified by `keep_token` stays.
pub(crate) async fn change_password(
    db: web::Data<Db>,
    user_id: i64,
    keep_token: String,
    request: ChangePasswordRequest,
) -> ApiResult<()> {
    request.validate()?;
    let current_hash = db.run(move |conn| users::password_hash(conn, user_id)).await?;

    let ChangePasswordRequest {
        current_password,
        new_password,
        ..
    } = request;
    let new_hash = web::block(move || {
        if !verify_password(&current_password, &current_hash) {
            return Err(ApiError::BadRequest("Current password is incorrect".to_string()));
        }
        hash_password(&new_password)
    })
    .await??;

    let ended = db
        .run(move |conn| {
            users::set_password_hash(conn, user_id, &new_hash)?;
            users::delete_other_sessions(conn, user_id, &keep_token)
        })
        .await?;
    info!("User {} changed password, ended {} other sessions", user_id, ended);
    Ok(())
}
