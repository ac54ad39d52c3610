use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::model::user::User;
use common::requests::ProfileUpdate;

use crate::auth::AuthUser;
use crate::db::{users, Db};
use crate::error::ApiResult;

/// `GET /api/auth/me`
pub(crate) async fn process(caller: AuthUser) -> impl Responder {
    HttpResponse::Ok().json(caller.user)
}

/// `PUT /api/auth/me`
pub(crate) async fn update(
    db: web::Data<Db>,
    caller: AuthUser,
    payload: web::Json<ProfileUpdate>,
) -> impl Responder {
    match update_profile(db, caller.user.id, payload.into_inner()).await {
        Ok(user) => HttpResponse::Ok().json(user),
        Err(err) => err.error_response(),
    }
}

pub(crate) async fn update_profile(
    db: web::Data<Db>,
    user_id: i64,
    update: ProfileUpdate,
) -> ApiResult<User> {
    update.validate()?;
    db.run(move |conn| users::update_profile(conn, user_id, &update))
        .await
}
