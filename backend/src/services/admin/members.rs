use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::loyalty::LoyaltySummary;
use common::requests::LessonCreditRequest;
use log::info;

use crate::auth::AdminUser;
use crate::db::{users, Db};
use crate::error::{ApiError, ApiResult};

/// `POST /api/admin/users/{id}/lessons`
pub(crate) async fn credit_lessons(
    db: web::Data<Db>,
    _admin: AdminUser,
    path: web::Path<i64>,
    payload: web::Json<LessonCreditRequest>,
) -> impl Responder {
    match credit(db, path.into_inner(), payload.into_inner()).await {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(err) => err.error_response(),
    }
}

async fn credit(db: web::Data<Db>, user_id: i64, request: LessonCreditRequest) -> ApiResult<LoyaltySummary> {
    if request.lessons == 0 {
        return Err(ApiError::BadRequest("At least one lesson is required".to_string()));
    }
    let account = db
        .run(move |conn| {
            users::get(conn, user_id)?;
            users::credit_lessons(conn, user_id, request.lessons)
        })
        .await?;
    info!("Credited {} lessons to user {}", request.lessons, user_id);
    Ok(account.summary())
}
