use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::model::user::NotificationList;
use serde_json::json;

use crate::auth::PortalUser;
use crate::db::{users, Db};

const NOTIFICATION_LIMIT: u32 = 50;

/// `GET /api/portal/student/notifications`
pub(crate) async fn process(db: web::Data<Db>, caller: PortalUser) -> impl Responder {
    let user_id = caller.user.id;
    let result = db
        .run(move |conn| {
            Ok(NotificationList {
                notifications: users::notifications(conn, user_id, NOTIFICATION_LIMIT)?,
                unread_count: users::unread_count(conn, user_id)?,
            })
        })
        .await;
    match result {
        Ok(list) => HttpResponse::Ok().json(list),
        Err(err) => err.error_response(),
    }
}

/// `PUT /api/portal/student/notifications/{id}/read`
pub(crate) async fn read_one(db: web::Data<Db>, caller: PortalUser, path: web::Path<i64>) -> impl Responder {
    let user_id = caller.user.id;
    let id = path.into_inner();
    match db.run(move |conn| users::mark_read(conn, user_id, id)).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => err.error_response(),
    }
}

/// `PUT /api/portal/student/notifications/read-all`
pub(crate) async fn read_all(db: web::Data<Db>, caller: PortalUser) -> impl Responder {
    let user_id = caller.user.id;
    match db.run(move |conn| users::mark_all_read(conn, user_id)).await {
        Ok(marked) => HttpResponse::Ok().json(json!({ "marked": marked })),
        Err(err) => err.error_response(),
    }
}
