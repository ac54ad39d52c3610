use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::model::user::{NotificationPreferences, StudentProfile};
use common::requests::{ChangePasswordRequest, ProfileUpdate};
use serde_json::json;

use crate::auth::PortalUser;
use crate::db::{users, Db};
use crate::error::ApiResult;
use crate::services::auth::{me, password};

async fn load_profile(db: &web::Data<Db>, user_id: i64) -> ApiResult<StudentProfile> {
    db.run(move |conn| {
        Ok(StudentProfile {
            user: users::get(conn, user_id)?,
            preferences: users::preferences(conn, user_id)?,
            account: users::registration(conn, user_id)?,
        })
    })
    .await
}

/// `GET /api/portal/student/profile`
pub(crate) async fn process(db: web::Data<Db>, caller: PortalUser) -> impl Responder {
    match load_profile(&db, caller.user.id).await {
        Ok(profile) => HttpResponse::Ok().json(profile),
        Err(err) => err.error_response(),
    }
}

/// `PUT /api/portal/student/profile`
pub(crate) async fn update(
    db: web::Data<Db>,
    caller: PortalUser,
    payload: web::Json<ProfileUpdate>,
) -> impl Responder {
    match save_profile(db, caller.user.id, payload.into_inner()).await {
        Ok(profile) => HttpResponse::Ok().json(profile),
        Err(err) => err.error_response(),
    }
}

async fn save_profile(db: web::Data<Db>, user_id: i64, update: ProfileUpdate) -> ApiResult<StudentProfile> {
    me::update_profile(db.clone(), user_id, update).await?;
    load_profile(&db, user_id).await
}

/// `GET /api/portal/student/preferences`
pub(crate) async fn preferences(db: web::Data<Db>, caller: PortalUser) -> impl Responder {
    let user_id = caller.user.id;
    match db.run(move |conn| users::preferences(conn, user_id)).await {
        Ok(preferences) => HttpResponse::Ok().json(preferences),
        Err(err) => err.error_response(),
    }
}

/// `PUT /api/portal/student/preferences`
pub(crate) async fn update_preferences(
    db: web::Data<Db>,
    caller: PortalUser,
    payload: web::Json<NotificationPreferences>,
) -> impl Responder {
    let user_id = caller.user.id;
    let preferences = payload.into_inner();
    let result = db
        .run(move |conn| {
            users::set_preferences(conn, user_id, &preferences)?;
            users::preferences(conn, user_id)
        })
        .await;
    match result {
        Ok(preferences) => HttpResponse::Ok().json(preferences),
        Err(err) => err.error_response(),
    }
}

/// `PUT /api/portal/student/password`
pub(crate) async fn change_password(
    db: web::Data<Db>,
    caller: PortalUser,
    payload: web::Json<ChangePasswordRequest>,
) -> impl Responder {
    match password::change_password(db, caller.user.id, caller.token, payload.into_inner()).await {
        Ok(()) => HttpResponse::Ok().json(json!({ "message": "Password updated successfully" })),
        Err(err) => err.error_response(),
    }
}

#[cfg(test)]
mod tests {
    use crate::services::test_support::{context, test_app};
    use actix_web::test;
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn profile_and_preferences_round_trip() {
        let ctx = context();
        let app = test_app!(ctx, crate::services::portal::configure_routes()).await;

        let req = test::TestRequest::get()
            .uri("/api/portal/student/profile")
            .insert_header(("Authorization", ctx.student_token.as_str()))
            .to_request();
        let profile: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(profile["email"], "student@example.com");
        assert_eq!(profile["preferences"]["email_promotions"], false);
        assert_eq!(profile["account"]["account_type"], "customer");

        let req = test::TestRequest::put()
            .uri("/api/portal/student/profile")
            .insert_header(("Authorization", ctx.student_token.as_str()))
            .set_json(json!({ "first_name": "Amara", "timezone": "America/Chicago" }))
            .to_request();
        let updated: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated["first_name"], "Amara");
        assert_eq!(updated["timezone"], "America/Chicago");

        let req = test::TestRequest::put()
            .uri("/api/portal/student/preferences")
            .insert_header(("Authorization", ctx.student_token.as_str()))
            .set_json(json!({
                "email_lesson_reminders": false,
                "email_progress_reports": true,
                "email_promotions": true,
                "push_lesson_reminders": false,
                "push_messages": true
            }))
            .to_request();
        let preferences: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(preferences["email_promotions"], true);
        assert_eq!(preferences["push_lesson_reminders"], false);
    }

    #[actix_web::test]
    async fn wrong_current_password_is_rejected() {
        let ctx = context();
        let app = test_app!(ctx, crate::services::portal::configure_routes()).await;
        let req = test::TestRequest::put()
            .uri("/api/portal/student/password")
            .insert_header(("Authorization", ctx.student_token.as_str()))
            .set_json(json!({ "current_password": "guess1234", "new_password": "brand-new-pass" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Current password is incorrect");
    }

    #[actix_web::test]
    async fn portal_needs_a_token() {
        let ctx = context();
        let app = test_app!(ctx, crate::services::portal::configure_routes()).await;
        let req = test::TestRequest::get().uri("/api/portal/student/profile").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 401);
    }
}
