use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::model::user::AuthSession;
use common::requests::{AccountDetails, RegisterRequest};
use log::info;

use crate::auth::{hash_password, start_session};
use crate::config::ServerConfig;
use crate::db::{users, Db};
use crate::error::ApiResult;

/// `POST /api/auth/register`
pub(crate) async fn process(
    db: web::Data<Db>,
    config: web::Data<ServerConfig>,
    payload: web::Json<RegisterRequest>,
) -> impl Responder {
    match register(db, config, payload.into_inner()).await {
        Ok(session) => HttpResponse::Created().json(session),
        Err(err) => err.error_response(),
    }
}

fn welcome_message(account: &AccountDetails) -> String {
    match account {
        AccountDetails::Parent(child) => format!(
            "Thanks for signing up! We'll be in touch to schedule {}'s first {} lesson.",
            child.child_first_name, child.language_interest
        ),
        AccountDetails::Educator(_) => {
            "Thanks for your interest in teaching with iSPEAK. Our team will review your \
             application."
                .to_string()
        }
        AccountDetails::Customer => "Your account is ready. Welcome to iSPEAK!".to_string(),
    }
}

async fn register(
    db: web::Data<Db>,
    config: web::Data<ServerConfig>,
    request: RegisterRequest,
) -> ApiResult<AuthSession> {
    request.validate()?;
    let password = request.password.clone();
    let hash = web::block(move || hash_password(&password)).await??;
    let ttl_hours = config.session_ttl_hours;

    db.run(move |conn| {
        let role = request.account.role();
        let user = users::insert(conn, &request, role, &hash)?;
        users::notify(
            conn,
            user.id,
            "Welcome to iSPEAK",
            &welcome_message(&request.account),
            "info",
        )?;
        info!("Registered {} as {}", user.email, user.role);
        start_session(conn, user, ttl_hours)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use serde_json::json;

    #[actix_web::test]
    async fn registering_twice_conflicts() {
        let db = web::Data::new(Db::open_in_memory().unwrap());
        let app = test::init_service(
            App::new()
                .app_data(db.clone())
                .app_data(web::Data::new(ServerConfig::default()))
                .service(crate::services::auth::configure_routes()),
        )
        .await;
        let body = json!({
            "email": "mama@example.com",
            "password": "password123",
            "first_name": "Ife",
            "last_name": "Adeyemi",
            "account": {
                "account_type": "parent",
                "child_first_name": "Tobi",
                "child_last_name": "Adeyemi",
                "child_age": 7,
                "language_interest": "yoruba",
                "current_level": "beginner"
            }
        });

        let req = test::TestRequest::post().uri("/api/auth/register").set_json(&body).to_request();
        let session: AuthSession = test::call_and_read_body_json(&app, req).await;
        assert_eq!(session.user.role, common::model::user::Role::Parent);
        assert!(!session.token.is_empty());

        let req = test::TestRequest::post().uri("/api/auth/register").set_json(&body).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 409);
    }
}
