use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::requests::MediaQuery;

use crate::config::ServerConfig;
use crate::db::{media, Db};

/// `GET /api/media/policy`: the upload ceiling and compression settings the
/// browser applies before sending a file.
pub(crate) async fn policy(config: web::Data<ServerConfig>) -> impl Responder {
    HttpResponse::Ok().json(config.upload_policy())
}

/// `GET /api/media`
pub(crate) async fn process(db: web::Data<Db>, query: web::Query<MediaQuery>) -> impl Responder {
    let query = query.into_inner();
    match db.run(move |conn| media::search(conn, &query)).await {
        Ok(page) => HttpResponse::Ok().json(page),
        Err(err) => err.error_response(),
    }
}

/// `GET /api/media/folders`
pub(crate) async fn folders(db: web::Data<Db>) -> impl Responder {
    match db.run(|conn| media::folders(conn)).await {
        Ok(folders) => HttpResponse::Ok().json(folders),
        Err(err) => err.error_response(),
    }
}

/// `GET /api/media/{id}`
pub(crate) async fn get_one(db: web::Data<Db>, path: web::Path<i64>) -> impl Responder {
    let id = path.into_inner();
    match db.run(move |conn| media::get(conn, id)).await {
        Ok(item) => HttpResponse::Ok().json(item),
        Err(err) => err.error_response(),
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ServerConfig;
    use crate::services::test_support::{context, test_app};
    use actix_web::{test, web};
    use serde_json::Value;

    #[actix_web::test]
    async fn policy_reports_the_configured_ceiling() {
        let mut ctx = context();
        ctx.config = web::Data::new(ServerConfig {
            max_upload_kb: 500,
            ..ServerConfig::default()
        });
        let app = test_app!(ctx, crate::services::media::configure_routes()).await;
        let req = test::TestRequest::get().uri("/api/media/policy").to_request();
        let policy: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(policy["max_kb"], 500);
        assert_eq!(policy["max_width"], 1200);
        assert_eq!(policy["jpeg_quality"], 85);
    }
}
