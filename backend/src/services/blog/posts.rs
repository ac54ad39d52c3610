use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::model::blog::BlogPostDetail;
use common::requests::BlogQuery;

use crate::db::{blog, Db};

const FEATURED_LIMIT: u32 = 3;
const RELATED_LIMIT: u32 = 3;

/// `GET /api/blog`
pub(crate) async fn process(db: web::Data<Db>, query: web::Query<BlogQuery>) -> impl Responder {
    let query = query.into_inner();
    match db.run(move |conn| blog::published(conn, &query)).await {
        Ok(page) => HttpResponse::Ok().json(page),
        Err(err) => err.error_response(),
    }
}

/// `GET /api/blog/featured`
pub(crate) async fn featured(db: web::Data<Db>) -> impl Responder {
    match db.run(|conn| blog::featured(conn, FEATURED_LIMIT)).await {
        Ok(posts) => HttpResponse::Ok().json(posts),
        Err(err) => err.error_response(),
    }
}

/// `GET /api/blog/slug/{slug}`
pub(crate) async fn by_slug(db: web::Data<Db>, path: web::Path<String>) -> impl Responder {
    let slug = path.into_inner();
    let result = db
        .run(move |conn| {
            let post = blog::view_by_slug(conn, &slug)?;
            let related = blog::related(conn, &post, RELATED_LIMIT)?;
            Ok(BlogPostDetail { post, related })
        })
        .await;
    match result {
        Ok(detail) => HttpResponse::Ok().json(detail),
        Err(err) => err.error_response(),
    }
}

/// `GET /api/blog/categories`
pub(crate) async fn categories(db: web::Data<Db>) -> impl Responder {
    match db.run(|conn| blog::categories(conn)).await {
        Ok(categories) => HttpResponse::Ok().json(categories),
        Err(err) => err.error_response(),
    }
}
