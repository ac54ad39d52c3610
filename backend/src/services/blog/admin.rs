use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::model::blog::{BlogCategory, BlogPost};
use common::requests::{BlogCategoryInput, BlogPostInput, BlogPostUpdate};
use log::info;

use crate::auth::AdminUser;
use crate::db::{blog, Db};
use crate::error::ApiResult;

/// `GET /api/blog/admin/all`
pub(crate) async fn all(db: web::Data<Db>, _admin: AdminUser) -> impl Responder {
    match db.run(|conn| blog::all(conn)).await {
        Ok(posts) => HttpResponse::Ok().json(posts),
        Err(err) => err.error_response(),
    }
}

/// `GET /api/blog/admin/{id}`
pub(crate) async fn get_one(db: web::Data<Db>, _admin: AdminUser, path: web::Path<i64>) -> impl Responder {
    let id = path.into_inner();
    match db.run(move |conn| blog::get(conn, id)).await {
        Ok(post) => HttpResponse::Ok().json(post),
        Err(err) => err.error_response(),
    }
}

async fn create_post(db: web::Data<Db>, author_id: i64, input: BlogPostInput) -> ApiResult<BlogPost> {
    input.validate()?;
    let post = db
        .run(move |conn| blog::insert(conn, &input, Some(author_id)))
        .await?;
    info!("Created blog post {} (published: {})", post.slug, post.is_published);
    Ok(post)
}

/// `POST /api/blog`
///
/// The calling admin becomes the author.
pub(crate) async fn create(
    db: web::Data<Db>,
    admin: AdminUser,
    payload: web::Json<BlogPostInput>,
) -> impl Responder {
    match create_post(db, admin.0.id, payload.into_inner()).await {
        Ok(post) => HttpResponse::Created().json(post),
        Err(err) => err.error_response(),
    }
}

/// `PUT /api/blog/{id}`
pub(crate) async fn update(
    db: web::Data<Db>,
    _admin: AdminUser,
    path: web::Path<i64>,
    payload: web::Json<BlogPostUpdate>,
) -> impl Responder {
    let id = path.into_inner();
    let update = payload.into_inner();
    match db.run(move |conn| blog::update(conn, id, &update)).await {
        Ok(post) => HttpResponse::Ok().json(post),
        Err(err) => err.error_response(),
    }
}

/// `DELETE /api/blog/{id}`
pub(crate) async fn remove(db: web::Data<Db>, _admin: AdminUser, path: web::Path<i64>) -> impl Responder {
    let id = path.into_inner();
    match db.run(move |conn| blog::delete(conn, id)).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => err.error_response(),
    }
}

async fn create_category_row(db: web::Data<Db>, input: BlogCategoryInput) -> ApiResult<BlogCategory> {
    input.validate()?;
    db.run(move |conn| blog::insert_category(conn, &input)).await
}

/// `POST /api/blog/categories`
pub(crate) async fn create_category(
    db: web::Data<Db>,
    _admin: AdminUser,
    payload: web::Json<BlogCategoryInput>,
) -> impl Responder {
    match create_category_row(db, payload.into_inner()).await {
        Ok(category) => HttpResponse::Created().json(category),
        Err(err) => err.error_response(),
    }
}

#[cfg(test)]
mod tests {
    use crate::services::test_support::{context, test_app};
    use actix_web::test;
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn drafts_stay_private_until_published() {
        let ctx = context();
        let app = test_app!(ctx, crate::services::blog::configure_routes()).await;

        let req = test::TestRequest::post()
            .uri("/api/blog/categories")
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .set_json(json!({ "name": "Culture" }))
            .to_request();
        let category: Value = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/api/blog")
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .set_json(json!({
                "title": "Why Yoruba Has Tones",
                "slug": "why-yoruba-has-tones",
                "content": "# Tones\n\nThree of them.",
                "category_id": category["id"]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let draft: Value = test::read_body_json(resp).await;
        assert!(draft["published_at"].is_null());
        assert_eq!(draft["author_name"], "Test User");

        let req = test::TestRequest::get().uri("/api/blog/slug/why-yoruba-has-tones").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);

        let req = test::TestRequest::put()
            .uri(&format!("/api/blog/{}", draft["id"]))
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .set_json(json!({ "is_published": true }))
            .to_request();
        let published: Value = test::call_and_read_body_json(&app, req).await;
        assert!(!published["published_at"].is_null());

        let req = test::TestRequest::get().uri("/api/blog/slug/why-yoruba-has-tones").to_request();
        let detail: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(detail["views"], 1);
        assert_eq!(detail["related"], json!([]));

        let req = test::TestRequest::get().uri("/api/blog/categories").to_request();
        let categories: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        let culture = categories.iter().find(|c| c["slug"] == "culture").unwrap();
        assert_eq!(culture["post_count"], 1);

        let req = test::TestRequest::post()
            .uri("/api/blog")
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .set_json(json!({ "title": "Copy", "slug": "why-yoruba-has-tones" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 409);
    }
}
