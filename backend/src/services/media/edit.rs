use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::requests::MediaUpdate;
use log::info;

use crate::auth::AdminUser;
use crate::db::{media, Db};
use crate::error::ApiResult;
use crate::storage::BucketStore;

/// `PUT /api/media/{id}`
pub(crate) async fn process(
    db: web::Data<Db>,
    _admin: AdminUser,
    path: web::Path<i64>,
    payload: web::Json<MediaUpdate>,
) -> impl Responder {
    let id = path.into_inner();
    let update = payload.into_inner();
    match db.run(move |conn| media::update(conn, id, &update)).await {
        Ok(item) => HttpResponse::Ok().json(item),
        Err(err) => err.error_response(),
    }
}

/// `DELETE /api/media/{id}`
pub(crate) async fn remove(
    db: web::Data<Db>,
    store: web::Data<BucketStore>,
    _admin: AdminUser,
    path: web::Path<i64>,
) -> impl Responder {
    match delete_media(db, store, path.into_inner()).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => err.error_response(),
    }
}

/// The row goes first; a file that is already gone only logs a warning.
async fn delete_media(db: web::Data<Db>, store: web::Data<BucketStore>, id: i64) -> ApiResult<()> {
    let (bucket, key) = db
        .run(move |conn| {
            let location = media::location(conn, id)?;
            media::delete(conn, id)?;
            Ok(location)
        })
        .await?;
    web::block(move || store.remove(&bucket, &key)).await??;
    info!("Deleted media {}", id);
    Ok(())
}
