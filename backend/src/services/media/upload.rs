use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use chrono::Utc;
use common::model::media::{title_from_filename, UploadedMedia, DEFAULT_FOLDER};
use common::requests::UploadUrlRequest;
use log::info;

use super::analyze::schedule_analysis;
use crate::ai::ImageAnalyzer;
use crate::auth::AdminUser;
use crate::config::ServerConfig;
use crate::db::media::NewMedia;
use crate::db::{media, Db};
use crate::error::ApiResult;
use crate::job_controller::state::JobsState;
use crate::storage::{sanitize_filename, unique_tag, BucketStore, MEDIA_BUCKET};
use crate::uploads::{self, UploadForm};

/// App data an upload needs, bundled so the two entry points share one path.
struct MediaContext {
    db: web::Data<Db>,
    store: web::Data<BucketStore>,
    config: web::Data<ServerConfig>,
    jobs: web::Data<JobsState>,
    analyzer: web::Data<ImageAnalyzer>,
}

/// `{folder}/{millis}-{tag}-{stem}.{ext}`, with the stem taken from the
/// original name and the extension from the stored MIME type.
fn object_name(
    folder: &str,
    original_name: &str,
    extension: &str,
    millis: i64,
    tag: &str,
) -> (String, String) {
    let sanitized = sanitize_filename(original_name);
    let stem = match sanitized.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => sanitized.as_str(),
    };
    let filename = format!("{}-{}-{}.{}", millis, tag, stem, extension);
    let key = format!("{}/{}", sanitize_filename(folder), filename);
    (filename, key)
}

async fn store_upload(ctx: MediaContext, form: UploadForm) -> ApiResult<UploadedMedia> {
    let policy = ctx.config.upload_policy();
    let image = uploads::prepare(policy, form.bytes, form.content_type).await?;
    let folder = form.folder.unwrap_or_else(|| DEFAULT_FOLDER.to_string());
    let (filename, key) = object_name(
        &folder,
        &form.filename,
        image.extension(),
        Utc::now().timestamp_millis(),
        &unique_tag(),
    );

    let original_name = form.filename;
    let final_size = image.size();
    let (original_size, compressed) = (image.original_size, image.compressed);
    let (width, height) = (image.width, image.height);
    let mime_type = image.mime_type.clone();
    let bytes = image.bytes;
    let store = ctx.store.clone();
    let db = ctx.db.clone();
    let stored = web::block(move || {
        store.put_recorded(MEDIA_BUCKET, &key, &bytes, |url| {
            db.run_blocking(|conn| {
                let title = title_from_filename(&original_name);
                media::insert(
                    conn,
                    &NewMedia {
                        filename: &filename,
                        original_name: &original_name,
                        bucket: MEDIA_BUCKET,
                        object_key: &key,
                        url: &url,
                        mime_type: &mime_type,
                        file_size: final_size,
                        width,
                        height,
                        title: Some(&title),
                        folder: &folder,
                    },
                )
            })
        })
    })
    .await??;
    info!(
        "Uploaded {} ({} -> {} bytes{})",
        stored.url,
        original_size,
        final_size,
        if compressed { ", compressed" } else { "" }
    );

    let analysis_job_id = if ctx.analyzer.is_configured() {
        Some(schedule_analysis(ctx.db, ctx.store, ctx.jobs, ctx.analyzer, stored.id).await)
    } else {
        None
    };

    Ok(UploadedMedia {
        media: stored,
        compressed,
        original_size,
        final_size,
        analysis_job_id,
    })
}

/// `POST /api/media/upload`
pub(crate) async fn process(
    db: web::Data<Db>,
    store: web::Data<BucketStore>,
    config: web::Data<ServerConfig>,
    jobs: web::Data<JobsState>,
    analyzer: web::Data<ImageAnalyzer>,
    _admin: AdminUser,
    payload: Multipart,
) -> impl Responder {
    let policy = config.upload_policy();
    let form = match uploads::read_form(payload, &policy, config.max_request_bytes()).await {
        Ok(form) => form,
        Err(err) => return err.error_response(),
    };
    let ctx = MediaContext {
        db,
        store,
        config,
        jobs,
        analyzer,
    };
    match store_upload(ctx, form).await {
        Ok(uploaded) => HttpResponse::Created().json(uploaded),
        Err(err) => err.error_response(),
    }
}

/// `POST /api/media/upload-url`
pub(crate) async fn from_url(
    db: web::Data<Db>,
    store: web::Data<BucketStore>,
    config: web::Data<ServerConfig>,
    jobs: web::Data<JobsState>,
    analyzer: web::Data<ImageAnalyzer>,
    _admin: AdminUser,
    payload: web::Json<UploadUrlRequest>,
) -> impl Responder {
    let ctx = MediaContext {
        db,
        store,
        config,
        jobs,
        analyzer,
    };
    match import_url(ctx, payload.into_inner()).await {
        Ok(uploaded) => HttpResponse::Created().json(uploaded),
        Err(err) => err.error_response(),
    }
}

async fn import_url(ctx: MediaContext, request: UploadUrlRequest) -> ApiResult<UploadedMedia> {
    request.validate()?;
    let policy = ctx.config.upload_policy();
    let form = uploads::fetch_image(
        request.url.trim(),
        request.folder,
        &policy,
        ctx.config.max_request_bytes(),
    )
    .await?;
    store_upload(ctx, form).await
}

#[cfg(test)]
mod tests {
    use super::object_name;
    use crate::services::test_support::{context, multipart_body, test_app};
    use actix_web::test;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use serde_json::{json, Value};
    use std::io::Cursor;

    fn noise_png(width: u32, height: u32) -> Vec<u8> {
        let mut state: u32 = 0x1234_5678;
        let image = RgbImage::from_fn(width, height, |_, _| {
            let mut channel = || {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state & 0xff) as u8
            };
            image::Rgb([channel(), channel(), channel()])
        });
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(image)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[actix_web::test]
    async fn object_names_keep_the_stem_and_swap_the_extension() {
        let (filename, key) = object_name("Summer Camp", "Kids Drumming.PNG", "jpg", 1700, "0a1b2c3d");
        assert_eq!(filename, "1700-0a1b2c3d-kids-drumming.jpg");
        assert_eq!(key, "summer-camp/1700-0a1b2c3d-kids-drumming.jpg");
    }

    #[actix_web::test]
    async fn upload_stores_file_and_row() {
        let ctx = context();
        let app = test_app!(ctx, crate::services::media::configure_routes()).await;
        let (content_type, body) = multipart_body("market-day.png", "image/png", &noise_png(20, 10));
        let req = test::TestRequest::post()
            .uri("/api/media/upload")
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .insert_header(("Content-Type", content_type))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let uploaded: Value = test::read_body_json(resp).await;
        assert_eq!(uploaded["compressed"], false);
        assert_eq!(uploaded["media"]["folder"], "uploads");
        assert_eq!(uploaded["media"]["title"], "market day");
        assert_eq!(uploaded["media"]["width"], 20);
        assert!(uploaded["analysis_job_id"].is_null());
        assert_eq!(ctx.store.list("media").unwrap().len(), 1);

        let req = test::TestRequest::get().uri("/api/media?search=market").to_request();
        let page: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(page["total"], 1);

        let id = uploaded["media"]["id"].as_i64().unwrap();
        let req = test::TestRequest::put()
            .uri(&format!("/api/media/{}", id))
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .set_json(json!({ "alt_text": "Stalls at the market" }))
            .to_request();
        let edited: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(edited["alt_text"], "Stalls at the market");
        assert_eq!(edited["title"], "market day");

        let req = test::TestRequest::delete()
            .uri(&format!("/api/media/{}", id))
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 204);
        assert!(ctx.store.list("media").unwrap().is_empty());
    }

    #[actix_web::test]
    async fn same_name_uploads_keep_separate_objects() {
        let ctx = context();
        let app = test_app!(ctx, crate::services::media::configure_routes()).await;
        let mut urls = Vec::new();
        for width in [8, 9] {
            let (content_type, body) = multipart_body("logo.png", "image/png", &noise_png(width, 4));
            let req = test::TestRequest::post()
                .uri("/api/media/upload")
                .insert_header(("Authorization", ctx.admin_token.as_str()))
                .insert_header(("Content-Type", content_type))
                .set_payload(body)
                .to_request();
            let uploaded: Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(uploaded["media"]["width"], width);
            urls.push(uploaded["media"]["url"].as_str().unwrap().to_string());
        }
        assert_ne!(urls[0], urls[1]);
        assert_eq!(ctx.store.list("media").unwrap().len(), 2);

        let req = test::TestRequest::get().uri("/api/media?search=logo").to_request();
        let page: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(page["total"], 2);
    }

    #[actix_web::test]
    async fn oversized_upload_over_the_ceiling_is_refused() {
        let ctx = context();
        let app = test_app!(ctx, crate::services::media::configure_routes()).await;
        let (content_type, body) = multipart_body("noise.png", "image/png", &noise_png(1000, 1000));
        let req = test::TestRequest::post()
            .uri("/api/media/upload")
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .insert_header(("Content-Type", content_type))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 413);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body["error"],
            "Unable to compress image below 200KB. Please use a smaller image."
        );
        assert!(ctx.store.list("media").unwrap().is_empty());
    }

    #[actix_web::test]
    async fn unsupported_type_is_refused_with_415() {
        let ctx = context();
        let app = test_app!(ctx, crate::services::media::configure_routes()).await;
        let (content_type, body) = multipart_body("notes.pdf", "application/pdf", b"%PDF-1.4");
        let req = test::TestRequest::post()
            .uri("/api/media/upload")
            .insert_header(("Authorization", ctx.admin_token.as_str()))
            .insert_header(("Content-Type", content_type))
            .set_payload(body)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 415);
        assert!(ctx.store.list("media").unwrap().is_empty());
    }
}
