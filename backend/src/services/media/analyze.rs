//! Background work on the media library.
//!
//! Both jobs answer `202 {job_id}` at once and report through `JobsState`:
//! the AI analysis of one item, and the import of files that were put into
//! the bucket without going through the upload endpoint.

use std::collections::HashSet;

use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::jobs::JobStatus;
use common::model::media::{title_from_filename, DEFAULT_FOLDER};
use common::upload::{normalize_mime, probe_dimensions, UploadPolicy};
use log::{info, warn};
use rayon::prelude::*;
use serde_json::json;

use crate::ai::ImageAnalyzer;
use crate::auth::AdminUser;
use crate::config::ServerConfig;
use crate::db::media::NewMedia;
use crate::db::{media, Db};
use crate::error::{ApiError, ApiResult};
use crate::job_controller::state::JobsState;
use crate::storage::{BucketStore, MEDIA_BUCKET};

/// Registers an analysis job for one media item and starts it.
pub(super) async fn schedule_analysis(
    db: web::Data<Db>,
    store: web::Data<BucketStore>,
    jobs: web::Data<JobsState>,
    analyzer: web::Data<ImageAnalyzer>,
    media_id: i64,
) -> String {
    let job_id = jobs.register().await;
    let job = job_id.clone();

    tokio::spawn(async move {
        jobs.report(&job, JobStatus::InProgress(10)).await;
        let status = match analyze_item(&db, &store, &analyzer, media_id).await {
            Ok(message) => JobStatus::Completed(message),
            Err(e) => {
                warn!("Analysis of media {} failed: {}", media_id, e);
                JobStatus::Failed(e.to_string())
            }
        };
        jobs.report(&job, status).await;
    });

    job_id
}

async fn analyze_item(
    db: &web::Data<Db>,
    store: &web::Data<BucketStore>,
    analyzer: &ImageAnalyzer,
    media_id: i64,
) -> ApiResult<String> {
    let (item, (bucket, key)) = db
        .run(move |conn| Ok((media::get(conn, media_id)?, media::location(conn, media_id)?)))
        .await?;
    let bucket_store = store.clone();
    let bytes = web::block(move || bucket_store.read(&bucket, &key)).await??;

    let suggestion = analyzer.analyze(&bytes, &item.mime_type).await?;
    if suggestion.is_empty() {
        return Ok("No suggestions returned".to_string());
    }
    let updated = db
        .run(move |conn| media::apply_suggestion(conn, media_id, &suggestion))
        .await?;
    info!("Applied analysis to media {}", updated.id);
    Ok(format!(
        "Updated \"{}\"",
        updated.title.unwrap_or(updated.filename)
    ))
}

/// `POST /api/media/{id}/analyze`
pub(crate) async fn process(
    db: web::Data<Db>,
    store: web::Data<BucketStore>,
    jobs: web::Data<JobsState>,
    analyzer: web::Data<ImageAnalyzer>,
    _admin: AdminUser,
    path: web::Path<i64>,
) -> impl Responder {
    if !analyzer.is_configured() {
        return ApiError::BadRequest("AI analysis not configured".to_string()).error_response();
    }
    let id = path.into_inner();
    if let Err(err) = db.run(move |conn| media::get(conn, id)).await {
        return err.error_response();
    }
    let job_id = schedule_analysis(db, store, jobs, analyzer, id).await;
    HttpResponse::Accepted().json(json!({ "job_id": job_id }))
}

/// A bucket object with no library row yet, ready to be inserted.
struct Found {
    key: String,
    mime_type: String,
    size: u64,
    dimensions: Option<(u32, u32)>,
}

fn inspect(store: &BucketStore, key: &str, policy: &UploadPolicy) -> Option<Found> {
    let mime_type = normalize_mime(mime_guess::from_path(key).first_or_octet_stream().essence_str());
    policy.check_type(&mime_type).ok()?;
    let bytes = match store.read(MEDIA_BUCKET, key) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Skipping {}: {}", key, e);
            return None;
        }
    };
    Some(Found {
        key: key.to_string(),
        mime_type: if mime_type == "image/jpg" { "image/jpeg".to_string() } else { mime_type },
        size: bytes.len() as u64,
        dimensions: probe_dimensions(&bytes),
    })
}

/// Reads every unknown image in the bucket in parallel, then inserts the rows.
fn import_untracked(
    db: &Db,
    store: &BucketStore,
    policy: &UploadPolicy,
    jobs: &JobsState,
    job_id: &str,
) -> ApiResult<usize> {
    let known: HashSet<String> = db
        .run_blocking(|conn| media::known_keys(conn, MEDIA_BUCKET))?
        .into_iter()
        .collect();
    let untracked: Vec<String> = store
        .list(MEDIA_BUCKET)?
        .into_iter()
        .filter(|key| !known.contains(key))
        .collect();
    jobs.report_blocking(job_id, JobStatus::InProgress(25));

    let found: Vec<Found> = untracked
        .par_iter()
        .filter_map(|key| inspect(store, key, policy))
        .collect();
    jobs.report_blocking(job_id, JobStatus::InProgress(75));

    db.run_blocking(|conn| {
        let tx = conn.transaction()?;
        for item in &found {
            let (folder, filename) = item
                .key
                .rsplit_once('/')
                .unwrap_or((DEFAULT_FOLDER, item.key.as_str()));
            let title = title_from_filename(filename);
            media::insert(
                &tx,
                &NewMedia {
                    filename,
                    original_name: filename,
                    bucket: MEDIA_BUCKET,
                    object_key: &item.key,
                    url: &store.public_url(MEDIA_BUCKET, &item.key),
                    mime_type: &item.mime_type,
                    file_size: item.size,
                    width: item.dimensions.map(|(w, _)| w),
                    height: item.dimensions.map(|(_, h)| h),
                    title: Some(&title),
                    folder,
                },
            )?;
        }
        tx.commit()?;
        Ok(())
    })?;
    Ok(found.len())
}

/// `POST /api/media/scan-imports`
pub(crate) async fn scan_imports(
    db: web::Data<Db>,
    store: web::Data<BucketStore>,
    config: web::Data<ServerConfig>,
    jobs: web::Data<JobsState>,
    _admin: AdminUser,
) -> impl Responder {
    let policy = config.upload_policy();
    let job_id = jobs.register().await;
    let job = job_id.clone();

    tokio::spawn(async move {
        let worker_jobs = jobs.clone();
        let worker_job = job.clone();
        let handle = tokio::task::spawn_blocking(move || {
            import_untracked(&db, &store, &policy, &worker_jobs, &worker_job)
        });
        let status = match handle.await {
            Ok(Ok(count)) => {
                info!("Imported {} untracked media files", count);
                JobStatus::Completed(format!("Imported {} files", count))
            }
            Ok(Err(e)) => JobStatus::Failed(e.to_string()),
            Err(e) => JobStatus::Failed(format!("Task join error: {}", e)),
        };
        jobs.report(&job, status).await;
    });

    HttpResponse::Accepted().json(json!({ "job_id": job_id }))
}
