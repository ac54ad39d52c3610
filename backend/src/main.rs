mod ai;
mod auth;
mod config;
mod db;
mod error;
mod job_controller;
mod services;
mod storage;
mod uploads;

use actix_web::middleware::Logger;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use env_logger::Env;
use include_dir::{include_dir, Dir};
use log::{error, info};
use mime_guess::from_path;
use std::thread;
use std::time::Duration;

use crate::ai::ImageAnalyzer;
use crate::config::ServerConfig;
use crate::db::Db;
use crate::error::ApiError;
use crate::job_controller::state::{start_job_updater, JobsState};
use crate::storage::BucketStore;

static STATIC_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/static/dist");

/// Serves the embedded storefront and admin app. Unknown paths fall back to
/// `index.html` so client-side routes survive a reload.
async fn serve_embedded(req: HttpRequest) -> HttpResponse {
    let path = req.path().trim_start_matches('/');
    let file_path = if path.is_empty() { "index.html" } else { path };

    match STATIC_DIR.get_file(file_path) {
        Some(file) => {
            let mime = from_path(file_path).first_or_octet_stream();
            HttpResponse::Ok()
                .content_type(mime.as_ref())
                .body(file.contents().to_vec())
        }
        None => match STATIC_DIR.get_file("index.html") {
            Some(index) => HttpResponse::Ok()
                .content_type("text/html; charset=utf-8")
                .body(index.contents().to_vec()),
            None => HttpResponse::NotFound().body("Not Found"),
        },
    }
}

fn startup_error(err: ApiError) -> std::io::Error {
    error!("Startup failed: {}", err);
    std::io::Error::other(err.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let config = ServerConfig::from_env();
    let url = config.url();

    let db = Db::open(&config.database_path).map_err(startup_error)?;
    auth::bootstrap_admin(&db, &config).map_err(startup_error)?;
    let store = BucketStore::new(config.storage_root.clone(), &config.public_base_url)
        .map_err(startup_error)?;
    let analyzer = ImageAnalyzer::new(&config);
    if !analyzer.is_configured() {
        info!("OPENROUTER_API_KEY not set, image analysis is disabled");
    }

    if config.open_browser {
        let browser_url = url.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(500));
            let _ = webbrowser::open(&browser_url);
        });
    }

    let (jobs_state, rx) = JobsState::new();
    tokio::spawn(start_job_updater(jobs_state.clone(), rx));

    info!("Server running at {}", url);

    let bind = (config.host.clone(), config.port);
    let request_limit = config.max_request_bytes();
    let storage_root = config.storage_root.clone();
    let db = web::Data::new(db);
    let store = web::Data::new(store);
    let analyzer = web::Data::new(analyzer);
    let jobs = web::Data::new(jobs_state);
    let config = web::Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(
                web::JsonConfig::default()
                    .limit(request_limit)
                    .error_handler(|err, _| ApiError::BadRequest(err.to_string()).into()),
            )
            .app_data(db.clone())
            .app_data(store.clone())
            .app_data(analyzer.clone())
            .app_data(jobs.clone())
            .app_data(config.clone())
            .route("/health", web::get().to(services::health::process))
            .service(services::auth::configure_routes())
            .service(services::products::configure_routes())
            .service(services::collections::configure_routes())
            .service(services::media::configure_routes())
            .service(services::blog::configure_routes())
            .service(services::orders::configure_routes())
            .service(services::portal::configure_routes())
            .service(services::admin::configure_routes())
            .service(services::jobs::configure_routes())
            .service(actix_files::Files::new("/uploads", storage_root.clone()))
            .default_service(web::route().to(serve_embedded))
    })
    .bind(bind)?
    .run()
    .await
}
