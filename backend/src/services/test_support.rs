//! Shared fixtures for handler tests.

use actix_web::web;

use crate::ai::ImageAnalyzer;
use crate::config::ServerConfig;
use crate::db::{users, Db};
use crate::job_controller::state::{start_job_updater, JobsState};
use crate::storage::BucketStore;
use common::model::user::Role;
use common::requests::{AccountDetails, RegisterRequest};

/// App data for handler tests: in-memory database, temporary buckets, a
/// running job updater and bearer tokens for an admin and a student.
pub struct TestContext {
    pub db: web::Data<Db>,
    pub store: web::Data<BucketStore>,
    pub config: web::Data<ServerConfig>,
    pub jobs: web::Data<JobsState>,
    pub analyzer: web::Data<ImageAnalyzer>,
    pub admin_token: String,
    pub student_token: String,
    pub _dir: tempfile::TempDir,
}

fn account(db: &Db, email: &str, role: Role, token: &str) {
    let request = RegisterRequest {
        email: email.to_string(),
        password: "password123".to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        phone: None,
        timezone: None,
        how_heard: None,
        subscribe_newsletter: false,
        account: AccountDetails::Customer,
    };
    let token = token.to_string();
    db.run_blocking(move |conn| {
        let user = users::insert(conn, &request, role, "unused-hash")?;
        users::insert_session(
            conn,
            &token,
            user.id,
            chrono::Utc::now() + chrono::Duration::hours(1),
        )
    })
    .unwrap();
}

pub fn context() -> TestContext {
    let dir = tempfile::TempDir::new().unwrap();
    let db = Db::open_in_memory().unwrap();
    account(&db, "admin@example.com", Role::Admin, "admin-token");
    account(&db, "student@example.com", Role::Student, "student-token");
    let store = BucketStore::new(dir.path().to_path_buf(), "").unwrap();
    let config = ServerConfig::default();
    let (jobs, rx) = JobsState::new();
    actix_web::rt::spawn(start_job_updater(jobs.clone(), rx));
    TestContext {
        db: web::Data::new(db),
        store: web::Data::new(store),
        analyzer: web::Data::new(ImageAnalyzer::new(&config)),
        config: web::Data::new(config),
        jobs: web::Data::new(jobs),
        admin_token: "Bearer admin-token".to_string(),
        student_token: "Bearer student-token".to_string(),
        _dir: dir,
    }
}

/// A `multipart/form-data` body with a single `file` field, and its
/// content type.
pub fn multipart_body(filename: &str, content_type: &str, bytes: &[u8]) -> (String, Vec<u8>) {
    let boundary = "ispeak-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\n\
             Content-Type: {t}\r\n\r\n",
            b = boundary,
            f = filename,
            t = content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    (format!("multipart/form-data; boundary={}", boundary), body)
}

/// Builds a test service with every piece of app data from a `TestContext`.
macro_rules! test_app {
    ($ctx:expr, $($scope:expr),+ $(,)?) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($ctx.db.clone())
                .app_data($ctx.store.clone())
                .app_data($ctx.config.clone())
                .app_data($ctx.jobs.clone())
                .app_data($ctx.analyzer.clone())
                $(.service($scope))+,
        )
    };
}

pub(crate) use test_app;
