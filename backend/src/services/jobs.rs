//! `GET /api/jobs/{job_id}`: current status of a background job.
//!
//! Answers `{"status": "Pending" | {"InProgress": n} | {"Completed": msg} |
//! {"Failed": msg}}`, or 404 for an id this server never issued.

use actix_web::web::{get, scope};
use actix_web::{web, HttpResponse, Responder, ResponseError, Scope};
use serde_json::json;

use crate::error::ApiError;
use crate::job_controller::state::JobsState;

const API_PATH: &str = "/api/jobs";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/{job_id}", get().to(process))
}

async fn process(jobs: web::Data<JobsState>, path: web::Path<String>) -> impl Responder {
    let job_id = path.into_inner();
    match jobs.status(&job_id).await {
        Some(status) => HttpResponse::Ok().json(json!({ "job_id": job_id, "status": status })),
        None => ApiError::NotFound("Job").error_response(),
    }
}

#[cfg(test)]
mod tests {
    use crate::services::test_support::{context, test_app};
    use actix_web::test;
    use serde_json::Value;

    #[actix_web::test]
    async fn known_jobs_report_status_and_unknown_ones_404() {
        let ctx = context();
        let job_id = ctx.jobs.register().await;
        let app = test_app!(ctx, super::configure_routes()).await;

        let req = test::TestRequest::get().uri(&format!("/api/jobs/{}", job_id)).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "Pending");

        let req = test::TestRequest::get().uri("/api/jobs/nope").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }
}
