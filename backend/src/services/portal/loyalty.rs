use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::loyalty::{find_reward, LoyaltyOverview};
use common::requests::RedeemRequest;
use log::info;

use crate::auth::PortalUser;
use crate::db::{users, Db};
use crate::error::{ApiError, ApiResult};

/// `GET /api/portal/student/loyalty`
pub(crate) async fn process(db: web::Data<Db>, caller: PortalUser) -> impl Responder {
    let user_id = caller.user.id;
    match db.run(move |conn| Ok(users::points(conn, user_id)?.overview())).await {
        Ok(overview) => HttpResponse::Ok().json(overview),
        Err(err) => err.error_response(),
    }
}

/// `POST /api/portal/student/loyalty/redeem`
pub(crate) async fn redeem(
    db: web::Data<Db>,
    caller: PortalUser,
    payload: web::Json<RedeemRequest>,
) -> impl Responder {
    match redeem_reward(db, caller.user.id, payload.into_inner()).await {
        Ok(overview) => HttpResponse::Ok().json(overview),
        Err(err) => err.error_response(),
    }
}

async fn redeem_reward(db: web::Data<Db>, user_id: i64, request: RedeemRequest) -> ApiResult<LoyaltyOverview> {
    let reward = find_reward(&request.reward_id).ok_or(ApiError::NotFound("Reward"))?;
    let account = db.run(move |conn| users::redeem(conn, user_id, reward)).await?;
    info!("User {} redeemed {}", user_id, reward.id);
    Ok(account.overview())
}

#[cfg(test)]
mod tests {
    use crate::db::users;
    use crate::services::test_support::{context, test_app};
    use actix_web::test;
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn redeeming_spends_the_balance_but_keeps_the_tier() {
        let ctx = context();
        ctx.db
            .run_blocking(|conn| {
                let student = users::find_with_hash(conn, "student@example.com")?.unwrap().0;
                users::credit_lessons(conn, student.id, 20)
            })
            .unwrap();
        let app = test_app!(ctx, crate::services::portal::configure_routes()).await;

        let req = test::TestRequest::get()
            .uri("/api/portal/student/loyalty")
            .insert_header(("Authorization", ctx.student_token.as_str()))
            .to_request();
        let overview: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(overview["summary"]["balance"], 100);
        assert_eq!(overview["summary"]["tier"], "explorer");

        let req = test::TestRequest::post()
            .uri("/api/portal/student/loyalty/redeem")
            .insert_header(("Authorization", ctx.student_token.as_str()))
            .set_json(json!({ "reward_id": "lesson-extension" }))
            .to_request();
        let after: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(after["summary"]["balance"], 50);
        assert_eq!(after["summary"]["tier"], "explorer");

        let req = test::TestRequest::post()
            .uri("/api/portal/student/loyalty/redeem")
            .insert_header(("Authorization", ctx.student_token.as_str()))
            .set_json(json!({ "reward_id": "bonus-lesson" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "You need 100 more points for this reward");

        let req = test::TestRequest::post()
            .uri("/api/portal/student/loyalty/redeem")
            .insert_header(("Authorization", ctx.student_token.as_str()))
            .set_json(json!({ "reward_id": "no-such-reward" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }
}
