use crate::middlewares::{AuthGuard, AuthenticatedUser};
use crate::models::*;
use crate::services::CashLendingService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/cash-lending/plans",
    tag = "cash_lending",
    responses((status = 200, description = "Plans currently on sale"))
)]
pub async fn list_plans(
    cash_lending_service: web::Data<CashLendingService>,
) -> Result<HttpResponse> {
    match cash_lending_service.list_active_plans().await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": list
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/cash-lending/subscribe",
    tag = "cash_lending",
    request_body = SubscribeRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Subscription started", body = SubscriptionResponse),
        (status = 400, description = "Plan not on sale"),
        (status = 409, description = "An active subscription already exists")
    )
)]
pub async fn subscribe(
    cash_lending_service: web::Data<CashLendingService>,
    user: AuthenticatedUser,
    request: web::Json<SubscribeRequest>,
) -> Result<HttpResponse> {
    match cash_lending_service
        .subscribe(user.user_id, request.into_inner())
        .await
    {
        Ok(subscription) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": subscription
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/cash-lending/subscriptions",
    tag = "cash_lending",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Own subscriptions", body = [SubscriptionResponse]))
)]
pub async fn list_subscriptions(
    cash_lending_service: web::Data<CashLendingService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    match cash_lending_service
        .list_user_subscriptions(user.user_id)
        .await
    {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": list
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/cash-lending/plans",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "All plans"))
)]
pub async fn admin_list_plans(
    cash_lending_service: web::Data<CashLendingService>,
) -> Result<HttpResponse> {
    match cash_lending_service.list_all_plans().await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": list
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/cash-lending/plans",
    tag = "admin",
    request_body = CashLendingPlanRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Plan created"),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_plan(
    cash_lending_service: web::Data<CashLendingService>,
    request: web::Json<CashLendingPlanRequest>,
) -> Result<HttpResponse> {
    match cash_lending_service.create_plan(request.into_inner()).await {
        Ok(plan) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": plan
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/cash-lending/plans/{id}",
    tag = "admin",
    params(("id" = i64, Path, description = "Plan id")),
    request_body = CashLendingPlanRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Plan updated"),
        (status = 404, description = "Plan not found")
    )
)]
pub async fn update_plan(
    cash_lending_service: web::Data<CashLendingService>,
    path: web::Path<i64>,
    request: web::Json<CashLendingPlanRequest>,
) -> Result<HttpResponse> {
    match cash_lending_service
        .update_plan(path.into_inner(), request.into_inner())
        .await
    {
        Ok(plan) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": plan
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/cash-lending/plans/{id}/toggle",
    tag = "admin",
    params(("id" = i64, Path, description = "Plan id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Availability flipped"),
        (status = 404, description = "Plan not found")
    )
)]
pub async fn toggle_plan(
    cash_lending_service: web::Data<CashLendingService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match cash_lending_service.toggle_plan(path.into_inner()).await {
        Ok(plan) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": plan
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn cash_lending_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/cash-lending")
            .route("/plans", web::get().to(list_plans))
            .service(
                web::resource("/subscribe")
                    .wrap(AuthGuard::authenticated())
                    .route(web::post().to(subscribe)),
            )
            .service(
                web::resource("/subscriptions")
                    .wrap(AuthGuard::authenticated())
                    .route(web::get().to(list_subscriptions)),
            ),
    );
}

/// Mounted inside the `/admin` scope.
pub fn admin_cash_lending_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/cash-lending")
            .route("/plans", web::get().to(admin_list_plans))
            .route("/plans", web::post().to(create_plan))
            .route("/plans/{id}", web::put().to(update_plan))
            .route("/plans/{id}/toggle", web::post().to(toggle_plan)),
    );
}
