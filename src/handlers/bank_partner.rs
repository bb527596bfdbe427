use crate::models::*;
use crate::services::BankPartnerService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/bank-partners",
    tag = "reference",
    responses((status = 200, description = "Active bank partners"))
)]
pub async fn list_partners(
    bank_partner_service: web::Data<BankPartnerService>,
) -> Result<HttpResponse> {
    match bank_partner_service.list_active().await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": list
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/bank-partners",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "All bank partners"))
)]
pub async fn admin_list_partners(
    bank_partner_service: web::Data<BankPartnerService>,
) -> Result<HttpResponse> {
    match bank_partner_service.list_all().await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": list
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/bank-partners",
    tag = "admin",
    request_body = BankPartnerRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Bank partner created"),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_partner(
    bank_partner_service: web::Data<BankPartnerService>,
    request: web::Json<BankPartnerRequest>,
) -> Result<HttpResponse> {
    match bank_partner_service.create(request.into_inner()).await {
        Ok(partner) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": partner
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/bank-partners/{id}",
    tag = "admin",
    params(("id" = i64, Path, description = "Bank partner id")),
    request_body = BankPartnerRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Bank partner updated"),
        (status = 404, description = "Bank partner not found")
    )
)]
pub async fn update_partner(
    bank_partner_service: web::Data<BankPartnerService>,
    path: web::Path<i64>,
    request: web::Json<BankPartnerRequest>,
) -> Result<HttpResponse> {
    match bank_partner_service
        .update(path.into_inner(), request.into_inner())
        .await
    {
        Ok(partner) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": partner
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/bank-partners/{id}/toggle",
    tag = "admin",
    params(("id" = i64, Path, description = "Bank partner id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Visibility flipped"),
        (status = 404, description = "Bank partner not found")
    )
)]
pub async fn toggle_partner(
    bank_partner_service: web::Data<BankPartnerService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match bank_partner_service.toggle(path.into_inner()).await {
        Ok(partner) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": partner
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn bank_partner_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/bank-partners", web::get().to(list_partners));
}

/// Mounted inside the `/admin` scope.
pub fn admin_bank_partner_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/bank-partners", web::get().to(admin_list_partners))
        .route("/bank-partners", web::post().to(create_partner))
        .route("/bank-partners/{id}", web::put().to(update_partner))
        .route("/bank-partners/{id}/toggle", web::post().to(toggle_partner));
}
