use crate::models::*;
use crate::services::ContentService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/content/{slug}",
    tag = "reference",
    params(("slug" = String, Path, description = "Page slug, e.g. terms-of-service")),
    responses(
        (status = 200, description = "Published page"),
        (status = 404, description = "No published page with this slug")
    )
)]
pub async fn get_content(
    content_service: web::Data<ContentService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match content_service.get_published(&path.into_inner()).await {
        Ok(content) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": content
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/content",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "All pages, published or not"))
)]
pub async fn admin_list_content(
    content_service: web::Data<ContentService>,
) -> Result<HttpResponse> {
    match content_service.list_all().await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": list
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/content/{slug}",
    tag = "admin",
    params(("slug" = String, Path, description = "Page slug")),
    request_body = UpsertContentRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Page created or replaced"),
        (status = 400, description = "Invalid slug or title")
    )
)]
pub async fn upsert_content(
    content_service: web::Data<ContentService>,
    path: web::Path<String>,
    request: web::Json<UpsertContentRequest>,
) -> Result<HttpResponse> {
    match content_service
        .upsert(&path.into_inner(), request.into_inner())
        .await
    {
        Ok(content) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": content
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn content_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/content/{slug}", web::get().to(get_content));
}

/// Mounted inside the `/admin` scope.
pub fn admin_content_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/content", web::get().to(admin_list_content))
        .route("/content/{slug}", web::put().to(upsert_content));
}
