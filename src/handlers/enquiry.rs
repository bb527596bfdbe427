use crate::models::*;
use crate::services::EnquiryService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/enquiries",
    tag = "reference",
    request_body = CreateEnquiryRequest,
    responses(
        (status = 201, description = "Enquiry received"),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_enquiry(
    enquiry_service: web::Data<EnquiryService>,
    request: web::Json<CreateEnquiryRequest>,
) -> Result<HttpResponse> {
    match enquiry_service.create(request.into_inner()).await {
        Ok(enquiry) => Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
            enquiry,
            "Thank you, we will get back to you shortly",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/enquiries",
    tag = "admin",
    params(EnquiryQuery),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Paginated enquiries"))
)]
pub async fn admin_list_enquiries(
    enquiry_service: web::Data<EnquiryService>,
    query: web::Query<EnquiryQuery>,
) -> Result<HttpResponse> {
    match enquiry_service.list(query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/enquiries/{id}/status",
    tag = "admin",
    params(("id" = i64, Path, description = "Enquiry id")),
    request_body = UpdateEnquiryStatusRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Status updated"),
        (status = 404, description = "Enquiry not found")
    )
)]
pub async fn update_enquiry_status(
    enquiry_service: web::Data<EnquiryService>,
    path: web::Path<i64>,
    request: web::Json<UpdateEnquiryStatusRequest>,
) -> Result<HttpResponse> {
    match enquiry_service
        .update_status(path.into_inner(), request.into_inner())
        .await
    {
        Ok(enquiry) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": enquiry
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn enquiry_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/enquiries", web::post().to(create_enquiry));
}

/// Mounted inside the `/admin` scope.
pub fn admin_enquiry_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/enquiries", web::get().to(admin_list_enquiries))
        .route("/enquiries/{id}/status", web::put().to(update_enquiry_status));
}
