use crate::middlewares::{AuthGuard, AuthenticatedUser};
use crate::models::*;
use crate::services::LoanService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

fn ok(data: LoanApplicationResponse) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "success": true,
        "data": data
    }))
}

#[utoipa::path(
    post,
    path = "/loans/apply",
    tag = "loan",
    request_body = ApplyLoanRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Application submitted", body = LoanApplicationResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No eligible membership card")
    )
)]
pub async fn apply(
    loan_service: web::Data<LoanService>,
    user: AuthenticatedUser,
    request: web::Json<ApplyLoanRequest>,
) -> Result<HttpResponse> {
    match loan_service.apply(user.user_id, request.into_inner()).await {
        Ok(application) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": application,
            "message": "Loan application submitted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/loans",
    tag = "loan",
    params(LoanQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own applications, newest first"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_own(
    loan_service: web::Data<LoanService>,
    user: AuthenticatedUser,
    query: web::Query<LoanQuery>,
) -> Result<HttpResponse> {
    match loan_service.list_own(user.user_id, query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loan",
    params(("id" = i64, Path, description = "Application id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Application", body = LoanApplicationResponse),
        (status = 404, description = "Not found or not owned")
    )
)]
pub async fn get_own(
    loan_service: web::Data<LoanService>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match loan_service.get_own(user.user_id, path.into_inner()).await {
        Ok(application) => Ok(ok(application)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/loans/{id}",
    tag = "loan",
    params(("id" = i64, Path, description = "Application id")),
    request_body = UpdateLoanRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Application updated", body = LoanApplicationResponse),
        (status = 403, description = "Application is no longer editable"),
        (status = 404, description = "Not found or not owned"),
        (status = 409, description = "Status changed concurrently")
    )
)]
pub async fn update_own(
    loan_service: web::Data<LoanService>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    request: web::Json<UpdateLoanRequest>,
) -> Result<HttpResponse> {
    match loan_service
        .update_own(user.user_id, path.into_inner(), request.into_inner())
        .await
    {
        Ok(application) => Ok(ok(application)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/loans/{id}/documents",
    tag = "loan",
    params(("id" = i64, Path, description = "Application id")),
    request_body = AttachDocumentRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Document reference attached", body = LoanApplicationResponse),
        (status = 403, description = "Application is no longer editable"),
        (status = 404, description = "Not found or not owned")
    )
)]
pub async fn attach_document(
    loan_service: web::Data<LoanService>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    request: web::Json<AttachDocumentRequest>,
) -> Result<HttpResponse> {
    match loan_service
        .attach_document(user.user_id, path.into_inner(), request.into_inner())
        .await
    {
        Ok(application) => Ok(ok(application)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/loans/{id}/cancel",
    tag = "loan",
    params(("id" = i64, Path, description = "Application id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Application cancelled", body = LoanApplicationResponse),
        (status = 403, description = "Already decided"),
        (status = 404, description = "Not found or not owned")
    )
)]
pub async fn cancel_own(
    loan_service: web::Data<LoanService>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match loan_service.cancel_own(user.user_id, path.into_inner()).await {
        Ok(application) => Ok(ok(application)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/loans",
    tag = "admin",
    params(AdminLoanQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Paginated applications"),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn admin_list(
    loan_service: web::Data<LoanService>,
    query: web::Query<AdminLoanQuery>,
) -> Result<HttpResponse> {
    match loan_service.admin_list(query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/loans/{id}",
    tag = "admin",
    params(("id" = i64, Path, description = "Application id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Application", body = LoanApplicationResponse),
        (status = 404, description = "Not found")
    )
)]
pub async fn admin_get(
    loan_service: web::Data<LoanService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match loan_service.admin_get(path.into_inner()).await {
        Ok(application) => Ok(ok(application)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/loans/{id}/review",
    tag = "admin",
    params(("id" = i64, Path, description = "Application id")),
    request_body = AdminRemarksRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Moved to under_review", body = LoanApplicationResponse),
        (status = 400, description = "Illegal transition"),
        (status = 409, description = "Status changed concurrently")
    )
)]
pub async fn start_review(
    loan_service: web::Data<LoanService>,
    admin: AuthenticatedUser,
    path: web::Path<i64>,
    request: Option<web::Json<AdminRemarksRequest>>,
) -> Result<HttpResponse> {
    let request = request.map(|r| r.into_inner()).unwrap_or_default();
    match loan_service
        .start_review(admin.user_id, path.into_inner(), request)
        .await
    {
        Ok(application) => Ok(ok(application)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/loans/{id}/request-documents",
    tag = "admin",
    params(("id" = i64, Path, description = "Application id")),
    request_body = AdminRemarksRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Moved to requires_documents", body = LoanApplicationResponse),
        (status = 400, description = "Illegal transition"),
        (status = 409, description = "Status changed concurrently")
    )
)]
pub async fn request_documents(
    loan_service: web::Data<LoanService>,
    admin: AuthenticatedUser,
    path: web::Path<i64>,
    request: web::Json<AdminRemarksRequest>,
) -> Result<HttpResponse> {
    match loan_service
        .request_documents(admin.user_id, path.into_inner(), request.into_inner())
        .await
    {
        Ok(application) => Ok(ok(application)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/loans/{id}/approve",
    tag = "admin",
    params(("id" = i64, Path, description = "Application id")),
    request_body = ApproveLoanRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Application approved", body = LoanApplicationResponse),
        (status = 400, description = "Invalid terms or illegal transition"),
        (status = 409, description = "Status changed concurrently")
    )
)]
pub async fn approve(
    loan_service: web::Data<LoanService>,
    admin: AuthenticatedUser,
    path: web::Path<i64>,
    request: web::Json<ApproveLoanRequest>,
) -> Result<HttpResponse> {
    match loan_service
        .approve(admin.user_id, path.into_inner(), request.into_inner())
        .await
    {
        Ok(application) => Ok(ok(application)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/loans/{id}/reject",
    tag = "admin",
    params(("id" = i64, Path, description = "Application id")),
    request_body = RejectLoanRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Application rejected", body = LoanApplicationResponse),
        (status = 400, description = "Missing reason or illegal transition"),
        (status = 409, description = "Status changed concurrently")
    )
)]
pub async fn reject(
    loan_service: web::Data<LoanService>,
    admin: AuthenticatedUser,
    path: web::Path<i64>,
    request: web::Json<RejectLoanRequest>,
) -> Result<HttpResponse> {
    match loan_service
        .reject(admin.user_id, path.into_inner(), request.into_inner())
        .await
    {
        Ok(application) => Ok(ok(application)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/loans/{id}/disburse",
    tag = "admin",
    params(("id" = i64, Path, description = "Application id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Funds disbursed", body = LoanApplicationResponse),
        (status = 400, description = "Illegal transition")
    )
)]
pub async fn disburse(
    loan_service: web::Data<LoanService>,
    admin: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match loan_service.disburse(admin.user_id, path.into_inner()).await {
        Ok(application) => Ok(ok(application)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/loans/{id}/close",
    tag = "admin",
    params(("id" = i64, Path, description = "Application id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Loan closed", body = LoanApplicationResponse),
        (status = 400, description = "Illegal transition")
    )
)]
pub async fn close(
    loan_service: web::Data<LoanService>,
    admin: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match loan_service.close(admin.user_id, path.into_inner()).await {
        Ok(application) => Ok(ok(application)),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn loan_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/loans")
            .wrap(AuthGuard::authenticated())
            .route("", web::get().to(list_own))
            .route("/apply", web::post().to(apply))
            .route("/{id}", web::get().to(get_own))
            .route("/{id}", web::put().to(update_own))
            .route("/{id}/documents", web::post().to(attach_document))
            .route("/{id}/cancel", web::post().to(cancel_own)),
    );
}

/// Mounted inside the `/admin` scope.
pub fn admin_loan_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/loans")
            .route("", web::get().to(admin_list))
            .route("/{id}", web::get().to(admin_get))
            .route("/{id}/review", web::post().to(start_review))
            .route("/{id}/request-documents", web::post().to(request_documents))
            .route("/{id}/approve", web::post().to(approve))
            .route("/{id}/reject", web::post().to(reject))
            .route("/{id}/disburse", web::post().to(disburse))
            .route("/{id}/close", web::post().to(close)),
    );
}
