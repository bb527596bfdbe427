use crate::handlers::{bank_partner, cash_lending, content, enquiry, loan, membership, user};
use crate::middlewares::AuthGuard;
use crate::services::ReportService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/admin/reports/summary",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard counters", body = crate::models::SummaryReport),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn summary_report(report_service: web::Data<ReportService>) -> Result<HttpResponse> {
    match report_service.summary().await {
        Ok(report) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": report
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// Every admin route sits behind one guarded scope.
pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .wrap(AuthGuard::admin())
            .route("/reports/summary", web::get().to(summary_report))
            .configure(user::admin_user_routes)
            .configure(loan::admin_loan_routes)
            .configure(membership::admin_membership_routes)
            .configure(cash_lending::admin_cash_lending_routes)
            .configure(bank_partner::admin_bank_partner_routes)
            .configure(content::admin_content_routes)
            .configure(enquiry::admin_enquiry_routes),
    );
}
