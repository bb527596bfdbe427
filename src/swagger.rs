use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{
    EnquiryStatus, LoanStatus, LoanSupport, LoanType, MembershipCardStatus, SubscriptionStatus,
    UserStatus, UserType, bank_partners, cash_lending_plans, enquiries, membership_card_types,
    static_contents,
};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh_token,
        handlers::auth::mobile_auth,
        handlers::auth::verify_mobile_otp,
        handlers::user::get_me,
        handlers::user::update_me,
        handlers::loan::apply,
        handlers::loan::list_own,
        handlers::loan::get_own,
        handlers::loan::update_own,
        handlers::loan::attach_document,
        handlers::loan::cancel_own,
        handlers::membership::list_card_types,
        handlers::membership::purchase,
        handlers::membership::list_cards,
        handlers::membership::eligibility,
        handlers::cash_lending::list_plans,
        handlers::cash_lending::subscribe,
        handlers::cash_lending::list_subscriptions,
        handlers::bank_partner::list_partners,
        handlers::content::get_content,
        handlers::enquiry::create_enquiry,
        handlers::admin::summary_report,
        handlers::user::list_users,
        handlers::user::get_user,
        handlers::user::update_user_status,
        handlers::loan::admin_list,
        handlers::loan::admin_get,
        handlers::loan::start_review,
        handlers::loan::request_documents,
        handlers::loan::approve,
        handlers::loan::reject,
        handlers::loan::disburse,
        handlers::loan::close,
        handlers::membership::admin_list_card_types,
        handlers::membership::create_card_type,
        handlers::membership::update_card_type,
        handlers::membership::toggle_card_type,
        handlers::membership::cancel_card,
        handlers::cash_lending::admin_list_plans,
        handlers::cash_lending::create_plan,
        handlers::cash_lending::update_plan,
        handlers::cash_lending::toggle_plan,
        handlers::bank_partner::admin_list_partners,
        handlers::bank_partner::create_partner,
        handlers::bank_partner::update_partner,
        handlers::bank_partner::toggle_partner,
        handlers::content::admin_list_content,
        handlers::content::upsert_content,
        handlers::enquiry::admin_list_enquiries,
        handlers::enquiry::update_enquiry_status,
    ),
    components(
        schemas(
            UserType,
            UserStatus,
            LoanType,
            LoanStatus,
            LoanSupport,
            MembershipCardStatus,
            SubscriptionStatus,
            EnquiryStatus,
            RegisterRequest,
            LoginRequest,
            RefreshTokenRequest,
            MobileAuthRequest,
            MobileAuthResponse,
            VerifyOtpRequest,
            UpdateProfileRequest,
            UpdateUserStatusRequest,
            UserResponse,
            AuthResponse,
            ApplyLoanRequest,
            UpdateLoanRequest,
            AttachDocumentRequest,
            ApproveLoanRequest,
            RejectLoanRequest,
            AdminRemarksRequest,
            LoanApplicationResponse,
            CardTypeRequest,
            PurchaseCardRequest,
            EligibilityResponse,
            MembershipCardResponse,
            CashLendingPlanRequest,
            SubscribeRequest,
            SubscriptionResponse,
            BankPartnerRequest,
            UpsertContentRequest,
            CreateEnquiryRequest,
            UpdateEnquiryStatusRequest,
            SummaryReport,
            HealthResponse,
            ApiError,
            membership_card_types::Model,
            cash_lending_plans::Model,
            bank_partners::Model,
            static_contents::Model,
            enquiries::Model,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and OTP sign-in"),
        (name = "user", description = "Own profile"),
        (name = "loan", description = "Loan applications"),
        (name = "membership", description = "Membership cards and loan eligibility"),
        (name = "cash_lending", description = "Cash-lending plans and subscriptions"),
        (name = "reference", description = "Bank partners, static pages and enquiries"),
        (name = "admin", description = "Back-office operations"),
    ),
    info(
        title = "LendHub Backend API",
        version = "1.0.0",
        description = "Loan origination and membership REST API"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
