use crate::middlewares::{AuthGuard, AuthenticatedUser};
use crate::models::*;
use crate::services::MembershipService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/membership/card-types",
    tag = "membership",
    responses((status = 200, description = "Card types currently on sale"))
)]
pub async fn list_card_types(
    membership_service: web::Data<MembershipService>,
) -> Result<HttpResponse> {
    match membership_service.list_active_card_types().await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": list
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/membership/purchase",
    tag = "membership",
    request_body = PurchaseCardRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Card issued", body = MembershipCardResponse),
        (status = 400, description = "Card type not on sale"),
        (status = 409, description = "An active card already exists")
    )
)]
pub async fn purchase(
    membership_service: web::Data<MembershipService>,
    user: AuthenticatedUser,
    request: web::Json<PurchaseCardRequest>,
) -> Result<HttpResponse> {
    match membership_service
        .purchase(user.user_id, request.into_inner())
        .await
    {
        Ok(card) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": card,
            "message": "Membership card issued"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/membership/cards",
    tag = "membership",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own cards", body = [MembershipCardResponse]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_cards(
    membership_service: web::Data<MembershipService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    match membership_service.list_user_cards(user.user_id).await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": list
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/membership/eligibility",
    tag = "membership",
    params(EligibilityQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Eligibility verdict", body = EligibilityResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn eligibility(
    membership_service: web::Data<MembershipService>,
    user: AuthenticatedUser,
    query: web::Query<EligibilityQuery>,
) -> Result<HttpResponse> {
    match membership_service
        .eligibility(user.user_id, query.loan_type)
        .await
    {
        Ok(verdict) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": verdict
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/membership/card-types",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "All card types"))
)]
pub async fn admin_list_card_types(
    membership_service: web::Data<MembershipService>,
) -> Result<HttpResponse> {
    match membership_service.list_all_card_types().await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": list
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/membership/card-types",
    tag = "admin",
    request_body = CardTypeRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Card type created"),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_card_type(
    membership_service: web::Data<MembershipService>,
    request: web::Json<CardTypeRequest>,
) -> Result<HttpResponse> {
    match membership_service
        .create_card_type(request.into_inner())
        .await
    {
        Ok(card_type) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": card_type
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/membership/card-types/{id}",
    tag = "admin",
    params(("id" = i64, Path, description = "Card type id")),
    request_body = CardTypeRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Card type updated"),
        (status = 404, description = "Card type not found")
    )
)]
pub async fn update_card_type(
    membership_service: web::Data<MembershipService>,
    path: web::Path<i64>,
    request: web::Json<CardTypeRequest>,
) -> Result<HttpResponse> {
    match membership_service
        .update_card_type(path.into_inner(), request.into_inner())
        .await
    {
        Ok(card_type) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": card_type
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/membership/card-types/{id}/toggle",
    tag = "admin",
    params(("id" = i64, Path, description = "Card type id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Availability flipped"),
        (status = 404, description = "Card type not found")
    )
)]
pub async fn toggle_card_type(
    membership_service: web::Data<MembershipService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match membership_service.toggle_card_type(path.into_inner()).await {
        Ok(card_type) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": card_type
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/membership/cards/{id}/cancel",
    tag = "admin",
    params(("id" = i64, Path, description = "Card id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Card cancelled", body = MembershipCardResponse),
        (status = 404, description = "Card not found"),
        (status = 409, description = "Card already cancelled")
    )
)]
pub async fn cancel_card(
    membership_service: web::Data<MembershipService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match membership_service.cancel_card(path.into_inner()).await {
        Ok(card) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": card
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn membership_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/membership")
            .route("/card-types", web::get().to(list_card_types))
            .service(
                web::resource("/purchase")
                    .wrap(AuthGuard::authenticated())
                    .route(web::post().to(purchase)),
            )
            .service(
                web::resource("/cards")
                    .wrap(AuthGuard::authenticated())
                    .route(web::get().to(list_cards)),
            )
            .service(
                web::resource("/eligibility")
                    .wrap(AuthGuard::authenticated())
                    .route(web::get().to(eligibility)),
            ),
    );
}

/// Mounted inside the `/admin` scope.
pub fn admin_membership_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/membership")
            .route("/card-types", web::get().to(admin_list_card_types))
            .route("/card-types", web::post().to(create_card_type))
            .route("/card-types/{id}", web::put().to(update_card_type))
            .route("/card-types/{id}/toggle", web::post().to(toggle_card_type))
            .route("/cards/{id}/cancel", web::post().to(cancel_card)),
    );
}
