use crate::middlewares::{AuthGuard, AuthenticatedUser};
use crate::models::*;
use crate::services::UserService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/users/me",
    tag = "user",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_me(
    user_service: web::Data<UserService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    match user_service.get_me(user.user_id).await {
        Ok(me) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": me
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/users/me",
    tag = "user",
    request_body = UpdateProfileRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Phone already registered")
    )
)]
pub async fn update_me(
    user_service: web::Data<UserService>,
    user: AuthenticatedUser,
    request: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
    match user_service.update_me(user.user_id, request.into_inner()).await {
        Ok(me) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": me
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "admin",
    params(AdminUserQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Paginated users"),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn list_users(
    user_service: web::Data<UserService>,
    query: web::Query<AdminUserQuery>,
) -> Result<HttpResponse> {
    match user_service.list_users(query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/users/{id}",
    tag = "admin",
    params(("id" = i64, Path, description = "User id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    user_service: web::Data<UserService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match user_service.get_user(path.into_inner()).await {
        Ok(user) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": user
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/users/{id}/status",
    tag = "admin",
    params(("id" = i64, Path, description = "User id")),
    request_body = UpdateUserStatusRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Status updated", body = UserResponse),
        (status = 403, description = "Own status or not an admin"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user_status(
    user_service: web::Data<UserService>,
    admin: AuthenticatedUser,
    path: web::Path<i64>,
    request: web::Json<UpdateUserStatusRequest>,
) -> Result<HttpResponse> {
    match user_service
        .update_status(admin.user_id, path.into_inner(), request.status)
        .await
    {
        Ok(user) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": user
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn user_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .wrap(AuthGuard::authenticated())
            .route("/me", web::get().to(get_me))
            .route("/me", web::put().to(update_me)),
    );
}

/// Mounted inside the `/admin` scope.
pub fn admin_user_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/users", web::get().to(list_users))
        .route("/users/{id}", web::get().to(get_user))
        .route("/users/{id}/status", web::put().to(update_user_status));
}
