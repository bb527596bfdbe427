use crate::entities::UserType;
use crate::error::{AppError, AppResult};
use crate::utils::JwtService;
use actix_web::http::{Method, header::HeaderMap};
use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest,
    dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    web,
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

/// Identity of the caller, taken from a verified access token.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub email: Option<String>,
    pub user_type: UserType,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.user_type == UserType::Admin
    }
}

/// Reads `Authorization: Bearer <token>` and verifies it as an access token.
pub fn authenticate(headers: &HeaderMap, jwt: &JwtService) -> AppResult<AuthenticatedUser> {
    let token = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Missing access token".to_string()))?;

    let payload = jwt.verify_access_token(token)?;
    Ok(AuthenticatedUser {
        user_id: payload.user_id,
        email: payload.email,
        user_type: payload.user_type,
    })
}

fn jwt_from(req: &HttpRequest) -> AppResult<&JwtService> {
    req.app_data::<web::Data<JwtService>>()
        .map(|d| d.get_ref())
        .ok_or_else(|| AppError::InternalError("JWT service is not registered".to_string()))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Access {
    Authenticated,
    Admin,
}

/// Route guard. Wrap a scope with `AuthGuard::authenticated()` for any
/// signed-in user or `AuthGuard::admin()` for administrators only.
#[derive(Clone, Copy)]
pub struct AuthGuard {
    access: Access,
}

impl AuthGuard {
    pub fn authenticated() -> Self {
        Self {
            access: Access::Authenticated,
        }
    }

    pub fn admin() -> Self {
        Self {
            access: Access::Admin,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthGuardService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGuardService {
            service,
            access: self.access,
        }))
    }
}

pub struct AuthGuardService<S> {
    service: S,
    access: Access,
}

impl<S> AuthGuardService<S> {
    fn check(&self, req: &ServiceRequest) -> AppResult<AuthenticatedUser> {
        let user = authenticate(req.headers(), jwt_from(req.request())?)?;
        if self.access == Access::Admin && !user.is_admin() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        Ok(user)
    }
}

impl<S, B> Service<ServiceRequest> for AuthGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // CORS preflight carries no credentials
        if req.method() == Method::OPTIONS {
            return Box::pin(self.service.call(req));
        }

        match self.check(&req) {
            Ok(user) => {
                req.extensions_mut().insert(user);
                Box::pin(self.service.call(req))
            }
            Err(e) => Box::pin(async move { Err(e.into()) }),
        }
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(user) = req.extensions().get::<AuthenticatedUser>() {
            return ready(Ok(user.clone()));
        }
        ready(jwt_from(req).and_then(|jwt| authenticate(req.headers(), jwt)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::jwt::tests::{expired_access_token, payload, service};
    use actix_web::{App, HttpResponse, http::StatusCode, test};

    async fn whoami(user: AuthenticatedUser) -> HttpResponse {
        HttpResponse::Ok().body(user.user_id.to_string())
    }

    macro_rules! guarded_app {
        ($guard:expr) => {
            test::init_service(
                App::new().app_data(web::Data::new(service())).service(
                    web::scope("/guarded")
                        .wrap($guard)
                        .route("/me", web::get().to(whoami)),
                ),
            )
            .await
        };
    }

    fn bearer(token: &str) -> (&'static str, String) {
        ("Authorization", format!("Bearer {token}"))
    }

    #[actix_web::test]
    async fn test_missing_header_is_unauthorized() {
        let app = guarded_app!(AuthGuard::authenticated());
        let req = test::TestRequest::get().uri("/guarded/me").to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_wrong_scheme_is_unauthorized() {
        let app = guarded_app!(AuthGuard::authenticated());
        let token = service()
            .issue_access_token(&payload(UserType::Customer))
            .unwrap();
        let req = test::TestRequest::get()
            .uri("/guarded/me")
            .insert_header(("Authorization", format!("Token {token}")))
            .to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_expired_token_is_reported_as_expired() {
        let app = guarded_app!(AuthGuard::authenticated());
        let req = test::TestRequest::get()
            .uri("/guarded/me")
            .insert_header(bearer(&expired_access_token(UserType::Customer)))
            .to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();
        let app_err = err.as_error::<AppError>().unwrap();
        assert!(matches!(app_err, AppError::Unauthorized(m) if m == "Access token expired"));
    }

    #[actix_web::test]
    async fn test_customer_is_forbidden_on_admin_routes() {
        let app = guarded_app!(AuthGuard::admin());
        let token = service()
            .issue_access_token(&payload(UserType::Customer))
            .unwrap();
        let req = test::TestRequest::get()
            .uri("/guarded/me")
            .insert_header(bearer(&token))
            .to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_admin_passes_and_identity_reaches_handler() {
        let app = guarded_app!(AuthGuard::admin());
        let token = service()
            .issue_access_token(&payload(UserType::Admin))
            .unwrap();
        let req = test::TestRequest::get()
            .uri("/guarded/me")
            .insert_header(bearer(&token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(body.as_ref(), b"42");
    }

    #[actix_web::test]
    async fn test_refresh_token_is_rejected_as_access_token() {
        let app = guarded_app!(AuthGuard::authenticated());
        let token = service()
            .issue_refresh_token(&payload(UserType::Customer))
            .unwrap();
        let req = test::TestRequest::get()
            .uri("/guarded/me")
            .insert_header(bearer(&token))
            .to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }
}
