use crate::config::{AdminBootstrapConfig, OtpConfig};
use crate::database::DbPool;
use crate::entities::{UserStatus, UserType, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::external::{TwilioService, mask_phone};
use crate::models::*;
use crate::utils::*;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, Set, SqlErr};

const DUPLICATE_ACCOUNT: &str = "An account with this email or phone already exists";
const BAD_CREDENTIALS: &str = "Invalid email or password";
const INVALID_OTP: &str = "Invalid OTP";
const TOO_MANY_ATTEMPTS: &str = "Too many failed attempts, request a new OTP";

fn duplicate_as_conflict(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(DUPLICATE_ACCOUNT.into()),
        _ => AppError::DatabaseError(e),
    }
}

#[derive(Clone)]
pub struct AuthService {
    db: DbPool,
    jwt_service: JwtService,
    twilio_service: TwilioService,
    otp: OtpConfig,
}

impl AuthService {
    pub fn new(
        db: DbPool,
        jwt_service: JwtService,
        twilio_service: TwilioService,
        otp: OtpConfig,
    ) -> Self {
        Self {
            db,
            jwt_service,
            twilio_service,
            otp,
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::ValidationError("name is required".into()));
        }
        let email = canonical_email(&request.email)?;
        validate_password(&request.password)?;
        let phone = match request.phone.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => Some(canonical_phone(p)?),
            _ => None,
        };
        let user_type = match request.user_type.unwrap_or(UserType::Customer) {
            UserType::Admin => {
                return Err(AppError::ValidationError(
                    "Administrator accounts cannot be self-registered".into(),
                ));
            }
            other => other,
        };

        let email_taken = users::Entity::find()
            .filter(users::Column::Email.eq(email.as_str()))
            .one(self.db.as_ref())
            .await?
            .is_some();
        if email_taken {
            return Err(AppError::Conflict("Email already registered".into()));
        }
        if let Some(phone) = &phone {
            let phone_taken = users::Entity::find()
                .filter(users::Column::Phone.eq(phone.as_str()))
                .one(self.db.as_ref())
                .await?
                .is_some();
            if phone_taken {
                return Err(AppError::Conflict("Phone already registered".into()));
            }
        }

        let password_hash = hash_password(&request.password)?;
        let now = Utc::now();
        let user = users::ActiveModel {
            name: Set(name),
            email: Set(Some(email)),
            phone: Set(phone),
            password_hash: Set(Some(password_hash)),
            user_type: Set(user_type),
            status: Set(UserStatus::Active),
            is_phone_verified: Set(false),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(duplicate_as_conflict)?;

        log::info!("User {} registered as {}", user.id, user.user_type);
        self.issue_tokens(user)
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        // unknown addresses fall through to the shared credentials message
        let email = canonical_email(&request.email)
            .map_err(|_| AppError::Unauthorized(BAD_CREDENTIALS.into()))?;

        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| AppError::Unauthorized(BAD_CREDENTIALS.into()))?;

        let Some(hash) = user.password_hash.as_deref() else {
            return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
        };
        if !verify_password(&request.password, hash)? {
            return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
        }
        if user.status == UserStatus::Suspended {
            return Err(AppError::Forbidden("Account suspended".into()));
        }

        log::info!("User {} logged in", user.id);
        self.issue_tokens(user)
    }

    pub async fn refresh_token(&self, request: RefreshTokenRequest) -> AppResult<AuthResponse> {
        let payload = self
            .jwt_service
            .verify_refresh_token(request.refresh_token.trim())?;

        let user = users::Entity::find_by_id(payload.user_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| AppError::Unauthorized("User no longer exists".into()))?;
        if user.status == UserStatus::Suspended {
            return Err(AppError::Unauthorized("Account suspended".into()));
        }

        let access_token = self.jwt_service.issue_access_token(&token_payload(&user))?;
        Ok(AuthResponse {
            user: user.into(),
            access_token,
            refresh_token: request.refresh_token.trim().to_string(),
            expires_in: self.jwt_service.get_access_token_expires_in(),
        })
    }

    /// Issues a fresh OTP for `phone`, creating a pending account when the
    /// number is unknown. Any previous code is replaced.
    pub async fn mobile_auth(&self, request: MobileAuthRequest) -> AppResult<MobileAuthResponse> {
        let phone = canonical_phone(&request.phone)?;
        let now = Utc::now();
        let code = generate_otp(self.otp.length);
        let expires_at = otp_expiry(now, self.otp.validity_minutes);

        let existing = users::Entity::find()
            .filter(users::Column::Phone.eq(phone.as_str()))
            .one(self.db.as_ref())
            .await?;

        let is_new_user = match existing {
            Some(user) => {
                if user.status == UserStatus::Suspended {
                    return Err(AppError::Forbidden("Account suspended".into()));
                }
                users::Entity::update_many()
                    .set(users::ActiveModel {
                        otp_code: Set(Some(code.clone())),
                        otp_expires_at: Set(Some(expires_at)),
                        otp_attempts: Set(0),
                        updated_at: Set(Some(now)),
                        ..Default::default()
                    })
                    .filter(users::Column::Id.eq(user.id))
                    .exec(self.db.as_ref())
                    .await?;
                false
            }
            None => {
                let user = users::ActiveModel {
                    name: Set(phone.clone()),
                    phone: Set(Some(phone.clone())),
                    user_type: Set(UserType::Customer),
                    status: Set(UserStatus::PendingVerification),
                    is_phone_verified: Set(false),
                    otp_code: Set(Some(code.clone())),
                    otp_expires_at: Set(Some(expires_at)),
                    otp_attempts: Set(0),
                    created_at: Set(Some(now)),
                    updated_at: Set(Some(now)),
                    ..Default::default()
                }
                .insert(self.db.as_ref())
                .await
                .map_err(duplicate_as_conflict)?;
                log::info!("Pending account {} created for mobile sign-in", user.id);
                true
            }
        };

        self.twilio_service
            .send_otp(&phone, &code, self.otp.validity_minutes)
            .await?;
        log::info!("OTP issued to {}", mask_phone(&phone));

        Ok(MobileAuthResponse {
            phone,
            expires_in: self.otp.validity_minutes * 60,
            is_new_user,
        })
    }

    pub async fn verify_mobile_otp(&self, request: VerifyOtpRequest) -> AppResult<AuthResponse> {
        self.verify_mobile_otp_at(request, Utc::now()).await
    }

    async fn verify_mobile_otp_at(
        &self,
        request: VerifyOtpRequest,
        now: DateTime<Utc>,
    ) -> AppResult<AuthResponse> {
        let phone = canonical_phone(&request.phone)?;
        let no_otp = || AppError::ValidationError("No OTP requested for this phone".into());

        let user = users::Entity::find()
            .filter(users::Column::Phone.eq(phone.as_str()))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(no_otp)?;

        match check_otp(
            user.otp_code.as_deref(),
            user.otp_expires_at,
            &request.otp,
            now,
        ) {
            OtpCheck::Missing => return Err(no_otp()),
            OtpCheck::Expired => {
                self.clear_otp(user.id, now).await?;
                return Err(AppError::ValidationError("OTP has expired".into()));
            }
            OtpCheck::Mismatch => {
                log::warn!("Wrong OTP supplied for {}", mask_phone(&phone));
                return Err(self.record_failed_otp(&user, now).await?);
            }
            OtpCheck::Valid if user.otp_attempts >= self.otp.max_attempts => {
                self.clear_otp(user.id, now).await?;
                return Err(AppError::ValidationError(TOO_MANY_ATTEMPTS.into()));
            }
            OtpCheck::Valid => {}
        }

        if user.status == UserStatus::Suspended {
            self.clear_otp(user.id, now).await?;
            return Err(AppError::Forbidden("Account suspended".into()));
        }

        let status = match user.status {
            UserStatus::PendingVerification => UserStatus::Active,
            other => other,
        };
        // the code is consumed only if nobody else consumed or replaced it first
        let result = users::Entity::update_many()
            .set(users::ActiveModel {
                otp_code: Set(None),
                otp_expires_at: Set(None),
                otp_attempts: Set(0),
                is_phone_verified: Set(true),
                phone_verified_at: Set(Some(now)),
                status: Set(status),
                updated_at: Set(Some(now)),
                ..Default::default()
            })
            .filter(users::Column::Id.eq(user.id))
            .filter(users::Column::OtpCode.eq(user.otp_code.clone()))
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            log::warn!("OTP for {} was already consumed", mask_phone(&phone));
            return Err(AppError::ValidationError(INVALID_OTP.into()));
        }

        let user = users::Model {
            otp_code: None,
            otp_expires_at: None,
            otp_attempts: 0,
            is_phone_verified: true,
            phone_verified_at: Some(now),
            status,
            updated_at: Some(now),
            ..user
        };
        log::info!("User {} verified phone {}", user.id, mask_phone(&phone));
        self.issue_tokens(user)
    }

    /// Creates the configured administrator unless an account with that email
    /// already exists. Returns whether a new account was created.
    pub async fn bootstrap_admin(&self, admin: &AdminBootstrapConfig) -> AppResult<bool> {
        let email = canonical_email(&admin.email)?;
        let existing = users::Entity::find()
            .filter(users::Column::Email.eq(email.as_str()))
            .one(self.db.as_ref())
            .await?;
        if let Some(user) = existing {
            if user.user_type != UserType::Admin {
                log::warn!(
                    "Bootstrap admin email belongs to non-admin user {}, leaving it unchanged",
                    user.id
                );
            }
            return Ok(false);
        }

        validate_password(&admin.password)
            .map_err(|e| AppError::ConfigError(format!("Bootstrap admin password: {e}")))?;
        let now = Utc::now();
        let user = users::ActiveModel {
            name: Set(admin.name.clone()),
            email: Set(Some(email)),
            password_hash: Set(Some(hash_password(&admin.password)?)),
            user_type: Set(UserType::Admin),
            status: Set(UserStatus::Active),
            is_phone_verified: Set(false),
            email_verified_at: Set(Some(now)),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;
        log::info!("Bootstrap administrator {} created", user.id);
        Ok(true)
    }

    /// Counts a wrong guess. The code is discarded once the limit is reached.
    async fn record_failed_otp(
        &self,
        user: &users::Model,
        now: DateTime<Utc>,
    ) -> AppResult<AppError> {
        if user.otp_attempts + 1 >= self.otp.max_attempts {
            self.clear_otp(user.id, now).await?;
            log::warn!("OTP for user {} discarded after repeated failures", user.id);
            return Ok(AppError::ValidationError(TOO_MANY_ATTEMPTS.into()));
        }
        users::Entity::update_many()
            .col_expr(
                users::Column::OtpAttempts,
                Expr::col(users::Column::OtpAttempts).add(1),
            )
            .filter(users::Column::Id.eq(user.id))
            .exec(self.db.as_ref())
            .await?;
        Ok(AppError::ValidationError(INVALID_OTP.into()))
    }

    async fn clear_otp(&self, user_id: i64, now: DateTime<Utc>) -> AppResult<()> {
        users::Entity::update_many()
            .set(users::ActiveModel {
                otp_code: Set(None),
                otp_expires_at: Set(None),
                otp_attempts: Set(0),
                updated_at: Set(Some(now)),
                ..Default::default()
            })
            .filter(users::Column::Id.eq(user_id))
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    fn issue_tokens(&self, user: users::Model) -> AppResult<AuthResponse> {
        let payload = token_payload(&user);
        Ok(AuthResponse {
            access_token: self.jwt_service.issue_access_token(&payload)?,
            refresh_token: self.jwt_service.issue_refresh_token(&payload)?,
            expires_in: self.jwt_service.get_access_token_expires_in(),
            user: user.into(),
        })
    }
}

fn token_payload(user: &users::Model) -> TokenPayload {
    TokenPayload {
        user_id: user.id,
        email: user.email.clone(),
        user_type: user.user_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TwilioConfig;
    use crate::database::connection::tests::{mock_pool, transaction_log};
    use crate::utils::jwt::tests::service as jwt_service;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn phone_user(otp: Option<&str>, issued_at: DateTime<Utc>) -> users::Model {
        users::Model {
            id: 5,
            name: "+919876543210".to_string(),
            email: None,
            phone: Some("+919876543210".to_string()),
            password_hash: None,
            user_type: UserType::Customer,
            status: UserStatus::PendingVerification,
            email_verified_at: None,
            phone_verified_at: None,
            is_phone_verified: false,
            otp_code: otp.map(str::to_string),
            otp_expires_at: otp.map(|_| otp_expiry(issued_at, 10)),
            otp_attempts: 0,
            created_at: Some(issued_at),
            updated_at: Some(issued_at),
        }
    }

    fn auth_service(db: DbPool) -> AuthService {
        AuthService::new(
            db,
            jwt_service(),
            TwilioService::new(TwilioConfig::default()),
            OtpConfig::default(),
        )
    }

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn verify_request(otp: &str) -> VerifyOtpRequest {
        VerifyOtpRequest {
            phone: "+91 98765 43210".to_string(),
            otp: otp.to_string(),
        }
    }

    #[tokio::test]
    async fn test_expired_otp_is_rejected_and_cleared() {
        let issued_at = Utc::now() - Duration::minutes(11);
        let db = mock_pool(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![phone_user(Some("482913"), issued_at)]])
                .append_exec_results([exec(1)]),
        );
        let service = auth_service(db.clone());

        let err = service
            .verify_mobile_otp(verify_request("482913"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(ref m) if m == "OTP has expired"));

        drop(service);
        let log = transaction_log(db);
        assert_eq!(log.len(), 2);
        let clear = format!("{:?}", log[1]);
        assert!(clear.contains("UPDATE"));
        assert!(clear.contains("otp_code"));
    }

    #[tokio::test]
    async fn test_wrong_otp_keeps_stored_code_and_counts_the_miss() {
        let issued_at = Utc::now() - Duration::minutes(2);
        let db = mock_pool(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![phone_user(Some("482913"), issued_at)]])
                .append_exec_results([exec(1)]),
        );
        let service = auth_service(db.clone());

        let err = service
            .verify_mobile_otp(verify_request("000000"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(ref m) if m == INVALID_OTP));

        drop(service);
        let log = transaction_log(db);
        assert_eq!(log.len(), 2);
        let bump = format!("{:?}", log[1]);
        assert!(bump.contains("otp_attempts"));
        assert!(!bump.contains("otp_code"));
    }

    #[tokio::test]
    async fn test_last_allowed_miss_discards_the_code() {
        let issued_at = Utc::now() - Duration::minutes(2);
        let user = users::Model {
            otp_attempts: OtpConfig::default().max_attempts - 1,
            ..phone_user(Some("482913"), issued_at)
        };
        let db = mock_pool(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![user]])
                .append_exec_results([exec(1)]),
        );
        let service = auth_service(db.clone());

        let err = service
            .verify_mobile_otp(verify_request("000000"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(ref m) if m == TOO_MANY_ATTEMPTS));

        drop(service);
        let log = transaction_log(db);
        assert_eq!(log.len(), 2);
        let clear = format!("{:?}", log[1]);
        assert!(clear.contains("otp_code"));
        assert!(clear.contains("String(None)"));
    }

    #[tokio::test]
    async fn test_missing_otp() {
        let db = mock_pool(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![phone_user(None, Utc::now())]]),
        );
        let service = auth_service(db);

        let err = service
            .verify_mobile_otp(verify_request("482913"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(err.public_message(), "No OTP requested for this phone");
    }

    #[tokio::test]
    async fn test_valid_otp_activates_account() {
        let issued_at = Utc::now() - Duration::minutes(1);
        let db = mock_pool(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![phone_user(Some("482913"), issued_at)]])
                .append_exec_results([exec(1)]),
        );
        let service = auth_service(db.clone());

        let auth = service
            .verify_mobile_otp(verify_request("482913"))
            .await
            .unwrap();
        assert_eq!(auth.user.status, UserStatus::Active);
        assert!(auth.user.is_phone_verified);
        assert!(auth.user.phone_verified_at.is_some());

        let payload = jwt_service().verify_access_token(&auth.access_token).unwrap();
        assert_eq!(payload.user_id, 5);
        assert_eq!(payload.user_type, UserType::Customer);

        drop(service);
        let log = transaction_log(db);
        let consume = format!("{:?}", log[1]);
        assert!(consume.contains("otp_code"));
        assert!(consume.contains("482913"));
    }

    #[tokio::test]
    async fn test_otp_consumed_concurrently_is_rejected() {
        let issued_at = Utc::now() - Duration::minutes(1);
        let db = mock_pool(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![phone_user(Some("482913"), issued_at)]])
                .append_exec_results([exec(0)]),
        );
        let service = auth_service(db);

        let err = service
            .verify_mobile_otp(verify_request("482913"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(ref m) if m == INVALID_OTP));
    }

    #[tokio::test]
    async fn test_mobile_auth_creates_pending_account_for_unknown_phone() {
        let db = mock_pool(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<users::Model>::new()])
                .append_query_results([vec![phone_user(Some("482913"), Utc::now())]]),
        );
        let service = auth_service(db.clone());

        let response = service
            .mobile_auth(MobileAuthRequest {
                phone: "+91 98765 43210".to_string(),
            })
            .await
            .unwrap();
        assert!(response.is_new_user);
        assert_eq!(response.phone, "+919876543210");
        assert_eq!(response.expires_in, 600);

        drop(service);
        let log = transaction_log(db);
        assert_eq!(log.len(), 2);
        let insert = format!("{:?}", log[1]);
        assert!(insert.contains("INSERT INTO"));
        assert!(insert.contains("users"));
        assert!(insert.contains("pending_verification"));
        assert!(insert.contains("+919876543210"));
    }

    #[tokio::test]
    async fn test_mobile_auth_for_suspended_account_is_forbidden() {
        let suspended = users::Model {
            status: UserStatus::Suspended,
            ..phone_user(None, Utc::now())
        };
        let db = mock_pool(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![suspended]]),
        );
        let service = auth_service(db);

        let result = service
            .mobile_auth(MobileAuthRequest {
                phone: "+919876543210".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_admin_cannot_self_register() {
        let db = mock_pool(MockDatabase::new(DatabaseBackend::Postgres));
        let service = auth_service(db);

        let request = RegisterRequest {
            name: "Mallory".to_string(),
            email: "mallory@example.com".to_string(),
            password: "Password123".to_string(),
            phone: None,
            user_type: Some(UserType::Admin),
        };
        assert!(matches!(
            service.register(request).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_login_unknown_email_and_wrong_password_look_alike() {
        let known = users::Model {
            email: Some("jane@example.com".to_string()),
            password_hash: Some(hash_password("Password123").unwrap()),
            status: UserStatus::Active,
            ..phone_user(None, Utc::now())
        };
        let db = mock_pool(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<users::Model>::new()])
                .append_query_results([vec![known]]),
        );
        let service = auth_service(db);

        let unknown = service
            .login(LoginRequest {
                email: "ghost@example.com".to_string(),
                password: "Password123".to_string(),
            })
            .await
            .unwrap_err();
        let wrong = service
            .login(LoginRequest {
                email: "jane@example.com".to_string(),
                password: "Password124".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(unknown.public_message(), BAD_CREDENTIALS);
        assert_eq!(wrong.public_message(), BAD_CREDENTIALS);
    }
}
