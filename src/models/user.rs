use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entities::{UserStatus, UserType, user_entity as users};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[schema(example = "Password123")]
    pub password: String,
    #[schema(example = "+919876543210")]
    pub phone: Option<String>,
    pub user_type: Option<UserType>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[schema(example = "Password123")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MobileAuthRequest {
    #[schema(example = "+919876543210")]
    pub phone: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MobileAuthResponse {
    pub phone: String,
    /// Seconds until the code stops being accepted.
    pub expires_in: i64,
    pub is_new_user: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyOtpRequest {
    #[schema(example = "+919876543210")]
    pub phone: String,
    #[schema(example = "482913")]
    pub otp: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateUserStatusRequest {
    pub status: UserStatus,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminUserQuery {
    pub user_type: Option<UserType>,
    pub status: Option<UserStatus>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

/// Public view of a user. Never carries the password hash or OTP state.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub user_type: UserType,
    pub status: UserStatus,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub phone_verified_at: Option<DateTime<Utc>>,
    pub is_phone_verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

impl From<users::Model> for UserResponse {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            user_type: user.user_type,
            status: user.status,
            email_verified_at: user.email_verified_at,
            phone_verified_at: user.phone_verified_at,
            is_phone_verified: user.is_phone_verified,
            created_at: user.created_at.unwrap_or_else(Utc::now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_response_hides_secrets() {
        let model = users::Model {
            id: 1,
            name: "Jane".to_string(),
            email: Some("jane@example.com".to_string()),
            phone: Some("+919876543210".to_string()),
            password_hash: Some("$2b$12$secret".to_string()),
            user_type: UserType::Customer,
            status: UserStatus::Active,
            email_verified_at: None,
            phone_verified_at: None,
            is_phone_verified: false,
            otp_code: Some("123456".to_string()),
            otp_expires_at: Some(Utc::now()),
            otp_attempts: 2,
            created_at: Some(Utc::now()),
            updated_at: None,
        };
        let json = serde_json::to_string(&UserResponse::from(model)).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("secret"));
        assert!(!json.contains("otp"));
        assert!(!json.contains("123456"));
    }
}
