use crate::entities::UserType;
use crate::error::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String, // user_id
    pub email: Option<String>,
    pub user_type: UserType,
    pub exp: i64,
    pub iat: i64,
    pub token_type: String, // "access" or "refresh"
}

/// Identity carried inside every token.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenPayload {
    pub user_id: i64,
    pub email: Option<String>,
    pub user_type: UserType,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed or has a bad signature")]
    Invalid,
    #[error("token has expired")]
    Expired,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    fn as_str(self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }

    fn label(self) -> &'static str {
        match self {
            TokenKind::Access => "Access token",
            TokenKind::Refresh => "Refresh token",
        }
    }
}

impl TokenError {
    pub fn into_app_error(self, kind: TokenKind) -> AppError {
        match self {
            TokenError::Expired => AppError::Unauthorized(format!("{} expired", kind.label())),
            TokenError::Invalid => {
                AppError::Unauthorized(format!("Invalid {}", kind.label().to_lowercase()))
            }
        }
    }
}

#[derive(Clone)]
pub struct JwtService {
    access_encoding_key: EncodingKey,
    access_decoding_key: DecodingKey,
    refresh_encoding_key: EncodingKey,
    refresh_decoding_key: DecodingKey,
    access_token_expires_in: i64,
    refresh_token_expires_in: i64,
}

impl JwtService {
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_expires_in: i64,
        refresh_expires_in: i64,
    ) -> Self {
        Self {
            access_encoding_key: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding_key: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding_key: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding_key: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_token_expires_in: access_expires_in,
            refresh_token_expires_in: refresh_expires_in,
        }
    }

    pub fn issue_access_token(&self, payload: &TokenPayload) -> AppResult<String> {
        self.issue(payload, TokenKind::Access)
    }

    pub fn issue_refresh_token(&self, payload: &TokenPayload) -> AppResult<String> {
        self.issue(payload, TokenKind::Refresh)
    }

    fn issue(&self, payload: &TokenPayload, kind: TokenKind) -> AppResult<String> {
        let now = Utc::now();
        let (ttl, key) = match kind {
            TokenKind::Access => (self.access_token_expires_in, &self.access_encoding_key),
            TokenKind::Refresh => (self.refresh_token_expires_in, &self.refresh_encoding_key),
        };
        let claims = Claims {
            sub: payload.user_id.to_string(),
            email: payload.email.clone(),
            user_type: payload.user_type,
            exp: (now + Duration::seconds(ttl)).timestamp(),
            iat: now.timestamp(),
            token_type: kind.as_str().to_string(),
        };

        encode(&Header::default(), &claims, key).map_err(AppError::JwtError)
    }

    /// Decodes a token of the given kind. Expiry is reported separately from
    /// every other failure.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<TokenPayload, TokenError> {
        let key = match kind {
            TokenKind::Access => &self.access_decoding_key,
            TokenKind::Refresh => &self.refresh_decoding_key,
        };
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let claims = decode::<Claims>(token, key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })?;

        if claims.token_type != kind.as_str() {
            return Err(TokenError::Invalid);
        }
        let user_id = claims.sub.parse::<i64>().map_err(|_| TokenError::Invalid)?;

        Ok(TokenPayload {
            user_id,
            email: claims.email,
            user_type: claims.user_type,
        })
    }

    pub fn verify_access_token(&self, token: &str) -> AppResult<TokenPayload> {
        self.verify(token, TokenKind::Access)
            .map_err(|e| e.into_app_error(TokenKind::Access))
    }

    pub fn verify_refresh_token(&self, token: &str) -> AppResult<TokenPayload> {
        self.verify(token, TokenKind::Refresh)
            .map_err(|e| e.into_app_error(TokenKind::Refresh))
    }

    pub fn get_access_token_expires_in(&self) -> i64 {
        self.access_token_expires_in
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const ACCESS_SECRET: &str = "test-access-secret";
    pub(crate) const REFRESH_SECRET: &str = "test-refresh-secret";

    pub(crate) fn service() -> JwtService {
        JwtService::new(ACCESS_SECRET, REFRESH_SECRET, 900, 3600)
    }

    pub(crate) fn payload(user_type: UserType) -> TokenPayload {
        TokenPayload {
            user_id: 42,
            email: Some("jane@example.com".to_string()),
            user_type,
        }
    }

    pub(crate) fn expired_access_token(user_type: UserType) -> String {
        let now = Utc::now();
        let claims = Claims {
            sub: "42".to_string(),
            email: None,
            user_type,
            exp: (now - Duration::minutes(5)).timestamp(),
            iat: (now - Duration::minutes(20)).timestamp(),
            token_type: "access".to_string(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(ACCESS_SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_access_token_carries_identity() {
        let jwt = service();
        let token = jwt.issue_access_token(&payload(UserType::Customer)).unwrap();
        let decoded = jwt.verify(&token, TokenKind::Access).unwrap();
        assert_eq!(decoded, payload(UserType::Customer));
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let jwt = service();
        let refresh = jwt.issue_refresh_token(&payload(UserType::Admin)).unwrap();
        assert_eq!(
            jwt.verify(&refresh, TokenKind::Access),
            Err(TokenError::Invalid)
        );
        assert!(jwt.verify(&refresh, TokenKind::Refresh).is_ok());
    }

    #[test]
    fn test_expired_token_reports_expired() {
        let jwt = service();
        let token = expired_access_token(UserType::Customer);
        assert_eq!(jwt.verify(&token, TokenKind::Access), Err(TokenError::Expired));

        let err = jwt.verify_access_token(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "Access token expired"));
    }

    #[test]
    fn test_garbage_and_foreign_signatures_are_invalid() {
        let jwt = service();
        assert_eq!(jwt.verify("not.a.jwt", TokenKind::Access), Err(TokenError::Invalid));

        let other = JwtService::new("someone-else", "another", 900, 3600);
        let token = other.issue_access_token(&payload(UserType::Admin)).unwrap();
        assert_eq!(jwt.verify(&token, TokenKind::Access), Err(TokenError::Invalid));
    }
}
