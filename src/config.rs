use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub otp: OtpConfig,
    #[serde(default)]
    pub twilio: TwilioConfig,
    #[serde(default)]
    pub admin: Option<AdminBootstrapConfig>,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_token_expires_in: i64,  // seconds
    pub refresh_token_expires_in: i64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpConfig {
    pub length: usize,
    pub validity_minutes: i64,
    /// Wrong guesses allowed before the code is discarded.
    #[serde(default = "default_otp_max_attempts")]
    pub max_attempts: i32,
}

fn default_otp_max_attempts() -> i32 {
    5
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            length: 6,
            validity_minutes: 10,
            max_attempts: default_otp_max_attempts(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Account created at startup when no user with this email exists yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminBootstrapConfig {
    pub email: String,
    pub password: String,
    #[serde(default = "default_admin_name")]
    pub name: String,
}

fn default_admin_name() -> String {
    "Administrator".to_string()
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // Without a config file everything comes from the environment.
        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => toml::from_str(&config_str)
                .map_err(|e| format!("Failed to parse config file {config_path}: {e}"))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let database_url = get_env("DATABASE_URL").ok_or(
                    "DATABASE_URL is not set and no config.toml was found",
                )?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        access_secret: get_env("JWT_ACCESS_SECRET")
                            .unwrap_or_else(|| "change-me-access".to_string()),
                        refresh_secret: get_env("JWT_REFRESH_SECRET")
                            .unwrap_or_else(|| "change-me-refresh".to_string()),
                        access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 900i64),
                        refresh_token_expires_in: get_env_parse(
                            "JWT_REFRESH_EXPIRES_IN",
                            604_800i64,
                        ),
                    },
                    otp: OtpConfig {
                        length: get_env_parse("OTP_LENGTH", 6usize),
                        validity_minutes: get_env_parse("OTP_VALIDITY_MINUTES", 10i64),
                        max_attempts: get_env_parse(
                            "OTP_MAX_ATTEMPTS",
                            default_otp_max_attempts(),
                        ),
                    },
                    twilio: TwilioConfig {
                        account_sid: get_env("TWILIO_ACCOUNT_SID").unwrap_or_default(),
                        auth_token: get_env("TWILIO_AUTH_TOKEN").unwrap_or_default(),
                        from_phone: get_env("TWILIO_FROM_PHONE").unwrap_or_default(),
                    },
                    admin: None,
                    cors: CorsConfig::default(),
                }
            }
            Err(e) => {
                return Err(format!("Failed to read config file {config_path}: {e}").into());
            }
        };

        // Environment variables win over file values.
        if let Some(v) = get_env("SERVER_HOST") {
            config.server.host = v;
        }
        if let Some(p) = get_env("SERVER_PORT").and_then(|v| v.parse().ok()) {
            config.server.port = p;
        }
        if let Some(v) = get_env("DATABASE_URL") {
            config.database.url = v;
        }
        if let Some(n) = get_env("DB_MAX_CONNECTIONS").and_then(|v| v.parse().ok()) {
            config.database.max_connections = n;
        }
        if let Some(v) = get_env("JWT_ACCESS_SECRET") {
            config.jwt.access_secret = v;
        }
        if let Some(v) = get_env("JWT_REFRESH_SECRET") {
            config.jwt.refresh_secret = v;
        }
        if let Some(n) = get_env("JWT_ACCESS_EXPIRES_IN").and_then(|v| v.parse().ok()) {
            config.jwt.access_token_expires_in = n;
        }
        if let Some(n) = get_env("JWT_REFRESH_EXPIRES_IN").and_then(|v| v.parse().ok()) {
            config.jwt.refresh_token_expires_in = n;
        }
        if let Some(n) = get_env("OTP_LENGTH").and_then(|v| v.parse().ok()) {
            config.otp.length = n;
        }
        if let Some(n) = get_env("OTP_VALIDITY_MINUTES").and_then(|v| v.parse().ok()) {
            config.otp.validity_minutes = n;
        }
        if let Some(n) = get_env("OTP_MAX_ATTEMPTS").and_then(|v| v.parse().ok()) {
            config.otp.max_attempts = n;
        }
        if let Some(v) = get_env("TWILIO_ACCOUNT_SID") {
            config.twilio.account_sid = v;
        }
        if let Some(v) = get_env("TWILIO_AUTH_TOKEN") {
            config.twilio.auth_token = v;
        }
        if let Some(v) = get_env("TWILIO_FROM_PHONE") {
            config.twilio.from_phone = v;
        }
        if let (Some(email), Some(password)) = (get_env("ADMIN_EMAIL"), get_env("ADMIN_PASSWORD"))
        {
            config.admin = Some(AdminBootstrapConfig {
                email,
                password,
                name: get_env("ADMIN_NAME").unwrap_or_else(default_admin_name),
            });
        }

        if let Some(v) = get_env("CORS_ALLOWED_ORIGINS") {
            config.cors.allowed_origins = v
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }

        config.otp.length = config.otp.length.clamp(4, 10);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.jwt.access_secret.is_empty() || self.jwt.refresh_secret.is_empty() {
            return Err(AppError::ConfigError("JWT secrets must not be empty".into()));
        }
        if self.jwt.access_secret == self.jwt.refresh_secret {
            return Err(AppError::ConfigError(
                "Access and refresh tokens must be signed with different secrets".into(),
            ));
        }
        if self.jwt.access_token_expires_in <= 0 || self.jwt.refresh_token_expires_in <= 0 {
            return Err(AppError::ConfigError("Token lifetimes must be positive".into()));
        }
        if self.otp.validity_minutes <= 0 {
            return Err(AppError::ConfigError("OTP validity must be positive".into()));
        }
        if self.otp.max_attempts <= 0 {
            return Err(AppError::ConfigError("OTP attempt limit must be positive".into()));
        }
        Ok(())
    }
}

fn get_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [server]
        host = "127.0.0.1"
        port = 9000

        [database]
        url = "postgres://localhost/lendhub"
        max_connections = 5

        [jwt]
        access_secret = "a"
        refresh_secret = "b"
        access_token_expires_in = 900
        refresh_token_expires_in = 604800
    "#;

    #[test]
    fn test_parse_minimal_file_uses_section_defaults() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.otp.length, 6);
        assert_eq!(config.otp.validity_minutes, 10);
        assert_eq!(config.otp.max_attempts, 5);
        assert!(config.admin.is_none());
        assert!(config.cors.allowed_origins.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_shared_secret_is_rejected() {
        let mut config: Config = toml::from_str(SAMPLE).unwrap();
        config.jwt.refresh_secret = config.jwt.access_secret.clone();
        assert!(matches!(config.validate(), Err(AppError::ConfigError(_))));
    }
}
