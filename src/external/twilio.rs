use crate::config::TwilioConfig;
use crate::error::{AppError, AppResult};
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SendSmsResponse {
    pub sid: String,
    pub status: String,
    pub error_code: Option<i64>,
    pub error_message: Option<String>,
}

#[derive(Clone)]
pub struct TwilioService {
    client: Client,
    config: TwilioConfig,
}

impl TwilioService {
    pub fn new(config: TwilioConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.config.account_sid.is_empty()
            && !self.config.auth_token.is_empty()
            && !self.config.from_phone.is_empty()
    }

    pub async fn send_sms(&self, to: &str, body: &str) -> AppResult<()> {
        if !self.is_configured() {
            log::warn!("Twilio is not configured, SMS to {} dropped", mask_phone(to));
            return Ok(());
        }

        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.config.account_sid
        );
        let params = [("To", to), ("From", self.config.from_phone.as_str()), ("Body", body)];

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await?;

        if response.status().is_success() {
            let sent: SendSmsResponse = response.json().await?;
            log::info!(
                "SMS {} queued for {} ({})",
                sent.sid,
                mask_phone(to),
                sent.status
            );
            Ok(())
        } else {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::error!(
                "SMS to {} failed with {status}: {error_text}",
                mask_phone(to)
            );
            Err(AppError::ExternalApiError(format!(
                "SMS sending failed: {status}"
            )))
        }
    }

    pub async fn send_otp(
        &self,
        phone: &str,
        code: &str,
        validity_minutes: i64,
    ) -> AppResult<()> {
        let body = format!(
            "Your verification code is {code}. It is valid for {validity_minutes} minutes."
        );
        self.send_sms(phone, &body).await
    }
}

/// Keeps the last four digits for log lines.
pub fn mask_phone(phone: &str) -> String {
    let hidden = phone.chars().count().saturating_sub(4);
    phone
        .chars()
        .enumerate()
        .map(|(i, c)| if i < hidden { '*' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_phone() {
        assert_eq!(mask_phone("+919876543210"), "*********3210");
        assert_eq!(mask_phone("12"), "12");
    }

    #[tokio::test]
    async fn test_unconfigured_client_skips_delivery() {
        let twilio = TwilioService::new(TwilioConfig::default());
        assert!(!twilio.is_configured());
        assert!(twilio.send_otp("+919876543210", "123456", 10).await.is_ok());
    }
}
