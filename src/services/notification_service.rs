//! Applicant notifications for loan decisions.
//!
//! Delivery is fire-and-forget: a notice is handed to a background task and
//! a failure there is logged, never reported back to the request that caused it.

use crate::database::DbPool;
use crate::entities::user_entity as users;
use crate::external::{TwilioService, mask_phone};
use sea_orm::EntityTrait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeKind {
    Approved { amount: i64 },
    Rejected { reason: String },
    Disbursed { amount: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicantNotice {
    pub user_id: i64,
    pub application_number: String,
    pub kind: NoticeKind,
}

impl ApplicantNotice {
    pub fn message(&self) -> String {
        let number = &self.application_number;
        match &self.kind {
            NoticeKind::Approved { amount } => format!(
                "Your loan application {number} has been approved for {}.",
                format_minor_units(*amount)
            ),
            NoticeKind::Rejected { reason } => {
                format!("Your loan application {number} was not approved: {reason}")
            }
            NoticeKind::Disbursed { amount } => format!(
                "{} for loan application {number} has been disbursed.",
                format_minor_units(*amount)
            ),
        }
    }
}

fn format_minor_units(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

pub trait ApplicantNotifier: Send + Sync {
    /// Must return immediately.
    fn notify(&self, notice: ApplicantNotice);
}

/// Sends notices as SMS to the applicant's phone on file.
#[derive(Clone)]
pub struct SmsNotifier {
    db: DbPool,
    twilio: TwilioService,
}

impl SmsNotifier {
    pub fn new(db: DbPool, twilio: TwilioService) -> Self {
        Self { db, twilio }
    }
}

impl ApplicantNotifier for SmsNotifier {
    fn notify(&self, notice: ApplicantNotice) {
        let db = self.db.clone();
        let twilio = self.twilio.clone();
        tokio::spawn(async move {
            let phone = match users::Entity::find_by_id(notice.user_id).one(db.as_ref()).await {
                Ok(Some(user)) => user.phone,
                Ok(None) => None,
                Err(e) => {
                    log::error!("Failed to load user {} for notification: {e}", notice.user_id);
                    return;
                }
            };
            let Some(phone) = phone else {
                log::debug!(
                    "User {} has no phone on file, skipping notice for {}",
                    notice.user_id,
                    notice.application_number
                );
                return;
            };
            if let Err(e) = twilio.send_sms(&phone, &notice.message()).await {
                log::error!(
                    "Failed to notify {} about {}: {e}",
                    mask_phone(&phone),
                    notice.application_number
                );
            }
        });
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Keeps notices in memory instead of sending them.
    #[derive(Default)]
    pub(crate) struct RecordingNotifier {
        pub(crate) sent: Mutex<Vec<ApplicantNotice>>,
    }

    impl ApplicantNotifier for RecordingNotifier {
        fn notify(&self, notice: ApplicantNotice) {
            self.sent.lock().unwrap().push(notice);
        }
    }

    #[test]
    fn test_messages() {
        let notice = ApplicantNotice {
            user_id: 1,
            application_number: "LA-0001".to_string(),
            kind: NoticeKind::Approved { amount: 450_050 },
        };
        assert_eq!(
            notice.message(),
            "Your loan application LA-0001 has been approved for 4500.50."
        );

        let notice = ApplicantNotice {
            kind: NoticeKind::Rejected {
                reason: "Income too low".to_string(),
            },
            ..notice
        };
        assert!(notice.message().ends_with("not approved: Income too low"));
    }
}
