//! Loan application state machine.
//!
//! Every status change goes through [`transition`], a table of
//! `(from, action) -> to`. Anything not in the table is rejected, so handlers
//! never compare status strings themselves. The `apply_*` helpers mutate an
//! in-memory record and keep the approval terms consistent with the status;
//! persisting the result (with a compare-and-swap on the previous status) is
//! the job of `LoanService`.

use crate::entities::{LoanStatus, loan_application_entity as loan};
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanAction {
    Submit,
    Edit,
    Cancel,
    StartReview,
    RequestDocuments,
    Approve,
    Reject,
    Disburse,
    Close,
}

impl LoanAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanAction::Submit => "submit",
            LoanAction::Edit => "edit",
            LoanAction::Cancel => "cancel",
            LoanAction::StartReview => "start review of",
            LoanAction::RequestDocuments => "request documents for",
            LoanAction::Approve => "approve",
            LoanAction::Reject => "reject",
            LoanAction::Disburse => "disburse",
            LoanAction::Close => "close",
        }
    }
}

/// Returns the state reached by applying `action` in state `from`.
///
/// An owner editing or cancelling outside the allowed states is a permission
/// problem and reports `Forbidden`; every other illegal pair reports
/// `InvalidStateTransition`.
pub fn transition(from: LoanStatus, action: LoanAction) -> AppResult<LoanStatus> {
    use LoanAction as A;
    use LoanStatus as S;

    let to = match (from, action) {
        (S::Draft, A::Submit) => Some(S::Submitted),
        (S::Draft | S::Submitted | S::RequiresDocuments, A::Edit) => Some(from),
        (S::Draft | S::Submitted | S::UnderReview | S::RequiresDocuments, A::Cancel) => {
            Some(S::Cancelled)
        }
        (S::Submitted, A::StartReview) => Some(S::UnderReview),
        (S::Submitted | S::UnderReview, A::RequestDocuments) => Some(S::RequiresDocuments),
        (S::UnderReview | S::RequiresDocuments, A::Approve) => Some(S::Approved),
        (S::UnderReview | S::RequiresDocuments, A::Reject) => Some(S::Rejected),
        (S::Approved, A::Disburse) => Some(S::Disbursed),
        (S::Disbursed, A::Close) => Some(S::Closed),
        _ => None,
    };

    match to {
        Some(to) => Ok(to),
        None if matches!(action, A::Edit | A::Cancel) => Err(AppError::Forbidden(format!(
            "Application can no longer be modified (status: {from})"
        ))),
        None => Err(AppError::InvalidStateTransition {
            from: from.to_string(),
            action: action.as_str().to_string(),
        }),
    }
}

pub fn is_editable(status: LoanStatus) -> bool {
    transition(status, LoanAction::Edit).is_ok()
}

/// Final terms set by an administrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalTerms {
    pub approved_amount: i64,
    pub interest_rate_bps: i32,
    pub tenure_months: i32,
    pub processing_fee: i64,
    pub admin_remarks: Option<String>,
}

impl ApprovalTerms {
    pub fn validate(&self) -> AppResult<()> {
        if self.approved_amount <= 0 {
            return Err(AppError::ValidationError(
                "approved_amount must be positive".into(),
            ));
        }
        if !(0..=10_000).contains(&self.interest_rate_bps) {
            return Err(AppError::ValidationError(
                "interest_rate_bps must be between 0 and 10000".into(),
            ));
        }
        if !(1..=360).contains(&self.tenure_months) {
            return Err(AppError::ValidationError(
                "tenure_months must be between 1 and 360".into(),
            ));
        }
        if self.processing_fee < 0 {
            return Err(AppError::ValidationError(
                "processing_fee must not be negative".into(),
            ));
        }
        Ok(())
    }
}

/// Moves `app` through a transition that carries no extra data.
pub fn apply_simple(
    app: &mut loan::Model,
    action: LoanAction,
    now: DateTime<Utc>,
) -> AppResult<LoanStatus> {
    debug_assert!(!matches!(action, LoanAction::Approve | LoanAction::Reject));
    let to = transition(app.status, action)?;
    match to {
        LoanStatus::Disbursed => app.disbursed_date = Some(now),
        LoanStatus::Closed => app.closed_date = Some(now),
        _ => {}
    }
    app.status = to;
    app.updated_at = Some(now);
    Ok(to)
}

pub fn apply_approval(
    app: &mut loan::Model,
    terms: &ApprovalTerms,
    reviewer_id: i64,
    now: DateTime<Utc>,
) -> AppResult<LoanStatus> {
    let to = transition(app.status, LoanAction::Approve)?;
    terms.validate()?;

    app.status = to;
    app.amount_approved = Some(terms.approved_amount);
    app.interest_rate_final_bps = Some(terms.interest_rate_bps);
    app.tenure_months_final = Some(terms.tenure_months);
    app.processing_fee = Some(terms.processing_fee);
    app.approved_date = Some(now);
    app.reviewed_by = Some(reviewer_id);
    if terms.admin_remarks.is_some() {
        app.admin_remarks = terms.admin_remarks.clone();
    }
    app.updated_at = Some(now);
    Ok(to)
}

pub fn apply_rejection(
    app: &mut loan::Model,
    reason: &str,
    admin_remarks: Option<String>,
    reviewer_id: i64,
    now: DateTime<Utc>,
) -> AppResult<LoanStatus> {
    let to = transition(app.status, LoanAction::Reject)?;
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(AppError::ValidationError(
            "rejection_reason is required".into(),
        ));
    }

    app.status = to;
    app.rejection_reason = Some(reason.to_string());
    if admin_remarks.is_some() {
        app.admin_remarks = admin_remarks;
    }
    app.reviewed_by = Some(reviewer_id);
    app.updated_at = Some(now);
    Ok(to)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::entities::LoanType;

    pub(crate) fn application(status: LoanStatus) -> loan::Model {
        let now = Utc::now();
        loan::Model {
            id: 7,
            application_number: "LA-TEST0001".to_string(),
            user_id: 42,
            membership_card_id: Some(3),
            loan_type: LoanType::Personal,
            amount_requested: 500_000,
            amount_approved: None,
            interest_rate_proposed_bps: Some(1200),
            interest_rate_final_bps: None,
            tenure_months_requested: 24,
            tenure_months_final: None,
            processing_fee: None,
            purpose: Some("Home renovation".to_string()),
            status,
            application_date: now,
            documents_submitted: serde_json::json!({}),
            admin_remarks: None,
            rejection_reason: None,
            reviewed_by: None,
            approved_date: None,
            disbursed_date: None,
            closed_date: None,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    pub(crate) fn terms() -> ApprovalTerms {
        ApprovalTerms {
            approved_amount: 450_000,
            interest_rate_bps: 1100,
            tenure_months: 24,
            processing_fee: 4_500,
            admin_remarks: Some("Verified income".to_string()),
        }
    }

    const DECISIONS: [LoanAction; 2] = [LoanAction::Approve, LoanAction::Reject];

    #[test]
    fn test_decisions_only_from_review_states() {
        for status in LoanStatus::ALL {
            for action in DECISIONS {
                let result = transition(status, action);
                match status {
                    LoanStatus::UnderReview | LoanStatus::RequiresDocuments => {
                        assert!(result.is_ok(), "{action:?} from {status}")
                    }
                    _ => assert!(
                        matches!(result, Err(AppError::InvalidStateTransition { .. })),
                        "{action:?} from {status} should be rejected"
                    ),
                }
            }
        }
    }

    #[test]
    fn test_happy_path() {
        let mut status = LoanStatus::Draft;
        for (action, expected) in [
            (LoanAction::Submit, LoanStatus::Submitted),
            (LoanAction::StartReview, LoanStatus::UnderReview),
            (LoanAction::RequestDocuments, LoanStatus::RequiresDocuments),
            (LoanAction::Approve, LoanStatus::Approved),
            (LoanAction::Disburse, LoanStatus::Disbursed),
            (LoanAction::Close, LoanStatus::Closed),
        ] {
            status = transition(status, action).unwrap();
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn test_cancel_only_before_a_decision() {
        for status in LoanStatus::ALL {
            let result = transition(status, LoanAction::Cancel);
            let open = matches!(
                status,
                LoanStatus::Draft
                    | LoanStatus::Submitted
                    | LoanStatus::UnderReview
                    | LoanStatus::RequiresDocuments
            );
            assert_eq!(result.is_ok(), open, "cancel from {status}");
            if !open {
                assert!(matches!(result, Err(AppError::Forbidden(_))));
            }
        }
    }

    #[test]
    fn test_edit_outside_editable_states_is_forbidden() {
        assert!(is_editable(LoanStatus::Submitted));
        assert!(is_editable(LoanStatus::RequiresDocuments));
        assert!(!is_editable(LoanStatus::UnderReview));
        assert!(matches!(
            transition(LoanStatus::Approved, LoanAction::Edit),
            Err(AppError::Forbidden(_))
        ));
        // editing never changes the state
        assert_eq!(
            transition(LoanStatus::Submitted, LoanAction::Edit).unwrap(),
            LoanStatus::Submitted
        );
    }

    #[test]
    fn test_approval_terms_present_iff_status_has_terms() {
        let now = Utc::now();
        // records can only reach approved/disbursed/closed through an approval
        for start in LoanStatus::ALL.into_iter().filter(|s| !s.has_approval_terms()) {
            let mut app = application(start);
            let _ = apply_approval(&mut app, &terms(), 1, now);
            let _ = apply_simple(&mut app, LoanAction::Disburse, now);
            let _ = apply_simple(&mut app, LoanAction::Close, now);

            let has_terms = app.amount_approved.is_some();
            assert_eq!(has_terms, app.status.has_approval_terms(), "from {start}");
            assert_eq!(app.interest_rate_final_bps.is_some(), has_terms);
            assert_eq!(app.tenure_months_final.is_some(), has_terms);
        }
    }

    #[test]
    fn test_apply_approval_sets_terms() {
        let now = Utc::now();
        let mut app = application(LoanStatus::UnderReview);
        let to = apply_approval(&mut app, &terms(), 99, now).unwrap();

        assert_eq!(to, LoanStatus::Approved);
        assert_eq!(app.amount_approved, Some(450_000));
        assert_eq!(app.interest_rate_final_bps, Some(1100));
        assert_eq!(app.tenure_months_final, Some(24));
        assert_eq!(app.processing_fee, Some(4_500));
        assert_eq!(app.approved_date, Some(now));
        assert_eq!(app.reviewed_by, Some(99));
        assert_eq!(app.admin_remarks.as_deref(), Some("Verified income"));
    }

    #[test]
    fn test_invalid_terms_leave_record_untouched() {
        let mut app = application(LoanStatus::UnderReview);
        let before = app.clone();
        let bad = ApprovalTerms {
            approved_amount: 0,
            ..terms()
        };
        assert!(matches!(
            apply_approval(&mut app, &bad, 1, Utc::now()),
            Err(AppError::ValidationError(_))
        ));
        assert_eq!(app, before);
    }

    #[test]
    fn test_rejection_requires_reason() {
        let mut app = application(LoanStatus::RequiresDocuments);
        assert!(matches!(
            apply_rejection(&mut app, "   ", None, 1, Utc::now()),
            Err(AppError::ValidationError(_))
        ));
        assert_eq!(app.status, LoanStatus::RequiresDocuments);

        let to = apply_rejection(&mut app, "Income too low", None, 1, Utc::now()).unwrap();
        assert_eq!(to, LoanStatus::Rejected);
        assert_eq!(app.rejection_reason.as_deref(), Some("Income too low"));
        assert!(app.amount_approved.is_none());
    }
}
