use crate::database::DbPool;
use crate::entities::{LoanStatus, loan_application_entity as loan};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::loan_lifecycle::{self, ApprovalTerms, LoanAction};
use crate::services::membership_service::MembershipService;
use crate::services::notification_service::{ApplicantNotice, ApplicantNotifier, NoticeKind};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use std::collections::BTreeMap;
use std::sync::Arc;

const MAX_DOCUMENTS: usize = 50;

fn validate_amount(amount: i64) -> AppResult<()> {
    if amount <= 0 {
        return Err(AppError::ValidationError(
            "amount_requested must be positive".into(),
        ));
    }
    Ok(())
}

fn validate_tenure(months: i32) -> AppResult<()> {
    if !(1..=360).contains(&months) {
        return Err(AppError::ValidationError(
            "tenure_months_requested must be between 1 and 360".into(),
        ));
    }
    Ok(())
}

fn validate_rate(bps: Option<i32>) -> AppResult<()> {
    if matches!(bps, Some(b) if !(0..=10_000).contains(&b)) {
        return Err(AppError::ValidationError(
            "interest_rate_proposed_bps must be between 0 and 10000".into(),
        ));
    }
    Ok(())
}

fn validate_document(document_type: &str, reference: &str) -> AppResult<()> {
    if document_type.trim().is_empty() || reference.trim().is_empty() {
        return Err(AppError::ValidationError(
            "document_type and reference are required".into(),
        ));
    }
    Ok(())
}

fn documents_of(app: &loan::Model) -> BTreeMap<String, String> {
    serde_json::from_value(app.documents_submitted.clone()).unwrap_or_default()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn application_number(now: DateTime<Utc>) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string()[..6].to_uppercase();
    format!("LA-{}-{suffix}", now.format("%Y%m%d"))
}

/// Every column a lifecycle step or an owner edit may touch, marked `Set`.
fn mutable_columns(app: &loan::Model) -> loan::ActiveModel {
    loan::ActiveModel {
        amount_requested: Set(app.amount_requested),
        interest_rate_proposed_bps: Set(app.interest_rate_proposed_bps),
        tenure_months_requested: Set(app.tenure_months_requested),
        purpose: Set(app.purpose.clone()),
        status: Set(app.status),
        documents_submitted: Set(app.documents_submitted.clone()),
        amount_approved: Set(app.amount_approved),
        interest_rate_final_bps: Set(app.interest_rate_final_bps),
        tenure_months_final: Set(app.tenure_months_final),
        processing_fee: Set(app.processing_fee),
        admin_remarks: Set(app.admin_remarks.clone()),
        rejection_reason: Set(app.rejection_reason.clone()),
        reviewed_by: Set(app.reviewed_by),
        approved_date: Set(app.approved_date),
        disbursed_date: Set(app.disbursed_date),
        closed_date: Set(app.closed_date),
        updated_at: Set(app.updated_at),
        ..Default::default()
    }
}

#[derive(Clone)]
pub struct LoanService {
    db: DbPool,
    membership: MembershipService,
    notifier: Arc<dyn ApplicantNotifier>,
}

impl LoanService {
    pub fn new(
        db: DbPool,
        membership: MembershipService,
        notifier: Arc<dyn ApplicantNotifier>,
    ) -> Self {
        Self {
            db,
            membership,
            notifier,
        }
    }

    pub async fn apply(
        &self,
        user_id: i64,
        req: ApplyLoanRequest,
    ) -> AppResult<LoanApplicationResponse> {
        validate_amount(req.amount_requested)?;
        validate_tenure(req.tenure_months_requested)?;
        validate_rate(req.interest_rate_proposed_bps)?;
        let documents = req.documents.unwrap_or_default();
        if documents.len() > MAX_DOCUMENTS {
            return Err(AppError::ValidationError("Too many documents".into()));
        }
        for (document_type, reference) in &documents {
            validate_document(document_type, reference)?;
        }

        let card_id = self
            .membership
            .require_eligible(user_id, req.loan_type, req.amount_requested)
            .await?;

        let now = Utc::now();
        let status = loan_lifecycle::transition(LoanStatus::Draft, LoanAction::Submit)?;
        let model = loan::ActiveModel {
            application_number: Set(application_number(now)),
            user_id: Set(user_id),
            membership_card_id: Set(Some(card_id)),
            loan_type: Set(req.loan_type),
            amount_requested: Set(req.amount_requested),
            interest_rate_proposed_bps: Set(req.interest_rate_proposed_bps),
            tenure_months_requested: Set(req.tenure_months_requested),
            purpose: Set(non_blank(req.purpose)),
            status: Set(status),
            application_date: Set(now),
            documents_submitted: Set(serde_json::to_value(&documents)?),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;

        log::info!(
            "Loan application {} submitted by user {user_id} ({}, {})",
            model.application_number,
            model.loan_type,
            model.amount_requested
        );
        Ok(model.into())
    }

    pub async fn list_own(
        &self,
        user_id: i64,
        query: LoanQuery,
    ) -> AppResult<PaginatedResponse<LoanApplicationResponse>> {
        let params = PaginationParams::new(query.page, query.page_size);
        let mut condition = Condition::all().add(loan::Column::UserId.eq(user_id));
        if let Some(status) = query.status {
            condition = condition.add(loan::Column::Status.eq(status));
        }
        self.page(condition, &params).await
    }

    pub async fn get_own(&self, user_id: i64, id: i64) -> AppResult<LoanApplicationResponse> {
        Ok(self.load_owned(user_id, id).await?.into())
    }

    pub async fn update_own(
        &self,
        user_id: i64,
        id: i64,
        req: UpdateLoanRequest,
    ) -> AppResult<LoanApplicationResponse> {
        let current = self.load_owned(user_id, id).await?;
        loan_lifecycle::transition(current.status, LoanAction::Edit)?;

        let mut app = current.clone();
        if let Some(amount) = req.amount_requested {
            validate_amount(amount)?;
            if amount != app.amount_requested {
                // a new amount is re-checked against the card limit
                let card_id = self
                    .membership
                    .require_eligible(user_id, app.loan_type, amount)
                    .await?;
                app.membership_card_id = Some(card_id);
            }
            app.amount_requested = amount;
        }
        if let Some(months) = req.tenure_months_requested {
            validate_tenure(months)?;
            app.tenure_months_requested = months;
        }
        if req.interest_rate_proposed_bps.is_some() {
            validate_rate(req.interest_rate_proposed_bps)?;
            app.interest_rate_proposed_bps = req.interest_rate_proposed_bps;
        }
        if req.purpose.is_some() {
            app.purpose = non_blank(req.purpose);
        }
        app.updated_at = Some(Utc::now());

        let mut update = mutable_columns(&app);
        update.membership_card_id = Set(app.membership_card_id);
        self.compare_and_swap(current.id, current.status, update).await?;
        Ok(app.into())
    }

    pub async fn attach_document(
        &self,
        user_id: i64,
        id: i64,
        req: AttachDocumentRequest,
    ) -> AppResult<LoanApplicationResponse> {
        validate_document(&req.document_type, &req.reference)?;
        let current = self.load_owned(user_id, id).await?;
        loan_lifecycle::transition(current.status, LoanAction::Edit)?;

        let mut documents = documents_of(&current);
        if documents.len() >= MAX_DOCUMENTS && !documents.contains_key(req.document_type.trim()) {
            return Err(AppError::ValidationError("Too many documents".into()));
        }
        documents.insert(
            req.document_type.trim().to_string(),
            req.reference.trim().to_string(),
        );

        let mut app = current.clone();
        app.documents_submitted = serde_json::to_value(&documents)?;
        app.updated_at = Some(Utc::now());
        self.compare_and_swap(current.id, current.status, mutable_columns(&app))
            .await?;
        log::info!(
            "Document {} attached to {}",
            req.document_type.trim(),
            app.application_number
        );
        Ok(app.into())
    }

    pub async fn cancel_own(&self, user_id: i64, id: i64) -> AppResult<LoanApplicationResponse> {
        let current = self.load_owned(user_id, id).await?;
        self.step(current, LoanAction::Cancel, None).await
    }

    pub async fn admin_list(
        &self,
        query: AdminLoanQuery,
    ) -> AppResult<PaginatedResponse<LoanApplicationResponse>> {
        let params = PaginationParams::new(query.page, query.page_size);
        let mut condition = Condition::all();
        if let Some(status) = query.status {
            condition = condition.add(loan::Column::Status.eq(status));
        }
        if let Some(loan_type) = query.loan_type {
            condition = condition.add(loan::Column::LoanType.eq(loan_type));
        }
        if let Some(user_id) = query.user_id {
            condition = condition.add(loan::Column::UserId.eq(user_id));
        }
        self.page(condition, &params).await
    }

    pub async fn admin_get(&self, id: i64) -> AppResult<LoanApplicationResponse> {
        Ok(self.load(id).await?.into())
    }

    pub async fn start_review(
        &self,
        admin_id: i64,
        id: i64,
        req: AdminRemarksRequest,
    ) -> AppResult<LoanApplicationResponse> {
        let mut current = self.load(id).await?;
        current.reviewed_by = Some(admin_id);
        self.step(current, LoanAction::StartReview, non_blank(req.admin_remarks))
            .await
    }

    pub async fn request_documents(
        &self,
        admin_id: i64,
        id: i64,
        req: AdminRemarksRequest,
    ) -> AppResult<LoanApplicationResponse> {
        let mut current = self.load(id).await?;
        current.reviewed_by = Some(admin_id);
        self.step(
            current,
            LoanAction::RequestDocuments,
            non_blank(req.admin_remarks),
        )
        .await
    }

    pub async fn approve(
        &self,
        admin_id: i64,
        id: i64,
        req: ApproveLoanRequest,
    ) -> AppResult<LoanApplicationResponse> {
        let current = self.load(id).await?;
        let terms = ApprovalTerms {
            approved_amount: req.approved_amount,
            interest_rate_bps: req.interest_rate_bps,
            tenure_months: req.tenure_months,
            processing_fee: req.processing_fee,
            admin_remarks: non_blank(req.admin_remarks),
        };

        let mut app = current.clone();
        loan_lifecycle::apply_approval(&mut app, &terms, admin_id, Utc::now())?;
        self.compare_and_swap(current.id, current.status, mutable_columns(&app))
            .await?;

        log::info!(
            "Loan application {} approved by admin {admin_id} ({} -> {})",
            app.application_number,
            current.status,
            app.status
        );
        self.notifier.notify(ApplicantNotice {
            user_id: app.user_id,
            application_number: app.application_number.clone(),
            kind: NoticeKind::Approved {
                amount: terms.approved_amount,
            },
        });
        Ok(app.into())
    }

    pub async fn reject(
        &self,
        admin_id: i64,
        id: i64,
        req: RejectLoanRequest,
    ) -> AppResult<LoanApplicationResponse> {
        let current = self.load(id).await?;

        let mut app = current.clone();
        loan_lifecycle::apply_rejection(
            &mut app,
            &req.rejection_reason,
            non_blank(req.admin_remarks),
            admin_id,
            Utc::now(),
        )?;
        self.compare_and_swap(current.id, current.status, mutable_columns(&app))
            .await?;

        log::info!(
            "Loan application {} rejected by admin {admin_id} ({} -> {})",
            app.application_number,
            current.status,
            app.status
        );
        self.notifier.notify(ApplicantNotice {
            user_id: app.user_id,
            application_number: app.application_number.clone(),
            kind: NoticeKind::Rejected {
                reason: app.rejection_reason.clone().unwrap_or_default(),
            },
        });
        Ok(app.into())
    }

    pub async fn disburse(&self, admin_id: i64, id: i64) -> AppResult<LoanApplicationResponse> {
        let current = self.load(id).await?;
        let response = self.step(current, LoanAction::Disburse, None).await?;
        log::info!(
            "Loan application {} disbursed by admin {admin_id}",
            response.application_number
        );
        self.notifier.notify(ApplicantNotice {
            user_id: response.user_id,
            application_number: response.application_number.clone(),
            kind: NoticeKind::Disbursed {
                amount: response.amount_approved.unwrap_or(response.amount_requested),
            },
        });
        Ok(response)
    }

    pub async fn close(&self, admin_id: i64, id: i64) -> AppResult<LoanApplicationResponse> {
        let current = self.load(id).await?;
        let response = self.step(current, LoanAction::Close, None).await?;
        log::info!(
            "Loan application {} closed by admin {admin_id}",
            response.application_number
        );
        Ok(response)
    }

    /// Runs a transition that carries no terms and persists it.
    async fn step(
        &self,
        current: loan::Model,
        action: LoanAction,
        admin_remarks: Option<String>,
    ) -> AppResult<LoanApplicationResponse> {
        let mut app = current.clone();
        loan_lifecycle::apply_simple(&mut app, action, Utc::now())?;
        if admin_remarks.is_some() {
            app.admin_remarks = admin_remarks;
        }
        self.compare_and_swap(current.id, current.status, mutable_columns(&app))
            .await?;
        log::info!(
            "Loan application {}: {} -> {}",
            app.application_number,
            current.status,
            app.status
        );
        Ok(app.into())
    }

    /// Writes `update` to row `id` only if it still has status `expected`.
    async fn compare_and_swap(
        &self,
        id: i64,
        expected: LoanStatus,
        update: loan::ActiveModel,
    ) -> AppResult<()> {
        let result = loan::Entity::update_many()
            .set(update)
            .filter(loan::Column::Id.eq(id))
            .filter(loan::Column::Status.eq(expected))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            log::warn!("Loan application {id} changed status concurrently (expected {expected})");
            return Err(AppError::Conflict(
                "application status changed concurrently".into(),
            ));
        }
        Ok(())
    }

    async fn load(&self, id: i64) -> AppResult<loan::Model> {
        loan::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Loan application not found".into()))
    }

    /// Another user's application is reported exactly like a missing one.
    async fn load_owned(&self, user_id: i64, id: i64) -> AppResult<loan::Model> {
        loan::Entity::find_by_id(id)
            .filter(loan::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Loan application not found".into()))
    }

    async fn page(
        &self,
        condition: Condition,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<LoanApplicationResponse>> {
        let total = loan::Entity::find()
            .filter(condition.clone())
            .count(self.db.as_ref())
            .await?;
        let list = loan::Entity::find()
            .filter(condition)
            .order_by_desc(loan::Column::ApplicationDate)
            .order_by_desc(loan::Column::Id)
            .offset(params.get_offset())
            .limit(params.get_page_size())
            .all(self.db.as_ref())
            .await?;
        Ok(PaginatedResponse::new(list, params, total).map(LoanApplicationResponse::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connection::tests::{mock_pool, transaction_log};
    use crate::entities::{
        LoanSupport, LoanType, MembershipCardStatus, membership_card_entity as cards,
    };
    use crate::services::loan_lifecycle::tests::application;
    use crate::services::membership_service::tests::{card, card_type};
    use crate::services::notification_service::tests::RecordingNotifier;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn service(db: DbPool) -> (LoanService, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let svc = LoanService::new(
            db.clone(),
            MembershipService::new(db),
            notifier.clone(),
        );
        (svc, notifier)
    }

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn apply_request(loan_type: LoanType, amount_requested: i64) -> ApplyLoanRequest {
        ApplyLoanRequest {
            loan_type,
            amount_requested,
            interest_rate_proposed_bps: Some(1200),
            tenure_months_requested: 24,
            purpose: Some("  Home renovation ".to_string()),
            documents: None,
        }
    }

    fn approve_request() -> ApproveLoanRequest {
        ApproveLoanRequest {
            approved_amount: 450_000,
            interest_rate_bps: 1100,
            tenure_months: 24,
            processing_fee: 4_500,
            admin_remarks: Some("Verified income".to_string()),
        }
    }

    #[tokio::test]
    async fn test_apply_without_membership_is_forbidden() {
        let db = mock_pool(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<cards::Model>::new()]),
        );
        let (svc, _) = service(db);

        let err = svc
            .apply(42, apply_request(LoanType::Personal, 500_000))
            .await
            .unwrap_err();
        assert!(
            matches!(err, AppError::Forbidden(ref m) if m == "Active membership card required")
        );
    }

    #[tokio::test]
    async fn test_apply_validates_before_touching_storage() {
        let db = mock_pool(MockDatabase::new(DatabaseBackend::Postgres));
        let (svc, _) = service(db.clone());

        assert!(matches!(
            svc.apply(42, apply_request(LoanType::Business, 0)).await,
            Err(AppError::ValidationError(_))
        ));
        drop(svc);
        assert!(transaction_log(db).is_empty());
    }

    #[tokio::test]
    async fn test_apply_with_eligible_card_submits_application() {
        let expiry = Utc::now() + Duration::days(90);
        let db = mock_pool(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![card(3, MembershipCardStatus::Active, expiry)]])
                .append_query_results([vec![card_type(LoanSupport::Any, Some(1_000_000))]])
                .append_query_results([vec![application(LoanStatus::Submitted)]]),
        );
        let (svc, notifier) = service(db.clone());

        let created = svc
            .apply(42, apply_request(LoanType::Personal, 500_000))
            .await
            .unwrap();
        assert_eq!(created.status, LoanStatus::Submitted);
        assert_eq!(created.membership_card_id, Some(3));
        assert_eq!(created.amount_approved, None);
        assert!(notifier.sent.lock().unwrap().is_empty());

        drop(svc);
        let log = transaction_log(db);
        assert_eq!(log.len(), 3);
        let insert = format!("{:?}", log[2]);
        assert!(insert.contains("INSERT INTO"));
        assert!(insert.contains("loan_applications"));
        assert!(insert.contains("submitted"));
        assert!(insert.contains("Home renovation"));
        assert!(insert.contains("BigInt(Some(3))"));
        // approval terms stay unset until a decision
        let columns = insert.split("RETURNING").next().unwrap();
        assert!(columns.contains("membership_card_id"));
        assert!(!columns.contains("amount_approved"));
        assert!(!columns.contains("interest_rate_final_bps"));
    }

    #[tokio::test]
    async fn test_apply_above_card_limit_is_forbidden() {
        let expiry = Utc::now() + Duration::days(90);
        let db = mock_pool(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![card(3, MembershipCardStatus::Active, expiry)]])
                .append_query_results([vec![card_type(LoanSupport::Any, Some(100_000))]]),
        );
        let (svc, _) = service(db.clone());

        let err = svc
            .apply(42, apply_request(LoanType::Business, 500_000))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        drop(svc);
        // no INSERT after the two lookups
        assert_eq!(transaction_log(db).len(), 2);
    }

    #[tokio::test]
    async fn test_update_own_is_guarded_by_current_status() {
        let db = mock_pool(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![application(LoanStatus::Submitted)]])
                .append_exec_results([exec(1)]),
        );
        let (svc, _) = service(db.clone());

        let req = UpdateLoanRequest {
            tenure_months_requested: Some(36),
            ..Default::default()
        };
        let updated = svc.update_own(42, 7, req).await.unwrap();
        assert_eq!(updated.tenure_months_requested, 36);
        assert_eq!(updated.status, LoanStatus::Submitted);

        drop(svc);
        let log = transaction_log(db);
        assert_eq!(log.len(), 2);
        let update = format!("{:?}", log[1]);
        assert!(update.contains("UPDATE"));
        assert!(update.contains("WHERE"));
        assert!(update.contains("Int(Some(36))"));
    }

    #[tokio::test]
    async fn test_attach_document_records_reference() {
        let db = mock_pool(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![application(LoanStatus::RequiresDocuments)]])
                .append_exec_results([exec(1)]),
        );
        let (svc, _) = service(db.clone());

        let req = AttachDocumentRequest {
            document_type: " bank_statement ".to_string(),
            reference: "kyc/42/bank-statement.pdf".to_string(),
        };
        let updated = svc.attach_document(42, 7, req).await.unwrap();
        assert_eq!(
            updated.documents_submitted.get("bank_statement").map(String::as_str),
            Some("kyc/42/bank-statement.pdf")
        );

        drop(svc);
        let log = transaction_log(db);
        assert!(format!("{:?}", log[1]).contains("kyc/42/bank-statement.pdf"));
    }

    #[tokio::test]
    async fn test_attach_document_after_concurrent_decision_is_a_conflict() {
        let db = mock_pool(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![application(LoanStatus::UnderReview)]])
                .append_exec_results([exec(0)]),
        );
        let (svc, _) = service(db);

        let req = AttachDocumentRequest {
            document_type: "payslip".to_string(),
            reference: "kyc/42/payslip.pdf".to_string(),
        };
        assert!(matches!(
            svc.attach_document(42, 7, req).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_approve_rejected_application_is_invalid_transition() {
        let db = mock_pool(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![application(LoanStatus::Rejected)]]),
        );
        let (svc, notifier) = service(db);

        let err = svc.approve(1, 7, approve_request()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidStateTransition { .. }));
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_approve_from_under_review() {
        let db = mock_pool(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![application(LoanStatus::UnderReview)]])
                .append_exec_results([exec(1)]),
        );
        let (svc, notifier) = service(db.clone());

        let approved = svc.approve(1, 7, approve_request()).await.unwrap();
        assert_eq!(approved.status, LoanStatus::Approved);
        assert_eq!(approved.amount_approved, Some(450_000));
        assert_eq!(approved.interest_rate_final_bps, Some(1100));
        assert!(approved.approved_date.is_some());

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].user_id, 42);
        assert_eq!(sent[0].kind, NoticeKind::Approved { amount: 450_000 });
        drop(sent);

        drop(svc);
        let log = transaction_log(db);
        assert_eq!(log.len(), 2);
        let update = format!("{:?}", log[1]);
        assert!(update.contains("UPDATE"));
        assert!(update.contains("loan_applications"));
    }

    #[tokio::test]
    async fn test_lost_race_is_a_conflict() {
        let db = mock_pool(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![application(LoanStatus::UnderReview)]])
                .append_exec_results([exec(0)]),
        );
        let (svc, notifier) = service(db);

        let req = RejectLoanRequest {
            rejection_reason: "Income too low".to_string(),
            admin_remarks: None,
        };
        let err = svc.reject(1, 7, req).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(err.public_message(), "application status changed concurrently");
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_foreign_application_is_not_found() {
        let db = mock_pool(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<loan::Model>::new()]),
        );
        let (svc, _) = service(db);

        assert!(matches!(
            svc.get_own(99, 7).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_owner_cannot_edit_after_approval() {
        let db = mock_pool(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![application(LoanStatus::Approved)]]),
        );
        let (svc, _) = service(db);

        let req = UpdateLoanRequest {
            tenure_months_requested: Some(36),
            ..Default::default()
        };
        assert!(matches!(
            svc.update_own(42, 7, req).await,
            Err(AppError::Forbidden(_))
        ));
    }
}
