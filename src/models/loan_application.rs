use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

use crate::entities::{LoanStatus, LoanType, loan_application_entity as loan};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApplyLoanRequest {
    pub loan_type: LoanType,
    /// Minor currency units.
    #[schema(example = 500000)]
    pub amount_requested: i64,
    #[schema(example = 1200)]
    pub interest_rate_proposed_bps: Option<i32>,
    #[schema(example = 24)]
    pub tenure_months_requested: i32,
    pub purpose: Option<String>,
    /// Document type to storage reference, e.g. `{"pan_card": "kyc/42/pan.pdf"}`.
    pub documents: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateLoanRequest {
    pub amount_requested: Option<i64>,
    pub interest_rate_proposed_bps: Option<i32>,
    pub tenure_months_requested: Option<i32>,
    pub purpose: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttachDocumentRequest {
    #[schema(example = "bank_statement")]
    pub document_type: String,
    #[schema(example = "kyc/42/bank-statement-2026-09.pdf")]
    pub reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApproveLoanRequest {
    pub approved_amount: i64,
    pub interest_rate_bps: i32,
    pub tenure_months: i32,
    pub processing_fee: i64,
    pub admin_remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RejectLoanRequest {
    pub rejection_reason: String,
    pub admin_remarks: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct AdminRemarksRequest {
    pub admin_remarks: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoanQuery {
    pub status: Option<LoanStatus>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminLoanQuery {
    pub status: Option<LoanStatus>,
    pub loan_type: Option<LoanType>,
    pub user_id: Option<i64>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanApplicationResponse {
    pub id: i64,
    pub application_number: String,
    pub user_id: i64,
    pub membership_card_id: Option<i64>,
    pub loan_type: LoanType,
    pub amount_requested: i64,
    pub amount_approved: Option<i64>,
    pub interest_rate_proposed_bps: Option<i32>,
    pub interest_rate_final_bps: Option<i32>,
    pub tenure_months_requested: i32,
    pub tenure_months_final: Option<i32>,
    pub processing_fee: Option<i64>,
    pub purpose: Option<String>,
    pub status: LoanStatus,
    pub application_date: DateTime<Utc>,
    pub documents_submitted: BTreeMap<String, String>,
    pub admin_remarks: Option<String>,
    pub rejection_reason: Option<String>,
    pub approved_date: Option<DateTime<Utc>>,
    pub disbursed_date: Option<DateTime<Utc>>,
    pub closed_date: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<loan::Model> for LoanApplicationResponse {
    fn from(m: loan::Model) -> Self {
        let documents_submitted =
            serde_json::from_value(m.documents_submitted).unwrap_or_default();
        Self {
            id: m.id,
            application_number: m.application_number,
            user_id: m.user_id,
            membership_card_id: m.membership_card_id,
            loan_type: m.loan_type,
            amount_requested: m.amount_requested,
            amount_approved: m.amount_approved,
            interest_rate_proposed_bps: m.interest_rate_proposed_bps,
            interest_rate_final_bps: m.interest_rate_final_bps,
            tenure_months_requested: m.tenure_months_requested,
            tenure_months_final: m.tenure_months_final,
            processing_fee: m.processing_fee,
            purpose: m.purpose,
            status: m.status,
            application_date: m.application_date,
            documents_submitted,
            admin_remarks: m.admin_remarks,
            rejection_reason: m.rejection_reason,
            approved_date: m.approved_date,
            disbursed_date: m.disbursed_date,
            closed_date: m.closed_date,
            updated_at: m.updated_at,
        }
    }
}
