use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "loan_type")]
#[serde(rename_all = "snake_case")]
pub enum LoanType {
    #[sea_orm(string_value = "personal")]
    Personal,
    #[sea_orm(string_value = "business")]
    Business,
}

impl std::fmt::Display for LoanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoanType::Personal => write!(f, "personal"),
            LoanType::Business => write!(f, "business"),
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    ToSchema,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "loan_status")]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "submitted")]
    Submitted,
    #[sea_orm(string_value = "under_review")]
    UnderReview,
    #[sea_orm(string_value = "requires_documents")]
    RequiresDocuments,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "disbursed")]
    Disbursed,
    #[sea_orm(string_value = "closed")]
    Closed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl LoanStatus {
    pub const ALL: [LoanStatus; 9] = [
        LoanStatus::Draft,
        LoanStatus::Submitted,
        LoanStatus::UnderReview,
        LoanStatus::RequiresDocuments,
        LoanStatus::Approved,
        LoanStatus::Rejected,
        LoanStatus::Disbursed,
        LoanStatus::Closed,
        LoanStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Draft => "draft",
            LoanStatus::Submitted => "submitted",
            LoanStatus::UnderReview => "under_review",
            LoanStatus::RequiresDocuments => "requires_documents",
            LoanStatus::Approved => "approved",
            LoanStatus::Rejected => "rejected",
            LoanStatus::Disbursed => "disbursed",
            LoanStatus::Closed => "closed",
            LoanStatus::Cancelled => "cancelled",
        }
    }

    /// States that carry final approval terms.
    pub fn has_approval_terms(&self) -> bool {
        matches!(
            self,
            LoanStatus::Approved | LoanStatus::Disbursed | LoanStatus::Closed
        )
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Amounts are minor currency units, rates are basis points.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "loan_applications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
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
    #[sea_orm(column_type = "JsonBinary")]
    pub documents_submitted: Json,
    #[sea_orm(column_type = "Text", nullable)]
    pub admin_remarks: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub rejection_reason: Option<String>,
    pub reviewed_by: Option<i64>,
    pub approved_date: Option<DateTime<Utc>>,
    pub disbursed_date: Option<DateTime<Utc>>,
    pub closed_date: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
