use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entities::{
    LoanSupport, LoanType, MembershipCardStatus, membership_card_entity as cards,
    membership_card_type_entity as card_types,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CardTypeRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub validity_months: i32,
    pub loan_support: LoanSupport,
    pub max_loan_amount: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurchaseCardRequest {
    pub card_type_id: i64,
    /// Reference issued by the payment gateway for this purchase.
    pub payment_reference: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EligibilityQuery {
    pub loan_type: LoanType,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EligibilityResponse {
    pub loan_type: LoanType,
    pub eligible: bool,
    pub membership_card_id: Option<i64>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MembershipCardResponse {
    pub id: i64,
    pub card_number: String,
    pub card_type_id: i64,
    pub card_type_name: Option<String>,
    pub loan_support: Option<LoanSupport>,
    pub purchase_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    /// Stored status with expiry applied.
    pub status: MembershipCardStatus,
    pub payment_reference: Option<String>,
}

impl MembershipCardResponse {
    pub fn build(
        card: cards::Model,
        card_type: Option<&card_types::Model>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: card.id,
            status: card.effective_status(now),
            card_number: card.card_number,
            card_type_id: card.card_type_id,
            card_type_name: card_type.map(|t| t.name.clone()),
            loan_support: card_type.map(|t| t.loan_support),
            purchase_date: card.purchase_date,
            expiry_date: card.expiry_date,
            payment_reference: card.payment_reference,
        }
    }
}
