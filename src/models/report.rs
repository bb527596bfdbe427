use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SummaryReport {
    /// Keyed by user type.
    pub users_by_type: BTreeMap<String, u64>,
    /// Keyed by loan status.
    pub loans_by_status: BTreeMap<String, u64>,
    /// Sum of `amount_approved` over approved, disbursed and closed applications.
    pub total_approved_amount: i64,
    pub active_membership_cards: u64,
    pub active_cash_lending_subscriptions: u64,
}
