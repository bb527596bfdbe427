use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{SubscriptionStatus, cash_lending_subscription_entity as subscriptions};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CashLendingPlanRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub duration_months: i32,
    pub max_lending_amount: i64,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubscribeRequest {
    pub plan_id: i64,
    pub payment_reference: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionResponse {
    pub id: i64,
    pub plan_id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: SubscriptionStatus,
    pub payment_reference: Option<String>,
}

impl SubscriptionResponse {
    pub fn build(m: subscriptions::Model, now: DateTime<Utc>) -> Self {
        let status = if m.status == SubscriptionStatus::Active && m.end_date <= now {
            SubscriptionStatus::Expired
        } else {
            m.status
        };
        Self {
            id: m.id,
            plan_id: m.plan_id,
            start_date: m.start_date,
            end_date: m.end_date,
            status,
            payment_reference: m.payment_reference,
        }
    }
}
