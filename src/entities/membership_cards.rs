use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "membership_card_status"
)]
#[serde(rename_all = "snake_case")]
pub enum MembershipCardStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "expired")]
    Expired,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "membership_cards")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub card_type_id: i64,
    #[sea_orm(unique)]
    pub card_number: String,
    pub purchase_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub status: MembershipCardStatus,
    pub payment_reference: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// A card counts as active only while its stored status says so and its
    /// expiry date is still ahead of `now`.
    pub fn is_effectively_active(&self, now: DateTime<Utc>) -> bool {
        self.status == MembershipCardStatus::Active && self.expiry_date > now
    }

    pub fn effective_status(&self, now: DateTime<Utc>) -> MembershipCardStatus {
        if self.status == MembershipCardStatus::Active && self.expiry_date <= now {
            MembershipCardStatus::Expired
        } else {
            self.status
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
