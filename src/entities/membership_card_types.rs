use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::LoanType;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "loan_support")]
#[serde(rename_all = "snake_case")]
pub enum LoanSupport {
    #[sea_orm(string_value = "personal")]
    Personal,
    #[sea_orm(string_value = "business")]
    Business,
    #[sea_orm(string_value = "any")]
    Any,
}

impl LoanSupport {
    pub fn supports(&self, loan_type: LoanType) -> bool {
        matches!(
            (self, loan_type),
            (LoanSupport::Any, _)
                | (LoanSupport::Personal, LoanType::Personal)
                | (LoanSupport::Business, LoanType::Business)
        )
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "membership_card_types")]
#[schema(as = MembershipCardType)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub price: i64,
    pub validity_months: i32,
    pub loan_support: LoanSupport,
    /// Upper bound on `amount_requested` for applications backed by this card.
    pub max_loan_amount: Option<i64>,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loan_support_matrix() {
        assert!(LoanSupport::Any.supports(LoanType::Personal));
        assert!(LoanSupport::Any.supports(LoanType::Business));
        assert!(LoanSupport::Personal.supports(LoanType::Personal));
        assert!(!LoanSupport::Personal.supports(LoanType::Business));
        assert!(!LoanSupport::Business.supports(LoanType::Personal));
    }
}
