use crate::database::DbPool;
use crate::entities::{
    LoanStatus, MembershipCardStatus, SubscriptionStatus,
    cash_lending_subscription_entity as subscriptions, loan_application_entity as loans,
    membership_card_entity as cards, user_entity as users,
};
use crate::error::AppResult;
use crate::models::SummaryReport;
use chrono::Utc;
use sea_orm::sea_query::{Alias, Expr};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QuerySelect};
use std::collections::BTreeMap;

#[derive(Debug, sea_orm::FromQueryResult)]
struct GroupCountRow {
    key: String,
    count: i64,
}

#[derive(Debug, sea_orm::FromQueryResult)]
struct CountRow {
    count: i64,
}

#[derive(Debug, sea_orm::FromQueryResult)]
struct SumRow {
    total: Option<i64>,
}

fn tally(rows: Vec<GroupCountRow>) -> BTreeMap<String, u64> {
    rows.into_iter()
        .map(|r| (r.key, u64::try_from(r.count).unwrap_or(0)))
        .collect()
}

#[derive(Clone)]
pub struct ReportService {
    db: DbPool,
}

impl ReportService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Dashboard counters. Cards and subscriptions count as active only while
    /// their expiry is still in the future.
    pub async fn summary(&self) -> AppResult<SummaryReport> {
        let now = Utc::now();

        let users_by_type = users::Entity::find()
            .select_only()
            .column_as(Expr::col(users::Column::UserType).cast_as(Alias::new("text")), "key")
            .column_as(Expr::val(1).count(), "count")
            .group_by(users::Column::UserType)
            .into_model::<GroupCountRow>()
            .all(self.db.as_ref())
            .await?;

        let loans_by_status = loans::Entity::find()
            .select_only()
            .column_as(Expr::col(loans::Column::Status).cast_as(Alias::new("text")), "key")
            .column_as(Expr::val(1).count(), "count")
            .group_by(loans::Column::Status)
            .into_model::<GroupCountRow>()
            .all(self.db.as_ref())
            .await?;

        // SUM(bigint) is numeric in Postgres; enum keys above are cast to text.
        let approved = loans::Entity::find()
            .filter(loans::Column::Status.is_in([
                LoanStatus::Approved,
                LoanStatus::Disbursed,
                LoanStatus::Closed,
            ]))
            .select_only()
            .column_as(
                Expr::col(loans::Column::AmountApproved)
                    .sum()
                    .cast_as(Alias::new("bigint")),
                "total",
            )
            .into_model::<SumRow>()
            .one(self.db.as_ref())
            .await?
            .and_then(|r| r.total)
            .unwrap_or(0);

        let active_cards = cards::Entity::find()
            .filter(cards::Column::Status.eq(MembershipCardStatus::Active))
            .filter(cards::Column::ExpiryDate.gt(now))
            .select_only()
            .column_as(Expr::val(1).count(), "count")
            .into_model::<CountRow>()
            .one(self.db.as_ref())
            .await?
            .map(|r| r.count)
            .unwrap_or(0);

        let active_subscriptions = subscriptions::Entity::find()
            .filter(subscriptions::Column::Status.eq(SubscriptionStatus::Active))
            .filter(subscriptions::Column::EndDate.gt(now))
            .select_only()
            .column_as(Expr::val(1).count(), "count")
            .into_model::<CountRow>()
            .one(self.db.as_ref())
            .await?
            .map(|r| r.count)
            .unwrap_or(0);

        Ok(SummaryReport {
            users_by_type: tally(users_by_type),
            loans_by_status: tally(loans_by_status),
            total_approved_amount: approved,
            active_membership_cards: u64::try_from(active_cards).unwrap_or(0),
            active_cash_lending_subscriptions: u64::try_from(active_subscriptions).unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connection::tests::mock_pool;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};

    fn group(key: &str, count: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("key", Value::from(key.to_string())), ("count", Value::from(count))])
    }

    fn count(n: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("count", Value::from(n))])
    }

    #[tokio::test]
    async fn test_summary_collects_every_counter() {
        let db = mock_pool(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![group("customer", 7), group("admin", 1)]])
                .append_query_results([vec![group("submitted", 3), group("approved", 2)]])
                .append_query_results([vec![BTreeMap::from([(
                    "total",
                    Value::from(Some(12_500_000i64)),
                )])]])
                .append_query_results([vec![count(4)]])
                .append_query_results([vec![count(1)]]),
        );
        let service = ReportService::new(db);

        let report = service.summary().await.unwrap();
        assert_eq!(report.users_by_type.get("customer"), Some(&7));
        assert_eq!(report.users_by_type.get("admin"), Some(&1));
        assert_eq!(report.loans_by_status.get("approved"), Some(&2));
        assert_eq!(report.total_approved_amount, 12_500_000);
        assert_eq!(report.active_membership_cards, 4);
        assert_eq!(report.active_cash_lending_subscriptions, 1);
    }

    #[tokio::test]
    async fn test_empty_database_reports_zeroes() {
        let db = mock_pool(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<BTreeMap<&str, Value>>::new()])
                .append_query_results([Vec::<BTreeMap<&str, Value>>::new()])
                .append_query_results([vec![BTreeMap::from([("total", Value::BigInt(None))])]])
                .append_query_results([vec![count(0)]])
                .append_query_results([vec![count(0)]]),
        );
        let service = ReportService::new(db);

        let report = service.summary().await.unwrap();
        assert!(report.users_by_type.is_empty());
        assert_eq!(report.total_approved_amount, 0);
        assert_eq!(report.active_membership_cards, 0);
    }
}
