use crate::database::DbPool;
use crate::entities::{
    SubscriptionStatus, UserType, cash_lending_plan_entity as plans,
    cash_lending_subscription_entity as subscriptions, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::{DateTime, Months, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder,
    Set, SqlErr, TransactionTrait,
};

const ACTIVE_SUBSCRIPTION_EXISTS: &str = "An active cash-lending subscription already exists";

fn active_duplicate_as_conflict(e: DbErr) -> AppError {
    match e.sql_err() {
        // partial unique index on (user_id) where status = 'active'
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict(ACTIVE_SUBSCRIPTION_EXISTS.into())
        }
        _ => AppError::DatabaseError(e),
    }
}

fn validate_plan(req: &CashLendingPlanRequest) -> AppResult<()> {
    if req.name.trim().is_empty() {
        return Err(AppError::ValidationError("name is required".into()));
    }
    if req.price < 0 {
        return Err(AppError::ValidationError("price must not be negative".into()));
    }
    if !(1..=120).contains(&req.duration_months) {
        return Err(AppError::ValidationError(
            "duration_months must be between 1 and 120".into(),
        ));
    }
    if req.max_lending_amount <= 0 {
        return Err(AppError::ValidationError(
            "max_lending_amount must be positive".into(),
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct CashLendingService {
    db: DbPool,
}

impl CashLendingService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub async fn list_active_plans(&self) -> AppResult<Vec<plans::Model>> {
        Ok(plans::Entity::find()
            .filter(plans::Column::IsActive.eq(true))
            .order_by_asc(plans::Column::Price)
            .all(self.db.as_ref())
            .await?)
    }

    pub async fn list_all_plans(&self) -> AppResult<Vec<plans::Model>> {
        Ok(plans::Entity::find()
            .order_by_asc(plans::Column::Id)
            .all(self.db.as_ref())
            .await?)
    }

    pub async fn create_plan(&self, req: CashLendingPlanRequest) -> AppResult<plans::Model> {
        validate_plan(&req)?;
        let now = Utc::now();
        let plan = plans::ActiveModel {
            name: Set(req.name.trim().to_string()),
            description: Set(req.description),
            price: Set(req.price),
            duration_months: Set(req.duration_months),
            max_lending_amount: Set(req.max_lending_amount),
            is_active: Set(req.is_active.unwrap_or(true)),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;
        log::info!("Cash-lending plan {} created", plan.id);
        Ok(plan)
    }

    pub async fn update_plan(
        &self,
        id: i64,
        req: CashLendingPlanRequest,
    ) -> AppResult<plans::Model> {
        validate_plan(&req)?;
        let mut am = self.find_plan(id).await?.into_active_model();
        am.name = Set(req.name.trim().to_string());
        am.description = Set(req.description);
        am.price = Set(req.price);
        am.duration_months = Set(req.duration_months);
        am.max_lending_amount = Set(req.max_lending_amount);
        if let Some(active) = req.is_active {
            am.is_active = Set(active);
        }
        am.updated_at = Set(Some(Utc::now()));
        Ok(am.update(self.db.as_ref()).await?)
    }

    pub async fn toggle_plan(&self, id: i64) -> AppResult<plans::Model> {
        let plan = self.find_plan(id).await?;
        let active = plan.is_active;
        let mut am = plan.into_active_model();
        am.is_active = Set(!active);
        am.updated_at = Set(Some(Utc::now()));
        Ok(am.update(self.db.as_ref()).await?)
    }

    async fn find_plan(&self, id: i64) -> AppResult<plans::Model> {
        plans::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Cash-lending plan not found".into()))
    }

    /// Subscribes the user and upgrades a plain customer account to a
    /// cash-lending customer in the same transaction.
    pub async fn subscribe(
        &self,
        user_id: i64,
        req: SubscribeRequest,
    ) -> AppResult<SubscriptionResponse> {
        let plan = self.find_plan(req.plan_id).await?;
        if !plan.is_active {
            return Err(AppError::ValidationError(
                "Cash-lending plan is not available".into(),
            ));
        }

        let now = Utc::now();
        // Subscriptions past their end date stop blocking a new one.
        self.expire_stale_subscriptions_for(Some(user_id), now).await?;

        let has_active = subscriptions::Entity::find()
            .filter(subscriptions::Column::UserId.eq(user_id))
            .filter(subscriptions::Column::Status.eq(SubscriptionStatus::Active))
            .filter(subscriptions::Column::EndDate.gt(now))
            .one(self.db.as_ref())
            .await?
            .is_some();
        if has_active {
            return Err(AppError::Conflict(ACTIVE_SUBSCRIPTION_EXISTS.into()));
        }

        let end_date = u32::try_from(plan.duration_months)
            .ok()
            .and_then(|m| now.checked_add_months(Months::new(m)))
            .ok_or_else(|| AppError::InternalError("Invalid plan duration".into()))?;

        let txn = self.db.begin().await?;
        let subscription = subscriptions::ActiveModel {
            user_id: Set(user_id),
            plan_id: Set(plan.id),
            start_date: Set(now),
            end_date: Set(end_date),
            status: Set(SubscriptionStatus::Active),
            payment_reference: Set(req.payment_reference),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(active_duplicate_as_conflict)?;

        users::Entity::update_many()
            .set(users::ActiveModel {
                user_type: Set(UserType::CashLendingCustomer),
                updated_at: Set(Some(now)),
                ..Default::default()
            })
            .filter(users::Column::Id.eq(user_id))
            .filter(users::Column::UserType.eq(UserType::Customer))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        log::info!(
            "User {user_id} subscribed to cash-lending plan {} until {end_date}",
            plan.id
        );
        Ok(SubscriptionResponse::build(subscription, now))
    }

    pub async fn list_user_subscriptions(
        &self,
        user_id: i64,
    ) -> AppResult<Vec<SubscriptionResponse>> {
        let now = Utc::now();
        let list = subscriptions::Entity::find()
            .filter(subscriptions::Column::UserId.eq(user_id))
            .order_by_desc(subscriptions::Column::StartDate)
            .all(self.db.as_ref())
            .await?;
        Ok(list
            .into_iter()
            .map(|s| SubscriptionResponse::build(s, now))
            .collect())
    }

    pub async fn expire_stale_subscriptions(&self) -> AppResult<u64> {
        self.expire_stale_subscriptions_for(None, Utc::now()).await
    }

    async fn expire_stale_subscriptions_for(
        &self,
        user_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let mut query = subscriptions::Entity::update_many()
            .set(subscriptions::ActiveModel {
                status: Set(SubscriptionStatus::Expired),
                updated_at: Set(Some(now)),
                ..Default::default()
            })
            .filter(subscriptions::Column::Status.eq(SubscriptionStatus::Active))
            .filter(subscriptions::Column::EndDate.lte(now));
        if let Some(user_id) = user_id {
            query = query.filter(subscriptions::Column::UserId.eq(user_id));
        }
        let result = query.exec(self.db.as_ref()).await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connection::tests::{mock_pool, transaction_log};
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn plan(is_active: bool) -> plans::Model {
        plans::Model {
            id: 2,
            name: "Lender Pro".to_string(),
            description: None,
            price: 250_000,
            duration_months: 6,
            max_lending_amount: 10_000_000,
            is_active,
            created_at: None,
            updated_at: None,
        }
    }

    fn subscription(id: i64, end_date: DateTime<Utc>) -> subscriptions::Model {
        subscriptions::Model {
            id,
            user_id: 42,
            plan_id: 2,
            start_date: end_date - Duration::days(180),
            end_date,
            status: SubscriptionStatus::Active,
            payment_reference: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    #[tokio::test]
    async fn test_inactive_plan_cannot_be_subscribed() {
        let db = mock_pool(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![plan(false)]]),
        );
        let service = CashLendingService::new(db);

        let req = SubscribeRequest {
            plan_id: 2,
            payment_reference: None,
        };
        assert!(matches!(
            service.subscribe(42, req).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_second_active_subscription_is_a_conflict() {
        let now = Utc::now();
        let db = mock_pool(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![plan(true)]])
                .append_exec_results([exec(0)])
                .append_query_results([vec![subscription(9, now + Duration::days(170))]]),
        );
        let service = CashLendingService::new(db.clone());

        let req = SubscribeRequest {
            plan_id: 2,
            payment_reference: Some("pay_123".to_string()),
        };
        assert!(matches!(
            service.subscribe(42, req).await,
            Err(AppError::Conflict(ref m)) if m == ACTIVE_SUBSCRIPTION_EXISTS
        ));

        drop(service);
        // plan lookup, stale sweep, active lookup and no insert
        assert_eq!(transaction_log(db).len(), 3);
    }

    #[tokio::test]
    async fn test_subscribe_sweeps_stale_rows_and_upgrades_customer() {
        let now = Utc::now();
        let db = mock_pool(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![plan(true)]])
                .append_exec_results([exec(1)])
                .append_query_results([Vec::<subscriptions::Model>::new()])
                .append_query_results([vec![subscription(10, now + Duration::days(180))]])
                .append_exec_results([exec(1)]),
        );
        let service = CashLendingService::new(db.clone());

        let req = SubscribeRequest {
            plan_id: 2,
            payment_reference: Some("pay_456".to_string()),
        };
        let created = service.subscribe(42, req).await.unwrap();
        assert_eq!(created.id, 10);

        drop(service);
        let log = transaction_log(db);
        let sweep = format!("{:?}", log[1]);
        assert!(sweep.contains("UPDATE"));
        assert!(sweep.contains("cash_lending_subscriptions"));
        assert!(sweep.contains("expired"));
        let txn = format!("{:?}", log[3]);
        assert!(txn.contains("INSERT INTO"));
        assert!(txn.contains("pay_456"));
        assert!(txn.contains("cash_lending_customer"));
    }

    #[test]
    fn test_plan_validation() {
        let req = CashLendingPlanRequest {
            name: "Lender".to_string(),
            description: None,
            price: 100,
            duration_months: 0,
            max_lending_amount: 1,
            is_active: None,
        };
        assert!(validate_plan(&req).is_err());
        assert!(
            validate_plan(&CashLendingPlanRequest {
                duration_months: 12,
                ..req
            })
            .is_ok()
        );
    }
}
