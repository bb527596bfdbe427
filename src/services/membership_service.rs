use crate::database::DbPool;
use crate::entities::{
    LoanType, MembershipCardStatus, membership_card_entity as cards,
    membership_card_type_entity as card_types,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::{DateTime, Months, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
    SqlErr,
};
use std::collections::HashMap;

/// Outcome of checking a user's cards against a loan type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Eligible {
        card_id: i64,
        max_loan_amount: Option<i64>,
    },
    NoActiveCard,
    UnsupportedLoanType,
    MultipleActiveCards,
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible { .. })
    }

    pub fn reason(&self) -> Option<&'static str> {
        match self {
            Eligibility::Eligible { .. } => None,
            Eligibility::NoActiveCard => Some("Active membership card required"),
            Eligibility::UnsupportedLoanType => {
                Some("Membership card does not support this loan type")
            }
            Eligibility::MultipleActiveCards => {
                Some("More than one active membership card found, please contact support")
            }
        }
    }
}

/// Eligible iff exactly one card is active by status *and* unexpired, and its
/// type supports `loan_type`. The stored status alone is never trusted.
pub fn evaluate_eligibility(
    cards: &[(cards::Model, Option<card_types::Model>)],
    loan_type: LoanType,
    now: DateTime<Utc>,
) -> Eligibility {
    let active: Vec<_> = cards
        .iter()
        .filter(|(card, _)| card.is_effectively_active(now))
        .collect();

    match active.as_slice() {
        [] => Eligibility::NoActiveCard,
        [(card, Some(card_type))] if card_type.loan_support.supports(loan_type) => {
            Eligibility::Eligible {
                card_id: card.id,
                max_loan_amount: card_type.max_loan_amount,
            }
        }
        [_] => Eligibility::UnsupportedLoanType,
        _ => Eligibility::MultipleActiveCards,
    }
}

pub fn is_eligible(
    cards: &[(cards::Model, Option<card_types::Model>)],
    loan_type: LoanType,
    now: DateTime<Utc>,
) -> bool {
    evaluate_eligibility(cards, loan_type, now).is_eligible()
}

pub fn card_expiry(purchase_date: DateTime<Utc>, validity_months: i32) -> AppResult<DateTime<Utc>> {
    u32::try_from(validity_months)
        .ok()
        .and_then(|m| purchase_date.checked_add_months(Months::new(m)))
        .ok_or_else(|| AppError::ValidationError("Invalid card validity".into()))
}

fn validate_card_type(req: &CardTypeRequest) -> AppResult<()> {
    if req.name.trim().is_empty() {
        return Err(AppError::ValidationError("name is required".into()));
    }
    if req.price < 0 {
        return Err(AppError::ValidationError("price must not be negative".into()));
    }
    if !(1..=120).contains(&req.validity_months) {
        return Err(AppError::ValidationError(
            "validity_months must be between 1 and 120".into(),
        ));
    }
    if matches!(req.max_loan_amount, Some(max) if max <= 0) {
        return Err(AppError::ValidationError(
            "max_loan_amount must be positive".into(),
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct MembershipService {
    db: DbPool,
}

impl MembershipService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub async fn list_active_card_types(&self) -> AppResult<Vec<card_types::Model>> {
        let list = card_types::Entity::find()
            .filter(card_types::Column::IsActive.eq(true))
            .order_by_asc(card_types::Column::Price)
            .all(self.db.as_ref())
            .await?;
        Ok(list)
    }

    pub async fn list_all_card_types(&self) -> AppResult<Vec<card_types::Model>> {
        let list = card_types::Entity::find()
            .order_by_asc(card_types::Column::Id)
            .all(self.db.as_ref())
            .await?;
        Ok(list)
    }

    pub async fn create_card_type(&self, req: CardTypeRequest) -> AppResult<card_types::Model> {
        validate_card_type(&req)?;
        let now = Utc::now();
        let model = card_types::ActiveModel {
            name: Set(req.name.trim().to_string()),
            description: Set(req.description),
            price: Set(req.price),
            validity_months: Set(req.validity_months),
            loan_support: Set(req.loan_support),
            max_loan_amount: Set(req.max_loan_amount),
            is_active: Set(req.is_active.unwrap_or(true)),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;
        log::info!("Membership card type {} created", model.id);
        Ok(model)
    }

    pub async fn update_card_type(
        &self,
        id: i64,
        req: CardTypeRequest,
    ) -> AppResult<card_types::Model> {
        validate_card_type(&req)?;
        let mut am = self.find_card_type(id).await?.into_active_model();
        am.name = Set(req.name.trim().to_string());
        am.description = Set(req.description);
        am.price = Set(req.price);
        am.validity_months = Set(req.validity_months);
        am.loan_support = Set(req.loan_support);
        am.max_loan_amount = Set(req.max_loan_amount);
        if let Some(active) = req.is_active {
            am.is_active = Set(active);
        }
        am.updated_at = Set(Some(Utc::now()));
        Ok(am.update(self.db.as_ref()).await?)
    }

    pub async fn toggle_card_type(&self, id: i64) -> AppResult<card_types::Model> {
        let current = self.find_card_type(id).await?;
        let active = current.is_active;
        let mut am = current.into_active_model();
        am.is_active = Set(!active);
        am.updated_at = Set(Some(Utc::now()));
        Ok(am.update(self.db.as_ref()).await?)
    }

    async fn find_card_type(&self, id: i64) -> AppResult<card_types::Model> {
        card_types::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Membership card type not found".into()))
    }

    /// Records a purchased card. Payment happens upstream; the gateway's
    /// reference is stored as given.
    pub async fn purchase(
        &self,
        user_id: i64,
        req: PurchaseCardRequest,
    ) -> AppResult<MembershipCardResponse> {
        let card_type = self.find_card_type(req.card_type_id).await?;
        if !card_type.is_active {
            return Err(AppError::ValidationError(
                "Membership card type is not available".into(),
            ));
        }

        let now = Utc::now();
        // Cards whose date has passed stop blocking a new purchase.
        self.expire_stale_cards_for(Some(user_id), now).await?;

        let has_active = cards::Entity::find()
            .filter(cards::Column::UserId.eq(user_id))
            .filter(cards::Column::Status.eq(MembershipCardStatus::Active))
            .filter(cards::Column::ExpiryDate.gt(now))
            .one(self.db.as_ref())
            .await?
            .is_some();
        if has_active {
            return Err(AppError::Conflict(
                "An active membership card already exists".into(),
            ));
        }

        let expiry_date = card_expiry(now, card_type.validity_months)?;
        let card_number = format!(
            "MC-{}",
            uuid::Uuid::new_v4().simple().to_string()[..12].to_uppercase()
        );
        let card = cards::ActiveModel {
            user_id: Set(user_id),
            card_type_id: Set(card_type.id),
            card_number: Set(card_number),
            purchase_date: Set(now),
            expiry_date: Set(expiry_date),
            status: Set(MembershipCardStatus::Active),
            payment_reference: Set(req.payment_reference),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(|e| match e.sql_err() {
            // partial unique index on (user_id) where status = 'active'
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("An active membership card already exists".into())
            }
            _ => AppError::DatabaseError(e),
        })?;

        log::info!(
            "User {user_id} purchased membership card {} (type {})",
            card.id,
            card_type.id
        );
        Ok(MembershipCardResponse::build(card, Some(&card_type), now))
    }

    pub async fn list_user_cards(&self, user_id: i64) -> AppResult<Vec<MembershipCardResponse>> {
        let list = cards::Entity::find()
            .filter(cards::Column::UserId.eq(user_id))
            .order_by_desc(cards::Column::PurchaseDate)
            .all(self.db.as_ref())
            .await?;
        let types = self.card_types_for(&list).await?;
        let now = Utc::now();
        Ok(list
            .into_iter()
            .map(|card| {
                let card_type = types.get(&card.card_type_id);
                MembershipCardResponse::build(card, card_type, now)
            })
            .collect())
    }

    pub async fn check_eligibility(
        &self,
        user_id: i64,
        loan_type: LoanType,
    ) -> AppResult<Eligibility> {
        // Expiry is re-checked in memory, so a stale `active` row is harmless here.
        let list = cards::Entity::find()
            .filter(cards::Column::UserId.eq(user_id))
            .filter(cards::Column::Status.eq(MembershipCardStatus::Active))
            .all(self.db.as_ref())
            .await?;
        if list.is_empty() {
            return Ok(Eligibility::NoActiveCard);
        }
        let mut types = self.card_types_for(&list).await?;
        let pairs: Vec<_> = list
            .into_iter()
            .map(|card| {
                let card_type = types.remove(&card.card_type_id);
                (card, card_type)
            })
            .collect();
        Ok(evaluate_eligibility(&pairs, loan_type, Utc::now()))
    }

    pub async fn eligibility(
        &self,
        user_id: i64,
        loan_type: LoanType,
    ) -> AppResult<EligibilityResponse> {
        let verdict = self.check_eligibility(user_id, loan_type).await?;
        Ok(EligibilityResponse {
            loan_type,
            eligible: verdict.is_eligible(),
            membership_card_id: match verdict {
                Eligibility::Eligible { card_id, .. } => Some(card_id),
                _ => None,
            },
            reason: verdict.reason().map(str::to_string),
        })
    }

    /// Precondition for creating or resizing a loan application. Returns the
    /// card backing it.
    pub async fn require_eligible(
        &self,
        user_id: i64,
        loan_type: LoanType,
        amount: i64,
    ) -> AppResult<i64> {
        match self.check_eligibility(user_id, loan_type).await? {
            Eligibility::Eligible {
                card_id,
                max_loan_amount,
            } => {
                if matches!(max_loan_amount, Some(max) if amount > max) {
                    return Err(AppError::Forbidden(
                        "Requested amount exceeds membership card limit".into(),
                    ));
                }
                Ok(card_id)
            }
            other => Err(AppError::Forbidden(
                other.reason().unwrap_or("Not eligible").to_string(),
            )),
        }
    }

    pub async fn cancel_card(&self, card_id: i64) -> AppResult<MembershipCardResponse> {
        let card = cards::Entity::find_by_id(card_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Membership card not found".into()))?;
        if card.status == MembershipCardStatus::Cancelled {
            return Err(AppError::Conflict("Membership card already cancelled".into()));
        }
        let mut am = card.into_active_model();
        am.status = Set(MembershipCardStatus::Cancelled);
        am.updated_at = Set(Some(Utc::now()));
        let card = am.update(self.db.as_ref()).await?;
        log::info!("Membership card {card_id} cancelled");

        let card_type = card_types::Entity::find_by_id(card.card_type_id)
            .one(self.db.as_ref())
            .await?;
        Ok(MembershipCardResponse::build(card, card_type.as_ref(), Utc::now()))
    }

    /// Marks every card past its expiry date but still stored as `active`.
    pub async fn expire_stale_cards(&self) -> AppResult<u64> {
        self.expire_stale_cards_for(None, Utc::now()).await
    }

    async fn expire_stale_cards_for(
        &self,
        user_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let mut query = cards::Entity::update_many()
            .set(cards::ActiveModel {
                status: Set(MembershipCardStatus::Expired),
                updated_at: Set(Some(now)),
                ..Default::default()
            })
            .filter(cards::Column::Status.eq(MembershipCardStatus::Active))
            .filter(cards::Column::ExpiryDate.lte(now));
        if let Some(user_id) = user_id {
            query = query.filter(cards::Column::UserId.eq(user_id));
        }
        let result = query.exec(self.db.as_ref()).await?;
        Ok(result.rows_affected)
    }

    async fn card_types_for(
        &self,
        list: &[cards::Model],
    ) -> AppResult<HashMap<i64, card_types::Model>> {
        let mut ids: Vec<i64> = list.iter().map(|c| c.card_type_id).collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let types = card_types::Entity::find()
            .filter(card_types::Column::Id.is_in(ids))
            .all(self.db.as_ref())
            .await?;
        Ok(types.into_iter().map(|t| (t.id, t)).collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::entities::LoanSupport;
    use crate::database::connection::tests::{mock_pool, transaction_log};
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    pub(crate) fn card(
        id: i64,
        status: MembershipCardStatus,
        expiry: DateTime<Utc>,
    ) -> cards::Model {
        cards::Model {
            id,
            user_id: 42,
            card_type_id: 1,
            card_number: format!("MC-{id:012}"),
            purchase_date: expiry - Duration::days(365),
            expiry_date: expiry,
            status,
            payment_reference: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub(crate) fn card_type(
        loan_support: LoanSupport,
        max_loan_amount: Option<i64>,
    ) -> card_types::Model {
        card_types::Model {
            id: 1,
            name: "Gold".to_string(),
            description: None,
            price: 99_900,
            validity_months: 12,
            loan_support,
            max_loan_amount,
            is_active: true,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_active_supported_card_is_eligible() {
        let now = Utc::now();
        let cards = vec![(
            card(3, MembershipCardStatus::Active, now + Duration::days(30)),
            Some(card_type(LoanSupport::Personal, None)),
        )];
        assert_eq!(
            evaluate_eligibility(&cards, LoanType::Personal, now),
            Eligibility::Eligible {
                card_id: 3,
                max_loan_amount: None
            }
        );
        assert_eq!(
            evaluate_eligibility(&cards, LoanType::Business, now),
            Eligibility::UnsupportedLoanType
        );
    }

    #[test]
    fn test_stale_active_status_is_not_eligible() {
        let now = Utc::now();
        let cards = vec![(
            card(3, MembershipCardStatus::Active, now - Duration::days(1)),
            Some(card_type(LoanSupport::Any, None)),
        )];
        assert!(!is_eligible(&cards, LoanType::Personal, now));
        assert_eq!(
            evaluate_eligibility(&cards, LoanType::Personal, now),
            Eligibility::NoActiveCard
        );
    }

    #[test]
    fn test_cancelled_and_expired_cards_are_ignored() {
        let now = Utc::now();
        let cards = vec![
            (
                card(1, MembershipCardStatus::Cancelled, now + Duration::days(30)),
                Some(card_type(LoanSupport::Any, None)),
            ),
            (
                card(2, MembershipCardStatus::Expired, now + Duration::days(30)),
                Some(card_type(LoanSupport::Any, None)),
            ),
        ];
        assert!(!is_eligible(&cards, LoanType::Business, now));
    }

    #[test]
    fn test_more_than_one_active_card_is_not_eligible() {
        let now = Utc::now();
        let cards = vec![
            (
                card(1, MembershipCardStatus::Active, now + Duration::days(30)),
                Some(card_type(LoanSupport::Any, None)),
            ),
            (
                card(2, MembershipCardStatus::Active, now + Duration::days(60)),
                Some(card_type(LoanSupport::Any, None)),
            ),
        ];
        assert_eq!(
            evaluate_eligibility(&cards, LoanType::Personal, now),
            Eligibility::MultipleActiveCards
        );
    }

    #[test]
    fn test_card_expiry_adds_calendar_months() {
        let purchase = DateTime::parse_from_rfc3339("2026-01-31T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let expiry = card_expiry(purchase, 1).unwrap();
        assert_eq!(expiry.to_rfc3339(), "2026-02-28T10:00:00+00:00");
        assert!(card_expiry(purchase, -1).is_err());
    }

    #[tokio::test]
    async fn test_require_eligible_without_cards_is_forbidden() {
        let db = mock_pool(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<cards::Model>::new()]),
        );
        let service = MembershipService::new(db);

        let err = service
            .require_eligible(42, LoanType::Personal, 10_000)
            .await
            .unwrap_err();
        assert!(
            matches!(err, AppError::Forbidden(ref m) if m == "Active membership card required")
        );
    }

    #[tokio::test]
    async fn test_require_eligible_enforces_card_limit() {
        let expiry = Utc::now() + Duration::days(30);
        let db = mock_pool(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![card(3, MembershipCardStatus::Active, expiry)]])
                .append_query_results([vec![card_type(LoanSupport::Any, Some(100_000))]])
                .append_query_results([vec![card(3, MembershipCardStatus::Active, expiry)]])
                .append_query_results([vec![card_type(LoanSupport::Any, Some(100_000))]]),
        );
        let service = MembershipService::new(db);

        let err = service
            .require_eligible(42, LoanType::Business, 150_000)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let card_id = service
            .require_eligible(42, LoanType::Business, 100_000)
            .await
            .unwrap();
        assert_eq!(card_id, 3);
    }

    #[tokio::test]
    async fn test_purchase_expires_stale_cards_then_inserts_active_card() {
        let now = Utc::now();
        let db = mock_pool(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![card_type(LoanSupport::Personal, None)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([Vec::<cards::Model>::new()])
                .append_query_results([vec![card(
                    9,
                    MembershipCardStatus::Active,
                    now + Duration::days(365),
                )]]),
        );
        let service = MembershipService::new(db.clone());

        let purchased = service
            .purchase(
                42,
                PurchaseCardRequest {
                    card_type_id: 1,
                    payment_reference: Some("pay_123".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(purchased.id, 9);
        assert_eq!(purchased.status, MembershipCardStatus::Active);
        assert_eq!(purchased.card_type_name.as_deref(), Some("Gold"));

        drop(service);
        let log = transaction_log(db);
        assert_eq!(log.len(), 4);
        let sweep = format!("{:?}", log[1]);
        assert!(sweep.contains("UPDATE"));
        assert!(sweep.contains("expired"));
        let insert = format!("{:?}", log[3]);
        assert!(insert.contains("INSERT INTO"));
        assert!(insert.contains("membership_cards"));
        assert!(insert.contains("pay_123"));
    }

    #[tokio::test]
    async fn test_second_active_card_is_a_conflict() {
        let now = Utc::now();
        let db = mock_pool(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![card_type(LoanSupport::Any, None)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .append_query_results([vec![card(
                    3,
                    MembershipCardStatus::Active,
                    now + Duration::days(30),
                )]]),
        );
        let service = MembershipService::new(db.clone());

        let err = service
            .purchase(
                42,
                PurchaseCardRequest {
                    card_type_id: 1,
                    payment_reference: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        drop(service);
        assert_eq!(transaction_log(db).len(), 3);
    }
}
