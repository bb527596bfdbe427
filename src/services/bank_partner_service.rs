use crate::database::DbPool;
use crate::entities::bank_partner_entity as partners;
use crate::error::{AppError, AppResult};
use crate::models::BankPartnerRequest;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
};

fn validate(req: &BankPartnerRequest) -> AppResult<()> {
    if req.name.trim().is_empty() {
        return Err(AppError::ValidationError("name is required".into()));
    }
    for bps in [req.min_interest_bps, req.max_interest_bps].into_iter().flatten() {
        if !(0..=10_000).contains(&bps) {
            return Err(AppError::ValidationError(
                "interest rates must be between 0 and 10000 bps".into(),
            ));
        }
    }
    if let (Some(min), Some(max)) = (req.min_interest_bps, req.max_interest_bps) {
        if min > max {
            return Err(AppError::ValidationError(
                "min_interest_bps must not exceed max_interest_bps".into(),
            ));
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct BankPartnerService {
    db: DbPool,
}

impl BankPartnerService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub async fn list_active(&self) -> AppResult<Vec<partners::Model>> {
        Ok(partners::Entity::find()
            .filter(partners::Column::IsActive.eq(true))
            .order_by_asc(partners::Column::Name)
            .all(self.db.as_ref())
            .await?)
    }

    pub async fn list_all(&self) -> AppResult<Vec<partners::Model>> {
        Ok(partners::Entity::find()
            .order_by_asc(partners::Column::Id)
            .all(self.db.as_ref())
            .await?)
    }

    pub async fn create(&self, req: BankPartnerRequest) -> AppResult<partners::Model> {
        validate(&req)?;
        let now = Utc::now();
        let partner = partners::ActiveModel {
            name: Set(req.name.trim().to_string()),
            logo_url: Set(req.logo_url),
            website: Set(req.website),
            description: Set(req.description),
            min_interest_bps: Set(req.min_interest_bps),
            max_interest_bps: Set(req.max_interest_bps),
            is_active: Set(req.is_active.unwrap_or(true)),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;
        Ok(partner)
    }

    pub async fn update(&self, id: i64, req: BankPartnerRequest) -> AppResult<partners::Model> {
        validate(&req)?;
        let mut am = self.find(id).await?.into_active_model();
        am.name = Set(req.name.trim().to_string());
        am.logo_url = Set(req.logo_url);
        am.website = Set(req.website);
        am.description = Set(req.description);
        am.min_interest_bps = Set(req.min_interest_bps);
        am.max_interest_bps = Set(req.max_interest_bps);
        if let Some(active) = req.is_active {
            am.is_active = Set(active);
        }
        am.updated_at = Set(Some(Utc::now()));
        Ok(am.update(self.db.as_ref()).await?)
    }

    pub async fn toggle(&self, id: i64) -> AppResult<partners::Model> {
        let partner = self.find(id).await?;
        let active = partner.is_active;
        let mut am = partner.into_active_model();
        am.is_active = Set(!active);
        am.updated_at = Set(Some(Utc::now()));
        Ok(am.update(self.db.as_ref()).await?)
    }

    async fn find(&self, id: i64) -> AppResult<partners::Model> {
        partners::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Bank partner not found".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_range_is_checked() {
        let mut req = BankPartnerRequest {
            name: "First Bank".to_string(),
            logo_url: None,
            website: None,
            description: None,
            min_interest_bps: Some(900),
            max_interest_bps: Some(1400),
            is_active: None,
        };
        assert!(validate(&req).is_ok());

        req.min_interest_bps = Some(1500);
        assert!(validate(&req).is_err());

        req.min_interest_bps = None;
        req.max_interest_bps = Some(20_000);
        assert!(validate(&req).is_err());
    }
}
