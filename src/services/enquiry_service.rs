use crate::database::DbPool;
use crate::entities::{EnquiryStatus, enquiry_entity as enquiries};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::{canonical_email, canonical_phone};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

const MAX_MESSAGE_CHARS: usize = 5_000;

#[derive(Clone)]
pub struct EnquiryService {
    db: DbPool,
}

impl EnquiryService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub async fn create(&self, req: CreateEnquiryRequest) -> AppResult<enquiries::Model> {
        let name = req.name.trim().to_string();
        let subject = req.subject.trim().to_string();
        let message = req.message.trim().to_string();
        if name.is_empty() || subject.is_empty() || message.is_empty() {
            return Err(AppError::ValidationError(
                "name, subject and message are required".into(),
            ));
        }
        if message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(AppError::ValidationError("message is too long".into()));
        }
        let email = canonical_email(&req.email)?;
        let phone = match req.phone.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => Some(canonical_phone(p)?),
            _ => None,
        };

        let now = Utc::now();
        let enquiry = enquiries::ActiveModel {
            name: Set(name),
            email: Set(email),
            phone: Set(phone),
            subject: Set(subject),
            message: Set(message),
            status: Set(EnquiryStatus::New),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;
        log::info!("Enquiry {} received", enquiry.id);
        Ok(enquiry)
    }

    pub async fn list(
        &self,
        query: EnquiryQuery,
    ) -> AppResult<PaginatedResponse<enquiries::Model>> {
        let params = PaginationParams::new(query.page, query.page_size);
        let mut condition = Condition::all();
        if let Some(status) = query.status {
            condition = condition.add(enquiries::Column::Status.eq(status));
        }

        let total = enquiries::Entity::find()
            .filter(condition.clone())
            .count(self.db.as_ref())
            .await?;
        let list = enquiries::Entity::find()
            .filter(condition)
            .order_by_desc(enquiries::Column::CreatedAt)
            .offset(params.get_offset())
            .limit(params.get_page_size())
            .all(self.db.as_ref())
            .await?;
        Ok(PaginatedResponse::new(list, &params, total))
    }

    pub async fn update_status(
        &self,
        id: i64,
        req: UpdateEnquiryStatusRequest,
    ) -> AppResult<enquiries::Model> {
        let enquiry = enquiries::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Enquiry not found".into()))?;
        let mut am = enquiry.into_active_model();
        am.status = Set(req.status);
        if req.admin_notes.is_some() {
            am.admin_notes = Set(req.admin_notes);
        }
        am.updated_at = Set(Some(Utc::now()));
        Ok(am.update(self.db.as_ref()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connection::tests::{mock_pool, transaction_log};
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_blank_enquiry_is_rejected_without_storage() {
        let db = mock_pool(MockDatabase::new(DatabaseBackend::Postgres));
        let service = EnquiryService::new(db.clone());

        let req = CreateEnquiryRequest {
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            phone: None,
            subject: "  ".to_string(),
            message: "Hello".to_string(),
        };
        assert!(matches!(
            service.create(req).await,
            Err(AppError::ValidationError(_))
        ));
        drop(service);
        assert!(transaction_log(db).is_empty());
    }
}
