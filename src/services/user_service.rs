use crate::database::DbPool;
use crate::entities::{UserStatus, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::canonical_phone;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};

#[derive(Clone)]
pub struct UserService {
    pool: DbPool,
}

impl UserService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn get_me(&self, user_id: i64) -> AppResult<UserResponse> {
        Ok(self.find(user_id).await?.into())
    }

    /// Updates name and phone. A new phone number has to be verified again.
    pub async fn update_me(
        &self,
        user_id: i64,
        request: UpdateProfileRequest,
    ) -> AppResult<UserResponse> {
        let user = self.find(user_id).await?;
        let current_phone = user.phone.clone();
        let mut am = user.into_active_model();

        if let Some(name) = request.name {
            let name = name.trim().to_string();
            if name.is_empty() || name.chars().count() > 100 {
                return Err(AppError::ValidationError(
                    "name must be 1 to 100 characters".into(),
                ));
            }
            am.name = Set(name);
        }

        if let Some(phone) = request.phone {
            let phone = canonical_phone(&phone)?;
            if current_phone.as_deref() != Some(phone.as_str()) {
                let taken = users::Entity::find()
                    .filter(users::Column::Phone.eq(phone.as_str()))
                    .filter(users::Column::Id.ne(user_id))
                    .one(self.pool.as_ref())
                    .await?
                    .is_some();
                if taken {
                    return Err(AppError::Conflict("Phone already registered".into()));
                }
                am.phone = Set(Some(phone));
                am.is_phone_verified = Set(false);
                am.phone_verified_at = Set(None);
            }
        }

        am.updated_at = Set(Some(Utc::now()));
        let user = am.update(self.pool.as_ref()).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("Phone already registered".into())
            }
            _ => AppError::DatabaseError(e),
        })?;
        Ok(user.into())
    }

    pub async fn list_users(
        &self,
        query: AdminUserQuery,
    ) -> AppResult<PaginatedResponse<UserResponse>> {
        let params = PaginationParams::new(query.page, query.page_size);
        let mut condition = Condition::all();
        if let Some(user_type) = query.user_type {
            condition = condition.add(users::Column::UserType.eq(user_type));
        }
        if let Some(status) = query.status {
            condition = condition.add(users::Column::Status.eq(status));
        }

        let total = users::Entity::find()
            .filter(condition.clone())
            .count(self.pool.as_ref())
            .await?;
        let list = users::Entity::find()
            .filter(condition)
            .order_by_desc(users::Column::CreatedAt)
            .order_by_desc(users::Column::Id)
            .offset(params.get_offset())
            .limit(params.get_page_size())
            .all(self.pool.as_ref())
            .await?;

        Ok(PaginatedResponse::new(list, &params, total).map(UserResponse::from))
    }

    pub async fn get_user(&self, user_id: i64) -> AppResult<UserResponse> {
        Ok(self.find(user_id).await?.into())
    }

    pub async fn update_status(
        &self,
        admin_id: i64,
        user_id: i64,
        status: UserStatus,
    ) -> AppResult<UserResponse> {
        if admin_id == user_id {
            return Err(AppError::Forbidden(
                "Administrators cannot change their own status".into(),
            ));
        }
        let user = self.find(user_id).await?;
        let previous = user.status;
        let mut am = user.into_active_model();
        am.status = Set(status);
        am.updated_at = Set(Some(Utc::now()));
        let user = am.update(self.pool.as_ref()).await?;

        log::info!("Admin {admin_id} changed user {user_id} status: {previous} -> {status}");
        Ok(user.into())
    }

    async fn find(&self, user_id: i64) -> AppResult<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connection::tests::{mock_pool, transaction_log};
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_admin_cannot_change_own_status() {
        let db = mock_pool(MockDatabase::new(DatabaseBackend::Postgres));
        let service = UserService::new(db.clone());

        let err = service
            .update_status(1, 1, UserStatus::Suspended)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        drop(service);
        assert!(transaction_log(db).is_empty());
    }

    #[tokio::test]
    async fn test_missing_user_is_not_found() {
        let db = mock_pool(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<users::Model>::new()]),
        );
        let service = UserService::new(db);

        assert!(matches!(
            service.get_me(404).await,
            Err(AppError::NotFound(_))
        ));
    }
}
