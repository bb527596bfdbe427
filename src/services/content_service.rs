use crate::database::DbPool;
use crate::entities::static_content_entity as contents;
use crate::error::{AppError, AppResult};
use crate::models::UpsertContentRequest;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
};

/// Lowercase letters, digits and dashes, e.g. `terms-of-service`.
pub fn validate_slug(slug: &str) -> AppResult<()> {
    let valid = !slug.is_empty()
        && slug.len() <= 128
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid {
        return Err(AppError::ValidationError("Invalid content slug".into()));
    }
    Ok(())
}

#[derive(Clone)]
pub struct ContentService {
    db: DbPool,
}

impl ContentService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub async fn get_published(&self, slug: &str) -> AppResult<contents::Model> {
        contents::Entity::find()
            .filter(contents::Column::Slug.eq(slug))
            .filter(contents::Column::IsActive.eq(true))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Content not found".into()))
    }

    pub async fn list_all(&self) -> AppResult<Vec<contents::Model>> {
        Ok(contents::Entity::find()
            .order_by_asc(contents::Column::Slug)
            .all(self.db.as_ref())
            .await?)
    }

    pub async fn upsert(
        &self,
        slug: &str,
        req: UpsertContentRequest,
    ) -> AppResult<contents::Model> {
        validate_slug(slug)?;
        if req.title.trim().is_empty() {
            return Err(AppError::ValidationError("title is required".into()));
        }

        let now = Utc::now();
        let existing = contents::Entity::find()
            .filter(contents::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await?;

        let content = match existing {
            Some(current) => {
                let mut am = current.into_active_model();
                am.title = Set(req.title.trim().to_string());
                am.body = Set(req.body);
                if let Some(active) = req.is_active {
                    am.is_active = Set(active);
                }
                am.updated_at = Set(Some(now));
                am.update(self.db.as_ref()).await?
            }
            None => {
                contents::ActiveModel {
                    slug: Set(slug.to_string()),
                    title: Set(req.title.trim().to_string()),
                    body: Set(req.body),
                    is_active: Set(req.is_active.unwrap_or(true)),
                    created_at: Set(Some(now)),
                    updated_at: Set(Some(now)),
                    ..Default::default()
                }
                .insert(self.db.as_ref())
                .await?
            }
        };
        log::info!("Content '{slug}' saved");
        Ok(content)
    }
}
