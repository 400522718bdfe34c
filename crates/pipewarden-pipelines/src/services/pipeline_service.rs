use pipewarden_core::{require_non_blank, PaginationParams};
use pipewarden_database::DbConnection;
use pipewarden_entities::pipelines;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::types::{contains_pattern, CreatePipelineRequest, PipelineError, UpdatePipelineRequest};

/// Registry of pipeline definitions
pub struct PipelineService {
    db: Arc<DbConnection>,
}

impl PipelineService {
    pub fn new(db: Arc<DbConnection>) -> Self {
        Self { db }
    }

    pub async fn create_pipeline(
        &self,
        request: CreatePipelineRequest,
    ) -> Result<pipelines::Model, PipelineError> {
        let name = require_non_blank("name", &request.name)?;

        let mut pipeline = pipelines::ActiveModel {
            name: Set(name.clone()),
            description: Set(request.description),
            created_by: Set(request.created_by),
            ..Default::default()
        };
        if let Some(config) = request.config {
            pipeline.config = Set(config);
        }
        if let Some(is_active) = request.is_active {
            pipeline.is_active = Set(is_active);
        }

        let created = pipeline
            .insert(self.db.as_ref())
            .await
            .map_err(|e| {
                PipelineError::from_write(e, || format!("pipeline '{}' already exists", name))
            })?;

        info!("Created pipeline {} ({})", created.name, created.id);
        Ok(created)
    }

    pub async fn get_pipeline(&self, id: Uuid) -> Result<pipelines::Model, PipelineError> {
        pipelines::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| PipelineError::NotFound(format!("pipeline {}", id)))
    }

    pub async fn get_pipeline_by_name(&self, name: &str) -> Result<pipelines::Model, PipelineError> {
        pipelines::Entity::find()
            .filter(pipelines::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| PipelineError::NotFound(format!("pipeline '{}'", name)))
    }

    /// One page of pipelines ordered by name, plus the total count
    pub async fn list_pipelines(
        &self,
        active_only: bool,
        pagination: PaginationParams,
    ) -> Result<(Vec<pipelines::Model>, u64), PipelineError> {
        let (page, page_size) = pagination.normalize();

        let mut query = pipelines::Entity::find();
        if active_only {
            query = query.filter(pipelines::Column::IsActive.eq(true));
        }

        let paginator = query
            .order_by_asc(pipelines::Column::Name)
            .paginate(self.db.as_ref(), page_size);
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page - 1).await?;

        Ok((models, total))
    }

    /// Case-insensitive substring match on the name
    pub async fn search_pipelines(
        &self,
        term: &str,
        limit: u64,
    ) -> Result<Vec<pipelines::Model>, PipelineError> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let models = pipelines::Entity::find()
            .filter(Expr::col(pipelines::Column::Name).ilike(contains_pattern(term)))
            .order_by_asc(pipelines::Column::Name)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;

        debug!("Pipeline search '{}' matched {} rows", term, models.len());
        Ok(models)
    }

    pub async fn update_pipeline(
        &self,
        id: Uuid,
        request: UpdatePipelineRequest,
    ) -> Result<pipelines::Model, PipelineError> {
        // Validate before the lookup so bad input never reaches the database
        let name = request
            .name
            .as_deref()
            .map(|n| require_non_blank("name", n))
            .transpose()?;

        let existing = self.get_pipeline(id).await?;
        let mut pipeline: pipelines::ActiveModel = existing.into();

        if let Some(name) = name.clone() {
            pipeline.name = Set(name);
        }
        if let Some(description) = request.description {
            pipeline.description = Set(Some(description));
        }
        if let Some(config) = request.config {
            pipeline.config = Set(config);
        }
        if let Some(is_active) = request.is_active {
            pipeline.is_active = Set(is_active);
        }

        let updated = pipeline.update(self.db.as_ref()).await.map_err(|e| {
            PipelineError::from_write(e, || {
                format!("pipeline '{}' already exists", name.unwrap_or_default())
            })
        })?;

        Ok(updated)
    }

    /// Removes the pipeline; its executions and their validation results go with it
    pub async fn delete_pipeline(&self, id: Uuid) -> Result<(), PipelineError> {
        let result = pipelines::Entity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(PipelineError::NotFound(format!("pipeline {}", id)));
        }

        info!("Deleted pipeline {}", id);
        Ok(())
    }
}
