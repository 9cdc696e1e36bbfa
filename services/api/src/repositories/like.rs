//! PostgreSQL like repository

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;
use uuid::Uuid;

use super::LikeRepository;
use crate::models::ProjectLike;

/// Like repository backed by PostgreSQL
#[derive(Clone)]
pub struct LikeRepositoryPg {
    pool: PgPool,
}

impl LikeRepositoryPg {
    /// Create a new like repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LikeRepository for LikeRepositoryPg {
    async fn find(&self, project_id: Uuid, user_id: Uuid) -> DatabaseResult<Option<ProjectLike>> {
        sqlx::query_as::<_, ProjectLike>(
            r#"
            SELECT id, project_id, user_id, liked_at
            FROM project_likes
            WHERE project_id = $1 AND user_id = $2
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }

    async fn create(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> DatabaseResult<Option<ProjectLike>> {
        // No row comes back when the pair already exists
        sqlx::query_as::<_, ProjectLike>(
            r#"
            INSERT INTO project_likes (project_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (project_id, user_id) DO NOTHING
            RETURNING id, project_id, user_id, liked_at
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }

    async fn delete(&self, project_id: Uuid, user_id: Uuid) -> DatabaseResult<bool> {
        let result =
            sqlx::query("DELETE FROM project_likes WHERE project_id = $1 AND user_id = $2")
                .bind(project_id)
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_for_project(&self, project_id: Uuid) -> DatabaseResult<u64> {
        let result = sqlx::query("DELETE FROM project_likes WHERE project_id = $1")
            .bind(project_id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected())
    }

    async fn list_all(&self) -> DatabaseResult<Vec<ProjectLike>> {
        sqlx::query_as::<_, ProjectLike>(
            "SELECT id, project_id, user_id, liked_at FROM project_likes ORDER BY liked_at ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }
}
