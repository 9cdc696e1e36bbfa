//! PostgreSQL user repository

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{
    PgPool, Postgres, Row,
    postgres::{PgArguments, PgRow},
    query::Query,
    types::Json,
};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::UserRepository;
use crate::models::{ProfilePatch, ProjectMembership, User, UserLinks};

/// Column list for `users` queries. Credential columns are left out.
const USER_COLUMNS: &str = "\
    id, first_name, last_name, email, title, about, offer, contacts, \
    profile_picture_url, profile_picture_public_id, profile_cover_picture_url, \
    profile_cover_picture_public_id, watch_list, own_projects, \
    participating_projects, applied_projects, created_at, updated_at";

/// User repository backed by PostgreSQL
#[derive(Clone)]
pub struct UserRepositoryPg {
    pool: PgPool,
}

impl UserRepositoryPg {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_optional(
        &self,
        query: Query<'_, Postgres, PgArguments>,
    ) -> DatabaseResult<Option<User>> {
        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        row.as_ref().map(user_from_row).transpose()
    }
}

fn user_from_row(row: &PgRow) -> DatabaseResult<User> {
    let contacts: Json<BTreeMap<String, String>> =
        row.try_get("contacts").map_err(DatabaseError::Query)?;
    let participating: Json<Vec<ProjectMembership>> = row
        .try_get("participating_projects")
        .map_err(DatabaseError::Query)?;
    let applied: Json<Vec<ProjectMembership>> = row
        .try_get("applied_projects")
        .map_err(DatabaseError::Query)?;

    Ok(User {
        id: row.try_get("id").map_err(DatabaseError::Query)?,
        first_name: row.try_get("first_name").map_err(DatabaseError::Query)?,
        last_name: row.try_get("last_name").map_err(DatabaseError::Query)?,
        email: row.try_get("email").map_err(DatabaseError::Query)?,
        title: row.try_get("title").map_err(DatabaseError::Query)?,
        about: row.try_get("about").map_err(DatabaseError::Query)?,
        offer: row.try_get("offer").map_err(DatabaseError::Query)?,
        contacts: contacts.0,
        profile_picture_url: row
            .try_get("profile_picture_url")
            .map_err(DatabaseError::Query)?,
        profile_picture_public_id: row
            .try_get("profile_picture_public_id")
            .map_err(DatabaseError::Query)?,
        profile_cover_picture_url: row
            .try_get("profile_cover_picture_url")
            .map_err(DatabaseError::Query)?,
        profile_cover_picture_public_id: row
            .try_get("profile_cover_picture_public_id")
            .map_err(DatabaseError::Query)?,
        watch_list: row.try_get("watch_list").map_err(DatabaseError::Query)?,
        own_projects: row.try_get("own_projects").map_err(DatabaseError::Query)?,
        participating_projects: participating.0,
        applied_projects: applied.0,
        created_at: row.try_get("created_at").map_err(DatabaseError::Query)?,
        updated_at: row.try_get("updated_at").map_err(DatabaseError::Query)?,
    })
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim)
}

#[async_trait]
impl UserRepository for UserRepositoryPg {
    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        self.fetch_optional(sqlx::query(&sql).bind(id)).await
    }

    async fn list_ids(&self) -> DatabaseResult<Vec<Uuid>> {
        sqlx::query_scalar("SELECT id FROM users ORDER BY created_at ASC, id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::Query)
    }

    async fn update_profile(&self, id: Uuid, patch: &ProfilePatch) -> DatabaseResult<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                title = COALESCE($4, title),
                about = COALESCE($5, about),
                offer = COALESCE($6, offer),
                contacts = COALESCE($7, contacts),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let query = sqlx::query(&sql)
            .bind(id)
            .bind(trimmed(&patch.first_name))
            .bind(trimmed(&patch.last_name))
            .bind(trimmed(&patch.title))
            .bind(trimmed(&patch.about))
            .bind(trimmed(&patch.offer))
            .bind(patch.contacts.as_ref().map(Json));

        self.fetch_optional(query).await
    }

    async fn set_memberships(
        &self,
        id: Uuid,
        applied: &[ProjectMembership],
        participating: &[ProjectMembership],
    ) -> DatabaseResult<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users
            SET applied_projects = $2, participating_projects = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let query = sqlx::query(&sql)
            .bind(id)
            .bind(Json(applied))
            .bind(Json(participating));

        self.fetch_optional(query).await
    }

    async fn add_own_project(&self, id: Uuid, project_id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET own_projects = array_append(own_projects, $2), updated_at = NOW()
            WHERE id = $1 AND NOT ($2 = ANY(own_projects))
            "#,
        )
        .bind(id)
        .bind(project_id)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_to_watch_list(&self, id: Uuid, project_id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET watch_list = array_append(watch_list, $2), updated_at = NOW()
            WHERE id = $1 AND NOT ($2 = ANY(watch_list))
            "#,
        )
        .bind(id)
        .bind(project_id)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_from_watch_list(&self, id: Uuid, project_id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET watch_list = array_remove(watch_list, $2), updated_at = NOW()
            WHERE id = $1 AND $2 = ANY(watch_list)
            "#,
        )
        .bind(id)
        .bind(project_id)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_project_references(&self, project_id: Uuid) -> DatabaseResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET own_projects = array_remove(own_projects, $1),
                watch_list = array_remove(watch_list, $1),
                applied_projects = COALESCE(
                    (SELECT jsonb_agg(m) FROM jsonb_array_elements(applied_projects) m
                     WHERE m->>'projectId' <> $1::text),
                    '[]'::jsonb),
                participating_projects = COALESCE(
                    (SELECT jsonb_agg(m) FROM jsonb_array_elements(participating_projects) m
                     WHERE m->>'projectId' <> $1::text),
                    '[]'::jsonb),
                updated_at = NOW()
            WHERE $1 = ANY(own_projects)
               OR $1 = ANY(watch_list)
               OR applied_projects @> jsonb_build_array(jsonb_build_object('projectId', $1::text))
               OR participating_projects @> jsonb_build_array(jsonb_build_object('projectId', $1::text))
            "#,
        )
        .bind(project_id)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected())
    }

    async fn replace_links(&self, id: Uuid, links: &UserLinks) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET own_projects = $2, watch_list = $3, applied_projects = $4,
                participating_projects = $5, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&links.own_projects)
        .bind(&links.watch_list)
        .bind(Json(&links.applied_projects))
        .bind(Json(&links.participating_projects))
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }
}
