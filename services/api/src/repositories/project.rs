//! PostgreSQL project repository
//!
//! Membership arrays and technology tags are JSONB columns. Text search runs
//! against the generated `search_vector` column (see the migrations), ranked
//! with `ts_rank` under the `simple` configuration so that words are matched
//! without stemming.

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{
    PgPool, Postgres, Row,
    postgres::PgRow,
    types::Json,
};
use uuid::Uuid;

use super::{ProjectRepository, ScoredProject};
use crate::models::{
    Applicant, NewProject, Participant, Project, ProjectPictures, ProjectStatus, Role,
    Technologies,
};

/// Column list for `projects` queries.
const PROJECT_COLUMNS: &str = "\
    id, title, description, status, technologies, roles_needed, like_count, \
    applicants, participants, project_picture_url, project_picture_public_id, \
    project_cover_picture_url, project_cover_picture_public_id, created_by, \
    created_at, updated_at";

/// Project repository backed by PostgreSQL
#[derive(Clone)]
pub struct ProjectRepositoryPg {
    pool: PgPool,
}

impl ProjectRepositoryPg {
    /// Create a new project repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> DatabaseResult<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(column).map_err(DatabaseError::Query)
}

fn project_from_row(row: &PgRow) -> DatabaseResult<Project> {
    let status: String = get(row, "status")?;
    let status = status
        .parse::<ProjectStatus>()
        .map_err(DatabaseError::Decode)?;
    let technologies: Json<Technologies> = get(row, "technologies")?;
    let roles_needed: Json<Vec<Role>> = get(row, "roles_needed")?;
    let applicants: Json<Vec<Applicant>> = get(row, "applicants")?;
    let participants: Json<Vec<Participant>> = get(row, "participants")?;

    Ok(Project {
        id: get(row, "id")?,
        title: get(row, "title")?,
        description: get(row, "description")?,
        status,
        technologies: technologies.0,
        roles_needed: roles_needed.0,
        like_count: get(row, "like_count")?,
        applicants: applicants.0,
        participants: participants.0,
        pictures: ProjectPictures {
            project_picture_url: get(row, "project_picture_url")?,
            project_picture_public_id: get(row, "project_picture_public_id")?,
            project_cover_picture_url: get(row, "project_cover_picture_url")?,
            project_cover_picture_public_id: get(row, "project_cover_picture_public_id")?,
        },
        created_by: get(row, "created_by")?,
        created_at: get(row, "created_at")?,
        updated_at: get(row, "updated_at")?,
    })
}

/// Text fed to the tag part of the search vector
fn search_tags(technologies: &Technologies, roles: &[Role]) -> String {
    technologies
        .tags()
        .chain(roles.iter().map(|role| role.as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split query terms into the lowercase words the search index keeps.
///
/// Every term is split on characters other than letters, digits and `_`.
/// Repeated words are dropped.
pub(crate) fn query_words(terms: &[String]) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for term in terms {
        for word in term.split(|c: char| !(c.is_alphanumeric() || c == '_')) {
            let word = word.to_lowercase();
            if !word.is_empty() && !words.contains(&word) {
                words.push(word);
            }
        }
    }
    words
}

/// Turn query terms into an OR `tsquery`, `None` when nothing searchable is left
pub(crate) fn build_tsquery(terms: &[String]) -> Option<String> {
    let words = query_words(terms);
    if words.is_empty() {
        None
    } else {
        Some(words.join(" | "))
    }
}

/// Escape `LIKE` wildcards so `needle` is matched literally
pub(crate) fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl ProjectRepository for ProjectRepositoryPg {
    async fn find_page(&self, skip: u64, limit: u64) -> DatabaseResult<Vec<Project>> {
        let sql = format!(
            "SELECT {} FROM projects ORDER BY created_at ASC, id ASC OFFSET $1 LIMIT $2",
            PROJECT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(skip as i64)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        rows.iter().map(project_from_row).collect()
    }

    async fn count(&self) -> DatabaseResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects")
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(count as u64)
    }

    async fn text_search(
        &self,
        terms: &[String],
        skip: u64,
        limit: u64,
    ) -> DatabaseResult<Vec<ScoredProject>> {
        let Some(tsquery) = build_tsquery(terms) else {
            return Ok(Vec::new());
        };

        let sql = format!(
            r#"
            SELECT {}, ts_rank(search_vector, to_tsquery('simple', $1))::FLOAT8 AS score
            FROM projects
            WHERE search_vector @@ to_tsquery('simple', $1)
            ORDER BY score DESC, id ASC
            OFFSET $2 LIMIT $3
            "#,
            PROJECT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(&tsquery)
            .bind(skip as i64)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        rows.iter()
            .map(|row| {
                Ok(ScoredProject {
                    project: project_from_row(row)?,
                    score: get(row, "score")?,
                })
            })
            .collect()
    }

    async fn count_text_matches(&self, terms: &[String]) -> DatabaseResult<u64> {
        let Some(tsquery) = build_tsquery(terms) else {
            return Ok(0);
        };

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM projects WHERE search_vector @@ to_tsquery('simple', $1)",
        )
        .bind(&tsquery)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(count as u64)
    }

    async fn find_containing(&self, needle: &str) -> DatabaseResult<Vec<Project>> {
        let pattern = format!("%{}%", escape_like(needle));
        let sql = format!(
            r#"
            SELECT {}
            FROM projects
            WHERE title ILIKE $1 OR description ILIKE $1 OR search_tags ILIKE $1
            "#,
            PROJECT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(&pattern)
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        rows.iter().map(project_from_row).collect()
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Project>> {
        let sql = format!("SELECT {} FROM projects WHERE id = $1", PROJECT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        row.as_ref().map(project_from_row).transpose()
    }

    async fn create(&self, project: &NewProject) -> DatabaseResult<Project> {
        let sql = format!(
            r#"
            INSERT INTO projects (
                title, description, status, technologies, roles_needed, search_tags,
                project_picture_url, project_picture_public_id,
                project_cover_picture_url, project_cover_picture_public_id, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(&project.title)
            .bind(&project.description)
            .bind(project.status.as_str())
            .bind(Json(&project.technologies))
            .bind(Json(&project.roles_needed))
            .bind(search_tags(&project.technologies, &project.roles_needed))
            .bind(&project.pictures.project_picture_url)
            .bind(&project.pictures.project_picture_public_id)
            .bind(&project.pictures.project_cover_picture_url)
            .bind(&project.pictures.project_cover_picture_public_id)
            .bind(project.created_by)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        project_from_row(&row)
    }

    async fn update_details(&self, project: &Project) -> DatabaseResult<Option<Project>> {
        let sql = format!(
            r#"
            UPDATE projects
            SET title = $2, description = $3, status = $4, technologies = $5,
                roles_needed = $6, search_tags = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(project.id)
            .bind(&project.title)
            .bind(&project.description)
            .bind(project.status.as_str())
            .bind(Json(&project.technologies))
            .bind(Json(&project.roles_needed))
            .bind(search_tags(&project.technologies, &project.roles_needed))
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        row.as_ref().map(project_from_row).transpose()
    }

    async fn set_members(
        &self,
        id: Uuid,
        applicants: &[Applicant],
        participants: &[Participant],
    ) -> DatabaseResult<Option<Project>> {
        let sql = format!(
            r#"
            UPDATE projects
            SET applicants = $2, participants = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(Json(applicants))
            .bind(Json(participants))
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        row.as_ref().map(project_from_row).transpose()
    }

    async fn adjust_like_count(&self, id: Uuid, delta: i64) -> DatabaseResult<Option<i64>> {
        sqlx::query_scalar(
            r#"
            UPDATE projects
            SET like_count = GREATEST(0, like_count + $2)
            WHERE id = $1
            RETURNING like_count
            "#,
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }

    async fn set_like_count(&self, id: Uuid, like_count: i64) -> DatabaseResult<bool> {
        let result = sqlx::query("UPDATE projects SET like_count = $2 WHERE id = $1")
            .bind(id)
            .bind(like_count.max(0))
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_tsquery_joins_words_with_or() {
        assert_eq!(
            build_tsquery(&terms(&["React", "go"])),
            Some("react | go".to_string())
        );
    }

    #[test]
    fn test_tsquery_splits_and_dedups_terms() {
        assert_eq!(
            build_tsquery(&terms(&["UI/UX", "ui", "C#"])),
            Some("ui | ux | c".to_string())
        );
    }

    #[test]
    fn test_tsquery_without_searchable_words() {
        assert_eq!(build_tsquery(&terms(&["!!", "&|"])), None);
        assert_eq!(build_tsquery(&[]), None);
    }

    #[test]
    fn test_escape_like_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("react"), "react");
    }

    #[test]
    fn test_search_tags_include_roles() {
        let mut technologies = Technologies::default();
        technologies.backend = vec!["Go".to_string()];
        assert_eq!(
            search_tags(&technologies, &[Role::TeamLead]),
            "Go Team Lead"
        );
    }
}
