//! Repositories for document store operations
//!
//! Engines only see these traits. `project`, `user` and `like` hold the
//! PostgreSQL implementations; `memory` holds an in-process store used by
//! tests and local development.

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    Applicant, NewProject, Participant, ProfilePatch, Project, ProjectLike, ProjectMembership,
    User, UserLinks,
};

pub mod like;
pub mod memory;
pub mod project;
pub mod user;

pub use like::LikeRepositoryPg;
pub use memory::{MemoryLikeRepository, MemoryProjectRepository, MemoryUserRepository};
pub use project::ProjectRepositoryPg;
pub use user::UserRepositoryPg;

/// A project with the relevance score of a text query
#[derive(Debug, Clone)]
pub struct ScoredProject {
    pub project: Project,
    pub score: f64,
}

/// Project collection
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Projects in store-native order
    async fn find_page(&self, skip: u64, limit: u64) -> DatabaseResult<Vec<Project>>;

    async fn count(&self) -> DatabaseResult<u64>;

    /// Projects containing any of `terms`, best score first, id as tie-break
    async fn text_search(
        &self,
        terms: &[String],
        skip: u64,
        limit: u64,
    ) -> DatabaseResult<Vec<ScoredProject>>;

    async fn count_text_matches(&self, terms: &[String]) -> DatabaseResult<u64>;

    /// Projects whose searchable fields contain `needle`, ignoring case
    async fn find_containing(&self, needle: &str) -> DatabaseResult<Vec<Project>>;

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Project>>;

    async fn create(&self, project: &NewProject) -> DatabaseResult<Project>;

    /// Persist the editable fields of `project`
    async fn update_details(&self, project: &Project) -> DatabaseResult<Option<Project>>;

    /// Replace both membership arrays
    async fn set_members(
        &self,
        id: Uuid,
        applicants: &[Applicant],
        participants: &[Participant],
    ) -> DatabaseResult<Option<Project>>;

    /// Atomically add `delta` to the like counter, never going below zero
    async fn adjust_like_count(&self, id: Uuid, delta: i64) -> DatabaseResult<Option<i64>>;

    async fn set_like_count(&self, id: Uuid, like_count: i64) -> DatabaseResult<bool>;

    async fn delete(&self, id: Uuid) -> DatabaseResult<bool>;
}

/// User collection
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>>;

    async fn list_ids(&self) -> DatabaseResult<Vec<Uuid>>;

    async fn update_profile(&self, id: Uuid, patch: &ProfilePatch) -> DatabaseResult<Option<User>>;

    /// Replace both membership mirrors
    async fn set_memberships(
        &self,
        id: Uuid,
        applied: &[ProjectMembership],
        participating: &[ProjectMembership],
    ) -> DatabaseResult<Option<User>>;

    async fn add_own_project(&self, id: Uuid, project_id: Uuid) -> DatabaseResult<bool>;

    async fn add_to_watch_list(&self, id: Uuid, project_id: Uuid) -> DatabaseResult<bool>;

    async fn remove_from_watch_list(&self, id: Uuid, project_id: Uuid) -> DatabaseResult<bool>;

    /// Strip `project_id` from every user's links, returning the users touched
    async fn remove_project_references(&self, project_id: Uuid) -> DatabaseResult<u64>;

    async fn replace_links(&self, id: Uuid, links: &UserLinks) -> DatabaseResult<bool>;
}

/// Like join collection
#[async_trait]
pub trait LikeRepository: Send + Sync {
    async fn find(&self, project_id: Uuid, user_id: Uuid) -> DatabaseResult<Option<ProjectLike>>;

    /// Insert the like, `None` when the pair already exists
    async fn create(&self, project_id: Uuid, user_id: Uuid) -> DatabaseResult<Option<ProjectLike>>;

    /// Remove the like, `false` when there was none
    async fn delete(&self, project_id: Uuid, user_id: Uuid) -> DatabaseResult<bool>;

    async fn delete_for_project(&self, project_id: Uuid) -> DatabaseResult<u64>;

    async fn list_all(&self) -> DatabaseResult<Vec<ProjectLike>>;
}

/// Store handles injected into the engines
#[derive(Clone)]
pub struct Repositories {
    pub projects: Arc<dyn ProjectRepository>,
    pub users: Arc<dyn UserRepository>,
    pub likes: Arc<dyn LikeRepository>,
}

impl Repositories {
    /// Repositories backed by PostgreSQL
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            projects: Arc::new(ProjectRepositoryPg::new(pool.clone())),
            users: Arc::new(UserRepositoryPg::new(pool.clone())),
            likes: Arc::new(LikeRepositoryPg::new(pool)),
        }
    }
}

/// Apply pending schema migrations
pub async fn run_migrations(pool: &PgPool) -> DatabaseResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))
}
