//! Like toggling and the watch list it drives

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::LikeToggle,
    repositories::{LikeRepository, ProjectRepository, UserRepository},
};

#[derive(Clone)]
pub struct LikeEngine {
    projects: Arc<dyn ProjectRepository>,
    users: Arc<dyn UserRepository>,
    likes: Arc<dyn LikeRepository>,
}

impl LikeEngine {
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        users: Arc<dyn UserRepository>,
        likes: Arc<dyn LikeRepository>,
    ) -> Self {
        Self {
            projects,
            users,
            likes,
        }
    }

    /// Like the project when the user has not yet, unlike it otherwise.
    ///
    /// The like row, the counter and the watch list are three separate
    /// writes; the counter uses an atomic increment floored at zero.
    pub async fn toggle(&self, project_id: Uuid, user_id: Uuid) -> ApiResult<LikeToggle> {
        if self.projects.find_by_id(project_id).await?.is_none() {
            return Err(ApiError::not_found("Project not found"));
        }
        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(ApiError::not_found("User not found"));
        }

        let liked = self.likes.find(project_id, user_id).await?.is_none();
        let changed = if liked {
            self.likes.create(project_id, user_id).await?.is_some()
        } else {
            self.likes.delete(project_id, user_id).await?
        };

        // Another request already made this change; the counter stays as is
        if !changed {
            warn!(
                "Like of user {} on project {} changed concurrently",
                user_id, project_id
            );
            return self.current_state(project_id, user_id).await;
        }

        let total_likes = self
            .projects
            .adjust_like_count(project_id, if liked { 1 } else { -1 })
            .await?
            .ok_or_else(|| ApiError::not_found("Project not found"))?;

        if liked {
            self.users.add_to_watch_list(user_id, project_id).await?;
        } else {
            self.users.remove_from_watch_list(user_id, project_id).await?;
        }

        info!(
            "User {} {} project {} ({} likes)",
            user_id,
            if liked { "liked" } else { "unliked" },
            project_id,
            total_likes
        );
        Ok(LikeToggle { liked, total_likes })
    }

    async fn current_state(&self, project_id: Uuid, user_id: Uuid) -> ApiResult<LikeToggle> {
        let liked = self.likes.find(project_id, user_id).await?.is_some();
        let project = self
            .projects
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Project not found"))?;

        Ok(LikeToggle {
            liked,
            total_likes: project.like_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::fixtures::Fixture,
        models::{ProjectLike, Role},
    };
    use async_trait::async_trait;
    use common::error::DatabaseResult;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Misses the like on the first lookup, as a request racing another
    /// toggle would
    struct StaleFirstLookup {
        inner: Arc<dyn LikeRepository>,
        missed: AtomicBool,
    }

    #[async_trait]
    impl LikeRepository for StaleFirstLookup {
        async fn find(&self, project_id: Uuid, user_id: Uuid) -> DatabaseResult<Option<ProjectLike>> {
            if !self.missed.swap(true, Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.find(project_id, user_id).await
        }

        async fn create(
            &self,
            project_id: Uuid,
            user_id: Uuid,
        ) -> DatabaseResult<Option<ProjectLike>> {
            self.inner.create(project_id, user_id).await
        }

        async fn delete(&self, project_id: Uuid, user_id: Uuid) -> DatabaseResult<bool> {
            self.inner.delete(project_id, user_id).await
        }

        async fn delete_for_project(&self, project_id: Uuid) -> DatabaseResult<u64> {
            self.inner.delete_for_project(project_id).await
        }

        async fn list_all(&self) -> DatabaseResult<Vec<ProjectLike>> {
            self.inner.list_all().await
        }
    }

    fn engine(fixture: &Fixture) -> LikeEngine {
        LikeEngine::new(
            fixture.repos.projects.clone(),
            fixture.repos.users.clone(),
            fixture.repos.likes.clone(),
        )
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_state() {
        let fixture = Fixture::new();
        let owner = fixture.user("Owner").await;
        let fan = fixture.user("Fan").await;
        let project = fixture.project(&owner, "Star Gazer", &[Role::Mentor]).await;
        let engine = engine(&fixture);

        let first = engine.toggle(project.id, fan.id).await.unwrap();
        assert_eq!(
            first,
            LikeToggle {
                liked: true,
                total_likes: 1
            }
        );
        assert_eq!(fixture.reload_user(fan.id).await.watch_list, vec![project.id]);
        assert!(fixture.repos.likes.find(project.id, fan.id).await.unwrap().is_some());

        let second = engine.toggle(project.id, fan.id).await.unwrap();
        assert_eq!(
            second,
            LikeToggle {
                liked: false,
                total_likes: 0
            }
        );
        assert!(fixture.reload_user(fan.id).await.watch_list.is_empty());
        assert!(fixture.repos.likes.find(project.id, fan.id).await.unwrap().is_none());
        assert_eq!(fixture.reload_project(project.id).await.like_count, 0);
    }

    #[tokio::test]
    async fn test_likes_from_several_users_add_up() {
        let fixture = Fixture::new();
        let owner = fixture.user("Owner").await;
        let project = fixture.project(&owner, "Star Gazer", &[Role::Mentor]).await;
        let engine = engine(&fixture);

        for name in ["Ann", "Ben", "Cal"] {
            let user = fixture.user(name).await;
            engine.toggle(project.id, user.id).await.unwrap();
        }

        assert_eq!(fixture.reload_project(project.id).await.like_count, 3);
    }

    #[tokio::test]
    async fn test_toggle_unknown_project_or_user() {
        let fixture = Fixture::new();
        let owner = fixture.user("Owner").await;
        let project = fixture.project(&owner, "Star Gazer", &[Role::Mentor]).await;
        let engine = engine(&fixture);

        assert!(matches!(
            engine.toggle(Uuid::new_v4(), owner.id).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            engine.toggle(project.id, Uuid::new_v4()).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_like_is_counted_once() {
        let fixture = Fixture::new();
        let owner = fixture.user("Owner").await;
        let fan = fixture.user("Fan").await;
        let project = fixture.project(&owner, "Star Gazer", &[Role::Mentor]).await;

        engine(&fixture).toggle(project.id, fan.id).await.unwrap();

        let racing = LikeEngine::new(
            fixture.repos.projects.clone(),
            fixture.repos.users.clone(),
            Arc::new(StaleFirstLookup {
                inner: fixture.repos.likes.clone(),
                missed: AtomicBool::new(false),
            }),
        );
        let toggle = racing.toggle(project.id, fan.id).await.unwrap();

        assert_eq!(
            toggle,
            LikeToggle {
                liked: true,
                total_likes: 1
            }
        );
        let rows = fixture.repos.likes.list_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(fixture.reload_project(project.id).await.like_count, rows.len() as i64);
        assert_eq!(fixture.reload_user(fan.id).await.watch_list, vec![project.id]);
    }
}
