//! In-process repositories
//!
//! Same contracts as the PostgreSQL repositories, kept in `RwLock`ed vectors.
//! Text relevance is a weighted term frequency: title words count three times,
//! description words twice, technology and role words once, each normalised by
//! the length of its field.

use async_trait::async_trait;
use chrono::Utc;
use common::error::DatabaseResult;
use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    LikeRepository, ProjectRepository, Repositories, ScoredProject, UserRepository,
    project::query_words,
};
use crate::models::{
    Applicant, NewProject, NewUser, Participant, ProfilePatch, Project, ProjectLike,
    ProjectMembership, User, UserLinks,
    user::{
        DEFAULT_PROFILE_COVER_PICTURE_PUBLIC_ID, DEFAULT_PROFILE_COVER_PICTURE_URL,
        DEFAULT_PROFILE_PICTURE_PUBLIC_ID, DEFAULT_PROFILE_PICTURE_URL,
    },
};

const TITLE_WEIGHT: f64 = 3.0;
const DESCRIPTION_WEIGHT: f64 = 2.0;
const TAG_WEIGHT: f64 = 1.0;

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn field_score(field: &[String], query: &[String], weight: f64) -> f64 {
    if field.is_empty() {
        return 0.0;
    }
    let hits = field.iter().filter(|word| query.contains(word)).count();
    weight * hits as f64 / field.len() as f64
}

/// Relevance of `project` for the query words, zero when nothing matches
fn score(project: &Project, query: &[String]) -> f64 {
    let tags = project
        .technologies
        .tags()
        .chain(project.roles_needed.iter().map(|role| role.as_str()))
        .flat_map(words)
        .collect::<Vec<_>>();

    field_score(&words(&project.title), query, TITLE_WEIGHT)
        + field_score(&words(&project.description), query, DESCRIPTION_WEIGHT)
        + field_score(&tags, query, TAG_WEIGHT)
}

fn page<T>(items: impl Iterator<Item = T>, skip: u64, limit: u64) -> Vec<T> {
    items.skip(skip as usize).take(limit as usize).collect()
}

/// Projects held in insertion order
#[derive(Default)]
pub struct MemoryProjectRepository {
    projects: RwLock<Vec<Project>>,
}

impl MemoryProjectRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn scored(&self, terms: &[String]) -> Vec<ScoredProject> {
        let query = query_words(terms);
        let projects = self.projects.read().await;

        let mut scored: Vec<ScoredProject> = projects
            .iter()
            .filter_map(|project| {
                let score = score(project, &query);
                (score > 0.0).then(|| ScoredProject {
                    project: project.clone(),
                    score,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.project.id.cmp(&b.project.id))
        });
        scored
    }
}

#[async_trait]
impl ProjectRepository for MemoryProjectRepository {
    async fn find_page(&self, skip: u64, limit: u64) -> DatabaseResult<Vec<Project>> {
        let projects = self.projects.read().await;
        Ok(page(projects.iter().cloned(), skip, limit))
    }

    async fn count(&self) -> DatabaseResult<u64> {
        Ok(self.projects.read().await.len() as u64)
    }

    async fn text_search(
        &self,
        terms: &[String],
        skip: u64,
        limit: u64,
    ) -> DatabaseResult<Vec<ScoredProject>> {
        Ok(page(self.scored(terms).await.into_iter(), skip, limit))
    }

    async fn count_text_matches(&self, terms: &[String]) -> DatabaseResult<u64> {
        Ok(self.scored(terms).await.len() as u64)
    }

    async fn find_containing(&self, needle: &str) -> DatabaseResult<Vec<Project>> {
        let needle = needle.to_lowercase();
        let projects = self.projects.read().await;

        Ok(projects
            .iter()
            .filter(|project| project.searchable_text().to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Project>> {
        let projects = self.projects.read().await;
        Ok(projects.iter().find(|project| project.id == id).cloned())
    }

    async fn create(&self, project: &NewProject) -> DatabaseResult<Project> {
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            title: project.title.clone(),
            description: project.description.clone(),
            status: project.status,
            technologies: project.technologies.clone(),
            roles_needed: project.roles_needed.clone(),
            like_count: 0,
            applicants: Vec::new(),
            participants: Vec::new(),
            pictures: project.pictures.clone(),
            created_by: project.created_by,
            created_at: now,
            updated_at: now,
        };

        self.projects.write().await.push(project.clone());
        Ok(project)
    }

    async fn update_details(&self, project: &Project) -> DatabaseResult<Option<Project>> {
        let mut projects = self.projects.write().await;
        let Some(stored) = projects.iter_mut().find(|p| p.id == project.id) else {
            return Ok(None);
        };

        stored.title = project.title.clone();
        stored.description = project.description.clone();
        stored.status = project.status;
        stored.technologies = project.technologies.clone();
        stored.roles_needed = project.roles_needed.clone();
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn set_members(
        &self,
        id: Uuid,
        applicants: &[Applicant],
        participants: &[Participant],
    ) -> DatabaseResult<Option<Project>> {
        let mut projects = self.projects.write().await;
        let Some(stored) = projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };

        stored.applicants = applicants.to_vec();
        stored.participants = participants.to_vec();
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn adjust_like_count(&self, id: Uuid, delta: i64) -> DatabaseResult<Option<i64>> {
        let mut projects = self.projects.write().await;
        Ok(projects.iter_mut().find(|p| p.id == id).map(|stored| {
            stored.like_count = (stored.like_count + delta).max(0);
            stored.like_count
        }))
    }

    async fn set_like_count(&self, id: Uuid, like_count: i64) -> DatabaseResult<bool> {
        let mut projects = self.projects.write().await;
        match projects.iter_mut().find(|p| p.id == id) {
            Some(stored) => {
                stored.like_count = like_count.max(0);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> DatabaseResult<bool> {
        let mut projects = self.projects.write().await;
        let before = projects.len();
        projects.retain(|p| p.id != id);
        Ok(projects.len() < before)
    }
}

/// Users held in insertion order
#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a user with default pictures and no project links
    pub async fn insert(&self, user: NewUser) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            title: None,
            about: None,
            offer: None,
            contacts: BTreeMap::new(),
            profile_picture_url: DEFAULT_PROFILE_PICTURE_URL.to_string(),
            profile_picture_public_id: DEFAULT_PROFILE_PICTURE_PUBLIC_ID.to_string(),
            profile_cover_picture_url: DEFAULT_PROFILE_COVER_PICTURE_URL.to_string(),
            profile_cover_picture_public_id: DEFAULT_PROFILE_COVER_PICTURE_PUBLIC_ID.to_string(),
            watch_list: Vec::new(),
            own_projects: Vec::new(),
            participating_projects: Vec::new(),
            applied_projects: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.users.write().await.push(user.clone());
        user
    }

    async fn modify<F>(&self, id: Uuid, change: F) -> Option<User>
    where
        F: FnOnce(&mut User),
    {
        let mut users = self.users.write().await;
        users.iter_mut().find(|user| user.id == id).map(|user| {
            change(user);
            user.updated_at = Utc::now();
            user.clone()
        })
    }
}

fn strip_memberships(memberships: &mut Vec<ProjectMembership>, project_id: Uuid) -> bool {
    let before = memberships.len();
    memberships.retain(|m| m.project_id != project_id);
    memberships.len() < before
}

fn strip_ids(ids: &mut Vec<Uuid>, project_id: Uuid) -> bool {
    let before = ids.len();
    ids.retain(|id| *id != project_id);
    ids.len() < before
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|user| user.id == id).cloned())
    }

    async fn list_ids(&self) -> DatabaseResult<Vec<Uuid>> {
        let users = self.users.read().await;
        Ok(users.iter().map(|user| user.id).collect())
    }

    async fn update_profile(&self, id: Uuid, patch: &ProfilePatch) -> DatabaseResult<Option<User>> {
        Ok(self.modify(id, |user| patch.apply(user)).await)
    }

    async fn set_memberships(
        &self,
        id: Uuid,
        applied: &[ProjectMembership],
        participating: &[ProjectMembership],
    ) -> DatabaseResult<Option<User>> {
        Ok(self
            .modify(id, |user| {
                user.applied_projects = applied.to_vec();
                user.participating_projects = participating.to_vec();
            })
            .await)
    }

    async fn add_own_project(&self, id: Uuid, project_id: Uuid) -> DatabaseResult<bool> {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|user| user.id == id) {
            Some(user) if !user.own_projects.contains(&project_id) => {
                user.own_projects.push(project_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn add_to_watch_list(&self, id: Uuid, project_id: Uuid) -> DatabaseResult<bool> {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|user| user.id == id) {
            Some(user) if !user.watch_list.contains(&project_id) => {
                user.watch_list.push(project_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn remove_from_watch_list(&self, id: Uuid, project_id: Uuid) -> DatabaseResult<bool> {
        let mut users = self.users.write().await;
        Ok(users
            .iter_mut()
            .find(|user| user.id == id)
            .is_some_and(|user| strip_ids(&mut user.watch_list, project_id)))
    }

    async fn remove_project_references(&self, project_id: Uuid) -> DatabaseResult<u64> {
        let mut users = self.users.write().await;
        let mut touched = 0;
        for user in users.iter_mut() {
            let own = strip_ids(&mut user.own_projects, project_id);
            let watched = strip_ids(&mut user.watch_list, project_id);
            let applied = strip_memberships(&mut user.applied_projects, project_id);
            let participating = strip_memberships(&mut user.participating_projects, project_id);
            if own || watched || applied || participating {
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn replace_links(&self, id: Uuid, links: &UserLinks) -> DatabaseResult<bool> {
        let updated = self
            .modify(id, |user| {
                user.own_projects = links.own_projects.clone();
                user.watch_list = links.watch_list.clone();
                user.applied_projects = links.applied_projects.clone();
                user.participating_projects = links.participating_projects.clone();
            })
            .await;
        Ok(updated.is_some())
    }
}

/// Likes held in insertion order
#[derive(Default)]
pub struct MemoryLikeRepository {
    likes: RwLock<Vec<ProjectLike>>,
}

impl MemoryLikeRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LikeRepository for MemoryLikeRepository {
    async fn find(&self, project_id: Uuid, user_id: Uuid) -> DatabaseResult<Option<ProjectLike>> {
        let likes = self.likes.read().await;
        Ok(likes
            .iter()
            .find(|like| like.project_id == project_id && like.user_id == user_id)
            .cloned())
    }

    async fn create(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> DatabaseResult<Option<ProjectLike>> {
        let mut likes = self.likes.write().await;
        if likes
            .iter()
            .any(|like| like.project_id == project_id && like.user_id == user_id)
        {
            return Ok(None);
        }

        let like = ProjectLike {
            id: Uuid::new_v4(),
            project_id,
            user_id,
            liked_at: Utc::now(),
        };
        likes.push(like.clone());
        Ok(Some(like))
    }

    async fn delete(&self, project_id: Uuid, user_id: Uuid) -> DatabaseResult<bool> {
        let mut likes = self.likes.write().await;
        let before = likes.len();
        likes.retain(|like| !(like.project_id == project_id && like.user_id == user_id));
        Ok(likes.len() < before)
    }

    async fn delete_for_project(&self, project_id: Uuid) -> DatabaseResult<u64> {
        let mut likes = self.likes.write().await;
        let before = likes.len();
        likes.retain(|like| like.project_id != project_id);
        Ok((before - likes.len()) as u64)
    }

    async fn list_all(&self) -> DatabaseResult<Vec<ProjectLike>> {
        Ok(self.likes.read().await.clone())
    }
}

impl Repositories {
    /// Fresh in-process repositories around an existing user store
    pub fn in_memory(users: Arc<MemoryUserRepository>) -> Self {
        Self {
            projects: Arc::new(MemoryProjectRepository::new()),
            users,
            likes: Arc::new(MemoryLikeRepository::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProjectPictures, ProjectStatus, Role, Technologies};

    fn new_project(title: &str, description: &str) -> NewProject {
        NewProject {
            title: title.to_string(),
            description: description.to_string(),
            status: ProjectStatus::default(),
            technologies: Technologies::default(),
            roles_needed: vec![Role::Mentor],
            pictures: ProjectPictures::default(),
            created_by: Uuid::new_v4(),
        }
    }

    fn terms(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_title_match_outranks_description_match() {
        let repo = MemoryProjectRepository::new();
        let in_description = repo
            .create(&new_project("Meal planner", "Built with react for weekly dinners"))
            .await
            .unwrap();
        let in_title = repo
            .create(&new_project("React dashboard", "Charts for a small bakery team"))
            .await
            .unwrap();

        let results = repo.text_search(&terms(&["react"]), 0, 10).await.unwrap();

        let ids: Vec<Uuid> = results.iter().map(|r| r.project.id).collect();
        assert_eq!(ids, vec![in_title.id, in_description.id]);
        assert_eq!(repo.count_text_matches(&terms(&["react"])).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_text_search_matches_whole_words_only() {
        let repo = MemoryProjectRepository::new();
        repo.create(&new_project("Reactor control", "Monitoring a tiny nuclear simulator"))
            .await
            .unwrap();

        assert!(repo.text_search(&terms(&["react"]), 0, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_like_count_never_goes_negative() {
        let repo = MemoryProjectRepository::new();
        let project = repo.create(&new_project("Counter", "Nothing to see here at all")).await.unwrap();

        assert_eq!(repo.adjust_like_count(project.id, -1).await.unwrap(), Some(0));
        assert_eq!(repo.adjust_like_count(project.id, 1).await.unwrap(), Some(1));
        assert_eq!(repo.adjust_like_count(Uuid::new_v4(), 1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove_project_references_strips_every_link() {
        let users = MemoryUserRepository::new();
        let project_id = Uuid::new_v4();
        let other = Uuid::new_v4();
        let user = users
            .insert(NewUser {
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                email: "ada@example.com".into(),
            })
            .await;
        let links = UserLinks {
            own_projects: vec![project_id, other],
            watch_list: vec![project_id],
            applied_projects: vec![ProjectMembership {
                project_id,
                role: Role::Mentor,
            }],
            participating_projects: vec![ProjectMembership {
                project_id: other,
                role: Role::TeamLead,
            }],
        };
        users.replace_links(user.id, &links).await.unwrap();

        assert_eq!(users.remove_project_references(project_id).await.unwrap(), 1);

        let user = users.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(user.own_projects, vec![other]);
        assert!(user.watch_list.is_empty());
        assert!(user.applied_projects.is_empty());
        assert_eq!(user.participating_projects.len(), 1);
    }

    #[tokio::test]
    async fn test_like_pair_is_unique() {
        let likes = MemoryLikeRepository::new();
        let (project_id, user_id) = (Uuid::new_v4(), Uuid::new_v4());

        let first = likes.create(project_id, user_id).await.unwrap();
        let second = likes.create(project_id, user_id).await.unwrap();

        assert_eq!(first.map(|like| like.user_id), Some(user_id));
        assert!(second.is_none());
        assert_eq!(likes.list_all().await.unwrap().len(), 1);

        assert!(likes.delete(project_id, user_id).await.unwrap());
        assert!(!likes.delete(project_id, user_id).await.unwrap());
    }
}
