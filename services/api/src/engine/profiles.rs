//! User profiles

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::{collections::BTreeMap, sync::Arc};
use tracing::{info, warn};
use uuid::Uuid;

use super::visibility::{ProjectView, project_view};
use crate::{
    error::{ApiError, ApiResult},
    models::{ProfilePatch, ProjectMembership, User},
    repositories::{ProjectRepository, UserRepository},
    validation,
};

/// A user profile with its own and watched projects expanded.
///
/// Credentials are never part of it; `watch_list` only for the owner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub title: Option<String>,
    pub about: Option<String>,
    pub offer: Option<String>,
    pub contacts: BTreeMap<String, String>,
    pub profile_picture_url: String,
    pub profile_picture_public_id: String,
    pub profile_cover_picture_url: String,
    pub profile_cover_picture_public_id: String,
    pub own_projects: Vec<ProjectView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch_list: Option<Vec<ProjectView>>,
    pub participating_projects: Vec<ProjectMembership>,
    pub applied_projects: Vec<ProjectMembership>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ProfileService {
    projects: Arc<dyn ProjectRepository>,
    users: Arc<dyn UserRepository>,
}

impl ProfileService {
    pub fn new(projects: Arc<dyn ProjectRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { projects, users }
    }

    async fn load(&self, id: Uuid) -> ApiResult<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("The profile is not found"))
    }

    /// Expand project ids, skipping projects that no longer exist
    async fn expand(&self, ids: &[Uuid], viewer: Uuid) -> ApiResult<Vec<ProjectView>> {
        let mut views = Vec::with_capacity(ids.len());
        for id in ids {
            match self.projects.find_by_id(*id).await? {
                Some(project) => views.push(project_view(&project, Some(viewer))),
                None => warn!("Profile references missing project {}", id),
            }
        }
        Ok(views)
    }

    async fn view(&self, user: User, viewer: Uuid, with_watch_list: bool) -> ApiResult<ProfileView> {
        let own_projects = self.expand(&user.own_projects, viewer).await?;
        let watch_list = if with_watch_list {
            Some(self.expand(&user.watch_list, viewer).await?)
        } else {
            None
        };

        Ok(ProfileView {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            title: user.title,
            about: user.about,
            offer: user.offer,
            contacts: user.contacts,
            profile_picture_url: user.profile_picture_url,
            profile_picture_public_id: user.profile_picture_public_id,
            profile_cover_picture_url: user.profile_cover_picture_url,
            profile_cover_picture_public_id: user.profile_cover_picture_public_id,
            own_projects,
            watch_list,
            participating_projects: user.participating_projects,
            applied_projects: user.applied_projects,
            created_at: user.created_at,
            updated_at: user.updated_at,
        })
    }

    pub async fn own_profile(&self, principal: Uuid) -> ApiResult<ProfileView> {
        let user = self.load(principal).await?;
        self.view(user, principal, true).await
    }

    pub async fn user_profile(&self, user_id: Uuid, viewer: Uuid) -> ApiResult<ProfileView> {
        let user = self.load(user_id).await?;
        self.view(user, viewer, false).await
    }

    /// Update the caller's profile from a raw JSON body
    pub async fn update_own_profile(&self, principal: Uuid, body: Value) -> ApiResult<ProfileView> {
        validation::reject_credential_keys(&body).map_err(ApiError::BadRequest)?;
        let patch: ProfilePatch =
            serde_json::from_value(body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
        validation::validate_profile_patch(&patch).map_err(ApiError::BadRequest)?;

        let user = self
            .users
            .update_profile(principal, &patch)
            .await?
            .ok_or_else(|| ApiError::not_found("The user is not found"))?;

        info!("Profile of user {} updated", principal);
        self.view(user, principal, true).await
    }
}
