//! Project creation, retrieval, editing and cascading deletion

use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::visibility::{ProjectView, project_view};
use crate::{
    assets::AssetStore,
    error::{ApiError, ApiResult},
    models::{CreateProjectRequest, NewProject, Project, ProjectPatch},
    repositories::Repositories,
    validation,
};

#[derive(Clone)]
pub struct ProjectService {
    repos: Repositories,
    assets: Arc<dyn AssetStore>,
}

impl ProjectService {
    pub fn new(repos: Repositories, assets: Arc<dyn AssetStore>) -> Self {
        Self { repos, assets }
    }

    /// Load a project the acting user created
    async fn owned_project(&self, id: Uuid, acting_user_id: Uuid, action: &str) -> ApiResult<Project> {
        let project = self
            .repos
            .projects
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Project not found"))?;

        if !project.is_creator(acting_user_id) {
            return Err(ApiError::forbidden(format!(
                "You do not have permission to {} this project.",
                action
            )));
        }
        Ok(project)
    }

    pub async fn create(&self, creator_id: Uuid, request: CreateProjectRequest) -> ApiResult<Project> {
        validation::validate_create_project(&request).map_err(ApiError::BadRequest)?;
        if self.repos.users.find_by_id(creator_id).await?.is_none() {
            return Err(ApiError::not_found("User not found"));
        }

        let project = self
            .repos
            .projects
            .create(&NewProject::from_request(request, creator_id))
            .await?;

        if let Err(e) = self.repos.users.add_own_project(creator_id, project.id).await {
            error!(
                "Failed to link project {} to its creator {}: {}",
                project.id, creator_id, e
            );
            if let Err(e) = self.repos.projects.delete(project.id).await {
                error!("Failed to roll back project {}: {}", project.id, e);
            }
            return Err(ApiError::InternalServerError);
        }

        info!("Project {} created by user {}", project.id, creator_id);
        Ok(project)
    }

    pub async fn get(&self, id: Uuid, principal: Option<Uuid>) -> ApiResult<ProjectView> {
        let project = self
            .repos
            .projects
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("The project does not exist"))?;

        Ok(project_view(&project, principal))
    }

    /// Apply an allow-listed patch given as a raw JSON body
    pub async fn edit(&self, id: Uuid, acting_user_id: Uuid, body: Value) -> ApiResult<Project> {
        let mut project = self.owned_project(id, acting_user_id, "edit").await?;

        validation::reject_protected_project_keys(&body).map_err(ApiError::BadRequest)?;
        let patch: ProjectPatch =
            serde_json::from_value(body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
        validation::validate_project_patch(&patch).map_err(ApiError::BadRequest)?;

        patch.apply(&mut project);
        let updated = self
            .repos
            .projects
            .update_details(&project)
            .await?
            .ok_or_else(|| ApiError::not_found("Project not found"))?;

        info!("Project {} edited by user {}", id, acting_user_id);
        Ok(updated)
    }

    /// Delete a project with its likes, user references and uploaded assets
    pub async fn delete(&self, id: Uuid, acting_user_id: Uuid) -> ApiResult<()> {
        let project = self.owned_project(id, acting_user_id, "delete").await?;

        let likes = self.repos.likes.delete_for_project(id).await?;
        let users = self.repos.users.remove_project_references(id).await?;
        self.repos.projects.delete(id).await?;

        for public_id in project.pictures.uploaded_asset_ids() {
            if let Err(e) = self.assets.destroy(public_id).await {
                warn!("Failed to destroy asset {} of project {}: {}", public_id, id, e);
            }
        }

        info!(
            "Project {} deleted by user {} ({} likes, {} users unlinked)",
            id, acting_user_id, likes, users
        );
        Ok(())
    }
}
