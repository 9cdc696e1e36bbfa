//! Application and participation workflow
//!
//! A user moves from nothing to applicant, and from applicant to participant
//! or back to nothing. Each transition rewrites the project's `applicants` /
//! `participants` and the user's `appliedProjects` / `participatingProjects`.
//! The project is written first. When the user write fails the project's
//! previous members are restored before the error is returned.

use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{Applicant, Participant, Project, ProjectMembership, Role, User},
    repositories::{ProjectRepository, UserRepository},
};

const PROJECT_NOT_FOUND: &str = "Project not found";
const ROLE_TAKEN: &str = "This role is already taken.";
const NOT_PERMITTED: &str = "You do not have permission to manage this project's team.";

#[derive(Clone)]
pub struct MembershipEngine {
    projects: Arc<dyn ProjectRepository>,
    users: Arc<dyn UserRepository>,
}

fn without_project(memberships: &[ProjectMembership], project_id: Uuid) -> Vec<ProjectMembership> {
    memberships
        .iter()
        .filter(|membership| membership.project_id != project_id)
        .cloned()
        .collect()
}

fn with_project(memberships: &[ProjectMembership], project_id: Uuid, role: Role) -> Vec<ProjectMembership> {
    let mut memberships = without_project(memberships, project_id);
    memberships.push(ProjectMembership { project_id, role });
    memberships
}

impl MembershipEngine {
    pub fn new(projects: Arc<dyn ProjectRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { projects, users }
    }

    async fn load_project(&self, id: Uuid) -> ApiResult<Project> {
        self.projects
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(PROJECT_NOT_FOUND))
    }

    async fn load_user(&self, id: Uuid) -> ApiResult<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))
    }

    async fn write_project(
        &self,
        project_id: Uuid,
        applicants: &[Applicant],
        participants: &[Participant],
    ) -> ApiResult<Project> {
        self.projects
            .set_members(project_id, applicants, participants)
            .await?
            .ok_or_else(|| ApiError::not_found(PROJECT_NOT_FOUND))
    }

    /// Write the user's mirrors, restoring `before` on failure
    async fn write_user(
        &self,
        before: &Project,
        user_id: Uuid,
        applied: &[ProjectMembership],
        participating: &[ProjectMembership],
    ) -> ApiResult<()> {
        match self.users.set_memberships(user_id, applied, participating).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => {
                warn!(
                    "User {} disappeared while updating project {}; skipping its mirror",
                    user_id, before.id
                );
                Ok(())
            }
            Err(e) => {
                error!("Failed to update memberships of user {}: {}", user_id, e);
                self.compensate(before).await;
                Err(ApiError::InternalServerError)
            }
        }
    }

    async fn compensate(&self, before: &Project) {
        warn!("Restoring members of project {} after a failed user update", before.id);
        if let Err(e) = self
            .projects
            .set_members(before.id, &before.applicants, &before.participants)
            .await
        {
            error!("Failed to restore members of project {}: {}", before.id, e);
        }
    }

    /// Apply to `project_id` for `role`
    pub async fn apply(&self, project_id: Uuid, user_id: Uuid, role: Role) -> ApiResult<Applicant> {
        let project = self.load_project(project_id).await?;

        if !project.roles_needed.contains(&role) {
            return Err(ApiError::bad_request("This role is not needed for this project."));
        }
        if project.role_holder(role).is_some() {
            return Err(ApiError::bad_request(ROLE_TAKEN));
        }
        if project.has_applied(user_id) {
            return Err(ApiError::bad_request("You have already applied to this project."));
        }
        if project.participant(user_id).is_some() {
            return Err(ApiError::bad_request(
                "You are already participating in this project.",
            ));
        }
        let user = self.load_user(user_id).await?;

        let applicant = Applicant {
            application_id: Uuid::new_v4(),
            user_id,
            role,
        };
        let mut applicants = project.applicants.clone();
        applicants.push(applicant.clone());
        self.write_project(project_id, &applicants, &project.participants)
            .await?;

        let applied = with_project(&user.applied_projects, project_id, role);
        self.write_user(&project, user_id, &applied, &user.participating_projects)
            .await?;

        info!(
            "User {} applied to project {} as {}",
            user_id, project_id, role
        );
        Ok(applicant)
    }

    /// Turn an application into a participation
    pub async fn approve(
        &self,
        project_id: Uuid,
        application_id: Uuid,
        acting_user_id: Uuid,
    ) -> ApiResult<Project> {
        let project = self.load_project(project_id).await?;
        if !project.is_creator(acting_user_id) {
            return Err(ApiError::forbidden(NOT_PERMITTED));
        }

        let applicant = project
            .applicant(application_id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("Application not found"))?;
        if project.participant(applicant.user_id).is_some() {
            return Err(ApiError::bad_request(
                "This user is already participating in this project.",
            ));
        }
        if project.role_holder(applicant.role).is_some() {
            return Err(ApiError::bad_request(ROLE_TAKEN));
        }
        let user = self.load_user(applicant.user_id).await?;

        let applicants: Vec<Applicant> = project
            .applicants
            .iter()
            .filter(|a| a.application_id != application_id)
            .cloned()
            .collect();
        let mut participants = project.participants.clone();
        participants.push(Participant {
            user_id: applicant.user_id,
            role: applicant.role,
        });
        let updated = self
            .write_project(project_id, &applicants, &participants)
            .await?;

        let applied = without_project(&user.applied_projects, project_id);
        let participating = with_project(&user.participating_projects, project_id, applicant.role);
        self.write_user(&project, applicant.user_id, &applied, &participating)
            .await?;

        info!(
            "Application {} approved: user {} joined project {} as {}",
            application_id, applicant.user_id, project_id, applicant.role
        );
        Ok(updated)
    }

    /// Drop an application, by the creator or the applicant
    pub async fn reject(
        &self,
        project_id: Uuid,
        application_id: Uuid,
        acting_user_id: Uuid,
    ) -> ApiResult<Project> {
        let project = self.load_project(project_id).await?;
        let applicant = project
            .applicant(application_id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("Application not found"))?;
        if !project.is_creator(acting_user_id) && applicant.user_id != acting_user_id {
            return Err(ApiError::forbidden(NOT_PERMITTED));
        }

        let applicants: Vec<Applicant> = project
            .applicants
            .iter()
            .filter(|a| a.application_id != application_id)
            .cloned()
            .collect();
        let updated = self
            .write_project(project_id, &applicants, &project.participants)
            .await?;

        if let Some(user) = self.users.find_by_id(applicant.user_id).await? {
            let applied = without_project(&user.applied_projects, project_id);
            self.write_user(&project, user.id, &applied, &user.participating_projects)
                .await?;
        }

        info!(
            "Application {} of user {} to project {} removed",
            application_id, applicant.user_id, project_id
        );
        Ok(updated)
    }

    /// Remove a participant, freeing their role
    pub async fn remove_participant(
        &self,
        project_id: Uuid,
        participant_user_id: Uuid,
        acting_user_id: Uuid,
    ) -> ApiResult<Project> {
        let project = self.load_project(project_id).await?;
        if !project.is_creator(acting_user_id) {
            return Err(ApiError::forbidden(NOT_PERMITTED));
        }
        if project.participant(participant_user_id).is_none() {
            return Err(ApiError::not_found("Participant not found"));
        }

        let participants: Vec<Participant> = project
            .participants
            .iter()
            .filter(|p| p.user_id != participant_user_id)
            .cloned()
            .collect();
        let updated = self
            .write_project(project_id, &project.applicants, &participants)
            .await?;

        if let Some(user) = self.users.find_by_id(participant_user_id).await? {
            let participating = without_project(&user.participating_projects, project_id);
            self.write_user(&project, user.id, &user.applied_projects, &participating)
                .await?;
        }

        info!(
            "User {} removed from project {}",
            participant_user_id, project_id
        );
        Ok(updated)
    }
}
