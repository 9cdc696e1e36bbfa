//! Project documents and the payloads that create or modify them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use super::{
    role::Role,
    technologies::{Technologies, TechnologiesPatch},
};

pub const DEFAULT_PROJECT_PICTURE_URL: &str = "https://res.cloudinary.com/dqhoyu7rj/image/upload/v1713736654/Default_Images/ozh3szm1p8vh4ikxap1y.jpg";
pub const DEFAULT_PROJECT_PICTURE_PUBLIC_ID: &str = "default_project_image";
pub const DEFAULT_PROJECT_COVER_PICTURE_URL: &str = "https://res.cloudinary.com/dqhoyu7rj/image/upload/v1713736654/Default_Images/w3j0abquf5ugqslao4d3.jpg";
pub const DEFAULT_PROJECT_COVER_PICTURE_PUBLIC_ID: &str = "default_project_cover_image";

/// Lifecycle status of a project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[default]
    #[serde(rename = "Seeking Team Members")]
    SeekingTeamMembers,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::SeekingTeamMembers => "Seeking Team Members",
            ProjectStatus::InProgress => "In Progress",
            ProjectStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Seeking Team Members" => Ok(ProjectStatus::SeekingTeamMembers),
            "In Progress" => Ok(ProjectStatus::InProgress),
            "Completed" => Ok(ProjectStatus::Completed),
            other => Err(format!("Invalid project status: {}", other)),
        }
    }
}

/// A pending application of a user for one role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Applicant {
    pub application_id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
}

/// A confirmed member holding one role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub user_id: Uuid,
    pub role: Role,
}

/// Asset locators of the two project images
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPictures {
    pub project_picture_url: String,
    pub project_picture_public_id: String,
    pub project_cover_picture_url: String,
    pub project_cover_picture_public_id: String,
}

impl Default for ProjectPictures {
    fn default() -> Self {
        Self {
            project_picture_url: DEFAULT_PROJECT_PICTURE_URL.to_string(),
            project_picture_public_id: DEFAULT_PROJECT_PICTURE_PUBLIC_ID.to_string(),
            project_cover_picture_url: DEFAULT_PROJECT_COVER_PICTURE_URL.to_string(),
            project_cover_picture_public_id: DEFAULT_PROJECT_COVER_PICTURE_PUBLIC_ID.to_string(),
        }
    }
}

impl ProjectPictures {
    /// Public ids that belong to uploaded assets, skipping the shared defaults
    pub fn uploaded_asset_ids(&self) -> Vec<&str> {
        [
            self.project_picture_public_id.as_str(),
            self.project_cover_picture_public_id.as_str(),
        ]
        .into_iter()
        .filter(|id| {
            !id.is_empty()
                && *id != DEFAULT_PROJECT_PICTURE_PUBLIC_ID
                && *id != DEFAULT_PROJECT_COVER_PICTURE_PUBLIC_ID
        })
        .collect()
    }
}

/// Project document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: ProjectStatus,
    pub technologies: Technologies,
    pub roles_needed: Vec<Role>,
    pub like_count: i64,
    pub applicants: Vec<Applicant>,
    pub participants: Vec<Participant>,
    #[serde(flatten)]
    pub pictures: ProjectPictures,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn is_creator(&self, user_id: Uuid) -> bool {
        self.created_by == user_id
    }

    pub fn applicant(&self, application_id: Uuid) -> Option<&Applicant> {
        self.applicants
            .iter()
            .find(|applicant| applicant.application_id == application_id)
    }

    pub fn has_applied(&self, user_id: Uuid) -> bool {
        self.applicants
            .iter()
            .any(|applicant| applicant.user_id == user_id)
    }

    pub fn participant(&self, user_id: Uuid) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|participant| participant.user_id == user_id)
    }

    pub fn role_holder(&self, role: Role) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|participant| participant.role == role)
    }

    /// Title, description, technology tags and roles joined by spaces
    pub fn searchable_text(&self) -> String {
        let mut text = format!("{} {} ", self.title, self.description);
        text.push_str(&self.technologies.tags().collect::<Vec<_>>().join(" "));
        text.push(' ');
        text.push_str(
            &self
                .roles_needed
                .iter()
                .map(Role::as_str)
                .collect::<Vec<_>>()
                .join(" "),
        );
        text
    }
}

/// Request body for project creation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateProjectRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub technologies: Technologies,
    pub roles_needed: Vec<Role>,
}

/// Everything the store needs to insert a project
#[derive(Debug, Clone)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub status: ProjectStatus,
    pub technologies: Technologies,
    pub roles_needed: Vec<Role>,
    pub pictures: ProjectPictures,
    pub created_by: Uuid,
}

impl NewProject {
    pub fn from_request(request: CreateProjectRequest, created_by: Uuid) -> Self {
        let mut technologies = request.technologies;
        technologies.dedup();

        Self {
            title: request.title.trim().to_string(),
            description: request.description.trim().to_string(),
            status: request.status,
            technologies,
            roles_needed: dedup_roles(request.roles_needed),
            pictures: ProjectPictures::default(),
            created_by,
        }
    }
}

/// Allow-listed fields a creator may change
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub technologies: Option<TechnologiesPatch>,
    pub roles_needed: Option<Vec<Role>>,
}

impl ProjectPatch {
    /// Merge the patch into `project`; technologies are merged per category
    pub fn apply(&self, project: &mut Project) {
        if let Some(title) = &self.title {
            project.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            project.description = description.trim().to_string();
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(technologies) = &self.technologies {
            project.technologies.merge(technologies);
        }
        if let Some(roles) = &self.roles_needed {
            project.roles_needed = dedup_roles(roles.clone());
        }
    }
}

fn dedup_roles(roles: Vec<Role>) -> Vec<Role> {
    let mut unique = Vec::with_capacity(roles.len());
    for role in roles {
        if !unique.contains(&role) {
            unique.push(role);
        }
    }
    unique
}
