//! API models for documents, request and response payloads

use serde::{Deserialize, Serialize};

pub mod like;
pub mod project;
pub mod role;
pub mod search;
pub mod technologies;
pub mod user;

pub use like::{LikeToggle, ProjectLike};
pub use project::{
    Applicant, CreateProjectRequest, NewProject, Participant, Project, ProjectPatch,
    ProjectPictures, ProjectStatus,
};
pub use role::Role;
pub use search::{SearchItem, SearchPage, SearchQuery, SuggestionQuery};
pub use technologies::{TechCategory, Technologies, TechnologiesPatch};
pub use user::{NewUser, ProfilePatch, ProjectMembership, User, UserLinks};

/// Request for applying to a project
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplyRequest {
    pub role: Role,
}

/// Confirmation of a submitted application
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationResponse {
    pub message: String,
    pub application_id: uuid::Uuid,
}

/// Plain confirmation message
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
