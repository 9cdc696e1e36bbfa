//! Caller-dependent projection of project documents

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{
    Applicant, Participant, Project, ProjectPictures, ProjectStatus, Role, Technologies,
};

/// A project as returned to one caller.
///
/// `created_by` and `participants` are only present for signed-in callers,
/// `applicants` only for the creator. Absent fields are left out of the JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: ProjectStatus,
    pub technologies: Technologies,
    pub roles_needed: Vec<Role>,
    pub like_count: i64,
    #[serde(flatten)]
    pub pictures: ProjectPictures,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participants: Option<Vec<Participant>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicants: Option<Vec<Applicant>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn project_view(project: &Project, principal: Option<Uuid>) -> ProjectView {
    let signed_in = principal.is_some();
    let is_creator = principal.is_some_and(|id| project.is_creator(id));

    ProjectView {
        id: project.id,
        title: project.title.clone(),
        description: project.description.clone(),
        status: project.status,
        technologies: project.technologies.clone(),
        roles_needed: project.roles_needed.clone(),
        like_count: project.like_count,
        pictures: project.pictures.clone(),
        created_by: signed_in.then_some(project.created_by),
        participants: signed_in.then(|| project.participants.clone()),
        applicants: is_creator.then(|| project.applicants.clone()),
        created_at: project.created_at,
        updated_at: project.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_with_members(creator: Uuid) -> Project {
        Project {
            id: Uuid::new_v4(),
            title: "Garden Share".to_string(),
            description: "Lend tools and swap seeds with your neighbours".to_string(),
            status: ProjectStatus::InProgress,
            technologies: Technologies::default(),
            roles_needed: vec![Role::Mentor],
            like_count: 3,
            applicants: vec![Applicant {
                application_id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                role: Role::Mentor,
            }],
            participants: vec![Participant {
                user_id: Uuid::new_v4(),
                role: Role::TeamLead,
            }],
            pictures: ProjectPictures::default(),
            created_by: creator,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_anonymous_view_hides_membership() {
        let project = project_with_members(Uuid::new_v4());
        let value = serde_json::to_value(project_view(&project, None)).unwrap();

        assert!(value.get("createdBy").is_none());
        assert!(value.get("participants").is_none());
        assert!(value.get("applicants").is_none());
        assert_eq!(value["likeCount"], 3);
        assert_eq!(value["title"], "Garden Share");
    }

    #[test]
    fn test_signed_in_view_shows_participants_only() {
        let project = project_with_members(Uuid::new_v4());
        let value = serde_json::to_value(project_view(&project, Some(Uuid::new_v4()))).unwrap();

        assert!(value.get("createdBy").is_some());
        assert_eq!(value["participants"].as_array().unwrap().len(), 1);
        assert!(value.get("applicants").is_none());
    }

    #[test]
    fn test_creator_view_shows_applicants() {
        let creator = Uuid::new_v4();
        let project = project_with_members(creator);
        let value = serde_json::to_value(project_view(&project, Some(creator))).unwrap();

        assert_eq!(value["applicants"].as_array().unwrap().len(), 1);
        assert_eq!(value["createdBy"], creator.to_string());
    }
}
