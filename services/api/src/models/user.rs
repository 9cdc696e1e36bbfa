//! User profile documents and their project links

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::role::Role;

pub const DEFAULT_PROFILE_PICTURE_URL: &str = "https://res.cloudinary.com/dqhoyu7rj/image/upload/v1713736654/Default_Images/default_profile.jpg";
pub const DEFAULT_PROFILE_PICTURE_PUBLIC_ID: &str = "default_profile_image";
pub const DEFAULT_PROFILE_COVER_PICTURE_URL: &str = "https://res.cloudinary.com/dqhoyu7rj/image/upload/v1713736654/Default_Images/default_profile_cover.jpg";
pub const DEFAULT_PROFILE_COVER_PICTURE_PUBLIC_ID: &str = "default_profile_cover_image";

/// A project a user applied to or participates in, with the role involved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMembership {
    pub project_id: Uuid,
    pub role: Role,
}

/// User document
///
/// Credentials live in the same table but are never selected into this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
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
    pub watch_list: Vec<Uuid>,
    pub own_projects: Vec<Uuid>,
    pub participating_projects: Vec<ProjectMembership>,
    pub applied_projects: Vec<ProjectMembership>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn links(&self) -> UserLinks {
        UserLinks {
            own_projects: self.own_projects.clone(),
            watch_list: self.watch_list.clone(),
            applied_projects: self.applied_projects.clone(),
            participating_projects: self.participating_projects.clone(),
        }
    }
}

/// Identity fields for a user created by the auth collaborator
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// The derived project references held on a user document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserLinks {
    pub own_projects: Vec<Uuid>,
    pub watch_list: Vec<Uuid>,
    pub applied_projects: Vec<ProjectMembership>,
    pub participating_projects: Vec<ProjectMembership>,
}

impl UserLinks {
    /// Same references regardless of their order
    pub fn same_as(&self, other: &UserLinks) -> bool {
        fn sorted<T: Clone + Ord>(items: &[T]) -> Vec<T> {
            let mut items = items.to_vec();
            items.sort();
            items
        }
        fn memberships(items: &[ProjectMembership]) -> Vec<(Uuid, Role)> {
            sorted(
                &items
                    .iter()
                    .map(|m| (m.project_id, m.role))
                    .collect::<Vec<_>>(),
            )
        }

        sorted(&self.own_projects) == sorted(&other.own_projects)
            && sorted(&self.watch_list) == sorted(&other.watch_list)
            && memberships(&self.applied_projects) == memberships(&other.applied_projects)
            && memberships(&self.participating_projects)
                == memberships(&other.participating_projects)
    }
}

/// Allow-listed profile fields a user may change on their own profile
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub title: Option<String>,
    pub about: Option<String>,
    pub offer: Option<String>,
    pub contacts: Option<BTreeMap<String, String>>,
}

impl ProfilePatch {
    pub fn apply(&self, user: &mut User) {
        if let Some(first_name) = &self.first_name {
            user.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = &self.last_name {
            user.last_name = last_name.trim().to_string();
        }
        if let Some(title) = &self.title {
            user.title = Some(title.trim().to_string());
        }
        if let Some(about) = &self.about {
            user.about = Some(about.trim().to_string());
        }
        if let Some(offer) = &self.offer {
            user.offer = Some(offer.trim().to_string());
        }
        if let Some(contacts) = &self.contacts {
            user.contacts = contacts.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_comparison_ignores_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let left = UserLinks {
            own_projects: vec![a, b],
            applied_projects: vec![
                ProjectMembership {
                    project_id: a,
                    role: Role::Mentor,
                },
                ProjectMembership {
                    project_id: b,
                    role: Role::TeamLead,
                },
            ],
            ..Default::default()
        };
        let mut right = left.clone();
        right.own_projects.reverse();
        right.applied_projects.reverse();

        assert!(left.same_as(&right));

        right.watch_list.push(a);
        assert!(!left.same_as(&right));
    }

    #[test]
    fn test_profile_patch_rejects_credentials() {
        let result: Result<ProfilePatch, _> =
            serde_json::from_value(serde_json::json!({ "password": "hunter2" }));
        assert!(result.is_err());
    }
}
