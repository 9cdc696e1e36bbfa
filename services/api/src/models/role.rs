//! Role catalog shared by projects, applicants and participants

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A role a project can need and a member can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Mentor")]
    Mentor,
    #[serde(rename = "Frontend Developer")]
    FrontendDeveloper,
    #[serde(rename = "Backend Developer")]
    BackendDeveloper,
    #[serde(rename = "Fullstack Developer")]
    FullstackDeveloper,
    #[serde(rename = "Team Lead")]
    TeamLead,
    #[serde(rename = "UI/UX Designer")]
    UiUxDesigner,
    #[serde(rename = "Project Manager")]
    ProjectManager,
    #[serde(rename = "DevOps Engineer")]
    DevOpsEngineer,
    #[serde(rename = "Quality Assurance Engineer")]
    QualityAssuranceEngineer,
}

impl Role {
    /// Every role, in catalog order
    pub const ALL: [Role; 9] = [
        Role::Mentor,
        Role::FrontendDeveloper,
        Role::BackendDeveloper,
        Role::FullstackDeveloper,
        Role::TeamLead,
        Role::UiUxDesigner,
        Role::ProjectManager,
        Role::DevOpsEngineer,
        Role::QualityAssuranceEngineer,
    ];

    /// Display name, identical to the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Mentor => "Mentor",
            Role::FrontendDeveloper => "Frontend Developer",
            Role::BackendDeveloper => "Backend Developer",
            Role::FullstackDeveloper => "Fullstack Developer",
            Role::TeamLead => "Team Lead",
            Role::UiUxDesigner => "UI/UX Designer",
            Role::ProjectManager => "Project Manager",
            Role::DevOpsEngineer => "DevOps Engineer",
            Role::QualityAssuranceEngineer => "Quality Assurance Engineer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("Invalid role: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_serialize_as_display_names() {
        let json = serde_json::to_string(&Role::UiUxDesigner).unwrap();
        assert_eq!(json, "\"UI/UX Designer\"");

        let role: Role = serde_json::from_str("\"Backend Developer\"").unwrap();
        assert_eq!(role, Role::BackendDeveloper);
    }

    #[test]
    fn test_from_str_matches_serialized_form() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role));
        }
        assert!("Astronaut".parse::<Role>().is_err());
    }
}
