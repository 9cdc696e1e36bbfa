//! Input validation utilities

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::models::{CreateProjectRequest, ProfilePatch, ProjectPatch, Role};

/// Keys a profile update may never carry
pub const CREDENTIAL_KEYS: [&str; 3] = ["email", "password", "passwordResetToken"];

/// Project keys that only the workflow engines may change
pub const PROTECTED_PROJECT_KEYS: [&str; 8] = [
    "id",
    "likeCount",
    "createdBy",
    "applicants",
    "participants",
    "createdAt",
    "updatedAt",
    "_id",
];

/// Split a free-text query into its non-empty terms
pub fn tokenize_query(query: &str) -> Vec<String> {
    static SEPARATOR_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = SEPARATOR_REGEX
        .get_or_init(|| Regex::new(r"[\s,.;+]+").expect("Failed to compile separator regex"));

    regex
        .split(query)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Validate project title
pub fn validate_title(title: &str) -> Result<(), String> {
    let title = title.trim();
    if title.is_empty() {
        return Err("Title is required".to_string());
    }

    let length = title.chars().count();
    if length < 3 {
        return Err("Title must be at least 3 characters long".to_string());
    }

    if length > 100 {
        return Err("The project title cannot exceed 100 characters".to_string());
    }

    Ok(())
}

/// Validate project description
pub fn validate_description(description: &str) -> Result<(), String> {
    let description = description.trim();
    if description.is_empty() {
        return Err("Description is required".to_string());
    }

    let length = description.chars().count();
    if length < 20 {
        return Err("Description must be at least 20 characters long".to_string());
    }

    if length > 700 {
        return Err("The project description cannot exceed 700 characters".to_string());
    }

    Ok(())
}

/// Validate the roles a project is looking for
pub fn validate_roles_needed(roles: &[Role]) -> Result<(), String> {
    if roles.is_empty() {
        return Err("At least one role is needed".to_string());
    }

    Ok(())
}

/// Validate a first or last name
pub fn validate_name(field: &str, name: &str) -> Result<(), String> {
    let length = name.trim().chars().count();
    if !(2..=30).contains(&length) {
        return Err(format!("{} must be between 2 and 30 characters long", field));
    }

    Ok(())
}

/// Validate a project creation request
pub fn validate_create_project(request: &CreateProjectRequest) -> Result<(), String> {
    validate_title(&request.title)?;
    validate_description(&request.description)?;
    validate_roles_needed(&request.roles_needed)?;
    request.technologies.validate()
}

/// Validate a project patch
pub fn validate_project_patch(patch: &ProjectPatch) -> Result<(), String> {
    if let Some(title) = &patch.title {
        validate_title(title)?;
    }
    if let Some(description) = &patch.description {
        validate_description(description)?;
    }
    if let Some(roles) = &patch.roles_needed {
        validate_roles_needed(roles)?;
    }
    if let Some(technologies) = &patch.technologies {
        technologies.validate()?;
    }

    Ok(())
}

/// Validate a profile patch
pub fn validate_profile_patch(patch: &ProfilePatch) -> Result<(), String> {
    if let Some(first_name) = &patch.first_name {
        validate_name("First name", first_name)?;
    }
    if let Some(last_name) = &patch.last_name {
        validate_name("Last name", last_name)?;
    }

    Ok(())
}

/// Reject protected keys before the body reaches its allow-listed patch type
pub fn reject_protected_project_keys(body: &Value) -> Result<(), String> {
    match first_key_in(body, &PROTECTED_PROJECT_KEYS) {
        Some(key) => Err(format!("The field '{}' cannot be updated", key)),
        None => Ok(()),
    }
}

/// Reject credential keys in a profile update
pub fn reject_credential_keys(body: &Value) -> Result<(), String> {
    match first_key_in(body, &CREDENTIAL_KEYS) {
        Some(_) => Err(
            "Direct updates to email, password, or password reset token are not allowed through this endpoint."
                .to_string(),
        ),
        None => Ok(()),
    }
}

fn first_key_in<'a>(body: &'a Value, keys: &[&str]) -> Option<&'a str> {
    body.as_object()?
        .keys()
        .find(|key| keys.contains(&key.as_str()))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tokenize_query() {
        assert_eq!(
            tokenize_query("react, node.js;go+rust  ai"),
            vec!["react", "node", "js", "go", "rust", "ai"]
        );
        assert!(tokenize_query(" ,.;+ ").is_empty());
        assert!(tokenize_query("").is_empty());
    }

    #[test]
    fn test_validate_title() {
        assert!(validate_title("Ok").is_err());
        assert!(validate_title("   ").is_err());
        assert!(validate_title("App").is_ok());
        assert!(validate_title(&"x".repeat(100)).is_ok());
        assert!(validate_title(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_description() {
        assert!(validate_description("too short").is_err());
        assert!(validate_description("exactly twenty chars").is_ok());
        assert!(validate_description(&"d".repeat(701)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("First name", "A").is_err());
        assert!(validate_name("First name", "Al").is_ok());
        assert!(validate_name("Last name", &"n".repeat(31)).is_err());
    }

    #[test]
    fn test_reject_protected_project_keys() {
        assert!(reject_protected_project_keys(&json!({ "title": "New title" })).is_ok());

        let err = reject_protected_project_keys(&json!({ "title": "x", "likeCount": 5 }))
            .unwrap_err();
        assert_eq!(err, "The field 'likeCount' cannot be updated");
    }

    #[test]
    fn test_reject_credential_keys() {
        assert!(reject_credential_keys(&json!({ "about": "hi" })).is_ok());
        assert!(reject_credential_keys(&json!({ "password": "secret" })).is_err());
        assert!(reject_credential_keys(&json!({ "passwordResetToken": "t" })).is_err());
    }
}
