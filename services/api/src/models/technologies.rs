//! Technology tags attached to a project, grouped in seven fixed categories

use serde::{Deserialize, Serialize};

/// One of the seven technology categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TechCategory {
    Frontend,
    Backend,
    Design,
    ProjectManagement,
    DevOps,
    QualityAssurance,
    Database,
}

impl TechCategory {
    pub const ALL: [TechCategory; 7] = [
        TechCategory::Frontend,
        TechCategory::Backend,
        TechCategory::Design,
        TechCategory::ProjectManagement,
        TechCategory::DevOps,
        TechCategory::QualityAssurance,
        TechCategory::Database,
    ];

    /// JSON key of the category
    pub fn key(&self) -> &'static str {
        match self {
            TechCategory::Frontend => "frontend",
            TechCategory::Backend => "backend",
            TechCategory::Design => "design",
            TechCategory::ProjectManagement => "projectManagement",
            TechCategory::DevOps => "devOps",
            TechCategory::QualityAssurance => "qualityAssurance",
            TechCategory::Database => "database",
        }
    }

    /// Tags accepted for the category
    pub fn catalog(&self) -> &'static [&'static str] {
        match self {
            TechCategory::Frontend => &[
                "HTML/CSS",
                "JavaScript",
                "TypeScript",
                "React",
                "Angular",
                "Vue.js",
                "Svelte",
                "Next.js",
                "Redux",
                "Bootstrap",
                "Tailwind CSS",
                "SASS/LESS",
            ],
            TechCategory::Backend => &[
                "Node.js",
                "Express.js",
                "Django",
                "Ruby on Rails",
                "Java",
                "PHP Laravel",
                "Kotlin",
                "Go",
                "C#",
            ],
            TechCategory::Design => &[
                "Adobe XD",
                "Sketch",
                "Figma",
                "InVision",
                "Photoshop",
                "Illustrator",
            ],
            TechCategory::ProjectManagement => &["Jira", "Trello", "Asana", "Confluence", "Linear"],
            TechCategory::DevOps => &[
                "Docker",
                "AWS",
                "Azure",
                "GCP",
                "Jenkins",
                "GitHub Actions",
                "GitLab CI/CD",
            ],
            TechCategory::QualityAssurance => &[
                "Selenium", "Jest", "Mocha", "Chai", "Cypress", "Postman", "JMeter",
            ],
            TechCategory::Database => &[
                "SQL",
                "NoSQL",
                "PostgreSQL",
                "MySQL",
                "SQLite",
                "MongoDB",
                "Cassandra",
            ],
        }
    }
}

/// Technology tags per category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Technologies {
    pub frontend: Vec<String>,
    pub backend: Vec<String>,
    pub design: Vec<String>,
    pub project_management: Vec<String>,
    pub dev_ops: Vec<String>,
    pub quality_assurance: Vec<String>,
    pub database: Vec<String>,
}

impl Technologies {
    pub fn category(&self, category: TechCategory) -> &[String] {
        match category {
            TechCategory::Frontend => &self.frontend,
            TechCategory::Backend => &self.backend,
            TechCategory::Design => &self.design,
            TechCategory::ProjectManagement => &self.project_management,
            TechCategory::DevOps => &self.dev_ops,
            TechCategory::QualityAssurance => &self.quality_assurance,
            TechCategory::Database => &self.database,
        }
    }

    fn category_mut(&mut self, category: TechCategory) -> &mut Vec<String> {
        match category {
            TechCategory::Frontend => &mut self.frontend,
            TechCategory::Backend => &mut self.backend,
            TechCategory::Design => &mut self.design,
            TechCategory::ProjectManagement => &mut self.project_management,
            TechCategory::DevOps => &mut self.dev_ops,
            TechCategory::QualityAssurance => &mut self.quality_assurance,
            TechCategory::Database => &mut self.database,
        }
    }

    /// All tags, flattened in category order
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        TechCategory::ALL
            .into_iter()
            .flat_map(move |category| self.category(category).iter().map(String::as_str))
    }

    /// Check every tag against its category catalog
    pub fn validate(&self) -> Result<(), String> {
        for category in TechCategory::ALL {
            validate_tags(category, self.category(category))?;
        }
        Ok(())
    }

    /// Drop repeated tags inside each category, keeping the first occurrence
    pub fn dedup(&mut self) {
        for category in TechCategory::ALL {
            let tags = self.category_mut(category);
            let mut seen = Vec::with_capacity(tags.len());
            tags.retain(|tag| {
                if seen.contains(tag) {
                    false
                } else {
                    seen.push(tag.clone());
                    true
                }
            });
        }
    }

    /// Replace the categories present in `patch`, leaving the others untouched
    pub fn merge(&mut self, patch: &TechnologiesPatch) {
        for category in TechCategory::ALL {
            if let Some(tags) = patch.category(category) {
                *self.category_mut(category) = tags.to_vec();
            }
        }
        self.dedup();
    }
}

/// Per-category replacement of technology tags
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TechnologiesPatch {
    pub frontend: Option<Vec<String>>,
    pub backend: Option<Vec<String>>,
    pub design: Option<Vec<String>>,
    pub project_management: Option<Vec<String>>,
    pub dev_ops: Option<Vec<String>>,
    pub quality_assurance: Option<Vec<String>>,
    pub database: Option<Vec<String>>,
}

impl TechnologiesPatch {
    pub fn category(&self, category: TechCategory) -> Option<&[String]> {
        let tags = match category {
            TechCategory::Frontend => &self.frontend,
            TechCategory::Backend => &self.backend,
            TechCategory::Design => &self.design,
            TechCategory::ProjectManagement => &self.project_management,
            TechCategory::DevOps => &self.dev_ops,
            TechCategory::QualityAssurance => &self.quality_assurance,
            TechCategory::Database => &self.database,
        };
        tags.as_deref()
    }

    pub fn validate(&self) -> Result<(), String> {
        for category in TechCategory::ALL {
            if let Some(tags) = self.category(category) {
                validate_tags(category, tags)?;
            }
        }
        Ok(())
    }
}

fn validate_tags(category: TechCategory, tags: &[String]) -> Result<(), String> {
    let catalog = category.catalog();
    match tags.iter().find(|tag| !catalog.contains(&tag.as_str())) {
        Some(tag) => Err(format!("Invalid {} technology: {}", category.key(), tag)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_category_keys_match_serde_names() {
        let mut technologies = Technologies::default();
        technologies.dev_ops = tags(&["Docker"]);
        technologies.project_management = tags(&["Jira"]);
        technologies.quality_assurance = tags(&["Jest"]);

        let value = serde_json::to_value(&technologies).unwrap();
        for category in TechCategory::ALL {
            assert!(value.get(category.key()).is_some(), "{}", category.key());
        }
        assert_eq!(value["devOps"][0], "Docker");
    }

    #[test]
    fn test_validate_rejects_tag_from_another_category() {
        let mut technologies = Technologies::default();
        technologies.frontend = tags(&["React", "Django"]);

        let err = technologies.validate().unwrap_err();
        assert_eq!(err, "Invalid frontend technology: Django");
    }

    #[test]
    fn test_merge_replaces_only_provided_categories() {
        let mut technologies = Technologies::default();
        technologies.frontend = tags(&["React"]);
        technologies.backend = tags(&["Go"]);

        let patch = TechnologiesPatch {
            backend: Some(tags(&["Kotlin", "Kotlin", "Java"])),
            ..Default::default()
        };
        technologies.merge(&patch);

        assert_eq!(technologies.frontend, tags(&["React"]));
        assert_eq!(technologies.backend, tags(&["Kotlin", "Java"]));
    }

    #[test]
    fn test_tags_are_flattened_in_category_order() {
        let mut technologies = Technologies::default();
        technologies.database = tags(&["SQLite"]);
        technologies.frontend = tags(&["Svelte"]);

        let flat: Vec<&str> = technologies.tags().collect();
        assert_eq!(flat, vec!["Svelte", "SQLite"]);
    }
}
