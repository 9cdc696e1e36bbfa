//! Search query parameters and paginated responses

use serde::{Deserialize, Serialize};

use crate::engine::visibility::ProjectView;

/// Query parameters for project listing and search
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    /// Free-text query; absent or empty lists every project
    pub search: Option<String>,
    /// Page number (1-based)
    pub page: Option<u32>,
    /// Number of items per page
    pub limit: Option<u32>,
}

/// Query parameters for word suggestions
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestionQuery {
    pub q: Option<String>,
}

/// A project in a result page, with the query words it does not contain
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItem {
    #[serde(flatten)]
    pub project: ProjectView,
    pub missing_words: Vec<String>,
}

/// One page of projects
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub items: Vec<SearchItem>,
    /// Items on this page
    pub count: usize,
    /// Matching projects across all pages
    pub total: u64,
    pub total_pages: u64,
    pub page: u32,
    pub limit: u32,
}
