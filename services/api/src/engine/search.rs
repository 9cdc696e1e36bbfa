//! Project search, ranking and word suggestions

use common::cache::RedisPool;
use regex::Regex;
use std::{
    collections::BTreeSet,
    sync::{Arc, OnceLock},
};
use tracing::{debug, warn};
use uuid::Uuid;

use super::visibility::project_view;
use crate::{
    error::ApiResult,
    models::{Project, SearchItem, SearchPage, SearchQuery},
    repositories::ProjectRepository,
    validation::tokenize_query,
};

/// Query tokens whose lowercase form does not occur in the project's
/// searchable text, kept as typed
pub fn missing_words(tokens: &[String], project: &Project) -> Vec<String> {
    let text = project.searchable_text().to_lowercase();
    tokens
        .iter()
        .filter(|token| !text.contains(&token.to_lowercase()))
        .cloned()
        .collect()
}

pub fn total_pages(total: u64, limit: u32) -> u64 {
    total.div_ceil(u64::from(limit.max(1)))
}

fn split_words(text: &str) -> impl Iterator<Item = &str> {
    static WORD_SEPARATOR_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = WORD_SEPARATOR_REGEX.get_or_init(|| {
        Regex::new(r"[^A-Za-z0-9_]+").expect("Failed to compile word separator regex")
    });

    regex.split(text).filter(|word| !word.is_empty())
}

/// Lowercase words of `projects` that contain `needle`
fn suggestion_words(projects: &[Project], needle: &str) -> Vec<String> {
    let mut words = BTreeSet::new();
    for project in projects {
        let fields = [project.title.as_str(), project.description.as_str()]
            .into_iter()
            .chain(project.technologies.tags())
            .chain(project.roles_needed.iter().map(|role| role.as_str()));

        for field in fields {
            for word in split_words(field) {
                let word = word.to_lowercase();
                if word.contains(needle) {
                    words.insert(word);
                }
            }
        }
    }
    words.into_iter().collect()
}

/// Redis-backed cache of suggestion results.
///
/// Failures only cost a recomputation.
#[derive(Clone)]
pub struct SuggestionCache {
    redis: RedisPool,
    ttl_seconds: u64,
}

impl SuggestionCache {
    pub fn new(redis: RedisPool, ttl_seconds: u64) -> Self {
        Self { redis, ttl_seconds }
    }

    fn key(needle: &str) -> String {
        format!("suggestions:{}", needle)
    }

    async fn get(&self, needle: &str) -> Option<Vec<String>> {
        match self.redis.get_json(&Self::key(needle)).await {
            Ok(words) => words,
            Err(e) => {
                warn!("Suggestion cache read failed: {:#}", e);
                None
            }
        }
    }

    async fn put(&self, needle: &str, words: &[String]) {
        if let Err(e) = self
            .redis
            .set_json(&Self::key(needle), words, Some(self.ttl_seconds))
            .await
        {
            warn!("Suggestion cache write failed: {:#}", e);
        }
    }
}

/// Free-text search over the project catalog
#[derive(Clone)]
pub struct SearchEngine {
    projects: Arc<dyn ProjectRepository>,
    cache: Option<SuggestionCache>,
    default_page_size: u32,
    max_page_size: u32,
}

impl SearchEngine {
    pub fn new(projects: Arc<dyn ProjectRepository>, default_page_size: u32, max_page_size: u32) -> Self {
        let max_page_size = max_page_size.max(1);
        Self {
            projects,
            cache: None,
            default_page_size: default_page_size.clamp(1, max_page_size),
            max_page_size,
        }
    }

    pub fn with_cache(mut self, cache: SuggestionCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// One page of projects, ranked when the query has terms.
    ///
    /// Without terms every project is listed in store order and no item has
    /// missing words.
    pub async fn search(&self, query: &SearchQuery, principal: Option<Uuid>) -> ApiResult<SearchPage> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query
            .limit
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size);
        let skip = u64::from(page - 1) * u64::from(limit);
        let tokens = query
            .search
            .as_deref()
            .map(tokenize_query)
            .unwrap_or_default();

        let (items, total) = if tokens.is_empty() {
            let projects = self.projects.find_page(skip, u64::from(limit)).await?;
            let total = self.projects.count().await?;
            let items = projects
                .iter()
                .map(|project| SearchItem {
                    project: project_view(project, principal),
                    missing_words: Vec::new(),
                })
                .collect::<Vec<_>>();
            (items, total)
        } else {
            let scored = self
                .projects
                .text_search(&tokens, skip, u64::from(limit))
                .await?;
            let total = self.projects.count_text_matches(&tokens).await?;
            let items = scored
                .iter()
                .map(|hit| SearchItem {
                    project: project_view(&hit.project, principal),
                    missing_words: missing_words(&tokens, &hit.project),
                })
                .collect::<Vec<_>>();
            (items, total)
        };

        debug!(
            "Search {:?} page {} returned {} of {} projects",
            tokens,
            page,
            items.len(),
            total
        );

        Ok(SearchPage {
            count: items.len(),
            items,
            total,
            total_pages: total_pages(total, limit),
            page,
            limit,
        })
    }

    /// Words from matching projects that contain `q`, lowercased and unique
    pub async fn suggest(&self, q: Option<&str>) -> ApiResult<Vec<String>> {
        let Some(q) = q.filter(|q| !q.is_empty()) else {
            return Ok(Vec::new());
        };
        let needle = q.to_lowercase();

        if let Some(cache) = &self.cache {
            if let Some(words) = cache.get(&needle).await {
                debug!("Suggestion cache hit for '{}'", needle);
                return Ok(words);
            }
        }

        let projects = self.projects.find_containing(q).await?;
        let words = suggestion_words(&projects, &needle);

        if let Some(cache) = &self.cache {
            cache.put(&needle, &words).await;
        }

        Ok(words)
    }
}
