//! Application state shared across handlers

use std::sync::Arc;

use crate::{
    assets::AssetStore,
    config::AppConfig,
    engine::{
        LikeEngine, MembershipEngine, ProfileService, ProjectService, SearchEngine,
        SuggestionCache,
    },
    middleware::JwtVerifier,
    repositories::Repositories,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub jwt: Option<Arc<JwtVerifier>>,
    pub search: SearchEngine,
    pub projects: ProjectService,
    pub membership: MembershipEngine,
    pub likes: LikeEngine,
    pub profiles: ProfileService,
}

impl AppState {
    /// Wire every engine to the same repositories
    pub fn new(
        config: &AppConfig,
        repos: Repositories,
        assets: Arc<dyn AssetStore>,
        cache: Option<SuggestionCache>,
        jwt: Option<JwtVerifier>,
    ) -> Self {
        let mut search = SearchEngine::new(
            repos.projects.clone(),
            config.default_page_size,
            config.max_page_size,
        );
        if let Some(cache) = cache {
            search = search.with_cache(cache);
        }

        Self {
            jwt: jwt.map(Arc::new),
            search,
            projects: ProjectService::new(repos.clone(), assets),
            membership: MembershipEngine::new(repos.projects.clone(), repos.users.clone()),
            likes: LikeEngine::new(
                repos.projects.clone(),
                repos.users.clone(),
                repos.likes.clone(),
            ),
            profiles: ProfileService::new(repos.projects, repos.users),
        }
    }
}
