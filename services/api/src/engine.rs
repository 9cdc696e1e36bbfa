//! Domain engines
//!
//! Every engine receives its repository handles at construction and returns
//! `ApiResult`s that the HTTP layer maps straight to responses.

pub mod likes;
pub mod membership;
pub mod profiles;
pub mod projects;
pub mod reconcile;
pub mod search;
pub mod visibility;

pub use likes::LikeEngine;
pub use membership::MembershipEngine;
pub use profiles::{ProfileService, ProfileView};
pub use projects::ProjectService;
pub use reconcile::{ReconcileReport, Reconciler};
pub use search::{SearchEngine, SuggestionCache};
pub use visibility::{ProjectView, project_view};
