//! Crewboard API service
//!
//! REST backend for a project-collaboration board: project search and
//! suggestions, the apply/approve workflow between creators and members,
//! likes and watch lists, and user profiles.

pub mod assets;
pub mod config;
pub mod engine;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod validation;

pub use routes::create_router;
pub use state::AppState;
