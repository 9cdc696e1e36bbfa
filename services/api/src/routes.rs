//! API service routes

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    engine::project_view,
    error::ApiError,
    middleware::{AuthUser, resolve_principal},
    models::{
        ApplicationResponse, ApplyRequest, CreateProjectRequest, MessageResponse, SearchQuery,
        SuggestionQuery,
    },
    state::AppState,
};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/projects", get(list_projects).post(create_project))
        .route("/projects/suggestions", get(suggest_words))
        .route(
            "/projects/:id",
            get(get_project).patch(edit_project).delete(delete_project),
        )
        .route("/projects/:id/like", patch(toggle_like))
        .route("/projects/:id/apply", post(apply_to_project))
        .route(
            "/projects/:id/approve/:application_id",
            post(approve_application),
        )
        .route(
            "/projects/:id/reject/:application_id",
            post(reject_application),
        )
        .route(
            "/projects/:id/participants/:participant_id",
            delete(remove_participant),
        )
        .route(
            "/profiles/myProfile",
            get(get_own_profile).patch(update_own_profile),
        )
        .route("/profiles/:user_id", get(get_user_profile))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            resolve_principal,
        ))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "api-service"
    }))
}

/// Search or list projects, one page at a time
pub async fn list_projects(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let page = state.search.search(&query, user.map(|u| u.id)).await?;
    Ok(Json(page))
}

/// Words from the catalog containing `q`
pub async fn suggest_words(
    State(state): State<AppState>,
    query: Result<Query<SuggestionQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let words = state.search.suggest(query.q.as_deref()).await?;
    Ok(Json(words))
}

/// Create a project owned by the caller
pub async fn create_project(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let project = state.projects.create(user.id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "project": project_view(&project, Some(user.id)) })),
    ))
}

/// Get a project by ID
pub async fn get_project(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    user: Option<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = path?;
    let project = state.projects.get(id, user.map(|u| u.id)).await?;
    Ok(Json(json!({ "project": project })))
}

/// Edit a project the caller created
pub async fn edit_project(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    user: AuthUser,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = path?;
    let Json(body) = payload?;
    let project = state.projects.edit(id, user.id, body).await?;

    Ok(Json(json!({ "project": project_view(&project, Some(user.id)) })))
}

/// Delete a project the caller created
pub async fn delete_project(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = path?;
    state.projects.delete(id, user.id).await?;
    Ok(Json(MessageResponse::new("Project successfully deleted")))
}

/// Like or unlike a project
pub async fn toggle_like(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = path?;
    let toggle = state.likes.toggle(id, user.id).await?;
    Ok(Json(toggle))
}

/// Apply to a project for one role
pub async fn apply_to_project(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    user: AuthUser,
    payload: Result<Json<ApplyRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = path?;
    let Json(request) = payload?;
    let applicant = state.membership.apply(id, user.id, request.role).await?;

    Ok(Json(ApplicationResponse {
        message: "Application submitted".to_string(),
        application_id: applicant.application_id,
    }))
}

/// Accept an application; creator only
pub async fn approve_application(
    State(state): State<AppState>,
    path: Result<Path<(Uuid, Uuid)>, PathRejection>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let Path((id, application_id)) = path?;
    let project = state.membership.approve(id, application_id, user.id).await?;
    Ok(Json(json!({ "project": project_view(&project, Some(user.id)) })))
}

/// Decline an application, or withdraw one's own
pub async fn reject_application(
    State(state): State<AppState>,
    path: Result<Path<(Uuid, Uuid)>, PathRejection>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let Path((id, application_id)) = path?;
    let project = state.membership.reject(id, application_id, user.id).await?;
    Ok(Json(json!({ "project": project_view(&project, Some(user.id)) })))
}

/// Remove a participant; creator only
pub async fn remove_participant(
    State(state): State<AppState>,
    path: Result<Path<(Uuid, Uuid)>, PathRejection>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let Path((id, participant_id)) = path?;
    let project = state
        .membership
        .remove_participant(id, participant_id, user.id)
        .await?;
    Ok(Json(json!({ "project": project_view(&project, Some(user.id)) })))
}

/// The caller's profile, watch list included
pub async fn get_own_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state.profiles.own_profile(user.id).await?;
    Ok(Json(json!({ "profile": profile })))
}

/// Update allow-listed fields of the caller's profile
pub async fn update_own_profile(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload?;
    let profile = state.profiles.update_own_profile(user.id, body).await?;
    Ok(Json(json!({ "profile": profile })))
}

/// Another user's profile, without their watch list
pub async fn get_user_profile(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let Path(user_id) = path?;
    let profile = state.profiles.user_profile(user_id, user.id).await?;
    Ok(Json(json!({ "profile": profile })))
}
