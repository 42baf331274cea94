use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::OwnedMutexGuard;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::dashboard::{Dashboard, DashboardState, DashboardView};
use crate::errors::AppError;
use crate::models::note::NoteRow;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AddVideoRequest {
    pub input: String,
}

#[derive(Deserialize)]
pub struct SaveEditRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize)]
pub struct AddNoteRequest {
    pub title: String,
    pub content: String,
    /// Comma-separated.
    #[serde(default)]
    pub tags: String,
}

#[derive(Deserialize)]
pub struct PostCommentRequest {
    pub text: String,
}

#[derive(Deserialize)]
pub struct NotesQuery {
    pub q: Option<String>,
}

/// Locks the caller's dashboard, creating and loading it on first use.
async fn open(state: &AppState, user: &AuthUser) -> Result<OwnedMutexGuard<Dashboard>, AppError> {
    let shared = state.dashboards.get_or_insert_with(&user.access_token, || {
        Dashboard::new(
            state.store.clone(),
            state.transport.clone(),
            state
                .events
                .for_user(Some(user.user_id), user.user_agent.as_deref()),
            Some(user.access_token.clone()),
        )
    });
    let mut dashboard = shared.lock_owned().await;
    if *dashboard.state() == DashboardState::Loading {
        dashboard.load().await?;
    }
    Ok(dashboard)
}

/// GET /api/v1/dashboard
pub async fn handle_get_dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<DashboardView>, AppError> {
    let mut dashboard = open(&state, &user).await?;
    Ok(Json(dashboard.view()))
}

/// POST /api/v1/dashboard/videos
pub async fn handle_add_video(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<AddVideoRequest>,
) -> Result<Json<DashboardView>, AppError> {
    let mut dashboard = open(&state, &user).await?;
    dashboard.add_video(&req.input).await?;
    Ok(Json(dashboard.view()))
}

/// POST /api/v1/dashboard/videos/:id/select
pub async fn handle_select_video(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DashboardView>, AppError> {
    let mut dashboard = open(&state, &user).await?;
    dashboard.select_video(id).await?;
    Ok(Json(dashboard.view()))
}

/// POST /api/v1/dashboard/refresh
pub async fn handle_refresh(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<DashboardView>, AppError> {
    let mut dashboard = open(&state, &user).await?;
    dashboard.refresh().await?;
    Ok(Json(dashboard.view()))
}

/// POST /api/v1/dashboard/edit
pub async fn handle_begin_edit(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<DashboardView>, AppError> {
    let mut dashboard = open(&state, &user).await?;
    dashboard.begin_edit()?;
    Ok(Json(dashboard.view()))
}

/// PUT /api/v1/dashboard/edit
pub async fn handle_save_edit(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<SaveEditRequest>,
) -> Result<Json<DashboardView>, AppError> {
    let mut dashboard = open(&state, &user).await?;
    dashboard.save_edit(&req.title, &req.description).await?;
    Ok(Json(dashboard.view()))
}

/// DELETE /api/v1/dashboard/edit
pub async fn handle_cancel_edit(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<DashboardView>, AppError> {
    let mut dashboard = open(&state, &user).await?;
    dashboard.cancel_edit();
    Ok(Json(dashboard.view()))
}

/// GET /api/v1/dashboard/notes?q=
pub async fn handle_list_notes(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<NotesQuery>,
) -> Result<Json<Vec<NoteRow>>, AppError> {
    let dashboard = open(&state, &user).await?;
    let query = params.q.unwrap_or_default();
    let notes = dashboard
        .filtered_notes(&query)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(notes))
}

/// POST /api/v1/dashboard/notes
pub async fn handle_add_note(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<AddNoteRequest>,
) -> Result<Json<DashboardView>, AppError> {
    let mut dashboard = open(&state, &user).await?;
    dashboard.add_note(&req.title, &req.content, &req.tags).await?;
    Ok(Json(dashboard.view()))
}

/// DELETE /api/v1/dashboard/notes/:id
pub async fn handle_delete_note(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DashboardView>, AppError> {
    let mut dashboard = open(&state, &user).await?;
    dashboard.delete_note(id).await?;
    Ok(Json(dashboard.view()))
}

/// POST /api/v1/dashboard/comments
pub async fn handle_post_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<PostCommentRequest>,
) -> Result<Json<DashboardView>, AppError> {
    let mut dashboard = open(&state, &user).await?;
    dashboard.post_comment(&req.text).await?;
    Ok(Json(dashboard.view()))
}

/// DELETE /api/v1/dashboard/comments/:id
pub async fn handle_delete_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DashboardView>, AppError> {
    let mut dashboard = open(&state, &user).await?;
    dashboard.delete_comment(&id).await?;
    Ok(Json(dashboard.view()))
}

/// POST /api/v1/dashboard/sign-out
/// Drops the in-memory dashboard. The store session itself is left alone.
pub async fn handle_sign_out(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<StatusCode, AppError> {
    match state.dashboards.remove(&user.access_token) {
        Some(shared) => shared.lock().await.sign_out().await,
        None => {
            state
                .events
                .for_user(Some(user.user_id), user.user_agent.as_deref())
                .log_user_action("signed_out", json!({}))
                .await
        }
    }
    info!(user_id = %user.user_id, "Dashboard session closed");
    Ok(StatusCode::NO_CONTENT)
}
