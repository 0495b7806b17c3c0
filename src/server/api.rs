//! HTTP route handlers

use crate::server::app::AppState;
use crate::server::error::ApiError;
use crate::server::extract::{ApiJson, AuthUser};
use crate::storage::{Note, NoteId, User};
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Body of note create/update; absent fields become empty strings
#[derive(Debug, Deserialize)]
pub struct NoteInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let username = req.username.trim();
    let email = req.email.trim();

    if username.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest(
            "username, email and password are required".to_string(),
        ));
    }

    let user = state
        .credentials
        .register(username, email, &req.password)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let token = state.sessions.login(req.email.trim(), &req.password).await?;

    Ok(Json(LoginResponse {
        token: token.to_string(),
        expires_at: token.expires_at(),
    }))
}

pub async fn list_notes(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Note>>, ApiError> {
    let notes = state.notes.list_for_owner(user_id).await?;
    Ok(Json(notes))
}

pub async fn create_note(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NoteInput>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    let note = state
        .notes
        .create(user_id, &input.title, &input.content)
        .await?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn update_note(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    id: Result<Path<NoteId>, PathRejection>,
    ApiJson(input): ApiJson<NoteInput>,
) -> Result<Json<Note>, ApiError> {
    let Path(id) = id?;
    let note = state
        .notes
        .update(id, user_id, &input.title, &input.content)
        .await?;
    Ok(Json(note))
}

pub async fn delete_note(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    id: Result<Path<NoteId>, PathRejection>,
) -> Result<Json<Note>, ApiError> {
    let Path(id) = id?;
    let note = state.notes.delete(id, user_id).await?;
    Ok(Json(note))
}

pub async fn health() -> &'static str {
    "ok"
}
