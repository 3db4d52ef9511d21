//! Profile endpoints backed by the user-storage collaborator.
//!
//! - GET `/me` - Fetch the authenticated user's profile
//! - PUT `/me` - Update the authenticated user's display name
//!
//! Both resolve the caller through the read-only current-user resolver; the
//! gate has already run, so no rotation happens here.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};

use super::ApiState;
use super::error::{ApiError, ResultExt};
use crate::db::UserRole;
use crate::user::CurrentUser;

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/me", get(me).put(update_name))
        .with_state(state)
}

#[derive(Serialize)]
struct ProfileResponse {
    email: String,
    name: String,
    role: UserRole,
}

async fn me(
    State(state): State<ApiState>,
    CurrentUser(subject): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .users()
        .find_by_email(&subject)
        .await
        .db_err("Failed to get user")?
        .ok_or_else(|| ApiError::not_found("Not found"))?;

    Ok((
        StatusCode::OK,
        Json(ProfileResponse {
            email: user.email,
            name: user.name,
            role: user.role,
        }),
    ))
}

#[derive(Deserialize)]
struct UpdateNameRequest {
    name: String,
}

async fn update_name(
    State(state): State<ApiState>,
    CurrentUser(subject): CurrentUser,
    Json(payload): Json<UpdateNameRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }

    let updated = state
        .db
        .users()
        .update_name(&subject, name)
        .await
        .db_err("Failed to update name")?;
    if !updated {
        return Err(ApiError::not_found("Not found"));
    }

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "success": true, "name": name })),
    ))
}
