//! services/api/src/web/users.rs
//!
//! Handlers for reading and updating user records.

use axum::{
    extract::State,
    response::Json,
    Extension,
};
use curious_dog_core::{
    domain::{Actor, UserId, UserUpdate},
    validation,
};
use std::sync::Arc;
use tracing::info;

use crate::web::{
    error::HttpError,
    extract::{ApiJson, ApiPath},
    rest::{ProfileResponse, UpdateUserRequest, UserResponse},
    state::AppState,
};

/// The signed-in user's own record.
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn get_me_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<UserResponse>, HttpError> {
    let user = state.accounts.get_user_by_id(actor.user_id).await?;
    Ok(Json(user.into()))
}

/// Update the signed-in user's profile picture.
///
/// The picture itself is hosted elsewhere; this records its URL.
#[utoipa::path(
    patch,
    path = "/users/me",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Invalid picture URL"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn update_me_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, HttpError> {
    if let Some(url) = req.profile_picture.as_deref() {
        validation::picture_url(url)?;
    }
    let update = UserUpdate {
        profile_picture: req.profile_picture,
    };
    let user = state.accounts.update_user(actor.user_id, update).await?;
    info!("User {} updated their profile", user.id);
    Ok(Json(user.into()))
}

/// A user's public profile.
#[utoipa::path(
    get,
    path = "/users/{user_id}",
    params(("user_id" = i64, Path, description = "The user's id")),
    responses(
        (status = 200, description = "Public profile", body = ProfileResponse),
        (status = 404, description = "No such user")
    )
)]
pub async fn get_user_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<Json<ProfileResponse>, HttpError> {
    let user = state.accounts.get_user_by_id(UserId(user_id)).await?;
    Ok(Json(user.profile().into()))
}
