//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use curious_dog_core::domain::Actor;
use std::sync::Arc;
use tracing::warn;

use crate::web::{auth::session_token, error::HttpError, state::AppState};

/// Middleware that validates the session token and resolves the acting user.
///
/// If valid, inserts an [`Actor`] into the request extensions; handlers take it
/// with `Extension<Actor>` and pass it on to the service explicitly.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = session_token(req.headers()) else {
        return HttpError::Unauthorized("Authentication required".to_string()).into_response();
    };

    let user_id = match state.accounts.validate_auth_session(token).await {
        Ok(user_id) => user_id,
        Err(e) => {
            warn!("Rejected auth session: {:?}", e);
            return HttpError::from(e).into_response();
        }
    };

    req.extensions_mut().insert(Actor::new(user_id));
    next.run(req).await
}
