pub mod auth;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod questions;
pub mod rest;
pub mod state;
pub mod users;

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

use crate::web::{
    auth::{login_handler, logout_handler, signup_handler},
    middleware::require_auth,
    questions::{
        answer_question_handler, create_question_handler, list_my_questions_handler,
        list_questions_handler,
    },
    state::AppState,
    users::{get_me_handler, get_user_handler, update_me_handler},
};

async fn health_handler() -> &'static str {
    "ok"
}

/// Builds the API router. Transport concerns such as CORS and the Swagger UI are
/// layered on by the binary.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/questions", get(list_questions_handler))
        .route("/users/{user_id}", get(get_user_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/users/me", get(get_me_handler).patch(update_me_handler))
        .route("/users/me/questions", get(list_my_questions_handler))
        .route("/users/{user_id}/questions", post(create_question_handler))
        .route(
            "/questions/{question_id}/answer",
            patch(answer_question_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state)
}
