//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup, login, and logout.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use curious_dog_core::{domain::UserId, validation, PortError};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::{
    error::HttpError,
    extract::ApiJson,
    rest::{AuthResponse, UserResponse},
    state::AppState,
};

const SESSION_COOKIE: &str = "session";

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

//=========================================================================================
// Session helpers
//=========================================================================================

/// Reads the session token from the `session` cookie, or from an
/// `Authorization: Bearer` header.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    let from_cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|c| {
                c.trim()
                    .strip_prefix(SESSION_COOKIE)
                    .and_then(|rest| rest.strip_prefix('='))
            })
        })
        .filter(|token| !token.is_empty());

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
    })
}

fn session_cookie(token: &str, ttl: Duration) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        token,
        ttl.num_seconds()
    )
}

/// Opens a login session for `user_id` and returns its token.
async fn start_session(state: &AppState, user_id: UserId) -> Result<(String, Duration), HttpError> {
    let ttl = Duration::days(state.config.session_ttl_days);
    let token = Uuid::new_v4().to_string();
    state
        .accounts
        .create_auth_session(&token, user_id, Utc::now() + ttl)
        .await
        .map_err(|e| {
            error!("Failed to create auth session: {:?}", e);
            HttpError::from(e)
        })?;
    Ok((token, ttl))
}

fn hash_password(password: &str) -> Result<String, HttpError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| HttpError::Internal(format!("Failed to hash password: {}", e)))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new user account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Username or email already registered"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let email = normalize_email(&req.email);
    validation::username(&req.username)?;
    validation::email(&email)?;
    validation::password(&req.password)?;

    // 1. Hash the password
    let password_hash = hash_password(&req.password)?;

    // 2. Create user in database
    let user = state
        .accounts
        .create_user(&req.username, &email, &password_hash)
        .await?;
    info!("Registered user {}", user.id);

    // 3. Open a session and hand it back as cookie and token
    let (token, ttl) = start_session(&state, user.id).await?;
    let response = AuthResponse {
        user: UserResponse::from(user),
        token: token.clone(),
    };

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, session_cookie(&token, ttl))],
        Json(response),
    ))
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let invalid = || HttpError::Unauthorized("Invalid email or password".to_string());

    // 1. Get user by email
    let user_creds = state
        .accounts
        .get_user_by_email(&normalize_email(&req.email))
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => invalid(),
            other => other.into(),
        })?;

    // 2. Verify password
    let parsed_hash = PasswordHash::new(&user_creds.hashed_password)
        .map_err(|e| HttpError::Internal(format!("Failed to parse password hash: {}", e)))?;
    let valid = Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_ok();
    if !valid {
        return Err(invalid());
    }

    // 3. Open a session
    let user = state.accounts.get_user_by_id(user_creds.user_id).await?;
    let (token, ttl) = start_session(&state, user.id).await?;
    info!("User {} logged in", user.id);

    let response = AuthResponse {
        user: UserResponse::from(user),
        token: token.clone(),
    };

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie(&token, ttl))],
        Json(response),
    ))
}

/// POST /auth/logout - Logout and invalidate session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpError> {
    let token = session_token(&headers)
        .ok_or_else(|| HttpError::Unauthorized("No session found".to_string()))?;

    state.accounts.delete_auth_session(token).await?;

    let cookie = session_cookie("", Duration::zero());
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn token_from_cookie_or_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session=abc-123"),
        );
        assert_eq!(session_token(&headers), Some("abc-123"));

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer xyz"),
        );
        assert_eq!(session_token(&headers), Some("xyz"));

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("sessionx=nope"));
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("correct horse").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default()
            .verify_password(b"correct horse", &parsed)
            .is_ok());
        assert!(Argon2::default()
            .verify_password(b"wrong horse", &parsed)
            .is_err());
    }
}
