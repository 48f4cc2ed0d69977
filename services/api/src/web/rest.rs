//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification, plus the JSON payloads
//! shared by the REST handlers. Field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use curious_dog_core::domain::{Question, QuestionView, User, UserProfile};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
        crate::web::users::get_me_handler,
        crate::web::users::update_me_handler,
        crate::web::users::get_user_handler,
        crate::web::questions::create_question_handler,
        crate::web::questions::answer_question_handler,
        crate::web::questions::list_questions_handler,
        crate::web::questions::list_my_questions_handler,
    ),
    components(
        schemas(
            crate::web::auth::SignupRequest,
            crate::web::auth::LoginRequest,
            AuthResponse,
            UserResponse,
            ProfileResponse,
            UpdateUserRequest,
            CreateQuestionRequest,
            AnswerQuestionRequest,
            QuestionResponse,
            QuestionViewResponse,
        )
    ),
    tags(
        (name = "Curious Dog API", description = "Ask users questions, anonymously or not, and browse the answers.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Request Payloads
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    pub body: String,
    pub is_anonymous: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct AnswerQuestionRequest {
    pub answer: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub profile_picture: Option<String>,
}

/// Query string of the feed endpoints. Values are kept raw so that malformed
/// pagination falls back to defaults instead of rejecting the request.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    pub limit: Option<String>,
    #[serde(alias = "PageParams", alias = "page")]
    pub page_params: Option<String>,
    pub asked: Option<String>,
}

impl FeedQuery {
    pub fn limit(&self) -> Option<i64> {
        lenient_int(self.limit.as_deref())
    }

    pub fn page(&self) -> Option<i64> {
        lenient_int(self.page_params.as_deref())
    }
}

fn lenient_int(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
}

//=========================================================================================
// Response Payloads
//=========================================================================================

#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: i64,
    pub username: String,
    pub profile_picture: Option<String>,
}

impl From<UserProfile> for ProfileResponse {
    fn from(p: UserProfile) -> Self {
        Self {
            id: p.id.0,
            username: p.username,
            profile_picture: p.profile_picture,
        }
    }
}

/// The signed-in user's own record.
#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub profile_picture: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id.0,
            username: u.username,
            email: u.email,
            profile_picture: u.profile_picture,
            created_at: u.created_at,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct AuthResponse {
    pub user: UserResponse,
    /// Session token, also set as the `session` cookie. May be sent as a bearer token.
    pub token: String,
}

/// A question as returned to its asker right after creation.
#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    pub id: i64,
    pub body: String,
    pub is_anonymous: bool,
    pub asker_id: i64,
    pub receiver_id: i64,
    pub answer: Option<String>,
    pub created_at: DateTime<Utc>,
    pub answered_at: Option<DateTime<Utc>>,
}

impl From<Question> for QuestionResponse {
    fn from(q: Question) -> Self {
        Self {
            id: q.id.0,
            body: q.body,
            is_anonymous: q.is_anonymous,
            asker_id: q.asker_id.0,
            receiver_id: q.receiver_id.0,
            answer: q.answer,
            created_at: q.created_at,
            answered_at: q.answered_at,
        }
    }
}

/// A question as shown in feeds. `askerId` and `asker` are omitted for anonymous
/// questions unless the reader asked it.
#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct QuestionViewResponse {
    pub id: i64,
    pub body: String,
    pub is_anonymous: bool,
    pub answer: Option<String>,
    pub created_at: DateTime<Utc>,
    pub answered_at: Option<DateTime<Utc>>,
    pub receiver_id: i64,
    pub receiver: Option<ProfileResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asker_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asker: Option<ProfileResponse>,
}

impl From<QuestionView> for QuestionViewResponse {
    fn from(v: QuestionView) -> Self {
        Self {
            id: v.id.0,
            body: v.body,
            is_anonymous: v.is_anonymous,
            answer: v.answer,
            created_at: v.created_at,
            answered_at: v.answered_at,
            receiver_id: v.receiver_id.0,
            receiver: v.receiver.map(Into::into),
            asker_id: v.asker_id.map(|id| id.0),
            asker: v.asker.map(Into::into),
        }
    }
}
