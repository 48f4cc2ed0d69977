//! services/api/src/web/questions.rs
//!
//! Thin handlers over the question service: they pull identities and fields
//! out of the request and hand them to `QuestionService` unchanged.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use curious_dog_core::domain::{Actor, PageRequest, QuestionId, UserId};
use std::sync::Arc;

use crate::web::{
    error::HttpError,
    extract::{ApiJson, ApiPath},
    rest::{
        AnswerQuestionRequest, CreateQuestionRequest, FeedQuery, QuestionResponse,
        QuestionViewResponse,
    },
    state::AppState,
};

fn page_of(query: &FeedQuery) -> PageRequest {
    PageRequest::from_raw(query.limit(), query.page())
}

/// Ask a user a question, optionally anonymously.
#[utoipa::path(
    post,
    path = "/users/{user_id}/questions",
    params(("user_id" = i64, Path, description = "The receiver's id")),
    request_body = CreateQuestionRequest,
    responses(
        (status = 201, description = "Question created", body = QuestionResponse),
        (status = 400, description = "Invalid body"),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "Receiver not found")
    )
)]
pub async fn create_question_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    ApiPath(receiver_id): ApiPath<i64>,
    ApiJson(req): ApiJson<CreateQuestionRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let question = state
        .questions
        .create_question(actor, UserId(receiver_id), &req.body, req.is_anonymous)
        .await?;
    Ok((StatusCode::CREATED, Json(QuestionResponse::from(question))))
}

/// Answer a question addressed to the signed-in user.
#[utoipa::path(
    patch,
    path = "/questions/{question_id}/answer",
    params(("question_id" = i64, Path, description = "The question's id")),
    request_body = AnswerQuestionRequest,
    responses(
        (status = 200, description = "Question answered", body = QuestionViewResponse),
        (status = 400, description = "Invalid answer"),
        (status = 403, description = "Not the receiver of this question"),
        (status = 404, description = "Question not found"),
        (status = 409, description = "Question already answered")
    )
)]
pub async fn answer_question_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    ApiPath(question_id): ApiPath<i64>,
    ApiJson(req): ApiJson<AnswerQuestionRequest>,
) -> Result<Json<QuestionViewResponse>, HttpError> {
    let view = state
        .questions
        .answer_question(actor, QuestionId(question_id), &req.answer)
        .await?;
    Ok(Json(view.into()))
}

/// The public feed of answered questions, newest first.
#[utoipa::path(
    get,
    path = "/questions",
    params(
        ("limit" = Option<String>, Query, description = "Page size, defaults to 10"),
        ("pageParams" = Option<String>, Query, description = "Zero-based page number")
    ),
    responses(
        (status = 200, description = "One page of the feed", body = [QuestionViewResponse])
    )
)]
pub async fn list_questions_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<QuestionViewResponse>>, HttpError> {
    let views = state.questions.get_questions(page_of(&query)).await?;
    Ok(Json(views.into_iter().map(Into::into).collect()))
}

/// Questions the signed-in user asked (`asked=true`) or received (`asked=false`).
#[utoipa::path(
    get,
    path = "/users/me/questions",
    params(
        ("asked" = String, Query, description = "\"true\" for asked, \"false\" for received"),
        ("limit" = Option<String>, Query, description = "Page size, defaults to 10"),
        ("pageParams" = Option<String>, Query, description = "Zero-based page number")
    ),
    responses(
        (status = 200, description = "One page of the user's questions", body = [QuestionViewResponse]),
        (status = 400, description = "Unknown 'asked' value"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn list_my_questions_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<QuestionViewResponse>>, HttpError> {
    let views = state
        .questions
        .get_current_user_questions(actor, query.asked.as_deref(), page_of(&query))
        .await?;
    Ok(Json(views.into_iter().map(Into::into).collect()))
}
