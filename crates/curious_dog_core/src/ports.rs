//! crates/curious_dog_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    NewQuestion, Question, QuestionId, User, UserCredentials, UserId, UserProfile, UserUpdate,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Read-only view of the user directory used by the question core.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn exists(&self, user_id: UserId) -> PortResult<bool>;

    /// Fails with `NotFound` when the user does not exist.
    async fn get_profile(&self, user_id: UserId) -> PortResult<UserProfile>;
}

/// Account management used by registration, login and profile updates.
#[async_trait]
pub trait AccountStore: Send + Sync {
    // --- User Management ---
    /// Fails with `Conflict` when the username or email is already taken.
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    async fn get_user_by_id(&self, user_id: UserId) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn update_user(&self, user_id: UserId, update: UserUpdate) -> PortResult<User>;

    // --- Auth Sessions ---
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Resolves a session id to its user. Unknown or expired sessions yield `Unauthorized`.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<UserId>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;
}

/// Which questions a page query selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionFilter {
    /// Every answered question, across all users.
    Answered,
    AskedBy(UserId),
    ReceivedBy(UserId),
}

impl QuestionFilter {
    pub fn matches(&self, question: &Question) -> bool {
        match self {
            QuestionFilter::Answered => question.is_answered(),
            QuestionFilter::AskedBy(id) => question.asker_id == *id,
            QuestionFilter::ReceivedBy(id) => question.receiver_id == *id,
        }
    }
}

/// Durable storage of questions.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    async fn insert(&self, question: NewQuestion) -> PortResult<Question>;

    async fn find_by_id(&self, question_id: QuestionId) -> PortResult<Option<Question>>;

    /// Sets the answer only if the question is still unanswered, as one atomic step.
    ///
    /// Returns `None` when no unanswered question with this id exists.
    async fn update_answer(
        &self,
        question_id: QuestionId,
        answer: &str,
    ) -> PortResult<Option<Question>>;

    /// Returns up to `limit` matching questions after skipping `offset`,
    /// newest first (`created_at` descending, then id descending).
    async fn query_page(
        &self,
        filter: QuestionFilter,
        offset: u64,
        limit: u32,
    ) -> PortResult<Vec<Question>>;
}
