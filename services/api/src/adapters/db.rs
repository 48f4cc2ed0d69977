//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the concrete implementation of the
//! `UserDirectory`, `AccountStore` and `QuestionStore` ports from the core crate.
//! It handles all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use curious_dog_core::domain::{
    NewQuestion, Question, QuestionId, User, UserCredentials, UserId, UserProfile, UserUpdate,
};
use curious_dog_core::ports::{
    AccountStore, PortError, PortResult, QuestionFilter, QuestionStore, UserDirectory,
};
use sqlx::{FromRow, PgPool};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the storage ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const USER_COLUMNS: &str = "id, username, email, profile_picture, created_at";
const QUESTION_COLUMNS: &str =
    "id, body, is_anonymous, asker_id, receiver_id, answer, created_at, answered_at";

#[derive(FromRow)]
struct UserRecord {
    id: i64,
    username: String,
    email: String,
    profile_picture: Option<String>,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: UserId(self.id),
            username: self.username,
            email: self.email,
            profile_picture: self.profile_picture,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: i64,
    email: String,
    hashed_password: String,
}

#[derive(FromRow)]
struct QuestionRecord {
    id: i64,
    body: String,
    is_anonymous: bool,
    asker_id: i64,
    receiver_id: i64,
    answer: Option<String>,
    created_at: DateTime<Utc>,
    answered_at: Option<DateTime<Utc>>,
}
impl QuestionRecord {
    fn to_domain(self) -> Question {
        Question {
            id: QuestionId(self.id),
            body: self.body,
            is_anonymous: self.is_anonymous,
            asker_id: UserId(self.asker_id),
            receiver_id: UserId(self.receiver_id),
            answer: self.answer,
            created_at: self.created_at,
            answered_at: self.answered_at,
        }
    }
}

//=========================================================================================
// `UserDirectory` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserDirectory for DbAdapter {
    async fn exists(&self, user_id: UserId) -> PortResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id.0)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)
    }

    async fn get_profile(&self, user_id: UserId) -> PortResult<UserProfile> {
        Ok(self.get_user_by_id(user_id).await?.profile())
    }
}

//=========================================================================================
// `AccountStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl AccountStore for DbAdapter {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let sql = format!(
            "INSERT INTO users (username, email, hashed_password) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(username)
            .bind(email)
            .bind(hashed_password)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    PortError::Conflict("username or email is already registered".to_string())
                }
                _ => unexpected(e),
            })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_id(&self, user_id: UserId) -> PortResult<User> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user_id.0)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
                _ => unexpected(e),
            })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("User with email {} not found", email))
            }
            _ => unexpected(e),
        })?;
        Ok(UserCredentials {
            user_id: UserId(record.id),
            email: record.email,
            hashed_password: record.hashed_password,
        })
    }

    async fn update_user(&self, user_id: UserId, update: UserUpdate) -> PortResult<User> {
        let sql = format!(
            "UPDATE users SET profile_picture = COALESCE($2, profile_picture) WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user_id.0)
            .bind(update.profile_picture)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
                _ => unexpected(e),
            })?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id.0)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<UserId> {
        let user_id = sqlx::query_scalar::<_, i64>(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or(PortError::Unauthorized)?;
        Ok(UserId(user_id))
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}

//=========================================================================================
// `QuestionStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl QuestionStore for DbAdapter {
    async fn insert(&self, question: NewQuestion) -> PortResult<Question> {
        let sql = format!(
            "INSERT INTO questions (body, is_anonymous, asker_id, receiver_id, created_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            QUESTION_COLUMNS
        );
        let record = sqlx::query_as::<_, QuestionRecord>(&sql)
            .bind(question.body)
            .bind(question.is_anonymous)
            .bind(question.asker_id.0)
            .bind(question.receiver_id.0)
            .bind(question.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                    PortError::NotFound("asker or receiver does not exist".to_string())
                }
                _ => unexpected(e),
            })?;
        Ok(record.to_domain())
    }

    async fn find_by_id(&self, question_id: QuestionId) -> PortResult<Option<Question>> {
        let sql = format!("SELECT {} FROM questions WHERE id = $1", QUESTION_COLUMNS);
        let record = sqlx::query_as::<_, QuestionRecord>(&sql)
            .bind(question_id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(record.map(QuestionRecord::to_domain))
    }

    async fn update_answer(
        &self,
        question_id: QuestionId,
        answer: &str,
    ) -> PortResult<Option<Question>> {
        // Guarded by `answer IS NULL` so that concurrent answers cannot both win.
        let sql = format!(
            "UPDATE questions SET answer = $2, answered_at = now() \
             WHERE id = $1 AND answer IS NULL RETURNING {}",
            QUESTION_COLUMNS
        );
        let record = sqlx::query_as::<_, QuestionRecord>(&sql)
            .bind(question_id.0)
            .bind(answer)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(record.map(QuestionRecord::to_domain))
    }

    async fn query_page(
        &self,
        filter: QuestionFilter,
        offset: u64,
        limit: u32,
    ) -> PortResult<Vec<Question>> {
        let (condition, user_id) = match filter {
            QuestionFilter::Answered => ("answer IS NOT NULL", None),
            QuestionFilter::AskedBy(id) => ("asker_id = $3", Some(id.0)),
            QuestionFilter::ReceivedBy(id) => ("receiver_id = $3", Some(id.0)),
        };
        let sql = format!(
            "SELECT {} FROM questions WHERE {} ORDER BY created_at DESC, id DESC OFFSET $1 LIMIT $2",
            QUESTION_COLUMNS, condition
        );
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);

        let mut query = sqlx::query_as::<_, QuestionRecord>(&sql)
            .bind(offset)
            .bind(i64::from(limit));
        if let Some(id) = user_id {
            query = query.bind(id);
        }
        let records = query.fetch_all(&self.pool).await.map_err(unexpected)?;

        Ok(records.into_iter().map(QuestionRecord::to_domain).collect())
    }
}
