//! crates/curious_dog_core/src/memory.rs
//!
//! An in-process implementation of every port, backed by a single mutex.
//! Used by the test suites and by the API when no database is configured.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::domain::{
    AuthSession, NewQuestion, Question, QuestionId, User, UserCredentials, UserId, UserProfile,
    UserUpdate,
};
use crate::ports::{
    AccountStore, PortError, PortResult, QuestionFilter, QuestionStore, UserDirectory,
};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, (User, String)>,
    sessions: HashMap<String, AuthSession>,
    questions: Vec<Question>,
    next_user_id: i64,
    next_question_id: i64,
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn exists(&self, user_id: UserId) -> PortResult<bool> {
        Ok(self.tables.lock().await.users.contains_key(&user_id))
    }

    async fn get_profile(&self, user_id: UserId) -> PortResult<UserProfile> {
        self.tables
            .lock()
            .await
            .users
            .get(&user_id)
            .map(|(user, _)| user.profile())
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let mut tables = self.tables.lock().await;
        let taken = tables
            .users
            .values()
            .any(|(u, _)| u.username == username || u.email == email);
        if taken {
            return Err(PortError::Conflict(
                "username or email is already registered".to_string(),
            ));
        }
        tables.next_user_id += 1;
        let user = User {
            id: UserId(tables.next_user_id),
            username: username.to_string(),
            email: email.to_string(),
            profile_picture: None,
            created_at: Utc::now(),
        };
        tables
            .users
            .insert(user.id, (user.clone(), hashed_password.to_string()));
        Ok(user)
    }

    async fn get_user_by_id(&self, user_id: UserId) -> PortResult<User> {
        self.tables
            .lock()
            .await
            .users
            .get(&user_id)
            .map(|(user, _)| user.clone())
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.tables
            .lock()
            .await
            .users
            .values()
            .find(|(u, _)| u.email == email)
            .map(|(u, hash)| UserCredentials {
                user_id: u.id,
                email: u.email.clone(),
                hashed_password: hash.clone(),
            })
            .ok_or_else(|| PortError::NotFound(format!("User with email {} not found", email)))
    }

    async fn update_user(&self, user_id: UserId, update: UserUpdate) -> PortResult<User> {
        let mut tables = self.tables.lock().await;
        let (user, _) = tables
            .users
            .get_mut(&user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
        if let Some(picture) = update.profile_picture {
            user.profile_picture = Some(picture);
        }
        Ok(user.clone())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let session = AuthSession {
            id: session_id.to_string(),
            user_id,
            expires_at,
        };
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        tables.sessions.retain(|_, s| s.expires_at > now);
        tables.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<UserId> {
        let mut tables = self.tables.lock().await;
        let found = tables
            .sessions
            .get(session_id)
            .map(|s| (s.user_id, s.expires_at));
        match found {
            Some((user_id, expires_at)) if expires_at > Utc::now() => Ok(user_id),
            Some(_) => {
                tables.sessions.remove(session_id);
                Err(PortError::Unauthorized)
            }
            None => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.tables.lock().await.sessions.remove(session_id);
        Ok(())
    }
}

#[async_trait]
impl QuestionStore for InMemoryStore {
    async fn insert(&self, question: NewQuestion) -> PortResult<Question> {
        let mut tables = self.tables.lock().await;
        tables.next_question_id += 1;
        let stored = Question {
            id: QuestionId(tables.next_question_id),
            body: question.body,
            is_anonymous: question.is_anonymous,
            asker_id: question.asker_id,
            receiver_id: question.receiver_id,
            answer: None,
            created_at: question.created_at,
            answered_at: None,
        };
        tables.questions.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, question_id: QuestionId) -> PortResult<Option<Question>> {
        Ok(self
            .tables
            .lock()
            .await
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .cloned())
    }

    async fn update_answer(
        &self,
        question_id: QuestionId,
        answer: &str,
    ) -> PortResult<Option<Question>> {
        let mut tables = self.tables.lock().await;
        let question = tables
            .questions
            .iter_mut()
            .find(|q| q.id == question_id && q.answer.is_none());
        Ok(question.map(|q| {
            q.answer = Some(answer.to_string());
            q.answered_at = Some(Utc::now());
            q.clone()
        }))
    }

    async fn query_page(
        &self,
        filter: QuestionFilter,
        offset: u64,
        limit: u32,
    ) -> PortResult<Vec<Question>> {
        let tables = self.tables.lock().await;
        let mut matching: Vec<&Question> =
            tables.questions.iter().filter(|q| filter.matches(q)).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        Ok(matching
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}
