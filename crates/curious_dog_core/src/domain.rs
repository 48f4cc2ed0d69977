//! crates/curious_dog_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

use crate::validation::ValidationError;

//=========================================================================================
// Identifiers
//=========================================================================================

/// Identifier of a registered user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a question, assigned by the question store at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuestionId(pub i64);

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//=========================================================================================
// Users
//=========================================================================================

/// Represents a registered user - used throughout the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub profile_picture: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            profile_picture: self.profile_picture.clone(),
        }
    }
}

/// The public projection of a user, safe to show to any reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub profile_picture: Option<String>,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: UserId,
    pub email: String,
    pub hashed_password: String,
}

/// Fields a user may change on their own record. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub profile_picture: Option<String>,
}

// Represents a login session (cookie or bearer token)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

/// The authenticated identity behind a single request.
///
/// Produced by the authentication layer and handed explicitly to every service
/// call that acts on behalf of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
}

impl Actor {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

//=========================================================================================
// Questions
//=========================================================================================

/// A question as stored: the asker is always recorded, even for anonymous questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: QuestionId,
    pub body: String,
    pub is_anonymous: bool,
    pub asker_id: UserId,
    pub receiver_id: UserId,
    pub answer: Option<String>,
    pub created_at: DateTime<Utc>,
    pub answered_at: Option<DateTime<Utc>>,
}

impl Question {
    pub fn is_answered(&self) -> bool {
        self.answer.is_some()
    }

    /// Whether `viewer` may learn who asked this question.
    pub fn asker_visible_to(&self, viewer: Option<UserId>) -> bool {
        !self.is_anonymous || viewer == Some(self.asker_id)
    }
}

/// The data needed to persist a new question.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub body: String,
    pub is_anonymous: bool,
    pub asker_id: UserId,
    pub receiver_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// A question as shown to a particular reader.
///
/// `asker_id` and `asker` are `None` whenever the reader is not allowed to know
/// who asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub id: QuestionId,
    pub body: String,
    pub is_anonymous: bool,
    pub answer: Option<String>,
    pub created_at: DateTime<Utc>,
    pub answered_at: Option<DateTime<Utc>>,
    pub receiver_id: UserId,
    pub receiver: Option<UserProfile>,
    pub asker_id: Option<UserId>,
    pub asker: Option<UserProfile>,
}

//=========================================================================================
// Feeds and pagination
//=========================================================================================

/// Which side of the current user's questions to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedMode {
    /// Questions the current user asked.
    Asked,
    /// Questions addressed to the current user.
    Received,
}

impl FromStr for FeedMode {
    type Err = ValidationError;

    /// Parses the `asked` discriminator: `"true"` or `"false"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "true" => Ok(FeedMode::Asked),
            "false" => Ok(FeedMode::Received),
            other => Err(ValidationError(format!(
                "'asked' must be \"true\" or \"false\", got '{}'",
                other
            ))),
        }
    }
}

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// An offset page: skip `limit * page` records, return up to `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    limit: u32,
    page: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            page: 0,
        }
    }
}

impl PageRequest {
    /// Builds a page from untrusted input, falling back to defaults instead of failing.
    ///
    /// A missing or non-positive `limit` becomes [`DEFAULT_PAGE_LIMIT`], a limit above
    /// [`MAX_PAGE_LIMIT`] is clamped, and a missing or negative `page` becomes 0.
    pub fn from_raw(limit: Option<i64>, page: Option<i64>) -> Self {
        let limit = match limit {
            Some(l) if l > 0 => l.min(MAX_PAGE_LIMIT as i64) as u32,
            _ => DEFAULT_PAGE_LIMIT,
        };
        let page = match page {
            Some(p) if p >= 0 => p.min(u32::MAX as i64) as u32,
            _ => 0,
        };
        Self { limit, page }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn offset(&self) -> u64 {
        self.limit as u64 * self.page as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_defaults_invalid_input() {
        assert_eq!(PageRequest::from_raw(None, None), PageRequest::default());
        let page = PageRequest::from_raw(Some(-5), Some(-1));
        assert_eq!(page.limit(), DEFAULT_PAGE_LIMIT);
        assert_eq!(page.page(), 0);
        assert_eq!(PageRequest::from_raw(Some(0), Some(2)).limit(), DEFAULT_PAGE_LIMIT);
    }

    #[test]
    fn page_request_clamps_limit_and_computes_offset() {
        let page = PageRequest::from_raw(Some(5_000), Some(3));
        assert_eq!(page.limit(), MAX_PAGE_LIMIT);
        assert_eq!(page.offset(), MAX_PAGE_LIMIT as u64 * 3);
        assert_eq!(PageRequest::from_raw(Some(2), Some(1)).offset(), 2);
    }

    #[test]
    fn feed_mode_accepts_only_known_values() {
        assert_eq!("true".parse::<FeedMode>().unwrap(), FeedMode::Asked);
        assert_eq!("false".parse::<FeedMode>().unwrap(), FeedMode::Received);
        assert!("maybe".parse::<FeedMode>().is_err());
        assert!("".parse::<FeedMode>().is_err());
    }

    #[test]
    fn anonymous_asker_only_visible_to_asker() {
        let question = Question {
            id: QuestionId(1),
            body: "hi?".to_string(),
            is_anonymous: true,
            asker_id: UserId(1),
            receiver_id: UserId(2),
            answer: None,
            created_at: Utc::now(),
            answered_at: None,
        };
        assert!(question.asker_visible_to(Some(UserId(1))));
        assert!(!question.asker_visible_to(Some(UserId(2))));
        assert!(!question.asker_visible_to(None));
    }
}
