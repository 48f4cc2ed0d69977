//! crates/curious_dog_core/src/service.rs
//!
//! The question lifecycle: creating, answering, and the paginated feeds.
//! Asker anonymity is enforced here, on the way out.

use futures::future::try_join_all;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::domain::{
    Actor, FeedMode, NewQuestion, PageRequest, Question, QuestionId, QuestionView, UserId,
    UserProfile,
};
use crate::ports::{PortError, QuestionFilter, QuestionStore, UserDirectory};
use crate::validation::{self, ValidationError};

/// Errors surfaced by the question service. Each variant is reported distinctly.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Port(#[from] PortError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Clone)]
pub struct QuestionService {
    questions: Arc<dyn QuestionStore>,
    users: Arc<dyn UserDirectory>,
}

impl QuestionService {
    pub fn new(questions: Arc<dyn QuestionStore>, users: Arc<dyn UserDirectory>) -> Self {
        Self { questions, users }
    }

    /// Asks `receiver_id` a question on behalf of `actor`.
    ///
    /// The asker gets the full record back, including their own id.
    #[instrument(skip(self, body), fields(asker = %actor.user_id))]
    pub async fn create_question(
        &self,
        actor: Actor,
        receiver_id: UserId,
        body: &str,
        is_anonymous: bool,
    ) -> ServiceResult<Question> {
        validation::question_body(body)?;
        if !self.users.exists(receiver_id).await? {
            warn!("Question addressed to unknown user {}", receiver_id);
            return Err(ServiceError::NotFound(format!(
                "User {} not found",
                receiver_id
            )));
        }

        let question = self
            .questions
            .insert(NewQuestion {
                body: body.to_string(),
                is_anonymous,
                asker_id: actor.user_id,
                receiver_id,
                created_at: chrono::Utc::now(),
            })
            .await?;
        info!("Question {} created for user {}", question.id, receiver_id);
        Ok(question)
    }

    /// Records the receiver's answer. A question can be answered exactly once.
    #[instrument(skip(self, answer), fields(receiver = %actor.user_id))]
    pub async fn answer_question(
        &self,
        actor: Actor,
        question_id: QuestionId,
        answer: &str,
    ) -> ServiceResult<QuestionView> {
        validation::answer_text(answer)?;

        let question = self
            .questions
            .find_by_id(question_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Question {} not found", question_id)))?;

        if question.receiver_id != actor.user_id {
            warn!("User {} tried to answer question {}", actor.user_id, question_id);
            return Err(ServiceError::Forbidden(
                "only the receiver may answer this question".to_string(),
            ));
        }
        if question.is_answered() {
            return Err(already_answered(question_id));
        }

        // The conditional update decides concurrent attempts; the check above is only a fast path.
        let answered = self
            .questions
            .update_answer(question_id, answer)
            .await?
            .ok_or_else(|| already_answered(question_id))?;
        info!("Question {} answered", question_id);

        let mut views = self.project(vec![answered], Some(actor.user_id)).await?;
        views
            .pop()
            .ok_or_else(|| ServiceError::NotFound(format!("Question {} not found", question_id)))
    }

    /// The public feed: answered questions from every user, newest first.
    /// Anonymous askers are never disclosed here.
    #[instrument(skip(self))]
    pub async fn get_questions(&self, page: PageRequest) -> ServiceResult<Vec<QuestionView>> {
        let questions = self
            .questions
            .query_page(QuestionFilter::Answered, page.offset(), page.limit())
            .await?;
        self.project(questions, None).await
    }

    /// The current user's own feed. `asked` selects between questions they asked
    /// (`"true"`) and questions they received (`"false"`).
    ///
    /// Received questions keep anonymous askers hidden from the receiver too.
    #[instrument(skip(self), fields(user = %actor.user_id))]
    pub async fn get_current_user_questions(
        &self,
        actor: Actor,
        asked: Option<&str>,
        page: PageRequest,
    ) -> ServiceResult<Vec<QuestionView>> {
        let mode: FeedMode = asked
            .ok_or_else(|| ValidationError("'asked' is required".to_string()))?
            .parse()?;
        let filter = match mode {
            FeedMode::Asked => QuestionFilter::AskedBy(actor.user_id),
            FeedMode::Received => QuestionFilter::ReceivedBy(actor.user_id),
        };
        let questions = self
            .questions
            .query_page(filter, page.offset(), page.limit())
            .await?;
        self.project(questions, Some(actor.user_id)).await
    }

    /// Turns stored questions into what `viewer` is allowed to see, enriched
    /// with user profiles.
    async fn project(
        &self,
        questions: Vec<Question>,
        viewer: Option<UserId>,
    ) -> ServiceResult<Vec<QuestionView>> {
        let mut wanted = BTreeSet::new();
        for q in &questions {
            wanted.insert(q.receiver_id);
            if q.asker_visible_to(viewer) {
                wanted.insert(q.asker_id);
            }
        }
        let profiles = self.load_profiles(wanted).await?;

        Ok(questions
            .into_iter()
            .map(|q| project_for_viewer(q, viewer, &profiles))
            .collect())
    }

    async fn load_profiles(
        &self,
        ids: BTreeSet<UserId>,
    ) -> ServiceResult<HashMap<UserId, UserProfile>> {
        let lookups = ids.into_iter().map(|id| async move {
            match self.users.get_profile(id).await {
                Ok(profile) => Ok(Some(profile)),
                Err(PortError::NotFound(_)) => Ok(None),
                Err(e) => Err(e),
            }
        });
        let found = try_join_all(lookups).await?;
        Ok(found
            .into_iter()
            .flatten()
            .map(|p| (p.id, p))
            .collect())
    }
}

fn already_answered(question_id: QuestionId) -> ServiceError {
    ServiceError::Conflict(format!("Question {} has already been answered", question_id))
}

/// Applies the anonymity rule: the asker is visible iff the question is not
/// anonymous or the viewer is the asker.
pub fn project_for_viewer(
    question: Question,
    viewer: Option<UserId>,
    profiles: &HashMap<UserId, UserProfile>,
) -> QuestionView {
    let (asker_id, asker) = if question.asker_visible_to(viewer) {
        (
            Some(question.asker_id),
            profiles.get(&question.asker_id).cloned(),
        )
    } else {
        (None, None)
    };
    QuestionView {
        id: question.id,
        receiver: profiles.get(&question.receiver_id).cloned(),
        receiver_id: question.receiver_id,
        body: question.body,
        is_anonymous: question.is_anonymous,
        answer: question.answer,
        created_at: question.created_at,
        answered_at: question.answered_at,
        asker_id,
        asker,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::ports::AccountStore;
    use chrono::Utc;

    struct Fixture {
        store: Arc<InMemoryStore>,
        service: QuestionService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let service = QuestionService::new(store.clone(), store.clone());
        Fixture { store, service }
    }

    async fn register(store: &InMemoryStore, name: &str) -> Actor {
        let user = store
            .create_user(name, &format!("{}@example.com", name), "hash")
            .await
            .unwrap();
        Actor::new(user.id)
    }

    #[tokio::test]
    async fn create_question_starts_unanswered() {
        let fx = fixture();
        let asker = register(&fx.store, "asker").await;
        let receiver = register(&fx.store, "receiver").await;

        let before = Utc::now();
        let q = fx
            .service
            .create_question(asker, receiver.user_id, "Do you like walks?", false)
            .await
            .unwrap();

        assert!(q.answer.is_none());
        assert!(q.created_at >= before);
        assert_eq!(q.asker_id, asker.user_id);
        assert_eq!(q.receiver_id, receiver.user_id);
    }

    #[tokio::test]
    async fn anonymous_create_still_returns_asker_to_asker() {
        let fx = fixture();
        let asker = register(&fx.store, "asker").await;
        let receiver = register(&fx.store, "receiver").await;

        let q = fx
            .service
            .create_question(asker, receiver.user_id, "secret?", true)
            .await
            .unwrap();
        assert!(q.is_anonymous);
        assert_eq!(q.asker_id, asker.user_id);
    }

    #[tokio::test]
    async fn create_question_rejects_bad_input() {
        let fx = fixture();
        let asker = register(&fx.store, "asker").await;
        let receiver = register(&fx.store, "receiver").await;

        let empty = fx
            .service
            .create_question(asker, receiver.user_id, "", false)
            .await;
        assert!(matches!(empty, Err(ServiceError::Validation(_))));

        let long = fx
            .service
            .create_question(asker, receiver.user_id, &"x".repeat(601), false)
            .await;
        assert!(matches!(long, Err(ServiceError::Validation(_))));

        let missing = fx
            .service
            .create_question(asker, UserId(999), "hello?", false)
            .await;
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn self_questions_are_allowed() {
        let fx = fixture();
        let me = register(&fx.store, "narcissus").await;
        let q = fx
            .service
            .create_question(me, me.user_id, "am I great?", false)
            .await
            .unwrap();
        let view = fx.service.answer_question(me, q.id, "yes").await.unwrap();
        assert_eq!(view.answer.as_deref(), Some("yes"));
    }

    #[tokio::test]
    async fn only_receiver_can_answer_and_only_once() {
        let fx = fixture();
        let asker = register(&fx.store, "asker").await;
        let receiver = register(&fx.store, "receiver").await;
        let q = fx
            .service
            .create_question(asker, receiver.user_id, "why?", false)
            .await
            .unwrap();

        let by_asker = fx.service.answer_question(asker, q.id, "because").await;
        assert!(matches!(by_asker, Err(ServiceError::Forbidden(_))));

        let unknown = fx
            .service
            .answer_question(receiver, QuestionId(4242), "hm")
            .await;
        assert!(matches!(unknown, Err(ServiceError::NotFound(_))));

        let empty = fx.service.answer_question(receiver, q.id, " ").await;
        assert!(matches!(empty, Err(ServiceError::Validation(_))));

        let answered = fx
            .service
            .answer_question(receiver, q.id, "because")
            .await
            .unwrap();
        assert!(answered.answered_at.is_some());
        let again = fx.service.answer_question(receiver, q.id, "again").await;
        assert!(matches!(again, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_answers_have_exactly_one_winner() {
        let fx = fixture();
        let asker = register(&fx.store, "asker").await;
        let receiver = register(&fx.store, "receiver").await;
        let q = fx
            .service
            .create_question(asker, receiver.user_id, "race?", false)
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..8 {
            let service = fx.service.clone();
            handles.push(tokio::spawn(async move {
                service
                    .answer_question(receiver, q.id, &format!("answer {}", i))
                    .await
            }));
        }

        let mut ok = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(ServiceError::Conflict(_)) => conflicts += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(conflicts, 7);
    }

    #[tokio::test]
    async fn answer_view_hides_anonymous_asker_from_receiver() {
        let fx = fixture();
        let asker = register(&fx.store, "asker").await;
        let receiver = register(&fx.store, "receiver").await;
        let q = fx
            .service
            .create_question(asker, receiver.user_id, "who am I?", true)
            .await
            .unwrap();

        let view = fx
            .service
            .answer_question(receiver, q.id, "no idea")
            .await
            .unwrap();
        assert!(view.asker_id.is_none());
        assert!(view.asker.is_none());
        assert_eq!(view.receiver.map(|r| r.username), Some("receiver".to_string()));
    }

    #[tokio::test]
    async fn global_feed_lists_answered_newest_first_in_disjoint_pages() {
        let fx = fixture();
        let asker = register(&fx.store, "asker").await;
        let receiver = register(&fx.store, "receiver").await;

        for i in 0..5 {
            let q = fx
                .service
                .create_question(asker, receiver.user_id, &format!("q{}", i), i % 2 == 0)
                .await
                .unwrap();
            fx.service
                .answer_question(receiver, q.id, &format!("a{}", i))
                .await
                .unwrap();
        }
        // unanswered questions stay out of the public feed
        fx.service
            .create_question(asker, receiver.user_id, "pending", false)
            .await
            .unwrap();

        let first = fx
            .service
            .get_questions(PageRequest::from_raw(Some(2), Some(0)))
            .await
            .unwrap();
        let second = fx
            .service
            .get_questions(PageRequest::from_raw(Some(2), Some(1)))
            .await
            .unwrap();
        let all = fx
            .service
            .get_questions(PageRequest::from_raw(Some(10), Some(0)))
            .await
            .unwrap();

        assert_eq!(all.len(), 5);
        assert!(all.iter().all(|q| q.answer.is_some()));
        assert!(all
            .windows(2)
            .all(|w| (w[0].created_at, w[0].id) >= (w[1].created_at, w[1].id)));

        let paged: Vec<QuestionId> = first.iter().chain(second.iter()).map(|q| q.id).collect();
        let expected: Vec<QuestionId> = all.iter().take(4).map(|q| q.id).collect();
        assert_eq!(paged, expected);

        for q in &all {
            if q.is_anonymous {
                assert!(q.asker_id.is_none() && q.asker.is_none());
            } else {
                assert_eq!(q.asker_id, Some(asker.user_id));
                assert_eq!(q.asker.as_ref().map(|a| a.username.as_str()), Some("asker"));
            }
        }
    }

    #[tokio::test]
    async fn current_user_feeds_respect_anonymity() {
        let fx = fixture();
        let asker = register(&fx.store, "asker").await;
        let receiver = register(&fx.store, "receiver").await;
        fx.service
            .create_question(asker, receiver.user_id, "anon?", true)
            .await
            .unwrap();
        fx.service
            .create_question(asker, receiver.user_id, "named?", false)
            .await
            .unwrap();

        let asked = fx
            .service
            .get_current_user_questions(asker, Some("true"), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(asked.len(), 2);
        assert!(asked.iter().all(|q| q.asker_id == Some(asker.user_id)));

        let received = fx
            .service
            .get_current_user_questions(receiver, Some("false"), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(received.len(), 2);
        for q in &received {
            assert_eq!(q.asker_id.is_some(), !q.is_anonymous);
        }

        let nothing = fx
            .service
            .get_current_user_questions(receiver, Some("true"), PageRequest::default())
            .await
            .unwrap();
        assert!(nothing.is_empty());
    }

    #[tokio::test]
    async fn unknown_asked_discriminator_is_rejected() {
        let fx = fixture();
        let me = register(&fx.store, "me").await;
        let maybe = fx
            .service
            .get_current_user_questions(me, Some("maybe"), PageRequest::default())
            .await;
        assert!(matches!(maybe, Err(ServiceError::Validation(_))));
        let missing = fx
            .service
            .get_current_user_questions(me, None, PageRequest::default())
            .await;
        assert!(matches!(missing, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn ask_answer_then_read_feed() {
        let fx = fixture();
        let asker = register(&fx.store, "first").await;
        let receiver = register(&fx.store, "second").await;
        assert_eq!(asker.user_id, UserId(1));
        assert_eq!(receiver.user_id, UserId(2));

        let q = fx
            .service
            .create_question(asker, UserId(2), "What's your favorite color?", true)
            .await
            .unwrap();
        fx.service
            .answer_question(Actor::new(UserId(2)), q.id, "Blue")
            .await
            .unwrap();

        let feed = fx
            .service
            .get_questions(PageRequest::from_raw(Some(10), Some(0)))
            .await
            .unwrap();
        let found = feed
            .iter()
            .find(|v| v.answer.as_deref() == Some("Blue"))
            .expect("answered question in feed");
        assert!(found.asker_id.is_none());
        assert!(found.asker.is_none());
    }
}
