//! services/api/src/web/state.rs
//!
//! Defines the application state shared by every request handler.

use crate::config::Config;
use curious_dog_core::ports::{AccountStore, QuestionStore, UserDirectory};
use curious_dog_core::service::QuestionService;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub accounts: Arc<dyn AccountStore>,
    pub questions: QuestionService,
}

impl AppState {
    /// Builds the state around one storage backend that implements every port.
    pub fn with_store<S>(config: Arc<Config>, store: Arc<S>) -> Self
    where
        S: AccountStore + QuestionStore + UserDirectory + 'static,
    {
        let questions = QuestionService::new(store.clone(), store.clone());
        Self {
            config,
            accounts: store,
            questions,
        }
    }
}
