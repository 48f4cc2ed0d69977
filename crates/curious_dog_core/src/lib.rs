pub mod domain;
pub mod memory;
pub mod ports;
pub mod service;
pub mod validation;

pub use domain::{
    Actor, AuthSession, FeedMode, NewQuestion, PageRequest, Question, QuestionId, QuestionView,
    User, UserCredentials, UserId, UserProfile, UserUpdate,
};
pub use memory::InMemoryStore;
pub use ports::{
    AccountStore, PortError, PortResult, QuestionFilter, QuestionStore, UserDirectory,
};
pub use service::{QuestionService, ServiceError, ServiceResult};
pub use validation::ValidationError;
