use std::sync::Mutex;

use async_trait::async_trait;
use bson::oid::ObjectId;
use thiserror::Error;

use crate::models::{
    quiz::{NewQuiz, QuizDefinition},
    result::{AttemptResult, NewResult},
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(e: mongodb::error::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

/// The external document store holding the `quizzes` and `results` collections.
#[async_trait]
pub trait QuizStore: Send + Sync {
    /// All quizzes, newest `created_at` first.
    async fn list_quizzes(&self) -> Result<Vec<QuizDefinition>, StoreError>;

    async fn get_quiz(&self, id: ObjectId) -> Result<Option<QuizDefinition>, StoreError>;

    /// Inserts the quiz; the store assigns `_id` and `created_at`.
    async fn create_quiz(&self, quiz: NewQuiz) -> Result<QuizDefinition, StoreError>;

    /// Results recorded for `user_id`, newest `completed_at` first.
    async fn list_results_for_user(&self, user_id: &str) -> Result<Vec<AttemptResult>, StoreError>;

    /// Inserts the result; the store assigns `_id` and `completed_at`.
    async fn create_result(&self, result: NewResult) -> Result<AttemptResult, StoreError>;
}

/// In-process store, used for local runs without MongoDB and by the tests.
#[derive(Default)]
pub struct MemoryQuizStore {
    quizzes: Mutex<Vec<QuizDefinition>>,
    results: Mutex<Vec<AttemptResult>>,
}

impl MemoryQuizStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(what: &str) -> StoreError {
    StoreError::Unavailable(format!("{what} lock poisoned"))
}

#[async_trait]
impl QuizStore for MemoryQuizStore {
    async fn list_quizzes(&self) -> Result<Vec<QuizDefinition>, StoreError> {
        let quizzes = self.quizzes.lock().map_err(|_| poisoned("quizzes"))?;
        // later inserts win ties on the millisecond timestamp
        let mut listed: Vec<QuizDefinition> = quizzes.iter().rev().cloned().collect();
        listed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listed)
    }

    async fn get_quiz(&self, id: ObjectId) -> Result<Option<QuizDefinition>, StoreError> {
        let quizzes = self.quizzes.lock().map_err(|_| poisoned("quizzes"))?;
        Ok(quizzes.iter().find(|q| q.id == Some(id)).cloned())
    }

    async fn create_quiz(&self, quiz: NewQuiz) -> Result<QuizDefinition, StoreError> {
        let stored = quiz.into_definition(Some(ObjectId::new()), bson::DateTime::now());
        self.quizzes
            .lock()
            .map_err(|_| poisoned("quizzes"))?
            .push(stored.clone());
        Ok(stored)
    }

    async fn list_results_for_user(&self, user_id: &str) -> Result<Vec<AttemptResult>, StoreError> {
        let results = self.results.lock().map_err(|_| poisoned("results"))?;
        let mut listed: Vec<AttemptResult> = results
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        listed.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(listed)
    }

    async fn create_result(&self, result: NewResult) -> Result<AttemptResult, StoreError> {
        let stored = result.into_result(Some(ObjectId::new()), bson::DateTime::now());
        self.results
            .lock()
            .map_err(|_| poisoned("results"))?
            .push(stored.clone());
        Ok(stored)
    }
}
