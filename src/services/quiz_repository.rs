use std::sync::Arc;

use bson::oid::ObjectId;
use tracing::{debug, error};

use crate::{
    models::{
        quiz::{NewQuiz, QuizDefinition},
        result::{AttemptResult, NewResult},
    },
    services::store::QuizStore,
};

/// Facade over the document store that never lets a store failure escape:
/// reads fall back to empty, writes report `None` (unsaved).
#[derive(Clone)]
pub struct QuizRepository {
    store: Arc<dyn QuizStore>,
}

impl QuizRepository {
    pub fn new(store: Arc<dyn QuizStore>) -> Self {
        Self { store }
    }

    pub async fn list_quizzes(&self) -> Vec<QuizDefinition> {
        match self.store.list_quizzes().await {
            Ok(quizzes) => quizzes,
            Err(e) => {
                error!(error = %e, "list_quizzes failed, showing an empty dashboard");
                Vec::new()
            }
        }
    }

    pub async fn get_quiz(&self, id: ObjectId) -> Option<QuizDefinition> {
        match self.store.get_quiz(id).await {
            Ok(quiz) => quiz,
            Err(e) => {
                error!(error = %e, quiz_id = %id, "get_quiz failed");
                None
            }
        }
    }

    pub async fn create_quiz(&self, quiz: NewQuiz) -> Option<QuizDefinition> {
        let title = quiz.title.clone();
        match self.store.create_quiz(quiz).await {
            Ok(created) => {
                debug!(quiz_id = ?created.id, "quiz created");
                Some(created)
            }
            Err(e) => {
                error!(error = %e, %title, "create_quiz failed, quiz not saved");
                None
            }
        }
    }

    pub async fn list_results_for_user(&self, user_id: &str) -> Vec<AttemptResult> {
        match self.store.list_results_for_user(user_id).await {
            Ok(results) => results,
            Err(e) => {
                error!(error = %e, %user_id, "list_results_for_user failed, showing no history");
                Vec::new()
            }
        }
    }

    pub async fn create_result(&self, result: NewResult) -> Option<AttemptResult> {
        let quiz_id = result.quiz_id;
        match self.store.create_result(result).await {
            Ok(created) => {
                debug!(result_id = ?created.id, %quiz_id, "result recorded");
                Some(created)
            }
            Err(e) => {
                error!(error = %e, %quiz_id, "create_result failed, score not saved");
                None
            }
        }
    }
}
