use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Number of answer options every question carries.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Label stored in `created_by` when the author has no identity.
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// DB model (stored in the `quizzes` collection)
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct QuizDefinition {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub description: String,
    pub questions: Vec<QuestionDefinition>,
    pub created_by: String,
    pub created_at: bson::DateTime,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, ToSchema)]
pub struct QuestionDefinition {
    pub prompt: String,
    pub options: [String; OPTIONS_PER_QUESTION],
    pub correct_option_index: usize,
}

impl QuestionDefinition {
    pub fn is_correct(&self, answer: Option<usize>) -> bool {
        answer == Some(self.correct_option_index)
    }
}

/// A quiz ready to be written; the store assigns `_id` and `created_at`.
#[derive(Clone, Debug)]
pub struct NewQuiz {
    pub title: String,
    pub description: String,
    pub questions: Vec<QuestionDefinition>,
    pub created_by: String,
}

impl NewQuiz {
    pub fn into_definition(self, id: Option<ObjectId>, created_at: bson::DateTime) -> QuizDefinition {
        QuizDefinition {
            id,
            title: self.title,
            description: self.description,
            questions: self.questions,
            created_by: self.created_by,
            created_at,
        }
    }
}

/// Dashboard entry (no answers leak through this)
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct QuizSummary {
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub question_count: usize,
    pub created_by: String,
    pub created_at: String, // RFC3339
}

impl From<QuizDefinition> for QuizSummary {
    fn from(q: QuizDefinition) -> Self {
        QuizSummary {
            id: q.id.map(|oid| oid.to_hex()),
            title: q.title,
            description: q.description,
            question_count: q.questions.len(),
            created_by: q.created_by,
            created_at: q.created_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

/// Response wrapper for quiz creation
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct CreateQuizResponse {
    pub message: String,
    /// `false` when the store write failed; the quiz was accepted but not saved.
    pub saved: bool,
    pub quiz: QuizSummary,
    pub questions: Vec<QuestionDefinition>,
}
