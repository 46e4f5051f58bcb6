use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::quiz::OPTIONS_PER_QUESTION;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    InProgress,
    Completed,
}

/// The question currently on screen. The correct option is never sent.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct QuestionView {
    pub number: usize, // 1-based
    pub prompt: String,
    pub options: [String; OPTIONS_PER_QUESTION],
    pub selected_answer: Option<usize>,
    pub remaining_seconds: u32,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq, Eq)]
pub struct ScoreView {
    pub correct_count: usize,
    pub total_questions: usize,
    pub score_percent: u32,
    pub answers: Vec<Option<usize>>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct AttemptView {
    #[schema(value_type = String)]
    pub attempt_id: Uuid,
    pub quiz_id: String,
    pub quiz_title: String,
    pub status: AttemptStatus,
    pub total_questions: usize,
    pub question: Option<QuestionView>,
    pub score: Option<ScoreView>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct SelectAnswerRequest {
    pub option_index: usize,
}
