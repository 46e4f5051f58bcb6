use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// DB model (stored in the `results` collection)
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AttemptResult {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub quiz_id: ObjectId,
    pub quiz_title: String,
    pub user_id: String,
    pub user_email: Option<String>,
    pub score_percent: u32,
    pub correct_count: usize,
    pub total_questions: usize,
    pub answers: Vec<Option<usize>>,
    pub completed_at: bson::DateTime,
}

/// A finished attempt ready to be written; the store assigns `_id` and `completed_at`.
#[derive(Clone, Debug, PartialEq)]
pub struct NewResult {
    pub quiz_id: ObjectId,
    pub quiz_title: String,
    pub user_id: String,
    pub user_email: Option<String>,
    pub score_percent: u32,
    pub correct_count: usize,
    pub total_questions: usize,
    pub answers: Vec<Option<usize>>,
}

impl NewResult {
    pub fn into_result(self, id: Option<ObjectId>, completed_at: bson::DateTime) -> AttemptResult {
        AttemptResult {
            id,
            quiz_id: self.quiz_id,
            quiz_title: self.quiz_title,
            user_id: self.user_id,
            user_email: self.user_email,
            score_percent: self.score_percent,
            correct_count: self.correct_count,
            total_questions: self.total_questions,
            answers: self.answers,
            completed_at,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct AttemptResultResponse {
    pub id: Option<String>,
    pub quiz_id: String,
    pub quiz_title: String,
    pub score_percent: u32,
    pub correct_count: usize,
    pub total_questions: usize,
    pub answers: Vec<Option<usize>>,
    pub completed_at: String, // RFC3339
}

impl From<AttemptResult> for AttemptResultResponse {
    fn from(r: AttemptResult) -> Self {
        AttemptResultResponse {
            id: r.id.map(|oid| oid.to_hex()),
            quiz_id: r.quiz_id.to_hex(),
            quiz_title: r.quiz_title,
            score_percent: r.score_percent,
            correct_count: r.correct_count,
            total_questions: r.total_questions,
            answers: r.answers,
            completed_at: r.completed_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResultsSummary {
    pub attempts: usize,
    pub average_score: u32,
    pub high_scores: usize,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ResultsResponse {
    pub summary: ResultsSummary,
    pub is_empty: bool,
    pub results: Vec<AttemptResultResponse>,
}
