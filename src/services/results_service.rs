use crate::{
    models::result::{AttemptResult, AttemptResultResponse, ResultsResponse, ResultsSummary},
    services::{player::percent, quiz_repository::QuizRepository},
};

/// Scores at or above this count as high scores.
pub const HIGH_SCORE_THRESHOLD: u32 = 80;

pub fn summarize(results: &[AttemptResult]) -> ResultsSummary {
    let attempts = results.len();
    if attempts == 0 {
        return ResultsSummary::default();
    }
    let total: usize = results.iter().map(|r| r.score_percent as usize).sum();
    ResultsSummary {
        attempts,
        // mean of percentages, rounded the same way as a single score
        average_score: percent(total, attempts * 100),
        high_scores: results
            .iter()
            .filter(|r| r.score_percent >= HIGH_SCORE_THRESHOLD)
            .count(),
    }
}

pub struct ResultsService {
    repository: QuizRepository,
}

impl ResultsService {
    pub fn new(repository: QuizRepository) -> Self {
        Self { repository }
    }

    pub async fn results_for_user(&self, user_id: &str) -> ResultsResponse {
        let results = self.repository.list_results_for_user(user_id).await;
        ResultsResponse {
            summary: summarize(&results),
            is_empty: results.is_empty(),
            results: results.into_iter().map(AttemptResultResponse::from).collect(),
        }
    }
}
