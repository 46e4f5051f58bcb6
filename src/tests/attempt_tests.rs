#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use std::{sync::Arc, time::Duration};
    use tokio::time::sleep;

    use uuid::Uuid;

    use crate::{
        models::{
            attempt::{AttemptStatus, AttemptView},
            result::ResultsResponse,
            user::Identity,
        },
        services::{
            attempt_service::{AttemptError, AttemptService, DEFAULT_FINISHED_RETENTION},
            player::PlayerError,
            store::{MemoryQuizStore, QuizStore},
        },
    };

    use super::super::common::{
        identity, request, seed_quiz, send, send_json, setup, setup_with_store, token_for,
        ResultWritesFail,
    };

    fn answer(option_index: usize) -> serde_json::Value {
        json!({ "option_index": option_index })
    }

    /// Keeps the attempt open the way a client rendering the countdown
    /// would, checking in every five seconds.
    async fn watch(attempts: &AttemptService, attempt_id: Uuid, who: &Identity, seconds: u64) {
        for _ in 0..seconds / 5 {
            sleep(Duration::from_secs(5)).await;
            let _ = attempts.view(attempt_id, who);
        }
    }

    #[tokio::test]
    async fn test_full_attempt_over_http() {
        let ctx = setup();
        let quiz = seed_quiz(&ctx.store, "Two questions", &[1, 2]).await;
        let token = token_for(&identity("alice"));
        let start_uri = format!("/quizzes/{}/attempts", quiz.id.unwrap().to_hex());

        let (status, view): (_, AttemptView) =
            send_json(&ctx.app, request("POST", &start_uri, Some(&token), None)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(view.status, AttemptStatus::InProgress);
        assert_eq!(view.total_questions, 2);
        let first = view.question.unwrap();
        assert_eq!(first.number, 1);
        assert_eq!(first.prompt, "Question 1?");
        assert_eq!(first.selected_answer, None);
        assert_eq!(first.remaining_seconds, 30);

        let answer_uri = format!("/attempts/{}/answer", view.attempt_id);
        let advance_uri = format!("/attempts/{}/advance", view.attempt_id);

        let (status, view): (_, AttemptView) =
            send_json(&ctx.app, request("POST", &answer_uri, Some(&token), Some(&answer(1)))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view.question.unwrap().selected_answer, Some(1));

        let (_, view): (_, AttemptView) =
            send_json(&ctx.app, request("POST", &advance_uri, Some(&token), None)).await;
        assert_eq!(view.question.unwrap().number, 2);

        send(&ctx.app, request("POST", &answer_uri, Some(&token), Some(&answer(0)))).await;
        let (status, view): (_, AttemptView) =
            send_json(&ctx.app, request("POST", &advance_uri, Some(&token), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view.status, AttemptStatus::Completed);
        assert!(view.question.is_none());
        let score = view.score.unwrap();
        assert_eq!(score.correct_count, 1);
        assert_eq!(score.score_percent, 50);
        assert_eq!(score.answers, vec![Some(1), Some(0)]);

        // the finished attempt can still be viewed
        let (status, view): (_, AttemptView) = send_json(
            &ctx.app,
            request("GET", &format!("/attempts/{}", view.attempt_id), Some(&token), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view.score.unwrap().score_percent, 50);

        let (_, results): (_, ResultsResponse) =
            send_json(&ctx.app, request("GET", "/results", Some(&token), None)).await;
        assert_eq!(results.results.len(), 1);
        assert_eq!(results.results[0].quiz_title, "Two questions");
        assert_eq!(results.results[0].score_percent, 50);
        assert_eq!(results.summary.average_score, 50);
    }

    #[tokio::test]
    async fn test_advance_requires_an_answer() {
        let ctx = setup();
        let quiz = seed_quiz(&ctx.store, "Quiz", &[0]).await;
        let token = token_for(&identity("alice"));
        let start_uri = format!("/quizzes/{}/attempts", quiz.id.unwrap().to_hex());
        let (_, view): (_, AttemptView) =
            send_json(&ctx.app, request("POST", &start_uri, Some(&token), None)).await;

        let advance_uri = format!("/attempts/{}/advance", view.attempt_id);
        let (status, _) = send(&ctx.app, request("POST", &advance_uri, Some(&token), None)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let answer_uri = format!("/attempts/{}/answer", view.attempt_id);
        let (status, _) =
            send(&ctx.app, request("POST", &answer_uri, Some(&token), Some(&answer(4)))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_attempts_are_private() {
        let ctx = setup();
        let quiz = seed_quiz(&ctx.store, "Quiz", &[0]).await;
        let alice = token_for(&identity("alice"));
        let bob = token_for(&identity("bob"));
        let start_uri = format!("/quizzes/{}/attempts", quiz.id.unwrap().to_hex());
        let (_, view): (_, AttemptView) =
            send_json(&ctx.app, request("POST", &start_uri, Some(&alice), None)).await;
        let uri = format!("/attempts/{}", view.attempt_id);

        let (status, _) = send(&ctx.app, request("GET", &uri, Some(&bob), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&ctx.app, request("DELETE", &uri, Some(&bob), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&ctx.app, request("GET", &uri, None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = send(&ctx.app, request("GET", "/attempts/nope", Some(&alice), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_ticks_once_per_second() {
        let ctx = setup();
        let alice = identity("alice");
        let quiz = seed_quiz(&ctx.store, "Quiz", &[0, 1]).await;
        let view = ctx.attempts.start(quiz, alice.clone()).unwrap();

        sleep(Duration::from_millis(29_500)).await;
        let now = ctx.attempts.view(view.attempt_id, &alice).unwrap();
        let question = now.question.unwrap();
        assert_eq!(question.number, 1);
        assert_eq!(question.remaining_seconds, 1);

        sleep(Duration::from_secs(1)).await;
        let now = ctx.attempts.view(view.attempt_id, &alice).unwrap();
        let question = now.question.unwrap();
        assert_eq!(question.number, 2);
        assert_eq!(question.remaining_seconds, 30);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unanswered_quiz_times_out_to_zero() {
        let ctx = setup();
        let alice = identity("alice");
        let quiz = seed_quiz(&ctx.store, "Quiz", &[0, 1, 2, 3]).await;
        let view = ctx.attempts.start(quiz, alice.clone()).unwrap();
        assert_eq!(ctx.attempts.running_countdowns(), 1);

        watch(&ctx.attempts, view.attempt_id, &alice, 120).await;
        sleep(Duration::from_millis(500)).await;

        let done = ctx.attempts.view(view.attempt_id, &alice).unwrap();
        assert_eq!(done.status, AttemptStatus::Completed);
        let score = done.score.unwrap();
        assert_eq!(score.score_percent, 0);
        assert_eq!(score.answers, vec![None; 4]);
        assert_eq!(ctx.attempts.running_countdowns(), 0);

        let results = ctx.store.list_results_for_user("alice").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score_percent, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_keeps_the_selected_answer() {
        let ctx = setup();
        let alice = identity("alice");
        let quiz = seed_quiz(&ctx.store, "Quiz", &[1, 0]).await;
        let view = ctx.attempts.start(quiz, alice.clone()).unwrap();
        ctx.attempts.select_answer(view.attempt_id, &alice, 1).unwrap();

        watch(&ctx.attempts, view.attempt_id, &alice, 60).await;
        sleep(Duration::from_millis(500)).await;

        let done = ctx.attempts.view(view.attempt_id, &alice).unwrap();
        let score = done.score.unwrap();
        assert_eq!(score.answers, vec![Some(1), None]);
        assert_eq!(score.correct_count, 1);
        assert_eq!(score.score_percent, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_advance_restarts_the_countdown() {
        let ctx = setup();
        let alice = identity("alice");
        let quiz = seed_quiz(&ctx.store, "Quiz", &[0, 0]).await;
        let view = ctx.attempts.start(quiz, alice.clone()).unwrap();

        sleep(Duration::from_millis(10_500)).await;
        ctx.attempts.select_answer(view.attempt_id, &alice, 0).unwrap();
        let next = ctx.attempts.advance(view.attempt_id, &alice).await.unwrap();
        assert_eq!(next.question.as_ref().unwrap().remaining_seconds, 30);

        sleep(Duration::from_millis(24_700)).await;
        let now = ctx.attempts.view(view.attempt_id, &alice).unwrap();
        let question = now.question.unwrap();
        assert_eq!(question.number, 2);
        assert_eq!(question.remaining_seconds, 6);
        assert_eq!(ctx.attempts.running_countdowns(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandon_records_nothing() {
        let ctx = setup();
        let alice = identity("alice");
        let quiz = seed_quiz(&ctx.store, "Quiz", &[0]).await;
        let view = ctx.attempts.start(quiz, alice.clone()).unwrap();
        ctx.attempts.select_answer(view.attempt_id, &alice, 0).unwrap();

        ctx.attempts.abandon(view.attempt_id, &alice).unwrap();
        assert_eq!(ctx.attempts.running_countdowns(), 0);
        assert_eq!(
            ctx.attempts.view(view.attempt_id, &alice).unwrap_err(),
            AttemptError::NotFound
        );

        sleep(Duration::from_secs(60)).await;
        assert!(ctx.store.list_results_for_user("alice").await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_walked_away_attempts_leave_nothing_behind() {
        let ctx = setup();
        let alice = identity("alice");
        let quiz = seed_quiz(&ctx.store, "Quiz", &[0, 1, 2, 3]).await;
        let mut started = Vec::new();
        for _ in 0..20 {
            started.push(ctx.attempts.start(quiz.clone(), alice.clone()).unwrap().attempt_id);
        }
        assert_eq!(ctx.attempts.running_countdowns(), 20);

        sleep(Duration::from_secs(24 * 60 * 60)).await;

        assert_eq!(ctx.attempts.running_countdowns(), 0);
        for attempt_id in started {
            assert_eq!(ctx.attempts.view(attempt_id, &alice).unwrap_err(), AttemptError::NotFound);
        }
        assert!(ctx.store.list_results_for_user("alice").await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_client_is_dropped_after_idle_window() {
        let ctx = setup();
        let alice = identity("alice");
        let quiz = seed_quiz(&ctx.store, "Quiz", &[0, 1, 2, 3]).await;
        let view = ctx.attempts.start(quiz, alice.clone()).unwrap();

        sleep(Duration::from_millis(29_500)).await;
        assert!(ctx.attempts.view(view.attempt_id, &alice).is_ok());

        // the view above counts as contact, so the idle window starts over
        sleep(Duration::from_millis(29_000)).await;
        assert!(ctx.attempts.view(view.attempt_id, &alice).is_ok());

        sleep(Duration::from_secs(31)).await;
        assert_eq!(
            ctx.attempts.view(view.attempt_id, &alice).unwrap_err(),
            AttemptError::NotFound
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_finished_attempt_expires_after_retention() {
        let ctx = setup();
        let alice = identity("alice");
        let quiz = seed_quiz(&ctx.store, "Quiz", &[0]).await;
        let view = ctx.attempts.start(quiz, alice.clone()).unwrap();
        ctx.attempts.select_answer(view.attempt_id, &alice, 0).unwrap();
        ctx.attempts.advance(view.attempt_id, &alice).await.unwrap();

        sleep(DEFAULT_FINISHED_RETENTION - Duration::from_secs(1)).await;
        let done = ctx.attempts.view(view.attempt_id, &alice).unwrap();
        assert_eq!(done.status, AttemptStatus::Completed);

        sleep(Duration::from_secs(2)).await;
        assert_eq!(
            ctx.attempts.view(view.attempt_id, &alice).unwrap_err(),
            AttemptError::NotFound
        );
        // the recorded result outlives the attempt
        assert_eq!(ctx.store.list_results_for_user("alice").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_completed_attempt_rejects_answers() {
        let ctx = setup();
        let alice = identity("alice");
        let quiz = seed_quiz(&ctx.store, "Quiz", &[0]).await;
        let view = ctx.attempts.start(quiz, alice.clone()).unwrap();
        ctx.attempts.select_answer(view.attempt_id, &alice, 0).unwrap();
        ctx.attempts.advance(view.attempt_id, &alice).await.unwrap();

        assert_eq!(
            ctx.attempts.select_answer(view.attempt_id, &alice, 1).unwrap_err(),
            AttemptError::Player(PlayerError::AttemptComplete)
        );
        // advancing again does not record a second result
        let again = ctx.attempts.advance(view.attempt_id, &alice).await.unwrap();
        assert_eq!(again.score.unwrap().score_percent, 100);
        assert_eq!(ctx.store.list_results_for_user("alice").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_score_shown_when_result_write_fails() {
        let memory = Arc::new(MemoryQuizStore::new());
        let ctx = setup_with_store(Arc::new(ResultWritesFail(memory.clone())));
        let alice = identity("alice");
        let quiz = seed_quiz(&memory, "Quiz", &[2]).await;
        let view = ctx.attempts.start(quiz, alice.clone()).unwrap();
        ctx.attempts.select_answer(view.attempt_id, &alice, 2).unwrap();

        let done = ctx.attempts.advance(view.attempt_id, &alice).await.unwrap();

        assert_eq!(done.status, AttemptStatus::Completed);
        assert_eq!(done.score.unwrap().score_percent, 100);
        assert!(memory.list_results_for_user("alice").await.unwrap().is_empty());
    }
}
