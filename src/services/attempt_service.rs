use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use bson::oid::ObjectId;
use thiserror::Error;
use tokio::time::{interval_at, sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    models::{
        attempt::{AttemptStatus, AttemptView, QuestionView, ScoreView},
        quiz::QuizDefinition,
        result::NewResult,
        user::Identity,
    },
    services::{
        player::{Advance, AdvanceCause, Player, PlayerError, ScoreCard, Tick, DEFAULT_QUESTION_SECONDS},
        quiz_repository::QuizRepository,
    },
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttemptError {
    #[error("attempt not found")]
    NotFound,
    #[error("quiz has not been saved yet")]
    UnsavedQuiz,
    #[error(transparent)]
    Player(#[from] PlayerError),
}

/// Default time a finished attempt stays viewable.
pub const DEFAULT_FINISHED_RETENTION: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Copy)]
pub struct AttemptSettings {
    pub question_seconds: u32,
    pub tick: Duration,
    /// A running attempt the client has not touched for this long is
    /// dropped unrecorded.
    pub idle_timeout: Duration,
    /// How long a finished attempt's score stays viewable.
    pub finished_retention: Duration,
}

impl Default for AttemptSettings {
    fn default() -> Self {
        Self {
            question_seconds: DEFAULT_QUESTION_SECONDS,
            tick: Duration::from_secs(1),
            idle_timeout: Duration::from_secs(DEFAULT_QUESTION_SECONDS as u64),
            finished_retention: DEFAULT_FINISHED_RETENTION,
        }
    }
}

struct LiveAttempt {
    owner: Identity,
    quiz_id: ObjectId,
    quiz_title: String,
    player: Player,
    countdown: Option<CancellationToken>,
    last_contact: Instant,
}

struct FinishedAttempt {
    owner: Identity,
    quiz_id: ObjectId,
    quiz_title: String,
    score: ScoreCard,
    expiry: CancellationToken,
}

enum Slot {
    Running(LiveAttempt),
    Finished(FinishedAttempt),
}

impl Slot {
    fn owner(&self) -> &Identity {
        match self {
            Slot::Running(live) => &live.owner,
            Slot::Finished(done) => &done.owner,
        }
    }
}

struct Registry {
    attempts: Mutex<HashMap<Uuid, Slot>>,
    repository: QuizRepository,
    settings: AttemptSettings,
}

enum TickOutcome {
    Continue,
    Stop,
    Persist(NewResult),
}

/// Owns every attempt in progress together with its countdown task.
#[derive(Clone)]
pub struct AttemptService {
    registry: Arc<Registry>,
}

impl AttemptService {
    pub fn new(repository: QuizRepository, settings: AttemptSettings) -> Self {
        Self {
            registry: Arc::new(Registry {
                attempts: Mutex::new(HashMap::new()),
                repository,
                settings,
            }),
        }
    }

    pub fn start(&self, quiz: QuizDefinition, owner: Identity) -> Result<AttemptView, AttemptError> {
        let quiz_id = quiz.id.ok_or(AttemptError::UnsavedQuiz)?;
        let player = Player::new(quiz.questions, self.registry.settings.question_seconds)?;
        let attempt_id = Uuid::new_v4();

        let mut attempts = self.registry.lock();
        let live = LiveAttempt {
            owner,
            quiz_id,
            quiz_title: quiz.title,
            player,
            countdown: Some(self.registry.arm(attempt_id)),
            last_contact: Instant::now(),
        };
        info!(%attempt_id, %quiz_id, user_id = %live.owner.user_id, "attempt started");
        let slot = attempts.entry(attempt_id).or_insert(Slot::Running(live));
        Ok(render(attempt_id, slot))
    }

    pub fn view(&self, attempt_id: Uuid, who: &Identity) -> Result<AttemptView, AttemptError> {
        let mut attempts = self.registry.lock();
        let slot = owned_slot(&mut attempts, attempt_id, who)?;
        Ok(render(attempt_id, slot))
    }

    pub fn select_answer(
        &self,
        attempt_id: Uuid,
        who: &Identity,
        option_index: usize,
    ) -> Result<AttemptView, AttemptError> {
        let mut attempts = self.registry.lock();
        let slot = owned_slot(&mut attempts, attempt_id, who)?;
        match slot {
            Slot::Running(live) => live.player.select_answer(option_index)?,
            Slot::Finished(_) => return Err(PlayerError::AttemptComplete.into()),
        }
        Ok(render(attempt_id, slot))
    }

    /// Leaves the current question. Finishing the last one records the
    /// result; a failed write is logged and the score is returned anyway.
    pub async fn advance(&self, attempt_id: Uuid, who: &Identity) -> Result<AttemptView, AttemptError> {
        let (view, finished) = {
            let mut attempts = self.registry.lock();
            let slot = owned_slot(&mut attempts, attempt_id, who)?;
            let advance = match slot {
                Slot::Running(live) => live.player.advance(AdvanceCause::Manual)?,
                Slot::Finished(_) => Advance::AlreadyComplete,
            };
            let finished = self.registry.apply(attempt_id, slot, advance);
            (render(attempt_id, slot), finished)
        };

        if let Some(result) = finished {
            self.registry.repository.create_result(result).await;
        }
        Ok(view)
    }

    /// Drops the attempt without recording anything.
    pub fn abandon(&self, attempt_id: Uuid, who: &Identity) -> Result<(), AttemptError> {
        let mut attempts = self.registry.lock();
        owned_slot(&mut attempts, attempt_id, who)?;
        match attempts.remove(&attempt_id) {
            Some(Slot::Running(live)) => {
                if let Some(token) = live.countdown {
                    token.cancel();
                }
                info!(%attempt_id, "attempt abandoned");
            }
            Some(Slot::Finished(done)) => done.expiry.cancel(),
            None => {}
        }
        Ok(())
    }

    /// Cancels every countdown and retention timer. Called when the server shuts down.
    pub fn shutdown(&self) {
        info!(running = self.running_countdowns(), "stopping attempt timers");
        let mut attempts = self.registry.lock();
        for slot in attempts.values_mut() {
            match slot {
                Slot::Running(live) => {
                    if let Some(token) = live.countdown.take() {
                        token.cancel();
                    }
                }
                Slot::Finished(done) => done.expiry.cancel(),
            }
        }
    }

    pub fn running_countdowns(&self) -> usize {
        self.registry
            .lock()
            .values()
            .filter(|slot| matches!(slot, Slot::Running(live) if live.countdown.is_some()))
            .count()
    }
}

impl Registry {
    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Slot>> {
        self.attempts.lock().unwrap_or_else(|poisoned| {
            warn!("attempt registry lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Spawns the countdown for the question now on screen.
    fn arm(self: &Arc<Self>, attempt_id: Uuid) -> CancellationToken {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let registry = Arc::clone(self);
        let period = self.settings.tick;

        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => match registry.on_tick(attempt_id, &cancelled) {
                        TickOutcome::Continue => {}
                        TickOutcome::Stop => break,
                        TickOutcome::Persist(result) => {
                            registry.repository.create_result(result).await;
                            break;
                        }
                    },
                }
            }
        });
        token
    }

    /// Removes a finished attempt once its retention window has passed.
    fn expire(self: &Arc<Self>, attempt_id: Uuid) -> CancellationToken {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let registry = Arc::clone(self);
        let retention = self.settings.finished_retention;

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancelled.cancelled() => {}
                _ = sleep(retention) => registry.remove_finished(attempt_id),
            }
        });
        token
    }

    fn remove_finished(&self, attempt_id: Uuid) {
        let mut attempts = self.lock();
        if matches!(attempts.get(&attempt_id), Some(Slot::Finished(_))) {
            attempts.remove(&attempt_id);
            debug!(%attempt_id, "finished attempt expired");
        }
    }

    fn on_tick(self: &Arc<Self>, attempt_id: Uuid, token: &CancellationToken) -> TickOutcome {
        let mut attempts = self.lock();
        // a transition may have happened between the tick firing and the lock
        if token.is_cancelled() {
            return TickOutcome::Stop;
        }
        let idle = match attempts.get(&attempt_id) {
            Some(Slot::Running(live)) => live.last_contact.elapsed() >= self.settings.idle_timeout,
            Some(Slot::Finished(_)) | None => return TickOutcome::Stop,
        };
        if idle {
            attempts.remove(&attempt_id);
            token.cancel();
            info!(%attempt_id, "attempt left idle, discarded");
            return TickOutcome::Stop;
        }
        let Some(slot) = attempts.get_mut(&attempt_id) else {
            return TickOutcome::Stop;
        };
        let tick = match slot {
            Slot::Running(live) => live.player.tick(),
            Slot::Finished(_) => return TickOutcome::Stop,
        };
        match tick {
            Tick::Counting(_) => TickOutcome::Continue,
            Tick::Idle => TickOutcome::Stop,
            Tick::TimedOut(advance) => {
                debug!(%attempt_id, "question timed out");
                match self.apply(attempt_id, slot, advance) {
                    Some(result) => TickOutcome::Persist(result),
                    None => TickOutcome::Stop,
                }
            }
        }
    }

    /// Settles the countdown after a transition: the old task is always
    /// cancelled, and a fresh one is armed only if a question remains.
    fn apply(self: &Arc<Self>, attempt_id: Uuid, slot: &mut Slot, advance: Advance) -> Option<NewResult> {
        let Slot::Running(live) = &mut *slot else {
            return None;
        };
        if let Some(token) = live.countdown.take() {
            token.cancel();
        }
        match advance {
            Advance::Next(index) => {
                debug!(%attempt_id, question = index, "next question");
                live.countdown = Some(self.arm(attempt_id));
                None
            }
            Advance::Completed(score) => {
                info!(
                    %attempt_id,
                    correct = score.correct_count,
                    total = score.total_questions,
                    score_percent = score.score_percent,
                    "attempt complete"
                );
                let result = NewResult {
                    quiz_id: live.quiz_id,
                    quiz_title: live.quiz_title.clone(),
                    user_id: live.owner.user_id.clone(),
                    user_email: live.owner.email.clone(),
                    score_percent: score.score_percent,
                    correct_count: score.correct_count,
                    total_questions: score.total_questions,
                    answers: score.answers.clone(),
                };
                let finished = FinishedAttempt {
                    owner: live.owner.clone(),
                    quiz_id: live.quiz_id,
                    quiz_title: live.quiz_title.clone(),
                    score,
                    expiry: self.expire(attempt_id),
                };
                *slot = Slot::Finished(finished);
                Some(result)
            }
            Advance::AlreadyComplete => None,
        }
    }
}

fn owned_slot<'a>(
    attempts: &'a mut HashMap<Uuid, Slot>,
    attempt_id: Uuid,
    who: &Identity,
) -> Result<&'a mut Slot, AttemptError> {
    let slot = attempts
        .get_mut(&attempt_id)
        .filter(|slot| slot.owner().user_id == who.user_id)
        .ok_or(AttemptError::NotFound)?;
    if let Slot::Running(live) = slot {
        live.last_contact = Instant::now();
    }
    Ok(slot)
}

fn render(attempt_id: Uuid, slot: &Slot) -> AttemptView {
    match slot {
        Slot::Running(live) => {
            let state = live.player.state();
            let question = live.player.current_question().map(|q| QuestionView {
                number: state.current_question_index + 1,
                prompt: q.prompt.clone(),
                options: q.options.clone(),
                selected_answer: state.selected_answers[state.current_question_index],
                remaining_seconds: state.remaining_seconds,
            });
            AttemptView {
                attempt_id,
                quiz_id: live.quiz_id.to_hex(),
                quiz_title: live.quiz_title.clone(),
                status: AttemptStatus::InProgress,
                total_questions: live.player.total_questions(),
                question,
                score: None,
            }
        }
        Slot::Finished(done) => AttemptView {
            attempt_id,
            quiz_id: done.quiz_id.to_hex(),
            quiz_title: done.quiz_title.clone(),
            status: AttemptStatus::Completed,
            total_questions: done.score.total_questions,
            question: None,
            score: Some(ScoreView {
                correct_count: done.score.correct_count,
                total_questions: done.score.total_questions,
                score_percent: done.score.score_percent,
                answers: done.score.answers.clone(),
            }),
        },
    }
}
