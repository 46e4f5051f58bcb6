//! The state machine behind one quiz attempt.
//!
//! A [`Player`] is synchronous and clock-free: the countdown is driven from
//! outside through [`Player::tick`], which lets the attempt runner own the
//! actual timer task and lets tests step time by hand.

use thiserror::Error;

use crate::models::quiz::QuestionDefinition;

pub const DEFAULT_QUESTION_SECONDS: u32 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlayerError {
    #[error("the attempt is already complete")]
    AttemptComplete,
    #[error("option {index} does not exist; the question has {len} options")]
    InvalidOption { index: usize, len: usize },
    #[error("choose an answer before moving on")]
    Unanswered,
    #[error("a quiz needs at least one question")]
    NoQuestions,
}

/// What caused the current question to be left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceCause {
    Manual,
    Timeout,
}

/// Final tally of a finished attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreCard {
    pub correct_count: usize,
    pub total_questions: usize,
    pub score_percent: u32,
    pub answers: Vec<Option<usize>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Moved on to the question at this index.
    Next(usize),
    /// The last question was left; this is the one and only scoring event.
    Completed(ScoreCard),
    /// Nothing happened because the attempt had already been scored.
    AlreadyComplete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    Counting(u32),
    TimedOut(Advance),
    Idle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptState {
    pub current_question_index: usize,
    pub selected_answers: Vec<Option<usize>>,
    pub remaining_seconds: u32,
    pub is_complete: bool,
}

pub struct Player {
    questions: Vec<QuestionDefinition>,
    state: AttemptState,
    question_seconds: u32,
}

impl Player {
    pub fn new(questions: Vec<QuestionDefinition>, question_seconds: u32) -> Result<Self, PlayerError> {
        if questions.is_empty() {
            return Err(PlayerError::NoQuestions);
        }
        let state = AttemptState {
            current_question_index: 0,
            selected_answers: vec![None; questions.len()],
            remaining_seconds: question_seconds,
            is_complete: false,
        };
        Ok(Self { questions, state, question_seconds })
    }

    pub fn state(&self) -> &AttemptState {
        &self.state
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn current_question(&self) -> Option<&QuestionDefinition> {
        if self.state.is_complete {
            return None;
        }
        self.questions.get(self.state.current_question_index)
    }

    pub fn select_answer(&mut self, option_index: usize) -> Result<(), PlayerError> {
        let question = self.current_question().ok_or(PlayerError::AttemptComplete)?;
        let len = question.options.len();
        if option_index >= len {
            return Err(PlayerError::InvalidOption { index: option_index, len });
        }
        let current = self.state.current_question_index;
        self.state.selected_answers[current] = Some(option_index);
        Ok(())
    }

    pub fn advance(&mut self, cause: AdvanceCause) -> Result<Advance, PlayerError> {
        if self.state.is_complete {
            return Ok(Advance::AlreadyComplete);
        }
        let current = self.state.current_question_index;
        let answered = self.state.selected_answers[current].is_some();
        if cause == AdvanceCause::Manual && !answered && self.state.remaining_seconds > 0 {
            return Err(PlayerError::Unanswered);
        }

        if current + 1 < self.questions.len() {
            self.state.current_question_index = current + 1;
            self.state.remaining_seconds = self.question_seconds;
            return Ok(Advance::Next(current + 1));
        }

        self.state.is_complete = true;
        self.state.remaining_seconds = 0;
        Ok(Advance::Completed(self.score()))
    }

    /// One second of countdown. Reaching zero leaves the question unanswered
    /// (or with whatever was selected) and moves on.
    pub fn tick(&mut self) -> Tick {
        if self.state.is_complete {
            return Tick::Idle;
        }
        self.state.remaining_seconds = self.state.remaining_seconds.saturating_sub(1);
        if self.state.remaining_seconds > 0 {
            return Tick::Counting(self.state.remaining_seconds);
        }
        match self.advance(AdvanceCause::Timeout) {
            Ok(advance) => Tick::TimedOut(advance),
            // timeout advances never check for an answer
            Err(_) => Tick::Idle,
        }
    }

    fn score(&self) -> ScoreCard {
        let correct_count = self
            .questions
            .iter()
            .zip(self.state.selected_answers.iter())
            .filter(|(question, answer)| question.is_correct(**answer))
            .count();
        let total_questions = self.questions.len();
        ScoreCard {
            correct_count,
            total_questions,
            score_percent: percent(correct_count, total_questions),
            answers: self.state.selected_answers.clone(),
        }
    }
}

/// `round(part / whole * 100)`, halves rounding up. Zero when `whole` is zero.
pub fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    let part = part.min(whole) as u64;
    let whole = whole as u64;
    ((200 * part + whole) / (2 * whole)) as u32
}
