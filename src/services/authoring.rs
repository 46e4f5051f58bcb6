use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::{
    quiz::{NewQuiz, QuestionDefinition, ANONYMOUS_AUTHOR, OPTIONS_PER_QUESTION},
    user::Identity,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("title is required")]
    MissingTitle,
    #[error("at least one question with a prompt and an option is required")]
    NoQuestions,
    #[error("a quiz must keep at least one question")]
    LastQuestion,
    #[error("question {0} does not exist")]
    NoSuchQuestion(usize),
    #[error("option {0} does not exist; questions have {} options", OPTIONS_PER_QUESTION)]
    NoSuchOption(usize),
}

/// Request DTO and editing model for the authoring form.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, ToSchema)]
pub struct QuizDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub questions: Vec<QuestionDraft>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, ToSchema)]
pub struct QuestionDraft {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub options: [String; OPTIONS_PER_QUESTION],
    #[serde(default)]
    pub correct_option_index: usize,
}

impl QuestionDraft {
    /// Blank prompt, or nothing but blank options.
    pub fn is_blank(&self) -> bool {
        self.prompt.trim().is_empty() || self.options.iter().all(|o| o.trim().is_empty())
    }
}

impl Default for QuizDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            questions: vec![QuestionDraft::default()],
        }
    }
}

impl QuizDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_question(&mut self) -> usize {
        self.questions.push(QuestionDraft::default());
        self.questions.len() - 1
    }

    pub fn remove_question(&mut self, index: usize) -> Result<QuestionDraft, DraftError> {
        if index >= self.questions.len() {
            return Err(DraftError::NoSuchQuestion(index));
        }
        if self.questions.len() == 1 {
            return Err(DraftError::LastQuestion);
        }
        Ok(self.questions.remove(index))
    }

    pub fn set_prompt(&mut self, index: usize, prompt: impl Into<String>) -> Result<(), DraftError> {
        self.question_mut(index)?.prompt = prompt.into();
        Ok(())
    }

    pub fn set_option(
        &mut self,
        index: usize,
        option: usize,
        text: impl Into<String>,
    ) -> Result<(), DraftError> {
        let question = self.question_mut(index)?;
        let slot = question.options.get_mut(option).ok_or(DraftError::NoSuchOption(option))?;
        *slot = text.into();
        Ok(())
    }

    pub fn set_correct_option(&mut self, index: usize, option: usize) -> Result<(), DraftError> {
        if option >= OPTIONS_PER_QUESTION {
            return Err(DraftError::NoSuchOption(option));
        }
        self.question_mut(index)?.correct_option_index = option;
        Ok(())
    }

    /// Checks the draft and turns it into a quiz ready for the store. Blank
    /// questions are dropped; the author falls back to the anonymous label.
    pub fn submit(self, author: Option<&Identity>) -> Result<NewQuiz, DraftError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(DraftError::MissingTitle);
        }

        let mut questions = Vec::with_capacity(self.questions.len());
        for q in self.questions.into_iter().filter(|q| !q.is_blank()) {
            if q.correct_option_index >= OPTIONS_PER_QUESTION {
                return Err(DraftError::NoSuchOption(q.correct_option_index));
            }
            questions.push(QuestionDefinition {
                prompt: q.prompt.trim().to_string(),
                options: q.options,
                correct_option_index: q.correct_option_index,
            });
        }
        if questions.is_empty() {
            return Err(DraftError::NoQuestions);
        }

        let created_by = author
            .map(|identity| identity.display_name().to_string())
            .unwrap_or_else(|| ANONYMOUS_AUTHOR.to_string());

        Ok(NewQuiz {
            title: title.to_string(),
            description: self.description.trim().to_string(),
            questions,
            created_by,
        })
    }

    fn question_mut(&mut self, index: usize) -> Result<&mut QuestionDraft, DraftError> {
        self.questions.get_mut(index).ok_or(DraftError::NoSuchQuestion(index))
    }
}
