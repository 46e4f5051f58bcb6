use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    models::{quiz::NewQuiz, user::Identity},
    services::authoring::{DraftError, QuizDraft},
};

/// Default time an untouched draft is kept.
pub const DEFAULT_DRAFT_RETENTION: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftServiceError {
    #[error("draft not found")]
    NotFound,
    #[error(transparent)]
    Draft(#[from] DraftError),
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct DraftView {
    #[schema(value_type = String)]
    pub draft_id: Uuid,
    pub draft: QuizDraft,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Default)]
pub struct DraftDetails {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct OptionEdit {
    pub index: usize,
    pub text: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Default)]
pub struct QuestionEdit {
    pub prompt: Option<String>,
    #[serde(default)]
    pub options: Vec<OptionEdit>,
    pub correct_option_index: Option<usize>,
}

struct DraftEntry {
    owner: Option<String>,
    draft: QuizDraft,
    last_edit: Instant,
    expiry: CancellationToken,
}

struct DraftBook {
    drafts: Mutex<HashMap<Uuid, DraftEntry>>,
    retention: Duration,
}

/// Quizzes being authored. Drafts started signed in belong to that user;
/// anonymous drafts are reachable by anyone holding the id.
#[derive(Clone)]
pub struct DraftService {
    book: Arc<DraftBook>,
}

impl DraftService {
    pub fn new(retention: Duration) -> Self {
        Self {
            book: Arc::new(DraftBook {
                drafts: Mutex::new(HashMap::new()),
                retention,
            }),
        }
    }

    pub fn create(&self, owner: Option<&Identity>) -> DraftView {
        let draft_id = Uuid::new_v4();
        let entry = DraftEntry {
            owner: owner.map(|identity| identity.user_id.clone()),
            draft: QuizDraft::new(),
            last_edit: Instant::now(),
            expiry: self.book.expire(draft_id),
        };
        let view = DraftView { draft_id, draft: entry.draft.clone() };
        self.book.lock().insert(draft_id, entry);
        debug!(%draft_id, "draft started");
        view
    }

    pub fn view(&self, draft_id: Uuid, who: Option<&Identity>) -> Result<DraftView, DraftServiceError> {
        let mut drafts = self.book.lock();
        let entry = owned_entry(&mut drafts, draft_id, who)?;
        Ok(DraftView { draft_id, draft: entry.draft.clone() })
    }

    pub fn set_details(
        &self,
        draft_id: Uuid,
        who: Option<&Identity>,
        details: DraftDetails,
    ) -> Result<DraftView, DraftServiceError> {
        self.edit(draft_id, who, |draft| {
            if let Some(title) = details.title {
                draft.title = title;
            }
            if let Some(description) = details.description {
                draft.description = description;
            }
            Ok(())
        })
    }

    pub fn add_question(&self, draft_id: Uuid, who: Option<&Identity>) -> Result<DraftView, DraftServiceError> {
        self.edit(draft_id, who, |draft| {
            draft.add_question();
            Ok(())
        })
    }

    /// Applies every change in `edit` or none of them.
    pub fn edit_question(
        &self,
        draft_id: Uuid,
        who: Option<&Identity>,
        index: usize,
        edit: QuestionEdit,
    ) -> Result<DraftView, DraftServiceError> {
        self.edit(draft_id, who, |draft| {
            if let Some(prompt) = edit.prompt {
                draft.set_prompt(index, prompt)?;
            }
            for option in edit.options {
                draft.set_option(index, option.index, option.text)?;
            }
            if let Some(correct) = edit.correct_option_index {
                draft.set_correct_option(index, correct)?;
            }
            Ok(())
        })
    }

    pub fn remove_question(
        &self,
        draft_id: Uuid,
        who: Option<&Identity>,
        index: usize,
    ) -> Result<DraftView, DraftServiceError> {
        self.edit(draft_id, who, |draft| draft.remove_question(index).map(drop))
    }

    /// Validates the draft for `author`. A valid draft is consumed; an
    /// invalid one stays available for fixing.
    pub fn submit(&self, draft_id: Uuid, author: Option<&Identity>) -> Result<NewQuiz, DraftServiceError> {
        let mut drafts = self.book.lock();
        let entry = owned_entry(&mut drafts, draft_id, author)?;
        let new_quiz = entry.draft.clone().submit(author)?;
        if let Some(entry) = drafts.remove(&draft_id) {
            entry.expiry.cancel();
        }
        info!(%draft_id, title = %new_quiz.title, "draft submitted");
        Ok(new_quiz)
    }

    pub fn discard(&self, draft_id: Uuid, who: Option<&Identity>) -> Result<(), DraftServiceError> {
        let mut drafts = self.book.lock();
        owned_entry(&mut drafts, draft_id, who)?;
        if let Some(entry) = drafts.remove(&draft_id) {
            entry.expiry.cancel();
        }
        Ok(())
    }

    pub fn shutdown(&self) {
        for entry in self.book.lock().values() {
            entry.expiry.cancel();
        }
    }

    fn edit<F>(&self, draft_id: Uuid, who: Option<&Identity>, change: F) -> Result<DraftView, DraftServiceError>
    where
        F: FnOnce(&mut QuizDraft) -> Result<(), DraftError>,
    {
        let mut drafts = self.book.lock();
        let entry = owned_entry(&mut drafts, draft_id, who)?;
        let mut draft = entry.draft.clone();
        change(&mut draft)?;
        entry.draft = draft;
        Ok(DraftView { draft_id, draft: entry.draft.clone() })
    }
}

impl DraftBook {
    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, DraftEntry>> {
        self.drafts.lock().unwrap_or_else(|poisoned| {
            warn!("draft lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Drops the draft once it has gone `retention` without being touched.
    fn expire(self: &Arc<Self>, draft_id: Uuid) -> CancellationToken {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let book = Arc::clone(self);

        tokio::spawn(async move {
            let mut deadline = Instant::now() + book.retention;
            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = sleep_until(deadline) => match book.expire_if_stale(draft_id) {
                        Some(next) => deadline = next,
                        None => break,
                    },
                }
            }
        });
        token
    }

    /// Removes a stale draft, or returns when to look again.
    fn expire_if_stale(&self, draft_id: Uuid) -> Option<Instant> {
        let mut drafts = self.lock();
        let due = drafts.get(&draft_id)?.last_edit + self.retention;
        if due > Instant::now() {
            return Some(due);
        }
        drafts.remove(&draft_id);
        debug!(%draft_id, "draft expired");
        None
    }
}

fn owned_entry<'a>(
    drafts: &'a mut HashMap<Uuid, DraftEntry>,
    draft_id: Uuid,
    who: Option<&Identity>,
) -> Result<&'a mut DraftEntry, DraftServiceError> {
    let entry = drafts
        .get_mut(&draft_id)
        .filter(|entry| match &entry.owner {
            Some(owner) => who.is_some_and(|identity| &identity.user_id == owner),
            None => true,
        })
        .ok_or(DraftServiceError::NotFound)?;
    entry.last_edit = Instant::now();
    Ok(entry)
}
