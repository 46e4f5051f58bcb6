use std::sync::Arc;

use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures::TryStreamExt;
use mongodb::{Collection, Database};
use tracing::warn;

use crate::{
    models::{
        quiz::{NewQuiz, QuizDefinition},
        result::{AttemptResult, NewResult},
    },
    services::store::{QuizStore, StoreError},
};

pub struct MongoQuizStore {
    quiz_collection: Collection<QuizDefinition>,
    result_collection: Collection<AttemptResult>,
}

impl MongoQuizStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            quiz_collection: db.collection("quizzes"),
            result_collection: db.collection("results"),
        }
    }
}

/// The `_id` MongoDB assigned. The write has already succeeded, so an
/// unexpected id type is logged and the document kept without one.
pub(crate) fn inserted_id(id: &bson::Bson) -> Option<ObjectId> {
    let oid = id.as_object_id();
    if oid.is_none() {
        warn!(inserted_id = %id, "insert returned a non-ObjectId _id");
    }
    oid
}

#[async_trait]
impl QuizStore for MongoQuizStore {
    async fn list_quizzes(&self) -> Result<Vec<QuizDefinition>, StoreError> {
        let cursor = self
            .quiz_collection
            .find(doc! {})
            .sort(doc! { "created_at": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn get_quiz(&self, id: ObjectId) -> Result<Option<QuizDefinition>, StoreError> {
        Ok(self.quiz_collection.find_one(doc! { "_id": id }).await?)
    }

    async fn create_quiz(&self, quiz: NewQuiz) -> Result<QuizDefinition, StoreError> {
        let mut definition = quiz.into_definition(None, bson::DateTime::now());

        let insert_result = self.quiz_collection.insert_one(&definition).await?;
        definition.id = inserted_id(&insert_result.inserted_id);
        Ok(definition)
    }

    async fn list_results_for_user(&self, user_id: &str) -> Result<Vec<AttemptResult>, StoreError> {
        let cursor = self
            .result_collection
            .find(doc! { "user_id": user_id })
            .sort(doc! { "completed_at": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn create_result(&self, result: NewResult) -> Result<AttemptResult, StoreError> {
        let mut stored = result.into_result(None, bson::DateTime::now());

        let insert_result = self.result_collection.insert_one(&stored).await?;
        stored.id = inserted_id(&insert_result.inserted_id);
        Ok(stored)
    }
}
