use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use bson::oid::ObjectId;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use crate::{
    models::{
        quiz::{NewQuiz, QuestionDefinition, QuizDefinition},
        result::{AttemptResult, NewResult},
        user::Identity,
    },
    routes,
    services::{
        attempt_service::{AttemptService, AttemptSettings},
        draft_service::{DraftService, DEFAULT_DRAFT_RETENTION},
        quiz_repository::QuizRepository,
        session_service::SessionService,
        store::{MemoryQuizStore, QuizStore, StoreError},
    },
    utils::generate_jwt,
};

pub const TEST_SECRET: &str = "test_secret";

pub struct TestContext {
    pub app: Router,
    pub store: Arc<MemoryQuizStore>,
    pub attempts: AttemptService,
    pub drafts: DraftService,
}

pub fn setup() -> TestContext {
    let store = Arc::new(MemoryQuizStore::new());
    let mut ctx = setup_with_store(store.clone());
    ctx.store = store;
    ctx
}

/// Wires the app over `store`. `ctx.store` is a fresh, unrelated memory store.
pub fn setup_with_store(store: Arc<dyn QuizStore>) -> TestContext {
    let repository = QuizRepository::new(store);
    let attempts = AttemptService::new(repository.clone(), AttemptSettings::default());
    let drafts = DraftService::new(DEFAULT_DRAFT_RETENTION);
    let sessions = Arc::new(SessionService::new(TEST_SECRET.to_string()));
    let app = routes::init_routes(repository, attempts.clone(), drafts.clone(), sessions);

    TestContext {
        app,
        store: Arc::new(MemoryQuizStore::new()),
        attempts,
        drafts,
    }
}

pub fn identity(user_id: &str) -> Identity {
    Identity {
        user_id: user_id.to_string(),
        email: Some(format!("{user_id}@example.com")),
    }
}

pub fn token_for(user: &Identity) -> String {
    generate_jwt(&user.user_id, user.email.as_deref(), TEST_SECRET).expect("token should encode")
}

pub fn question(prompt: &str, correct: usize) -> QuestionDefinition {
    QuestionDefinition {
        prompt: prompt.to_string(),
        options: ["A", "B", "C", "D"].map(String::from),
        correct_option_index: correct,
    }
}

/// Stores a quiz whose questions have the given correct option indices.
pub async fn seed_quiz(store: &MemoryQuizStore, title: &str, correct: &[usize]) -> QuizDefinition {
    let questions = correct
        .iter()
        .enumerate()
        .map(|(i, c)| question(&format!("Question {}?", i + 1), *c))
        .collect();
    store
        .create_quiz(NewQuiz {
            title: title.to_string(),
            description: String::new(),
            questions,
            created_by: "seed@example.com".to_string(),
        })
        .await
        .expect("memory store accepts quizzes")
}

/// Helper to create a JSON body for requests.
pub fn json_body(json: &Value) -> Body {
    Body::from(json.to_string())
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<&Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(json_body(json))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

pub async fn send_json<T: DeserializeOwned>(app: &Router, req: Request<Body>) -> (StatusCode, T) {
    let (status, body) = send(app, req).await;
    let parsed = serde_json::from_slice(&body)
        .unwrap_or_else(|e| panic!("{status}: {e}: {}", String::from_utf8_lossy(&body)));
    (status, parsed)
}

fn down() -> StoreError {
    StoreError::Unavailable("connection refused".to_string())
}

/// Every call fails, as if the store were unreachable.
pub struct UnavailableStore;

#[async_trait]
impl QuizStore for UnavailableStore {
    async fn list_quizzes(&self) -> Result<Vec<QuizDefinition>, StoreError> {
        Err(down())
    }
    async fn get_quiz(&self, _id: ObjectId) -> Result<Option<QuizDefinition>, StoreError> {
        Err(down())
    }
    async fn create_quiz(&self, _quiz: NewQuiz) -> Result<QuizDefinition, StoreError> {
        Err(down())
    }
    async fn list_results_for_user(&self, _user_id: &str) -> Result<Vec<AttemptResult>, StoreError> {
        Err(down())
    }
    async fn create_result(&self, _result: NewResult) -> Result<AttemptResult, StoreError> {
        Err(down())
    }
}

/// Quizzes work; recording a result always fails.
pub struct ResultWritesFail(pub Arc<MemoryQuizStore>);

#[async_trait]
impl QuizStore for ResultWritesFail {
    async fn list_quizzes(&self) -> Result<Vec<QuizDefinition>, StoreError> {
        self.0.list_quizzes().await
    }
    async fn get_quiz(&self, id: ObjectId) -> Result<Option<QuizDefinition>, StoreError> {
        self.0.get_quiz(id).await
    }
    async fn create_quiz(&self, quiz: NewQuiz) -> Result<QuizDefinition, StoreError> {
        self.0.create_quiz(quiz).await
    }
    async fn list_results_for_user(&self, user_id: &str) -> Result<Vec<AttemptResult>, StoreError> {
        self.0.list_results_for_user(user_id).await
    }
    async fn create_result(&self, _result: NewResult) -> Result<AttemptResult, StoreError> {
        Err(down())
    }
}
