use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::{
    openapi::{
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
        SecurityRequirement,
    },
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::Config,
    routes::init_routes,
    services::{
        attempt_service::AttemptService, draft_service::DraftService,
        quiz_repository::QuizRepository, session_service::SessionService,
    },
};

mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;
mod utils;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health_check,
        routes::session::get_session,
        routes::session::sign_out,
        routes::quiz::list_quizzes,
        routes::quiz::create_quiz,
        routes::quiz::start_attempt,
        routes::draft::create_draft,
        routes::draft::get_draft,
        routes::draft::update_details,
        routes::draft::discard_draft,
        routes::draft::add_question,
        routes::draft::edit_question,
        routes::draft::remove_question,
        routes::draft::submit_draft,
        routes::attempt::get_attempt,
        routes::attempt::select_answer,
        routes::attempt::advance,
        routes::attempt::abandon,
        routes::results::get_results,
    ),
    components(
        schemas(
            models::user::Identity,
            models::user::GateView,
            models::user::SessionResponse,
            models::quiz::QuestionDefinition,
            models::quiz::QuizSummary,
            models::quiz::CreateQuizResponse,
            services::authoring::QuizDraft,
            services::authoring::QuestionDraft,
            services::draft_service::DraftView,
            services::draft_service::DraftDetails,
            services::draft_service::QuestionEdit,
            services::draft_service::OptionEdit,
            models::attempt::AttemptStatus,
            models::attempt::QuestionView,
            models::attempt::ScoreView,
            models::attempt::AttemptView,
            models::attempt::SelectAnswerRequest,
            models::result::AttemptResultResponse,
            models::result::ResultsSummary,
            models::result::ResultsResponse,
        ),
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by the route docs.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let comps = openapi.components.get_or_insert_with(Default::default);
        comps.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );

        let sr = SecurityRequirement::new::<String, Vec<String>, String>(
            "bearer_auth".to_string(),
            Vec::<String>::new(),
        );
        openapi.security = Some(vec![sr]);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "quizdeck=info,tower_http=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let store = db::init_store(&config).await?;

    let repository = QuizRepository::new(store);
    let attempts = AttemptService::new(repository.clone(), config.attempt_settings());
    let drafts = DraftService::new(config.draft_retention());
    let sessions = Arc::new(SessionService::new(config.jwt_secret.clone()));

    let app = Router::new()
        .merge(init_routes(repository, attempts.clone(), drafts.clone(), sessions))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    attempts.shutdown();
    drafts.shutdown();
    Ok(())
}

#[cfg(test)]
mod tests;
