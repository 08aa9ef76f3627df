//! Taskforge server binary.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use taskforge::adapters::ai::{OpenAIConfig, OpenAIProvider};
use taskforge::adapters::http::{api_router, ApiContext};
use taskforge::adapters::http::auth::AuthAppState;
use taskforge::adapters::http::conversation::ConversationAppState;
use taskforge::adapters::http::middleware::JwtAuth;
use taskforge::adapters::http::recommendation::RecommendationAppState;
use taskforge::adapters::http::task_definition::TaskDefinitionAppState;
use taskforge::adapters::huggingface::HuggingFaceSearch;
use taskforge::adapters::postgres::{
    PostgresConversationRepository, PostgresTaskDefinitionRepository, PostgresUserRepository,
};
use taskforge::application::handlers::conversation::{SendMessageHandler, StreamMessageHandler};
use taskforge::application::handlers::recommendation::RecommendModelsHandler;
use taskforge::application::handlers::task_definition::CreateTaskDefinitionHandler;
use taskforge::application::ConversationLocks;
use taskforge::config::AppConfig;
use taskforge::domain::conversation::{CompletionSignal, MarkerPhraseDetector};
use taskforge::ports::{
    AIProvider, ConversationRepository, ModelSearch, TaskDefinitionRepository, UserRepository,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(&config.server.log_level)
        }))
        .init();

    config.validate()?;

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        tracing::info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    // Repositories
    let conversations: Arc<dyn ConversationRepository> =
        Arc::new(PostgresConversationRepository::new(pool.clone()));
    let task_definitions: Arc<dyn TaskDefinitionRepository> =
        Arc::new(PostgresTaskDefinitionRepository::new(pool.clone()));
    let users: Arc<dyn UserRepository> = Arc::new(PostgresUserRepository::new(pool));

    // External collaborators
    let provider: Arc<dyn AIProvider> = Arc::new(OpenAIProvider::new(
        OpenAIConfig::from_app_config(&config.ai),
    ));
    let info = provider.provider_info();
    tracing::info!(provider = %info.name, model = %info.model, "AI backend configured");
    let hub: Arc<dyn ModelSearch> = Arc::new(HuggingFaceSearch::from_app_config(&config.ai));

    // Core services
    let detector: Arc<dyn CompletionSignal> = Arc::new(MarkerPhraseDetector::default());
    let locks = Arc::new(ConversationLocks::new());
    let send_handler = Arc::new(SendMessageHandler::new(
        Arc::clone(&provider),
        Arc::clone(&conversations),
        Arc::clone(&detector),
        Arc::clone(&locks),
    ));
    let stream_handler = Arc::new(StreamMessageHandler::new(
        Arc::clone(&provider),
        Arc::clone(&conversations),
        Arc::clone(&detector),
        Arc::clone(&locks),
    ));
    let create_handler = Arc::new(CreateTaskDefinitionHandler::new(
        Arc::clone(&conversations),
        Arc::clone(&task_definitions),
    ));
    let recommender = Arc::new(RecommendModelsHandler::new(Arc::clone(&provider), hub));

    let jwt = Arc::new(JwtAuth::new(&config.auth));
    let context = ApiContext {
        auth: AuthAppState::new(
            users,
            Arc::clone(&jwt),
            config.auth.invitation_codes_list(),
        ),
        conversations: ConversationAppState::new(conversations, send_handler, stream_handler),
        task_definitions: TaskDefinitionAppState::new(task_definitions, create_handler),
        recommendations: RecommendationAppState::new(recommender),
        jwt,
    };

    let app = api_router(context, &config.server);
    let addr = config.server.socket_addr();
    tracing::info!(%addr, "Taskforge listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
