//! Prompt Agent - chat front-end for a hosted LLM agent
//!
//! Serves a browser chat UI. Each conversation is keyed by a deterministic
//! thread id so a returning patient resumes their earlier thread.

mod agent;
mod api;
mod config;
mod llm;
mod secrets;
mod session;
mod system_prompt;
mod tools;

use agent::ReactAgent;
use api::{create_router, AppState};
use config::AppConfig;
use llm::{LlmService, UnavailableService};
use secrets::SecretChain;
use std::net::SocketAddr;
use std::sync::Arc;
use tools::ToolRegistry;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prompt_agent=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration: platform secrets, then .env, then the environment
    let (secrets_file, env_file) = config::secret_store_paths();
    let secrets = SecretChain::standard(&secrets_file, &env_file);
    tracing::info!(
        secrets_file = %secrets_file.display(),
        env_file = %env_file.display(),
        sources = ?secrets.source_names(),
        "Secret sources configured"
    );
    let config = AppConfig::resolve(&secrets);

    let api_key_configured = config.llm.api_key.is_some();
    let llm: Arc<dyn LlmService> = match llm::from_config(&config.llm) {
        Ok(service) => {
            tracing::info!(model = %config.llm.model, "LLM client initialized");
            service
        }
        Err(e) => {
            tracing::warn!(error = %e, "LLM unavailable. Set OPENAI_API_KEY in secrets.toml, .env, or the environment.");
            Arc::new(UnavailableService::new(config.llm.model.clone(), e))
        }
    };

    let system_prompt = system_prompt::load_system_prompt(&config.prompt_file);
    let agent = ReactAgent::new(llm, ToolRegistry::standard(), system_prompt);
    let model_id = agent.model_id().to_string();

    let state = AppState::new(Arc::new(agent), model_id, api_key_configured);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Prompt agent listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
