use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use market_brief::config::AppConfig;
use market_brief::interview::{ChatModel, InterviewManager, InterviewRouteState, interview_routes};
use market_brief::llm::{LlmConfig, create_provider};

#[tokio::main]
async fn main() -> market_brief::error::Result<()> {
    // A missing .env file is fine; the variables may come from the shell.
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("  export OPENAI_API_KEY=sk-...");
            return Err(e.into());
        }
    };

    eprintln!("📈 Market Brief v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: {}", config.api_base);
    eprintln!(
        "   Models: {}",
        ChatModel::ALL.map(|m| m.as_str()).join(", ")
    );
    eprintln!("   Step delay: {:?}", config.interview.step_delay);
    if let Some(ref dir) = config.interview.export_dir {
        eprintln!("   Export dir: {}", dir.display());
    }
    eprintln!("   Listening: http://{}\n", config.bind_addr);

    let llm = create_provider(&LlmConfig {
        api_key: config.api_key.clone(),
        api_base: config.api_base.clone(),
        model: ChatModel::default().as_str().to_string(),
        timeout: config.request_timeout,
    })?;

    let manager = Arc::new(InterviewManager::new(llm, config.interview.clone()));

    let app = interview_routes(InterviewRouteState {
        manager: Arc::clone(&manager),
    })
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "Interview server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    tracing::info!("Shutting down, stopping any running batch");
    manager.shutdown().await;

    Ok(())
}
