pub mod api; // Upload page + JSON verification API
pub mod config;
pub mod pipeline; // Extraction adapter + governance rules

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::api::{start_server, ApiContext};
use crate::config::{AppConfig, ConfigError};
use crate::pipeline::extraction::{ExtractionError, GeminiClient};
use crate::pipeline::VerificationPipeline;

/// Failures that prevent the service from coming up.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Cannot build the model client: {0}")]
    Client(#[from] ExtractionError),
    #[error("Cannot start the async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("{0}")]
    Server(String),
}

/// Load configuration, start the HTTP server and serve until Ctrl-C.
pub fn run() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    serve().inspect_err(|e| tracing::error!("{e}"))
}

fn serve() -> Result<(), StartupError> {
    let config = AppConfig::from_env()?;
    tracing::info!(?config, "Configuration loaded");

    // The blocking HTTP client owns its own runtime; it must be built and
    // dropped outside the async context.
    let client = GeminiClient::from_config(&config)?;
    let pipeline = Arc::new(VerificationPipeline::new(
        Arc::new(client),
        config.unknown_type_policy,
    ));
    let ctx = ApiContext::from_config(pipeline.clone(), &config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(async move {
        let server = start_server(ctx, config.bind_addr)
            .await
            .map_err(StartupError::Server)?;
        tracing::info!(url = %server.url(), "Upload page ready");

        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Cannot listen for shutdown signal: {e}");
        }
        server.stop().await;
        Ok::<(), StartupError>(())
    });

    drop(runtime);
    drop(pipeline);
    result
}
