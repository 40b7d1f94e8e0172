//! Startup helpers for the hadith QA server.
//!
//! Every artifact is acquired before the listener binds. Any failure aborts
//! startup with a non-zero exit code.

use std::process::ExitCode;
use std::sync::Arc;

use crate::retrieval::{ServiceConfig, StartupResult};
use crate::server::{self, AppState};

/// Run the server (used by the `hadith-rag` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting hadith QA v{}", env!("CARGO_PKG_VERSION"));

    let (config, state) = match initialize() {
        Ok(ready) => ready,
        Err(e) => {
            tracing::error!("Startup failed: {e}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(server::run_server(state, config.server.port)) {
        tracing::error!("Server error: {e}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Read and validate configuration, then acquire all artifacts.
///
/// # Errors
/// Returns an error if configuration is invalid or any artifact fails to load.
pub fn initialize() -> StartupResult<(ServiceConfig, Arc<AppState>)> {
    let config = ServiceConfig::from_env()?;
    config.validate()?;
    tracing::info!(
        data_dir = %config.corpus.data_dir.display(),
        index = %config.corpus.index_path.display(),
        model = %config.embedding.model_name,
        "configuration loaded"
    );

    let state = AppState::from_config(&config)?;
    tracing::info!(
        hadiths = state.pipeline.corpus_size(),
        "artifacts loaded"
    );
    Ok((config, state))
}
