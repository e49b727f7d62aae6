//! CLI definition, tracing setup, and server startup.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing::info;

use strategypipe_shared::{AppConfig, PipelineConfig, load_config, load_config_from, store_token};
use strategypipe_store::{ArtifactStore, HttpArtifactStore};
use strategypipe_storage::Storage;

use crate::api::{self, AppState};

/// StrategyPipe — IT strategy generation service.
#[derive(Parser)]
#[command(
    name = "strategypipe",
    version,
    about = "Turn gap-analysis worksheets into IT strategy documents and executive decks.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Path to a config file (defaults to ~/.strategypipe/strategypipe.toml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Listen port (overrides the config file).
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Initialize tracing from CLI flags (RUST_LOG takes precedence).
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "strategypipe=info",
        1 => "strategypipe=debug",
        _ => "strategypipe=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

/// Load config, assemble application state, and serve until shutdown.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => load_config_from(path)
            .wrap_err_with(|| format!("failed to load config from {}", path.display()))?,
        None => load_config().wrap_err("failed to load config")?,
    };
    let port = cli.port.unwrap_or(config.server.port);

    let state = build_state(&config).await?;

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("failed to bind {addr}"))?;
    info!(%addr, "strategypipe server listening");

    axum::serve(listener, api::router(state))
        .await
        .wrap_err("server error")?;

    Ok(())
}

/// Assemble shared state from config: session index, artifact store, runtime settings.
async fn build_state(config: &AppConfig) -> Result<AppState> {
    let pipeline = PipelineConfig::from(config);

    std::fs::create_dir_all(&pipeline.base_dir)
        .wrap_err_with(|| format!("failed to create {}", pipeline.base_dir.display()))?;

    let storage = Storage::open(&pipeline.base_dir.join("sessions.db"))
        .await
        .wrap_err("failed to open session index")?;

    let token = store_token(config);
    if token.is_none() {
        tracing::warn!(
            env = %config.store.api_key_env,
            "no store token configured, uploads will be unauthenticated"
        );
    }
    let store: Arc<dyn ArtifactStore> = Arc::new(
        HttpArtifactStore::new(&config.store.endpoint, token, config.store.upload_timeout_secs)
            .wrap_err("failed to build artifact store client")?,
    );

    Ok(AppState {
        storage: Arc::new(storage),
        store,
        pipeline,
    })
}
