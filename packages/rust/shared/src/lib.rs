//! Shared types, error model, and configuration for StrategyPipe.
//!
//! This crate is the foundation depended on by all other StrategyPipe crates.
//! It provides:
//! - [`StrategyPipeError`] — the unified error type
//! - Domain types ([`SessionFile`], [`TriggerRequest`], [`HandoffPayload`])
//! - Configuration ([`AppConfig`], [`PipelineConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, PipelineConfig, PipelineDefaults, ServerConfig, StoreConfig, config_dir,
    config_file_path, load_config, load_config_from, store_token,
};
pub use error::{Result, StrategyPipeError};
pub use types::{
    DOCX_STRATEGY, EXECUTIVE_DECK_NAME, GPT_MODULE, HARDWARE_GAP, HandoffPayload, PPTX_STRATEGY,
    SOFTWARE_GAP, STATUS_COMPLETE, STRATEGY_DOC_NAME, SessionFile, TriggerRequest,
    session_dir_name,
};
