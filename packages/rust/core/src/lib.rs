//! Core pipeline orchestration and domain logic for StrategyPipe.
//!
//! This crate ties together ingestion, extraction, report synthesis,
//! persistence, and handoff into the end-to-end session workflow.

pub mod ingest;
pub mod pipeline;
pub mod runner;

pub use pipeline::{
    ProgressReporter, SessionOutcome, SessionRunConfig, SilentProgress, run_session,
};
pub use runner::spawn_session;
