//! End-to-end session pipeline: ingest → extract → synthesize → persist → hand off.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use strategypipe_extractor::extract_target_recommendations;
use strategypipe_report::{build_slide_deck, generate_strategy_document};
use strategypipe_shared::{
    DOCX_STRATEGY, EXECUTIVE_DECK_NAME, HARDWARE_GAP, HandoffPayload, PPTX_STRATEGY,
    PipelineConfig, Result, SOFTWARE_GAP, STRATEGY_DOC_NAME, SessionFile, StrategyPipeError,
};
use strategypipe_store::{ArtifactStore, persist};
use strategypipe_storage::{FileRecord, Storage};

use crate::ingest;

/// User-Agent string for artifact fetches and the handoff call.
const USER_AGENT: &str = concat!("StrategyPipe/", env!("CARGO_PKG_VERSION"));

/// Everything one session run needs.
#[derive(Debug, Clone)]
pub struct SessionRunConfig {
    /// Session identifier from the trigger.
    pub session_id: String,
    /// Notification target forwarded downstream.
    pub email: String,
    /// Input artifacts as declared by the trigger.
    pub files: Vec<SessionFile>,
    /// Session working directory (already created by the front door).
    pub session_dir: PathBuf,
    /// Runtime pipeline settings.
    pub pipeline: PipelineConfig,
}

/// Result of a completed session run.
#[derive(Debug)]
pub struct SessionOutcome {
    /// Number of file entries in the delivered handoff payload.
    pub handoff_files: usize,
    /// Distinct hardware recommendations extracted.
    pub hardware_recs: usize,
    /// Distinct software recommendations extracted.
    pub software_recs: usize,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when an artifact finishes persistence (`addressed` is false
    /// when the store returned no durable address).
    fn artifact_persisted(&self, name: &str, addressed: bool);
    /// Called when the pipeline completes.
    fn done(&self, outcome: &SessionOutcome);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn artifact_persisted(&self, _name: &str, _addressed: bool) {}
    fn done(&self, _outcome: &SessionOutcome) {}
}

/// Run the full session pipeline.
///
/// 1. Ingest input artifacts into the session directory
/// 2. Extract recommendations from gap worksheets
/// 3. Synthesize the strategy document and executive deck
/// 4. Persist every artifact to the store, refreshing addresses
/// 5. Deliver the consolidated payload downstream
#[instrument(skip_all, fields(session_id = %config.session_id))]
pub async fn run_session(
    config: &SessionRunConfig,
    store: &dyn ArtifactStore,
    storage: &Storage,
    progress: &dyn ProgressReporter,
) -> Result<SessionOutcome> {
    let start = Instant::now();
    let session_id = &config.session_id;

    info!(files = config.files.len(), "starting session pipeline");

    std::fs::create_dir_all(&config.session_dir)
        .map_err(|e| StrategyPipeError::io(&config.session_dir, e))?;

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(config.pipeline.fetch_timeout_secs))
        .build()
        .map_err(|e| StrategyPipeError::Ingestion(format!("failed to build HTTP client: {e}")))?;

    // --- Phase 1: Ingest ---
    progress.phase("Ingesting artifacts");
    let mut files = ingest::ingest_files(
        &client,
        &config.files,
        &config.session_dir,
        storage,
        session_id,
    )
    .await?;

    // --- Phase 2: Extract ---
    progress.phase("Extracting recommendations");
    let hardware = extract_category(&files, HARDWARE_GAP);
    let software = extract_category(&files, SOFTWARE_GAP);

    info!(
        hardware = hardware.len(),
        software = software.len(),
        "recommendation extraction complete"
    );

    // --- Phase 3: Synthesize ---
    progress.phase("Synthesizing reports");
    let strategy_doc = generate_strategy_document(session_id, &hardware, &software);
    let deck = build_slide_deck(session_id, &hardware, &software).render();

    let mut generated = Vec::with_capacity(2);
    for (name, tag, content) in [
        (STRATEGY_DOC_NAME, DOCX_STRATEGY, strategy_doc),
        (EXECUTIVE_DECK_NAME, PPTX_STRATEGY, deck),
    ] {
        let target = config.session_dir.join(name);
        std::fs::write(&target, content).map_err(|e| {
            StrategyPipeError::Synthesis(format!("{}: {e}", target.display()))
        })?;
        generated.push(SessionFile {
            file_name: name.into(),
            file_url: None,
            file_type: tag.into(),
            local_path: Some(target),
        });
    }
    files.append(&mut generated);

    // --- Phase 4: Persist ---
    progress.phase("Persisting artifacts");
    for file in &mut files {
        // Ingestion and synthesis both set local_path before this point.
        let Some(local_path) = file.local_path.clone() else {
            warn!(file_name = %file.file_name, "artifact has no local path, skipping persistence");
            continue;
        };

        file.file_url = persist(store, &local_path, session_id).await;
        progress.artifact_persisted(&file.file_name, file.file_url.is_some());

        let record = FileRecord {
            session_id: session_id.clone(),
            file_name: file.file_name.clone(),
            file_url: file.file_url.clone(),
            file_type: file.file_type.clone(),
            local_path: Some(local_path.display().to_string()),
            content_hash: None,
        };
        if let Err(e) = storage.upsert_file(&record).await {
            warn!(file_name = %record.file_name, error = %e, "failed to refresh artifact record");
        }
    }

    // --- Phase 5: Hand off ---
    progress.phase("Handing off");
    let payload = HandoffPayload::new(session_id.clone(), config.email.clone(), files);
    let handoff_files = payload.files.len();

    let response = client
        .post(&config.pipeline.handoff_url)
        .timeout(Duration::from_secs(config.pipeline.handoff_timeout_secs))
        .json(&payload)
        .send()
        .await
        .map_err(|e| {
            StrategyPipeError::Handoff(format!("{}: {e}", config.pipeline.handoff_url))
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(StrategyPipeError::Handoff(format!(
            "{}: HTTP {status}",
            config.pipeline.handoff_url
        )));
    }

    let outcome = SessionOutcome {
        handoff_files,
        hardware_recs: hardware.len(),
        software_recs: software.len(),
        elapsed: start.elapsed(),
    };

    progress.done(&outcome);

    info!(
        handoff_files = outcome.handoff_files,
        hardware_recs = outcome.hardware_recs,
        software_recs = outcome.software_recs,
        elapsed_ms = outcome.elapsed.as_millis(),
        "session pipeline complete"
    );

    Ok(outcome)
}

/// Union the recommendation sets of every materialized worksheet with the
/// given tag. A single worksheet that fails to parse is logged and skipped;
/// its category simply contributes nothing.
fn extract_category(files: &[SessionFile], tag: &str) -> BTreeSet<String> {
    let mut recommendations = BTreeSet::new();

    for file in files.iter().filter(|f| f.file_type == tag) {
        let Some(local_path) = file.local_path.as_deref() else {
            warn!(file_name = %file.file_name, "gap worksheet was never materialized");
            continue;
        };

        match extract_target_recommendations(local_path) {
            Ok(set) => recommendations.extend(set),
            Err(e) => {
                warn!(
                    file_name = %file.file_name,
                    error = %e,
                    "worksheet extraction failed, skipping"
                );
            }
        }
    }

    recommendations
}
