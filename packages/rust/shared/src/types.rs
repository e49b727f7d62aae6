//! Core domain types for StrategyPipe sessions.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StrategyPipeError};

/// Workflow stage label this service stamps on its handoff payload.
pub const GPT_MODULE: &str = "it_strategy";

/// Terminal status reported to the downstream stage.
pub const STATUS_COMPLETE: &str = "complete";

/// File tag for hardware gap worksheets (extracted).
pub const HARDWARE_GAP: &str = "hardware_gap";

/// File tag for software gap worksheets (extracted).
pub const SOFTWARE_GAP: &str = "software_gap";

/// File tag for the generated narrative strategy document.
pub const DOCX_STRATEGY: &str = "docx_strategy";

/// File tag for the generated executive slide deck.
pub const PPTX_STRATEGY: &str = "pptx_strategy";

/// Fixed file name for the narrative strategy document.
pub const STRATEGY_DOC_NAME: &str = "IT Infrastructure Upgrade Strategy.md";

/// Fixed file name for the executive slide deck.
pub const EXECUTIVE_DECK_NAME: &str = "IT Infrastructure Upgrade Executive Report.md";

// ---------------------------------------------------------------------------
// SessionFile
// ---------------------------------------------------------------------------

/// One artifact flowing through a session, before and after materialization.
///
/// `file_type` is an open-ended tag set; only [`HARDWARE_GAP`] and
/// [`SOFTWARE_GAP`] are significant to extraction, every other tag passes
/// through unexamined. `local_path` is set once the artifact is written to
/// the session directory and never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFile {
    /// Declared file name; also the name within the session directory.
    pub file_name: String,
    /// Remote address. Refreshed by persistence; `None` when an upload failed.
    #[serde(default)]
    pub file_url: Option<String>,
    /// Open-ended tag describing the artifact's role.
    pub file_type: String,
    /// Where the artifact was materialized, if it was.
    #[serde(skip)]
    pub local_path: Option<PathBuf>,
}

impl SessionFile {
    /// Whether this artifact is a gap worksheet the extractor should read.
    pub fn is_gap_artifact(&self) -> bool {
        self.file_type == HARDWARE_GAP || self.file_type == SOFTWARE_GAP
    }
}

// ---------------------------------------------------------------------------
// TriggerRequest
// ---------------------------------------------------------------------------

/// Inbound trigger that starts one session run.
#[derive(Debug, Clone, Deserialize)]
pub struct TriggerRequest {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub files: Vec<SessionFile>,
    #[serde(default)]
    pub gpt_module: String,
    #[serde(default)]
    pub status: String,
}

impl TriggerRequest {
    /// Reject triggers missing `session_id`, `email`, or any files, or
    /// carrying a `session_id` that is not a plain directory name.
    ///
    /// Validation failures surface synchronously to the caller; the pipeline
    /// never starts and no session directory is created.
    pub fn validate(&self) -> Result<()> {
        if self.session_id.trim().is_empty()
            || self.email.trim().is_empty()
            || self.files.is_empty()
        {
            return Err(StrategyPipeError::validation("missing required fields"));
        }

        // The session id becomes a directory name under the working root;
        // it must stay a single path component.
        let mut components = Path::new(&self.session_id).components();
        let single_normal = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single_normal || self.session_id.contains('\\') {
            return Err(StrategyPipeError::validation(
                "session_id must be a single path component",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// HandoffPayload
// ---------------------------------------------------------------------------

/// Consolidated payload delivered to the next workflow stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffPayload {
    pub session_id: String,
    pub email: String,
    pub gpt_module: String,
    pub files: Vec<SessionFile>,
    pub status: String,
}

impl HandoffPayload {
    /// Build the terminal payload for a completed session.
    pub fn new(session_id: impl Into<String>, email: impl Into<String>, files: Vec<SessionFile>) -> Self {
        Self {
            session_id: session_id.into(),
            email: email.into(),
            gpt_module: GPT_MODULE.into(),
            files,
            status: STATUS_COMPLETE.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Session directory naming
// ---------------------------------------------------------------------------

/// Directory name for a session's working storage.
///
/// Session ids arriving from upstream may or may not already carry the
/// `Temp_` prefix; the prefix is applied exactly once.
pub fn session_dir_name(session_id: &str) -> String {
    if session_id.starts_with("Temp_") {
        session_id.to_string()
    } else {
        format!("Temp_{session_id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gap_file(name: &str, tag: &str) -> SessionFile {
        SessionFile {
            file_name: name.into(),
            file_url: Some(format!("https://files.example.com/{name}")),
            file_type: tag.into(),
            local_path: None,
        }
    }

    #[test]
    fn trigger_validation_rejects_missing_fields() {
        let trigger = TriggerRequest {
            session_id: "sess-1".into(),
            email: String::new(),
            files: vec![gap_file("hw.csv", HARDWARE_GAP)],
            gpt_module: String::new(),
            status: String::new(),
        };
        assert!(trigger.validate().is_err());
    }

    #[test]
    fn trigger_validation_rejects_empty_files() {
        let trigger = TriggerRequest {
            session_id: "sess-1".into(),
            email: "ops@example.com".into(),
            files: vec![],
            gpt_module: String::new(),
            status: String::new(),
        };
        let err = trigger.validate().unwrap_err();
        assert!(err.to_string().contains("missing required fields"));
    }

    #[test]
    fn trigger_validation_accepts_complete_request() {
        let trigger = TriggerRequest {
            session_id: "sess-1".into(),
            email: "ops@example.com".into(),
            files: vec![gap_file("hw.csv", HARDWARE_GAP)],
            gpt_module: "intake".into(),
            status: "ready".into(),
        };
        assert!(trigger.validate().is_ok());
    }

    #[test]
    fn trigger_validation_rejects_path_like_session_ids() {
        for bad in ["x/../../evil", "../evil", "/etc", "a/b", "..", ".", "x\\..\\y"] {
            let trigger = TriggerRequest {
                session_id: bad.into(),
                email: "ops@example.com".into(),
                files: vec![gap_file("hw.csv", HARDWARE_GAP)],
                gpt_module: String::new(),
                status: String::new(),
            };
            assert!(trigger.validate().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn session_dir_name_applies_prefix_once() {
        assert_eq!(session_dir_name("abc123"), "Temp_abc123");
        assert_eq!(session_dir_name("Temp_abc123"), "Temp_abc123");
    }

    #[test]
    fn local_path_never_serializes() {
        let mut file = gap_file("hw.csv", HARDWARE_GAP);
        file.local_path = Some(PathBuf::from("/tmp/hw.csv"));
        let json = serde_json::to_string(&file).expect("serialize");
        assert!(!json.contains("local_path"));
        assert!(json.contains("hardware_gap"));
    }

    #[test]
    fn failed_upload_serializes_as_null_url() {
        let mut file = gap_file("hw.csv", HARDWARE_GAP);
        file.file_url = None;
        let json = serde_json::to_string(&file).expect("serialize");
        assert!(json.contains("\"file_url\":null"));
    }

    #[test]
    fn handoff_payload_is_stamped() {
        let payload = HandoffPayload::new("sess-1", "ops@example.com", vec![]);
        assert_eq!(payload.gpt_module, GPT_MODULE);
        assert_eq!(payload.status, STATUS_COMPLETE);

        let json = serde_json::to_string(&payload).expect("serialize");
        let parsed: HandoffPayload = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.session_id, "sess-1");
        assert_eq!(parsed.gpt_module, "it_strategy");
    }
}
