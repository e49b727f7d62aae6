//! Background execution of session pipelines.
//!
//! Sessions run on detached tokio tasks; outcome is recorded in storage so
//! callers can observe progress through the session record.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use strategypipe_storage::{SESSION_COMPLETE, SESSION_FAILED, Storage};
use strategypipe_store::ArtifactStore;

use crate::pipeline::{SessionRunConfig, SilentProgress, run_session};

/// Spawn a session pipeline in the background.
///
/// The returned handle is for tests and graceful shutdown; the task records
/// its own terminal status, so dropping the handle is fine.
pub fn spawn_session(
    config: SessionRunConfig,
    store: Arc<dyn ArtifactStore>,
    storage: Arc<Storage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let session_id = config.session_id.clone();

        match run_session(&config, store.as_ref(), storage.as_ref(), &SilentProgress).await {
            Ok(outcome) => {
                if let Err(e) = storage
                    .update_session_status(&session_id, SESSION_COMPLETE, None)
                    .await
                {
                    error!(session_id = %session_id, error = %e, "failed to record completion");
                }
                info!(
                    session_id = %session_id,
                    handoff_files = outcome.handoff_files,
                    "background session finished"
                );
            }
            Err(e) => {
                error!(session_id = %session_id, error = %e, "background session failed");
                if let Err(record_err) = storage
                    .update_session_status(&session_id, SESSION_FAILED, Some(&e.to_string()))
                    .await
                {
                    error!(session_id = %session_id, error = %record_err, "failed to record failure");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use strategypipe_shared::{PipelineConfig, SessionFile};
    use strategypipe_store::HttpArtifactStore;
    use uuid::Uuid;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn test_storage() -> Arc<Storage> {
        let tmp = std::env::temp_dir().join(format!("sp_runner_{}.db", Uuid::now_v7()));
        Arc::new(Storage::open(&tmp).await.unwrap())
    }

    fn run_config(server: &MockServer, session_id: &str, files: Vec<SessionFile>) -> SessionRunConfig {
        SessionRunConfig {
            session_id: session_id.into(),
            email: "ops@example.com".into(),
            files,
            session_dir: std::env::temp_dir().join(format!("sp-runner-{}", Uuid::now_v7())),
            pipeline: PipelineConfig {
                base_dir: std::env::temp_dir(),
                fetch_timeout_secs: 5,
                handoff_url: format!("{}/start_gap_target", server.uri()),
                handoff_timeout_secs: 5,
            },
        }
    }

    #[tokio::test]
    async fn successful_run_marks_session_complete() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/files/hw.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "Id,Category,Platform,Tier,Status,Recommendation\n1,c,SrvA,T1,Active,SrvA-v2\n",
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(wiremock::matchers::path_regex("^/containers/[^/]+$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "c-1"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/containers/c-1/artifacts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"url": "https://store.example.com/a"}),
            ))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/start_gap_target"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let storage = test_storage().await;
        storage
            .insert_session("bg-ok", "ops@example.com", "it_strategy")
            .await
            .unwrap();

        let config = run_config(
            &server,
            "bg-ok",
            vec![SessionFile {
                file_name: "hw.csv".into(),
                file_url: Some(format!("{}/files/hw.csv", server.uri())),
                file_type: "hardware_gap".into(),
                local_path: None,
            }],
        );
        let session_dir = config.session_dir.clone();
        let store: Arc<dyn ArtifactStore> =
            Arc::new(HttpArtifactStore::new(&server.uri(), None, 5).unwrap());

        spawn_session(config, store, Arc::clone(&storage))
            .await
            .unwrap();

        let record = storage.get_session("bg-ok").await.unwrap().unwrap();
        assert_eq!(record.status, SESSION_COMPLETE);
        assert!(record.error.is_none());
        assert!(record.finished_at.is_some());

        let _ = std::fs::remove_dir_all(&session_dir);
    }

    #[tokio::test]
    async fn failed_run_marks_session_failed_with_context() {
        let server = MockServer::start().await;

        // Every artifact fetch fails, which is fatal for the pipeline.
        Mock::given(method("GET"))
            .and(path("/files/hw.csv"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let storage = test_storage().await;
        storage
            .insert_session("bg-fail", "ops@example.com", "it_strategy")
            .await
            .unwrap();

        let config = run_config(
            &server,
            "bg-fail",
            vec![SessionFile {
                file_name: "hw.csv".into(),
                file_url: Some(format!("{}/files/hw.csv", server.uri())),
                file_type: "hardware_gap".into(),
                local_path: None,
            }],
        );
        let session_dir = config.session_dir.clone();
        let store: Arc<dyn ArtifactStore> =
            Arc::new(HttpArtifactStore::new(&server.uri(), None, 5).unwrap());

        spawn_session(config, store, Arc::clone(&storage))
            .await
            .unwrap();

        let record = storage.get_session("bg-fail").await.unwrap().unwrap();
        assert_eq!(record.status, SESSION_FAILED);
        assert!(record.error.is_some());

        let _ = std::fs::remove_dir_all(&session_dir);
    }
}
