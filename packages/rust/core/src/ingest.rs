//! Session ingestion: materialize input artifacts into the session directory.

use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use strategypipe_shared::{Result, SessionFile, StrategyPipeError};
use strategypipe_storage::{FileRecord, Storage};

/// Fetch every input artifact and write it under its declared name in the
/// session directory.
///
/// Per-artifact failures (bad URL, non-2xx, write error) are isolated: the
/// artifact is dropped with a warning and the rest of the batch continues.
/// Only a batch where every fetch failed is fatal. Returned files always
/// have `local_path` set.
pub async fn ingest_files(
    client: &reqwest::Client,
    files: &[SessionFile],
    session_dir: &Path,
    storage: &Storage,
    session_id: &str,
) -> Result<Vec<SessionFile>> {
    let mut ingested = Vec::with_capacity(files.len());
    let mut failures: usize = 0;

    for file in files {
        match fetch_one(client, file, session_dir).await {
            Ok((materialized, content_hash)) => {
                let record = FileRecord {
                    session_id: session_id.to_string(),
                    file_name: materialized.file_name.clone(),
                    file_url: materialized.file_url.clone(),
                    file_type: materialized.file_type.clone(),
                    local_path: materialized
                        .local_path
                        .as_ref()
                        .map(|p| p.display().to_string()),
                    content_hash: Some(content_hash),
                };
                if let Err(e) = storage.upsert_file(&record).await {
                    warn!(file_name = %record.file_name, error = %e, "failed to record artifact");
                }
                ingested.push(materialized);
            }
            Err(e) => {
                warn!(
                    file_name = %file.file_name,
                    error = %e,
                    "artifact fetch failed, skipping"
                );
                failures += 1;
            }
        }
    }

    if ingested.is_empty() && !files.is_empty() {
        return Err(StrategyPipeError::Ingestion(format!(
            "all {failures} artifact fetches failed"
        )));
    }

    debug!(
        session_id,
        ingested = ingested.len(),
        failures,
        "ingestion complete"
    );

    Ok(ingested)
}

/// Fetch a single artifact and write it to disk. Returns the materialized
/// file and its content hash.
async fn fetch_one(
    client: &reqwest::Client,
    file: &SessionFile,
    session_dir: &Path,
) -> Result<(SessionFile, String)> {
    let url = file
        .file_url
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| {
            StrategyPipeError::Ingestion(format!("{}: no file_url", file.file_name))
        })?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| StrategyPipeError::Ingestion(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(StrategyPipeError::Ingestion(format!("{url}: HTTP {status}")));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| StrategyPipeError::Ingestion(format!("{url}: body read failed: {e}")))?;

    // Only the final path component counts; declared names must not escape
    // the session directory.
    let safe_name = Path::new(&file.file_name)
        .file_name()
        .ok_or_else(|| {
            StrategyPipeError::Ingestion(format!("{}: unusable file name", file.file_name))
        })?;

    let target = session_dir.join(safe_name);
    std::fs::write(&target, &bytes)
        .map_err(|e| StrategyPipeError::Ingestion(format!("{}: {e}", target.display())))?;

    let content_hash = {
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        format!("{:x}", hasher.finalize())
    };

    let mut materialized = file.clone();
    materialized.local_path = Some(target);

    Ok((materialized, content_hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn input_file(name: &str, url: &str, tag: &str) -> SessionFile {
        SessionFile {
            file_name: name.into(),
            file_url: Some(url.into()),
            file_type: tag.into(),
            local_path: None,
        }
    }

    async fn test_env() -> (Storage, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("sp-ingest-{}", Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let storage = Storage::open(&dir.join("test.db")).await.unwrap();
        (storage, dir)
    }

    #[tokio::test]
    async fn materializes_artifacts_with_local_paths() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/hw.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string("header\nrow"))
            .mount(&server)
            .await;

        let (storage, dir) = test_env().await;
        storage
            .insert_session("s-1", "ops@example.com", "it_strategy")
            .await
            .unwrap();

        let files = vec![input_file(
            "hw.csv",
            &format!("{}/hw.csv", server.uri()),
            "hardware_gap",
        )];
        let client = reqwest::Client::new();

        let ingested = ingest_files(&client, &files, &dir, &storage, "s-1")
            .await
            .expect("ingest");

        assert_eq!(ingested.len(), 1);
        let local = ingested[0].local_path.as_ref().expect("local path set");
        assert_eq!(std::fs::read_to_string(local).unwrap(), "header\nrow");

        let records = storage.list_files_by_session("s-1").await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].content_hash.is_some());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn bad_url_is_isolated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/good.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gone.csv"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let (storage, dir) = test_env().await;
        storage
            .insert_session("s-2", "ops@example.com", "it_strategy")
            .await
            .unwrap();

        let files = vec![
            input_file("gone.csv", &format!("{}/gone.csv", server.uri()), "other"),
            input_file("good.csv", &format!("{}/good.csv", server.uri()), "other"),
        ];
        let client = reqwest::Client::new();

        let ingested = ingest_files(&client, &files, &dir, &storage, "s-2")
            .await
            .expect("ingest");
        assert_eq!(ingested.len(), 1);
        assert_eq!(ingested[0].file_name, "good.csv");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn all_fetches_failed_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (storage, dir) = test_env().await;
        storage
            .insert_session("s-3", "ops@example.com", "it_strategy")
            .await
            .unwrap();

        let files = vec![input_file(
            "hw.csv",
            &format!("{}/hw.csv", server.uri()),
            "hardware_gap",
        )];
        let client = reqwest::Client::new();

        let result = ingest_files(&client, &files, &dir, &storage, "s-3").await;
        assert!(matches!(result, Err(StrategyPipeError::Ingestion(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn declared_name_cannot_escape_session_dir() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("data"))
            .mount(&server)
            .await;

        let (storage, dir) = test_env().await;
        storage
            .insert_session("s-4", "ops@example.com", "it_strategy")
            .await
            .unwrap();

        let files = vec![input_file(
            "../../outside.csv",
            &format!("{}/f.csv", server.uri()),
            "other",
        )];
        let client = reqwest::Client::new();

        let ingested = ingest_files(&client, &files, &dir, &storage, "s-4")
            .await
            .expect("ingest");
        let local = ingested[0].local_path.as_ref().unwrap();
        assert!(local.starts_with(&dir));
        assert_eq!(local.file_name().unwrap(), "outside.csv");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
