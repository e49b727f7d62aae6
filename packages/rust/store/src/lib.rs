//! Artifact store client.
//!
//! The store is an opaque remote service exposing two operations: find or
//! create a container by name, and upload a file into a container for a
//! durable address. Container names are session-scoped, so concurrent
//! sessions never collide.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use strategypipe_shared::{Result, StrategyPipeError};

/// User-Agent string for store requests.
const USER_AGENT: &str = concat!("StrategyPipe/", env!("CARGO_PKG_VERSION"));

/// Remote artifact store operations.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Resolve a container by exact name, creating it when absent.
    ///
    /// Idempotent: a second call with the same name resolves the existing
    /// container instead of creating another.
    async fn ensure_container(&self, name: &str) -> Result<String>;

    /// Upload a local file into a container and return its durable address.
    async fn upload(&self, container_id: &str, local_path: &Path) -> Result<String>;
}

/// Persist one artifact into the session's container.
///
/// Any store failure is logged and surfaces as `None`; the pipeline
/// tolerates partial persistence without aborting the run.
pub async fn persist(
    store: &dyn ArtifactStore,
    local_path: &Path,
    session_id: &str,
) -> Option<String> {
    let result = async {
        let container_id = store.ensure_container(session_id).await?;
        store.upload(&container_id, local_path).await
    }
    .await;

    match result {
        Ok(url) => {
            debug!(path = %local_path.display(), url = %url, "artifact persisted");
            Some(url)
        }
        Err(e) => {
            warn!(
                path = %local_path.display(),
                session_id,
                error = %e,
                "artifact persistence failed, continuing with null address"
            );
            None
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ContainerResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

/// Store client speaking the container/artifact REST surface.
pub struct HttpArtifactStore {
    client: reqwest::Client,
    base: String,
    token: Option<String>,
}

impl HttpArtifactStore {
    /// Build a client for the store at `endpoint`, with an optional bearer token.
    pub fn new(endpoint: &str, token: Option<String>, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                StrategyPipeError::Persistence(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base: endpoint.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

#[async_trait]
impl ArtifactStore for HttpArtifactStore {
    async fn ensure_container(&self, name: &str) -> Result<String> {
        let lookup_url = format!("{}/containers/{name}", self.base);
        let response = self
            .authorized(self.client.get(&lookup_url))
            .send()
            .await
            .map_err(|e| StrategyPipeError::Persistence(format!("{lookup_url}: {e}")))?;

        match response.status() {
            status if status.is_success() => {
                let container: ContainerResponse = response.json().await.map_err(|e| {
                    StrategyPipeError::Persistence(format!("container lookup body: {e}"))
                })?;
                debug!(name, id = %container.id, "resolved existing container");
                Ok(container.id)
            }
            reqwest::StatusCode::NOT_FOUND => {
                let create_url = format!("{}/containers", self.base);
                let response = self
                    .authorized(self.client.post(&create_url))
                    .json(&serde_json::json!({ "name": name }))
                    .send()
                    .await
                    .map_err(|e| StrategyPipeError::Persistence(format!("{create_url}: {e}")))?;

                if !response.status().is_success() {
                    return Err(StrategyPipeError::Persistence(format!(
                        "container create failed: HTTP {}",
                        response.status()
                    )));
                }

                let container: ContainerResponse = response.json().await.map_err(|e| {
                    StrategyPipeError::Persistence(format!("container create body: {e}"))
                })?;
                debug!(name, id = %container.id, "created container");
                Ok(container.id)
            }
            status => Err(StrategyPipeError::Persistence(format!(
                "container lookup failed: HTTP {status}"
            ))),
        }
    }

    async fn upload(&self, container_id: &str, local_path: &Path) -> Result<String> {
        let file_name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                StrategyPipeError::Persistence(format!(
                    "no usable file name in {}",
                    local_path.display()
                ))
            })?;

        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|e| StrategyPipeError::Persistence(format!("{}: {e}", local_path.display())))?;

        let upload_url = format!("{}/containers/{container_id}/artifacts", self.base);
        let response = self
            .authorized(self.client.post(&upload_url))
            .query(&[("file_name", file_name)])
            .body(bytes)
            .send()
            .await
            .map_err(|e| StrategyPipeError::Persistence(format!("{upload_url}: {e}")))?;

        if !response.status().is_success() {
            return Err(StrategyPipeError::Persistence(format!(
                "upload failed: HTTP {}",
                response.status()
            )));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| StrategyPipeError::Persistence(format!("upload body: {e}")))?;

        Ok(uploaded.url)
    }
}
