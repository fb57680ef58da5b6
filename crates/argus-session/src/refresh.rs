//! HTTP side-channel to the backend: the authoritative anomaly-history
//! poll and the video upload that precedes upload-mode streaming.

use argus_common::{AnomalyRecord, ArgusError, Result};
use argus_protocol::{AnomalyEventsResponse, StoredAnomaly};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
struct UploadResponse {
    filename: String,
}

/// Thin client for the backend's REST surface.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the authoritative anomaly list. The caller decides whether to
    /// replace the in-memory list with it.
    pub async fn fetch_anomalies(&self) -> Result<Vec<AnomalyRecord>> {
        let url = format!("{}/anomaly_events", self.base_url);
        debug!(%url, "fetching anomaly history");
        let response: AnomalyEventsResponse = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response
            .anomaly_events
            .into_iter()
            .map(StoredAnomaly::into_record)
            .collect())
    }

    /// Upload a video file; the returned token names the uploaded file in
    /// the `/process_uploaded_video/<token>` connect target.
    pub async fn upload_video(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ArgusError::Upload(format!("cannot read {}: {e}", path.display())))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ArgusError::Upload(format!("not a file: {}", path.display())))?;

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("file", part);

        let response: UploadResponse = self
            .http
            .post(format!("{}/upload_video", self.base_url))
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.filename)
    }
}
