//! Read snapshot published to the view layer.

use argus_common::{AnomalyRecord, AnomalyStatus, ConnectionStatus};
use serde::Serialize;

pub const STATUS_READY: &str = "Ready to monitor";
pub const STATUS_CONNECTING: &str = "Connecting to monitoring service...";
pub const STATUS_CONNECTED: &str = "Connected - monitoring for anomalies";
pub const STATUS_DISCONNECTED: &str = "Disconnected from monitoring service";
pub const STATUS_MONITORING: &str = "Monitoring...";
pub const STATUS_ANALYSIS_RUNNING: &str = "Deep analysis in progress...";
pub const STATUS_ANALYSIS_TIMEOUT: &str = "Deep analysis timed out - monitoring resumed";
pub const STATUS_PARSE_ERROR: &str = "Received malformed data from server";

/// Everything the view needs to render, owned exclusively by the session
/// and exposed only as clones through the watch channel.
#[derive(Debug, Clone, Serialize)]
pub struct SessionState {
    pub connection: ConnectionStatus,
    pub anomaly_status: AnomalyStatus,
    /// One-line activity description shown under the feed.
    pub status_line: String,
    pub last_error: Option<String>,
    /// Most recent live-frame payload.
    pub current_frame: Option<String>,
    /// Identifier of the video source currently being processed.
    pub video_file: Option<String>,
    pub analysis_in_progress: bool,
    /// Correlated records, newest first.
    pub anomalies: Vec<AnomalyRecord>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            connection: ConnectionStatus::Disconnected,
            anomaly_status: AnomalyStatus::Normal,
            status_line: STATUS_READY.to_string(),
            last_error: None,
            current_frame: None,
            video_file: None,
            analysis_in_progress: false,
            anomalies: Vec::new(),
        }
    }
}

impl SessionState {
    /// Transition side effects shared by every path to `Disconnected`:
    /// drop the live frame and return the headline status to neutral.
    pub fn reset_for_disconnect(&mut self) {
        self.connection = ConnectionStatus::Disconnected;
        self.current_frame = None;
        self.anomaly_status = AnomalyStatus::Normal;
    }
}
