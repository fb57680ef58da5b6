//! Raw inbound frame as the backend encodes it.

use serde::Deserialize;

/// Message type discriminants used by the backend.
pub const MSG_TIER1_DETECTION: &str = "tier1_detection";
pub const MSG_TIER2_START: &str = "tier2_start";
pub const MSG_TIER2_RESULTS: &str = "tier2_results";
/// Streaming-path alias for `tier2_results`.
pub const MSG_TIER2_ANALYSIS: &str = "tier2_analysis";
pub const MSG_TIER2_ERROR: &str = "tier2_error";

/// Status values carried by tier-1 and heartbeat frames.
pub const STATUS_SUSPECTED: &str = "Suspected Anomaly";
pub const STATUS_NORMAL: &str = "Normal";

/// One decoded frame from the event stream. Every field is optional; the
/// backend mixes several producers onto the same channel and none of them
/// send the full shape. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerMessage {
    pub error: Option<String>,
    /// Base64 image payload of the live feed.
    pub frame: Option<String>,
    /// Identifier of the video source currently being processed.
    pub video_file: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub id: Option<String>,
    pub frame_id: Option<u64>,
    /// Media timestamp in seconds.
    pub timestamp: Option<f64>,
    pub status: Option<String>,
    pub details: Option<String>,
    pub confidence: Option<f64>,
    /// Opaque per-modality breakdown from the first-pass detector.
    pub tier1_components: Option<serde_json::Value>,
    pub frame_file: Option<String>,
    pub threat_severity_index: Option<f64>,
    pub reasoning_summary: Option<String>,
    pub visual_score: Option<f64>,
    pub audio_score: Option<f64>,
    pub multimodal_agreement: Option<f64>,
    pub detailed_analysis: Option<String>,
    pub message: Option<String>,
}

impl ServerMessage {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Correlation identifier for this frame: the explicit `id` when the
    /// backend assigns one, otherwise the frame number it analysed.
    pub fn subject_id(&self) -> Option<String> {
        self.id
            .clone()
            .or_else(|| self.frame_id.map(|f| f.to_string()))
    }
}
