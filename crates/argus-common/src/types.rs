//! Core domain types for the anomaly-monitoring engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Lifecycle of the single backend connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Closing,
}

/// Headline detection state shown next to the live feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyStatus {
    Normal,
    Detected,
}

/// Display lifecycle of a record: freshly arrived vs. already noticed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    New,
    Seen,
}

/// Display band derived from the deep-analysis severity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityBand {
    High,
    Medium,
    Low,
}

impl SeverityBand {
    /// Fixed contract thresholds: > 0.7 high, 0.4–0.7 medium, < 0.4 low.
    pub fn from_score(score: f64) -> Self {
        if score > 0.7 {
            SeverityBand::High
        } else if score >= 0.4 {
            SeverityBand::Medium
        } else {
            SeverityBand::Low
        }
    }
}

/// Completed deep-analysis pass attached to an anomaly record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tier2Analysis {
    pub severity_score: f64,
    pub severity: SeverityBand,
    pub reasoning_summary: String,
    pub visual_score: Option<f64>,
    pub audio_score: Option<f64>,
    pub multimodal_agreement: Option<f64>,
    pub detailed_analysis: Option<String>,
    pub error: Option<String>,
}

/// One correlated detection, the unit of display.
///
/// `received_at` is the local wall clock at receipt (for the operator);
/// `received_mono` is the monotonic instant that drives aging and is not
/// serialized. Records restored from a backend refresh have no monotonic
/// receipt time and enter the list already `Seen`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub id: String,
    pub timestamp: f64,
    pub frame_file: Option<String>,
    pub details: String,
    pub confidence: Option<f64>,
    pub analysis: Option<Tier2Analysis>,
    pub freshness: Freshness,
    pub received_at: DateTime<Utc>,
    #[serde(skip)]
    pub received_mono: Option<Instant>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_band_thresholds() {
        assert_eq!(SeverityBand::from_score(0.8), SeverityBand::High);
        assert_eq!(SeverityBand::from_score(0.71), SeverityBand::High);
        assert_eq!(SeverityBand::from_score(0.7), SeverityBand::Medium);
        assert_eq!(SeverityBand::from_score(0.4), SeverityBand::Medium);
        assert_eq!(SeverityBand::from_score(0.39), SeverityBand::Low);
        assert_eq!(SeverityBand::from_score(0.0), SeverityBand::Low);
    }
}
