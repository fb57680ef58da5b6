//! Shapes returned by the backend's HTTP anomaly-history endpoint.

use argus_common::{AnomalyRecord, Freshness, SeverityBand, Tier2Analysis};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Response body of `GET /anomaly_events`.
#[derive(Debug, Clone, Deserialize)]
pub struct AnomalyEventsResponse {
    #[serde(default)]
    pub anomaly_events: Vec<StoredAnomaly>,
}

/// One anomaly event as persisted server-side.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredAnomaly {
    pub id: Option<String>,
    pub frame_id: Option<u64>,
    pub timestamp: Option<f64>,
    pub frame_file: Option<String>,
    pub details: Option<String>,
    pub confidence: Option<f64>,
    /// ISO-8601 wall-clock time the server recorded the event.
    pub session_time: Option<String>,
    pub tier2_analysis: Option<StoredTier2>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoredTier2 {
    pub threat_severity_index: Option<f64>,
    pub reasoning_summary: Option<String>,
    pub visual_score: Option<f64>,
    pub audio_score: Option<f64>,
    pub multimodal_agreement: Option<f64>,
    pub detailed_analysis: Option<String>,
    pub error: Option<String>,
}

impl StoredAnomaly {
    /// Convert a persisted event into a local record. Refreshed records
    /// have already been on screen once, so they enter the list `Seen`
    /// with no monotonic receipt time.
    pub fn into_record(self) -> AnomalyRecord {
        let received_at = self
            .session_time
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        let id = self
            .id
            .or_else(|| self.frame_id.map(|f| f.to_string()))
            .unwrap_or_else(|| format!("event-{}", received_at.timestamp_millis()));

        AnomalyRecord {
            id,
            timestamp: self.timestamp.unwrap_or(0.0),
            frame_file: self.frame_file,
            details: self.details.unwrap_or_default(),
            confidence: self.confidence,
            analysis: self.tier2_analysis.map(|t| {
                let score = t.threat_severity_index.unwrap_or(0.5);
                Tier2Analysis {
                    severity_score: score,
                    severity: SeverityBand::from_score(score),
                    reasoning_summary: t.reasoning_summary.unwrap_or_default(),
                    visual_score: t.visual_score,
                    audio_score: t.audio_score,
                    multimodal_agreement: t.multimodal_agreement,
                    detailed_analysis: t.detailed_analysis,
                    error: t.error,
                }
            }),
            freshness: Freshness::Seen,
            received_at,
            received_mono: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_event_becomes_seen_record() {
        let raw = r#"{
            "anomaly_events": [{
                "frame_id": 17,
                "timestamp": 44.2,
                "frame_file": "anomaly_frames/frame_17.jpg",
                "details": "unattended bag",
                "session_time": "2025-03-01T10:30:00+00:00",
                "tier2_analysis": {
                    "threat_severity_index": 0.3,
                    "reasoning_summary": "benign object"
                }
            }]
        }"#;
        let resp: AnomalyEventsResponse = serde_json::from_str(raw).unwrap();
        let record = resp.anomaly_events.into_iter().next().unwrap().into_record();
        assert_eq!(record.id, "17");
        assert_eq!(record.freshness, Freshness::Seen);
        assert!(record.received_mono.is_none());
        let analysis = record.analysis.unwrap();
        assert_eq!(analysis.severity, SeverityBand::Low);
    }

    #[test]
    fn test_empty_response_parses() {
        let resp: AnomalyEventsResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.anomaly_events.is_empty());
    }
}
