//! Ordered dispatch of inbound frames.
//!
//! Exactly one `Action` is produced per frame, evaluated in a fixed
//! priority order. The live-frame payload and the active video-file
//! identifier are carried alongside the action because they ride on frames
//! of every kind and must be applied regardless of the winning branch.

use crate::message::{
    ServerMessage, MSG_TIER1_DETECTION, MSG_TIER2_ANALYSIS, MSG_TIER2_ERROR, MSG_TIER2_RESULTS,
    MSG_TIER2_START, STATUS_SUSPECTED,
};

/// A first-pass detection ready for the correlator's insert operation.
#[derive(Debug, Clone)]
pub struct DetectionEvent {
    /// Server-assigned identifier, when present. Legacy frames carry none.
    pub id: Option<String>,
    /// Media timestamp in seconds; legacy frames may omit it.
    pub timestamp: Option<f64>,
    pub frame_file: Option<String>,
    pub details: String,
    pub confidence: Option<f64>,
}

/// A completed (or failed) deep-analysis pass ready for result merge.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub subject_id: Option<String>,
    pub severity_score: f64,
    pub reasoning_summary: String,
    pub visual_score: Option<f64>,
    pub audio_score: Option<f64>,
    pub multimodal_agreement: Option<f64>,
    pub detailed_analysis: Option<String>,
    pub error: Option<String>,
}

/// The exclusive outcome of classifying one frame.
#[derive(Debug, Clone)]
pub enum Action {
    /// Explicit error field from the backend; nothing else in the frame is
    /// examined.
    ReportError(String),
    /// Deep analysis started for the given subject.
    AnalysisStarted { subject_id: Option<String> },
    /// Deep analysis finished; route to the correlator's result merge.
    AnalysisCompleted(AnalysisOutcome),
    /// First-pass detection; route to the correlator's insert.
    Detection(DetectionEvent),
    /// Steady-state "all normal" update.
    Heartbeat { details: Option<String> },
}

/// Classified frame: non-exclusive payloads plus the winning action.
#[derive(Debug, Clone)]
pub struct Classified {
    pub frame: Option<String>,
    pub video_file: Option<String>,
    pub action: Action,
}

/// Reduce one decoded frame to a dispatch decision.
///
/// Priority: error field first (exclusive), then the frame payload and
/// video-file identifier (non-exclusive), then the type discriminant, then
/// the legacy status field. The explicit `tier1_detection` push and the
/// legacy `Suspected Anomaly` status collapse into the same `Detection`
/// action so the correlator applies a single dedup rule to both.
pub fn classify(msg: ServerMessage) -> Classified {
    if let Some(error) = msg.error {
        return Classified {
            frame: None,
            video_file: None,
            action: Action::ReportError(error),
        };
    }

    let frame = msg.frame.clone();
    let video_file = msg.video_file.clone();
    let subject_id = msg.subject_id();

    let action = match msg.kind.as_deref() {
        Some(MSG_TIER2_START) => Action::AnalysisStarted { subject_id },
        Some(MSG_TIER2_RESULTS) | Some(MSG_TIER2_ANALYSIS) | Some(MSG_TIER2_ERROR) => {
            Action::AnalysisCompleted(AnalysisOutcome {
                subject_id,
                // The backend reports 0.5 when the analyser cannot commit
                // to a score.
                severity_score: msg.threat_severity_index.unwrap_or(0.5),
                reasoning_summary: msg
                    .reasoning_summary
                    .unwrap_or_else(|| "Analysis complete".to_string()),
                visual_score: msg.visual_score,
                audio_score: msg.audio_score,
                multimodal_agreement: msg.multimodal_agreement,
                detailed_analysis: msg.detailed_analysis,
                error: None,
            })
        }
        Some(MSG_TIER1_DETECTION) => Action::Detection(DetectionEvent {
            id: subject_id,
            timestamp: msg.timestamp,
            frame_file: msg.frame_file,
            details: msg.details.unwrap_or_else(|| "Anomaly detected".to_string()),
            confidence: msg.confidence,
        }),
        _ => match msg.status.as_deref() {
            Some(STATUS_SUSPECTED) => Action::Detection(DetectionEvent {
                id: subject_id,
                timestamp: msg.timestamp,
                frame_file: msg.frame_file,
                details: msg.details.unwrap_or_else(|| "Anomaly detected".to_string()),
                confidence: msg.confidence,
            }),
            _ => Action::Heartbeat {
                details: msg.details,
            },
        },
    };

    Classified {
        frame,
        video_file,
        action,
    }
}
