//! Anomaly correlation: merging the two asynchronous detection passes into
//! a single deduplicated record list.
//!
//! The list is kept newest-first. Deep analysis is requested immediately
//! after a first-pass detection, so when a result arrives without a usable
//! identifier the most recent unresolved record is the statistically likely
//! match; an exact identifier always takes precedence over that heuristic.

use argus_common::{AnomalyRecord, Freshness, SeverityBand, Tier2Analysis};
use argus_protocol::{AnalysisOutcome, DetectionEvent};
use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::warn;
use uuid::Uuid;

/// Two detections referencing the same frame within this window are the
/// same real-world event.
pub const DEDUP_WINDOW_SECS: f64 = 2.0;

#[derive(Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
}

#[derive(Debug, PartialEq, Eq)]
pub enum MergeOutcome {
    Matched { id: String, severity: SeverityBand },
    Discarded,
}

/// Insert a first-pass detection unless it duplicates an existing record,
/// by identifier or by frame reference within the dedup window. New records
/// are prepended so the list stays newest-first.
pub fn insert(
    list: &mut Vec<AnomalyRecord>,
    event: &DetectionEvent,
    now_wall: DateTime<Utc>,
    now_mono: Instant,
) -> InsertOutcome {
    // Legacy frames carry no media timestamp; fall back to the local clock
    // so the dedup window still has something to compare against.
    let timestamp = event
        .timestamp
        .unwrap_or_else(|| now_wall.timestamp_millis() as f64 / 1000.0);

    let duplicate = list.iter().any(|r| {
        if let Some(id) = event.id.as_deref() {
            if r.id == id {
                return true;
            }
        }
        event.frame_file.is_some()
            && r.frame_file == event.frame_file
            && (r.timestamp - timestamp).abs() <= DEDUP_WINDOW_SECS
    });
    if duplicate {
        return InsertOutcome::Duplicate;
    }

    let record = AnomalyRecord {
        id: event
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        timestamp,
        frame_file: event.frame_file.clone(),
        details: event.details.clone(),
        confidence: event.confidence,
        analysis: None,
        freshness: Freshness::New,
        received_at: now_wall,
        received_mono: Some(now_mono),
    };
    list.insert(0, record);
    InsertOutcome::Inserted
}

/// Attach a completed deep-analysis pass to its record.
///
/// Target selection, in order: exact identifier match; the newest record
/// whose analysis is still pending; the newest record outright
/// (last-write-wins). An empty list discards the result with a warning —
/// that is a correlation miss, not a caller error. Attaching never touches
/// the record's identifier, timestamp, or freshness.
pub fn attach_result(list: &mut [AnomalyRecord], outcome: AnalysisOutcome) -> MergeOutcome {
    if list.is_empty() {
        warn!(
            subject_id = ?outcome.subject_id,
            "deep-analysis result arrived with no records to attach to"
        );
        return MergeOutcome::Discarded;
    }

    let index = outcome
        .subject_id
        .as_deref()
        .and_then(|id| list.iter().position(|r| r.id == id))
        .or_else(|| list.iter().position(|r| r.analysis.is_none()))
        .unwrap_or(0);

    let severity = SeverityBand::from_score(outcome.severity_score);
    let record = &mut list[index];
    record.analysis = Some(Tier2Analysis {
        severity_score: outcome.severity_score,
        severity,
        reasoning_summary: outcome.reasoning_summary,
        visual_score: outcome.visual_score,
        audio_score: outcome.audio_score,
        multimodal_agreement: outcome.multimodal_agreement,
        detailed_analysis: outcome.detailed_analysis,
        error: outcome.error,
    });
    MergeOutcome::Matched {
        id: record.id.clone(),
        severity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(id: Option<&str>, frame_file: Option<&str>, timestamp: f64) -> DetectionEvent {
        DetectionEvent {
            id: id.map(str::to_string),
            timestamp: Some(timestamp),
            frame_file: frame_file.map(str::to_string),
            details: "test detection".to_string(),
            confidence: Some(0.8),
        }
    }

    fn outcome(subject_id: Option<&str>, score: f64) -> AnalysisOutcome {
        AnalysisOutcome {
            subject_id: subject_id.map(str::to_string),
            severity_score: score,
            reasoning_summary: "reasoning".to_string(),
            visual_score: None,
            audio_score: None,
            multimodal_agreement: None,
            detailed_analysis: None,
            error: None,
        }
    }

    fn now() -> (DateTime<Utc>, Instant) {
        (Utc::now(), Instant::now())
    }

    #[test]
    fn test_insert_is_newest_first() {
        let (wall, mono) = now();
        let mut list = Vec::new();
        insert(&mut list, &detection(Some("a1"), None, 100.0), wall, mono);
        insert(&mut list, &detection(Some("a2"), None, 101.0), wall, mono);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, "a2");
        assert_eq!(list[1].id, "a1");
    }

    #[test]
    fn test_duplicate_by_id_rejected() {
        let (wall, mono) = now();
        let mut list = Vec::new();
        insert(&mut list, &detection(Some("a1"), None, 100.0), wall, mono);
        let outcome = insert(&mut list, &detection(Some("a1"), None, 100.5), wall, mono);
        assert_eq!(outcome, InsertOutcome::Duplicate);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_duplicate_by_frame_within_window_rejected() {
        let (wall, mono) = now();
        let mut list = Vec::new();
        insert(&mut list, &detection(None, Some("f1.jpg"), 100.0), wall, mono);
        let dup = insert(&mut list, &detection(None, Some("f1.jpg"), 101.5), wall, mono);
        assert_eq!(dup, InsertOutcome::Duplicate);
        // Same frame but outside the window is a distinct event.
        let fresh = insert(&mut list, &detection(None, Some("f1.jpg"), 103.0), wall, mono);
        assert_eq!(fresh, InsertOutcome::Inserted);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_no_id_detection_gets_synthesized_id() {
        let (wall, mono) = now();
        let mut list = Vec::new();
        insert(&mut list, &detection(None, None, 100.0), wall, mono);
        assert!(!list[0].id.is_empty());
    }

    #[test]
    fn test_result_attaches_by_exact_id_regardless_of_order() {
        let (wall, mono) = now();
        let mut list = Vec::new();
        insert(&mut list, &detection(Some("a1"), None, 100.0), wall, mono);
        insert(&mut list, &detection(Some("a2"), None, 101.0), wall, mono);
        let merged = attach_result(&mut list, outcome(Some("a1"), 0.9));
        assert_eq!(
            merged,
            MergeOutcome::Matched {
                id: "a1".to_string(),
                severity: SeverityBand::High
            }
        );
        assert!(list[1].analysis.is_some());
        assert!(list[0].analysis.is_none());
    }

    #[test]
    fn test_result_without_id_attaches_newest_unmatched() {
        let (wall, mono) = now();
        let mut list = Vec::new();
        insert(&mut list, &detection(Some("a1"), None, 100.0), wall, mono);
        insert(&mut list, &detection(Some("a2"), None, 101.0), wall, mono);
        attach_result(&mut list, outcome(None, 0.6));
        assert!(list[0].analysis.is_some(), "newest record should win");
        assert!(list[1].analysis.is_none());

        // Next anonymous result goes to the remaining unmatched record,
        // never to one that already has an analysis.
        attach_result(&mut list, outcome(None, 0.2));
        assert!(list[1].analysis.is_some());
        assert_eq!(
            list[0].analysis.as_ref().map(|a| a.severity),
            Some(SeverityBand::Medium)
        );
    }

    #[test]
    fn test_all_matched_falls_back_to_newest() {
        let (wall, mono) = now();
        let mut list = Vec::new();
        insert(&mut list, &detection(Some("a1"), None, 100.0), wall, mono);
        attach_result(&mut list, outcome(Some("a1"), 0.5));
        // Best-effort: last write wins on the most recent record.
        attach_result(&mut list, outcome(None, 0.9));
        let analysis = list[0].analysis.as_ref().unwrap();
        assert_eq!(analysis.severity, SeverityBand::High);
    }

    #[test]
    fn test_result_with_empty_list_is_discarded() {
        let mut list: Vec<AnomalyRecord> = Vec::new();
        assert_eq!(
            attach_result(&mut list, outcome(Some("ghost"), 0.9)),
            MergeOutcome::Discarded
        );
    }

    #[test]
    fn test_attach_preserves_identity_and_freshness() {
        let (wall, mono) = now();
        let mut list = Vec::new();
        insert(&mut list, &detection(Some("a1"), None, 100.0), wall, mono);
        attach_result(&mut list, outcome(Some("a1"), 0.8));
        assert_eq!(list[0].id, "a1");
        assert!((list[0].timestamp - 100.0).abs() < f64::EPSILON);
        assert_eq!(list[0].freshness, Freshness::New);
    }
}
