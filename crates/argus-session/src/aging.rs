//! Aging supervisor: downgrades freshly-arrived anomalies to `Seen` once
//! the operator has had time to notice them.

use argus_common::{AnomalyRecord, Freshness};
use std::time::Duration;
use tokio::time::Instant;

/// How often the anomaly list is swept.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// How long a record stays `New` after local receipt.
pub const FRESHNESS_DWELL: Duration = Duration::from_secs(10);

/// Flip `New` records to `Seen` once their receipt instant is at least the
/// dwell time in the past. Idempotent; records restored from a backend
/// refresh carry no receipt instant and are left alone (they enter `Seen`).
/// Returns how many records were flipped.
pub fn sweep(list: &mut [AnomalyRecord], now: Instant) -> usize {
    let mut flipped = 0;
    for record in list.iter_mut() {
        if record.freshness == Freshness::New {
            if let Some(received) = record.received_mono {
                if now.duration_since(received) >= FRESHNESS_DWELL {
                    record.freshness = Freshness::Seen;
                    flipped += 1;
                }
            }
        }
    }
    flipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(freshness: Freshness, received: Option<Instant>) -> AnomalyRecord {
        AnomalyRecord {
            id: "r".to_string(),
            timestamp: 0.0,
            frame_file: None,
            details: String::new(),
            confidence: None,
            analysis: None,
            freshness,
            received_at: Utc::now(),
            received_mono: received,
        }
    }

    #[test]
    fn test_new_record_ages_after_dwell() {
        let now = Instant::now();
        let mut list = vec![record(Freshness::New, Some(now))];
        assert_eq!(sweep(&mut list, now + Duration::from_secs(9)), 0);
        assert_eq!(list[0].freshness, Freshness::New);
        assert_eq!(sweep(&mut list, now + Duration::from_secs(10)), 1);
        assert_eq!(list[0].freshness, Freshness::Seen);
    }

    #[test]
    fn test_sweep_is_idempotent() {
        let now = Instant::now();
        let mut list = vec![record(Freshness::Seen, Some(now))];
        assert_eq!(sweep(&mut list, now + Duration::from_secs(60)), 0);
        assert_eq!(list[0].freshness, Freshness::Seen);
    }

    #[test]
    fn test_refreshed_record_without_clock_is_untouched() {
        let now = Instant::now();
        let mut list = vec![record(Freshness::New, None)];
        assert_eq!(sweep(&mut list, now + Duration::from_secs(60)), 0);
    }
}
