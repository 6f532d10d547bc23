//! Stability Aggregator
//!
//! Majority vote over the most recent results. Pure function of history.

use serde::{Deserialize, Serialize};

use super::history::DetectionHistory;
use super::types::DetectionResult;
use crate::logic::config::VerificationConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityVerdict {
    pub stable: bool,
    pub face_detected: bool,
    pub in_frame: bool,
    pub identity_match: bool,
    /// Entries that took part in the vote
    pub count: usize,
    pub avg_confidence: f32,
}

impl StabilityVerdict {
    fn insufficient(count: usize) -> Self {
        Self {
            stable: false,
            face_detected: false,
            in_frame: false,
            identity_match: false,
            count,
            avg_confidence: 0.0,
        }
    }
}

pub fn compute_stability(history: &DetectionHistory, config: &VerificationConfig) -> StabilityVerdict {
    if history.is_empty() || history.len() < config.stability_min_history {
        return StabilityVerdict::insufficient(history.len());
    }

    let recent: Vec<_> = history.recent(config.stability_window).collect();
    let count = recent.len();
    let majority = |vote: fn(&DetectionResult) -> bool| {
        recent.iter().filter(|r| vote(r)).count() >= config.stability_majority
    };

    let face_detected = majority(|r| r.face_detected);
    let in_frame = majority(|r| r.in_frame);
    let identity_match = majority(|r| r.identity_match);
    let avg_confidence = recent.iter().map(|r| r.confidence).sum::<f32>() / count as f32;

    StabilityVerdict {
        stable: face_detected && in_frame && identity_match,
        face_detected,
        in_frame,
        identity_match,
        count,
        avg_confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::verification::CycleOutcome;

    fn good(ts: u64) -> DetectionResult {
        DetectionResult {
            outcome: CycleOutcome::Detected,
            face_detected: true,
            in_frame: true,
            identity_match: true,
            confidence: 0.8,
            ..DetectionResult::no_face(ts)
        }
    }

    #[test]
    fn test_two_entries_never_stable() {
        let mut history = DetectionHistory::new(10);
        history.push(good(0));
        history.push(good(1));

        let verdict = compute_stability(&history, &VerificationConfig::default());
        assert!(!verdict.stable);
        assert_eq!(verdict.count, 2);
    }

    fn off_frame(ts: u64) -> DetectionResult {
        DetectionResult {
            in_frame: false,
            confidence: 0.0,
            ..good(ts)
        }
    }

    #[test]
    fn test_majority_of_last_five() {
        let config = VerificationConfig::default();
        let mut history = DetectionHistory::new(10);

        // old failures fall outside the window
        for ts in 0..5 {
            history.push(off_frame(ts));
        }
        history.push(good(5));
        history.push(good(6));
        history.push(off_frame(7));
        history.push(good(8));
        history.push(off_frame(9));

        let verdict = compute_stability(&history, &config);
        assert_eq!(verdict.count, 5);
        assert!(verdict.in_frame);
        assert!(verdict.stable);
        assert!((verdict.avg_confidence - 0.48).abs() < 1e-5);

        history.push(off_frame(10));
        let verdict = compute_stability(&history, &config);
        assert!(verdict.face_detected);
        assert!(!verdict.in_frame);
        assert!(!verdict.stable);
    }

    #[test]
    fn test_mismatch_majority_breaks_stability() {
        let mut history = DetectionHistory::new(10);
        for ts in 0..5 {
            let mut r = good(ts);
            r.identity_match = ts < 2;
            history.push(r);
        }

        let verdict = compute_stability(&history, &VerificationConfig::default());
        assert!(verdict.face_detected);
        assert!(verdict.in_frame);
        assert!(!verdict.identity_match);
        assert!(!verdict.stable);
    }
}
