//! Face status reporting - only material changes are pushed.

use super::types::{CycleOutcome, DetectionResult};
use crate::logic::events::{FaceStatus, StatusUpdate};

/// Confidence movement that counts as a change on its own
const CONFIDENCE_DELTA: f32 = 0.1;

#[derive(Debug, Default)]
pub struct StatusTracker {
    last: Option<(FaceStatus, bool, f32)>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Status update for `result`, if it differs from the last one reported
    pub fn observe(&mut self, result: &DetectionResult) -> Option<StatusUpdate> {
        let status = match result.outcome {
            CycleOutcome::NotReady => return None,
            CycleOutcome::Fault => FaceStatus::Error,
            CycleOutcome::NoFace => FaceStatus::NoFace,
            CycleOutcome::Detected if result.identity_match => FaceStatus::Authorized,
            CycleOutcome::Detected => FaceStatus::Unauthorized,
        };

        let changed = match self.last {
            None => true,
            Some((last_status, last_detected, last_confidence)) => {
                last_status != status
                    || last_detected != result.face_detected
                    || (result.confidence - last_confidence).abs() > CONFIDENCE_DELTA
            }
        };
        if !changed {
            return None;
        }
        self.last = Some((status, result.face_detected, result.confidence));

        let message = match status {
            FaceStatus::Authorized => {
                format!("Authorized - {}%", (result.confidence * 100.0).round() as u32)
            }
            FaceStatus::Unauthorized => "Unauthorized person".to_string(),
            FaceStatus::NoFace => "No face detected".to_string(),
            FaceStatus::Error => "Face verification error".to_string(),
        };

        Some(StatusUpdate {
            kind: "face".to_string(),
            status,
            confidence: result.confidence,
            detected: result.face_detected,
            message,
            timestamp_ms: result.timestamp_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authorized(confidence: f32) -> DetectionResult {
        DetectionResult {
            outcome: CycleOutcome::Detected,
            face_detected: true,
            in_frame: true,
            identity_match: true,
            confidence,
            ..DetectionResult::no_face(0)
        }
    }

    #[test]
    fn test_reports_only_material_changes() {
        let mut tracker = StatusTracker::new();

        let first = tracker.observe(&authorized(0.80)).unwrap();
        assert_eq!(first.status, FaceStatus::Authorized);
        assert_eq!(first.message, "Authorized - 80%");

        assert!(tracker.observe(&authorized(0.85)).is_none());
        assert!(tracker.observe(&authorized(0.95)).is_some());

        let gone = tracker.observe(&DetectionResult::no_face(1)).unwrap();
        assert_eq!(gone.status, FaceStatus::NoFace);
        assert!(!gone.detected);

        assert!(tracker.observe(&DetectionResult::not_ready(2, "not ready")).is_none());
        let err = tracker.observe(&DetectionResult::fault(3, "boom".into())).unwrap();
        assert_eq!(err.status, FaceStatus::Error);
    }
}
