use serde::{Deserialize, Serialize};

use crate::logic::detector::BoundingBox;

/// What happened during one verification cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleOutcome {
    /// Prerequisites missing; nothing was counted
    NotReady,
    NoFace,
    Detected,
    /// Detector raised; converted to a degraded result
    Fault,
}

/// Output of one verification cycle. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub outcome: CycleOutcome,
    pub face_detected: bool,
    pub in_frame: bool,
    pub identity_match: bool,
    pub confidence: f32,
    pub distance: Option<f32>,
    pub detection_score: f32,
    pub timestamp_ms: u64,
    pub face_box: Option<BoundingBox>,
    pub match_label: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl DetectionResult {
    fn empty(outcome: CycleOutcome, timestamp_ms: u64) -> Self {
        Self {
            outcome,
            face_detected: false,
            in_frame: false,
            identity_match: false,
            confidence: 0.0,
            distance: None,
            detection_score: 0.0,
            timestamp_ms,
            face_box: None,
            match_label: None,
            message: None,
            error: None,
        }
    }

    pub fn not_ready(timestamp_ms: u64, message: &str) -> Self {
        Self {
            message: Some(message.to_string()),
            ..Self::empty(CycleOutcome::NotReady, timestamp_ms)
        }
    }

    pub fn no_face(timestamp_ms: u64) -> Self {
        Self {
            message: Some("No face detected".to_string()),
            ..Self::empty(CycleOutcome::NoFace, timestamp_ms)
        }
    }

    pub fn fault(timestamp_ms: u64, error: String) -> Self {
        Self {
            message: Some("Detection error".to_string()),
            error: Some(error),
            ..Self::empty(CycleOutcome::Fault, timestamp_ms)
        }
    }

    /// Face seen but not the enrolled subject
    pub fn is_mismatch(&self) -> bool {
        self.face_detected && !self.identity_match
    }
}
