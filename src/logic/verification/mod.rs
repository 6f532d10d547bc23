//! Verification Module - One Detection + Match Pass per Tick
//!
//! ## Structure
//! - `types`: `DetectionResult`, `CycleOutcome`
//! - `quality`: cumulative counters
//! - `history`: bounded ring buffer of results
//! - `stability`: majority-vote verdict over recent history
//! - `status`: change-only face status updates
//!
//! Detector faults never leave `verify_once`; they come back as a
//! degraded result with `error` set.

pub mod types;
pub mod quality;
pub mod history;
pub mod stability;
pub mod status;

#[cfg(test)]
mod tests;

pub use types::{CycleOutcome, DetectionResult};
pub use quality::{DetectionQuality, QualityReport};
pub use history::DetectionHistory;
pub use stability::{compute_stability, StabilityVerdict};
pub use status::StatusTracker;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::clock::Clock;
use super::config::VerificationConfig;
use super::detector::{BoundingBox, Detector, DetectorOptions, FaceDetection, Frame, FrameSource, ModelLoader};
use super::enrollment::SharedReference;
use super::matcher::{match_confidence, Matcher};

pub const NOT_READY_MESSAGE: &str = "not ready";
pub const BUSY_MESSAGE: &str = "busy";

#[derive(Debug)]
struct VerificationState {
    history: DetectionHistory,
    quality: DetectionQuality,
}

pub struct VerificationCycle {
    config: VerificationConfig,
    detector: Arc<dyn Detector>,
    frames: Arc<dyn FrameSource>,
    clock: Arc<dyn Clock>,
    models: Arc<ModelLoader>,
    reference: SharedReference,
    state: RwLock<VerificationState>,
    in_flight: AtomicBool,
}

impl VerificationCycle {
    pub fn new(
        config: VerificationConfig,
        detector: Arc<dyn Detector>,
        frames: Arc<dyn FrameSource>,
        clock: Arc<dyn Clock>,
        models: Arc<ModelLoader>,
        reference: SharedReference,
    ) -> Self {
        let state = VerificationState {
            history: DetectionHistory::new(config.history_capacity),
            quality: DetectionQuality::default(),
        };
        Self {
            config,
            detector,
            frames,
            clock,
            models,
            reference,
            state: RwLock::new(state),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Run one verification pass. Never fails.
    pub async fn verify_once(&self) -> DetectionResult {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            return DetectionResult::not_ready(self.clock.now_ms(), BUSY_MESSAGE);
        };

        if !self.models.is_loaded() {
            return DetectionResult::not_ready(self.clock.now_ms(), NOT_READY_MESSAGE);
        }
        let frame = match self.frames.frame() {
            Some(frame) if frame.is_ready() => frame,
            _ => return DetectionResult::not_ready(self.clock.now_ms(), NOT_READY_MESSAGE),
        };

        let matcher = self.reference.read().as_ref().map(|r| r.matcher.clone());
        let options = DetectorOptions {
            min_score: self.config.min_face_score,
            input_size: self.config.input_size,
        };

        let detection = self.detector.detect_face(&frame, &options).await;
        let now = self.clock.now_ms();

        match detection {
            Err(e) => {
                log::warn!("Face detection error: {}", e);
                self.state.write().quality.record_fault();
                DetectionResult::fault(now, e.to_string())
            }
            Ok(None) => {
                log::debug!("No face detected in current frame");
                // counted as a frame, kept out of the stability history
                self.state.write().quality.record_no_face();
                DetectionResult::no_face(now)
            }
            Ok(Some(face)) => {
                let result = self.score(&frame, &face, matcher.as_deref(), now);
                if result.is_mismatch() {
                    log::debug!(
                        "Identity mismatch: distance {:?}, confidence {:.3}",
                        result.distance,
                        result.confidence
                    );
                }
                let mut state = self.state.write();
                state.quality.record_face(result.confidence);
                state.history.push(result.clone());
                result
            }
        }
    }

    fn score(
        &self,
        frame: &Frame,
        face: &FaceDetection,
        matcher: Option<&Matcher>,
        now: u64,
    ) -> DetectionResult {
        let mut result = DetectionResult {
            outcome: CycleOutcome::Detected,
            face_detected: true,
            in_frame: is_face_in_frame(&face.bbox, frame.width, frame.height, self.config.in_frame_margin),
            identity_match: true,
            confidence: 0.0,
            distance: None,
            detection_score: face.score,
            timestamp_ms: now,
            face_box: Some(face.bbox),
            match_label: None,
            message: None,
            error: None,
        };

        match (matcher, face.descriptor.as_deref()) {
            (Some(matcher), Some(descriptor)) => {
                // matcher threshold only decides the label
                let best = matcher.find_best_match(descriptor);
                let threshold = self.config.match_threshold;
                result.confidence = match_confidence(best.distance, threshold);
                result.identity_match = best.is_authorized() && best.distance <= threshold;
                result.distance = Some(best.distance);
                result.match_label = Some(best.label);
            }
            (Some(_), None) => {
                // enrolled but nothing to compare against
                result.identity_match = false;
                result.message = Some("Face descriptor unavailable".to_string());
            }
            (None, _) => {
                result.confidence = face.score.clamp(0.0, 1.0);
            }
        }

        result
    }

    pub fn stability(&self) -> StabilityVerdict {
        compute_stability(&self.state.read().history, &self.config)
    }

    pub fn quality(&self) -> QualityReport {
        self.state.read().quality.report()
    }

    pub fn history(&self) -> Vec<DetectionResult> {
        self.state.read().history.to_vec()
    }

    /// Drop history and counters (new enrollment / monitoring restart)
    pub fn reset(&self) {
        let mut state = self.state.write();
        state.history.clear();
        state.quality.reset();
    }
}

/// Face-box centre lies strictly inside the margin on every side
pub fn is_face_in_frame(face: &BoundingBox, width: u32, height: u32, margin: f32) -> bool {
    let (w, h) = (width as f32, height as f32);
    let (margin_x, margin_y) = (w * margin, h * margin);
    let (cx, cy) = face.center();

    cx > margin_x && cx < w - margin_x && cy > margin_y && cy < h - margin_y
}

/// Clears the in-flight flag even if the cycle future is dropped mid-await
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
