//! Detection quality counters since the last enrollment / reset.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionQuality {
    total_frames: u64,
    successful_frames: u64,
    faults: u64,
    confidence_sum: f64,
}

impl DetectionQuality {
    pub fn record_no_face(&mut self) {
        self.total_frames += 1;
    }

    pub fn record_face(&mut self, confidence: f32) {
        self.total_frames += 1;
        self.successful_frames += 1;
        self.confidence_sum += confidence as f64;
    }

    pub fn record_fault(&mut self) {
        self.faults += 1;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Running average over every counted frame
    pub fn average_confidence(&self) -> f32 {
        if self.total_frames == 0 {
            return 0.0;
        }
        (self.confidence_sum / self.total_frames as f64) as f32
    }

    pub fn success_rate(&self) -> f32 {
        if self.total_frames == 0 {
            return 0.0;
        }
        self.successful_frames as f32 / self.total_frames as f32
    }

    pub fn report(&self) -> QualityReport {
        QualityReport {
            total_frames: self.total_frames,
            successful_frames: self.successful_frames,
            faults: self.faults,
            success_rate: self.success_rate(),
            average_confidence: self.average_confidence(),
        }
    }
}

/// Snapshot of `DetectionQuality` with derived metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub total_frames: u64,
    pub successful_frames: u64,
    pub faults: u64,
    /// 0.0 - 1.0
    pub success_rate: f32,
    /// 0.0 - 1.0
    pub average_confidence: f32,
}

impl QualityReport {
    pub fn success_rate_percent(&self) -> f32 {
        self.success_rate * 100.0
    }

    pub fn average_confidence_percent(&self) -> f32 {
        self.average_confidence * 100.0
    }
}
