use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::error::MonitorError;

/// How a template was captured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentMethod {
    LiveVideo,
    StaticImage,
    /// Detections supplied by the collaborator
    Imported,
}

impl EnrollmentMethod {
    /// Minimum / maximum sample counts for this method
    fn sample_bounds(&self) -> (usize, Option<usize>) {
        match self {
            EnrollmentMethod::LiveVideo => (2, None),
            EnrollmentMethod::StaticImage => (1, Some(1)),
            EnrollmentMethod::Imported => (1, None),
        }
    }
}

/// One enrolled descriptor with its capture metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSample {
    pub descriptor: Vec<f32>,
    /// Detector score of the sample
    pub quality: f32,
    pub captured_at_ms: u64,
}

/// Enrolled biometric reference
#[derive(Debug, Clone, PartialEq)]
pub struct BiometricTemplate {
    method: EnrollmentMethod,
    samples: Vec<TemplateSample>,
    threshold: f32,
}

impl BiometricTemplate {
    /// Build a template, enforcing the sample-count and shape invariants
    pub fn new(
        method: EnrollmentMethod,
        samples: Vec<TemplateSample>,
        threshold: f32,
    ) -> Result<Self, MonitorError> {
        let (min, max) = method.sample_bounds();
        if samples.len() < min || max.is_some_and(|m| samples.len() > m) {
            return Err(MonitorError::InvalidTemplate(format!(
                "{:?} enrollment cannot hold {} samples",
                method,
                samples.len()
            )));
        }

        let dim = samples[0].descriptor.len();
        if dim == 0 {
            return Err(MonitorError::InvalidTemplate("empty descriptor".to_string()));
        }

        for (i, sample) in samples.iter().enumerate() {
            if sample.descriptor.len() != dim {
                return Err(MonitorError::InvalidTemplate(format!(
                    "sample {} has length {}, expected {}",
                    i,
                    sample.descriptor.len(),
                    dim
                )));
            }
            if sample.descriptor.iter().any(|v| !v.is_finite()) {
                return Err(MonitorError::InvalidTemplate(format!(
                    "sample {} contains non-finite values",
                    i
                )));
            }
        }

        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(MonitorError::InvalidTemplate(format!(
                "invalid match threshold {}",
                threshold
            )));
        }

        Ok(Self {
            method,
            samples,
            threshold,
        })
    }

    pub fn method(&self) -> EnrollmentMethod {
        self.method
    }

    pub fn samples(&self) -> &[TemplateSample] {
        &self.samples
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.samples.first().map(|s| s.descriptor.len()).unwrap_or(0)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &[f32]> {
        self.samples.iter().map(|s| s.descriptor.as_slice())
    }
}

/// Stored description of the enrolled reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceMetadata {
    pub samples_count: usize,
    pub captured_at: DateTime<Utc>,
    pub detection_scores: Vec<f32>,
    pub sample_timestamps: Vec<u64>,
    pub method: EnrollmentMethod,
    pub threshold: f32,
    pub dimension: usize,
    /// SHA-256 (hex) of the stored descriptor record
    pub checksum: String,
}
