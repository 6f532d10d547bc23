//! Face Matcher
//!
//! Read-only view over an enrolled template. Rebuilt, never mutated,
//! whenever the template changes.

use crate::constants::{AUTHORIZED_LABEL, UNKNOWN_LABEL};
use super::reference::BiometricTemplate;

#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub label: String,
    pub distance: f32,
}

impl MatchResult {
    pub fn is_authorized(&self) -> bool {
        self.label == AUTHORIZED_LABEL
    }
}

#[derive(Debug, Clone)]
pub struct Matcher {
    label: String,
    descriptors: Vec<Vec<f32>>,
    threshold: f32,
}

impl Matcher {
    pub fn from_template(template: &BiometricTemplate) -> Self {
        Self {
            label: AUTHORIZED_LABEL.to_string(),
            descriptors: template.descriptors().map(|d| d.to_vec()).collect(),
            threshold: template.threshold(),
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Mean Euclidean distance to the reference set.
    ///
    /// Beyond the threshold the probe is labelled `unknown`.
    pub fn find_best_match(&self, probe: &[f32]) -> MatchResult {
        let distance = if self.descriptors.is_empty() {
            f32::INFINITY
        } else {
            self.descriptors
                .iter()
                .map(|reference| euclidean_distance(reference, probe))
                .sum::<f32>()
                / self.descriptors.len() as f32
        };

        let label = if distance <= self.threshold {
            self.label.clone()
        } else {
            UNKNOWN_LABEL.to_string()
        };

        MatchResult { label, distance }
    }
}

/// Euclidean distance; a length mismatch counts as infinitely far
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Map a match distance to a [0, 1] confidence.
///
/// The second branch can go negative before clamping; keep its shape.
pub fn match_confidence(distance: f32, threshold: f32) -> f32 {
    if distance <= threshold {
        ((threshold - distance) / threshold).max(0.0)
    } else {
        (0.1 - (distance - threshold) * 0.1).max(0.0)
    }
}
