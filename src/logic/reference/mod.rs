//! Reference Store - Enrolled Template Persistence
//!
//! Keeps the enrolled template in the session store under three keys:
//! - descriptors: JSON array of descriptor arrays
//! - captured flag: `"true"`, written last
//! - metadata: sample scores/timestamps, method, threshold, checksum
//!
//! Loading never fails the caller. A missing, partial or tampered record
//! is reported as "no reference" and the keys are wiped.

pub mod session;
pub mod types;


pub use session::{FileSessionStore, MemorySessionStore, SessionStore};
pub use types::{BiometricTemplate, EnrollmentMethod, ReferenceMetadata, TemplateSample};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::logic::error::StoreError;

/// Session storage keys
pub mod keys {
    pub const REFERENCE_DESCRIPTORS: &str = "face_reference_descriptors";
    pub const REFERENCE_CAPTURED: &str = "face_reference_captured";
    pub const REFERENCE_METADATA: &str = "face_reference_metadata";

    pub const ALL: [&str; 3] = [REFERENCE_DESCRIPTORS, REFERENCE_CAPTURED, REFERENCE_METADATA];
}

const CAPTURED_FLAG: &str = "true";

pub struct ReferenceStore {
    store: Arc<dyn SessionStore>,
}

impl ReferenceStore {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Persist a template. Same template, same bytes.
    pub fn save(&self, template: &BiometricTemplate) -> Result<(), StoreError> {
        let descriptors: Vec<&[f32]> = template.descriptors().collect();
        let descriptors_json = serde_json::to_string(&descriptors)?;
        let metadata = build_metadata(template, &descriptors_json);
        let metadata_json = serde_json::to_string(&metadata)?;

        self.store.set(keys::REFERENCE_DESCRIPTORS, &descriptors_json)?;
        self.store.set(keys::REFERENCE_METADATA, &metadata_json)?;
        self.store.set(keys::REFERENCE_CAPTURED, CAPTURED_FLAG)?;

        log::info!(
            "Face reference saved: {} samples ({:?}, threshold {})",
            template.len(),
            template.method(),
            template.threshold()
        );
        Ok(())
    }

    /// Load the stored template; corrupt records are cleared and yield `None`
    pub fn load(&self) -> Option<BiometricTemplate> {
        match self.try_load() {
            Ok(template) => template,
            Err(e) => {
                log::warn!("Discarding stored face reference: {}", e);
                if let Err(clear_err) = self.clear() {
                    log::error!("Failed to clear corrupt reference: {}", clear_err);
                }
                None
            }
        }
    }

    /// Remove every reference key
    pub fn clear(&self) -> Result<(), StoreError> {
        for key in keys::ALL {
            self.store.remove(key)?;
        }
        log::info!("Stored face reference cleared");
        Ok(())
    }

    /// Stored metadata, if a readable record exists
    pub fn describe(&self) -> Option<ReferenceMetadata> {
        let raw = self.store.get(keys::REFERENCE_METADATA).ok()??;
        serde_json::from_str(&raw).ok()
    }

    fn try_load(&self) -> Result<Option<BiometricTemplate>, StoreError> {
        let descriptors_raw = self.store.get(keys::REFERENCE_DESCRIPTORS)?;
        let captured = self.store.get(keys::REFERENCE_CAPTURED)?;
        let metadata_raw = self.store.get(keys::REFERENCE_METADATA)?;

        let (descriptors_raw, captured, metadata_raw) = match (descriptors_raw, captured, metadata_raw)
        {
            (None, None, None) => return Ok(None),
            (Some(d), Some(c), Some(m)) => (d, c, m),
            _ => return Err(StoreError::Corrupt("partially written record".to_string())),
        };

        if captured != CAPTURED_FLAG {
            return Err(StoreError::Corrupt(format!("unexpected captured flag {:?}", captured)));
        }

        let metadata: ReferenceMetadata = serde_json::from_str(&metadata_raw)
            .map_err(|e| StoreError::Corrupt(format!("metadata: {}", e)))?;

        if checksum(&descriptors_raw) != metadata.checksum {
            return Err(StoreError::Corrupt("descriptor checksum mismatch".to_string()));
        }

        let descriptors: Vec<Vec<f32>> = serde_json::from_str(&descriptors_raw)
            .map_err(|e| StoreError::Corrupt(format!("descriptors: {}", e)))?;

        let n = descriptors.len();
        if metadata.samples_count != n
            || metadata.detection_scores.len() != n
            || metadata.sample_timestamps.len() != n
        {
            return Err(StoreError::Corrupt(format!(
                "metadata describes {} samples, found {}",
                metadata.samples_count, n
            )));
        }

        let samples = descriptors
            .into_iter()
            .zip(metadata.detection_scores.iter())
            .zip(metadata.sample_timestamps.iter())
            .map(|((descriptor, &quality), &captured_at_ms)| TemplateSample {
                descriptor,
                quality,
                captured_at_ms,
            })
            .collect();

        let template = BiometricTemplate::new(metadata.method, samples, metadata.threshold)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        log::info!(
            "Loaded stored face reference with {} descriptors",
            template.len()
        );
        Ok(Some(template))
    }
}

fn build_metadata(template: &BiometricTemplate, descriptors_json: &str) -> ReferenceMetadata {
    let sample_timestamps: Vec<u64> = template.samples().iter().map(|s| s.captured_at_ms).collect();
    let first_ms = sample_timestamps.first().copied().unwrap_or(0);

    ReferenceMetadata {
        samples_count: template.len(),
        captured_at: DateTime::<Utc>::from_timestamp_millis(first_ms as i64).unwrap_or_default(),
        detection_scores: template.samples().iter().map(|s| s.quality).collect(),
        sample_timestamps,
        method: template.method(),
        threshold: template.threshold(),
        dimension: template.dimension(),
        checksum: checksum(descriptors_json),
    }
}

fn checksum(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    hex::encode(hasher.finalize())
}
