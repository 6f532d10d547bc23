//! Detector Module - Collaborator Contracts
//!
//! The monitor never depends on a concrete ML backend. Face, landmark and
//! object models sit behind `Detector`; cameras and microphones behind
//! `FrameSource` / `AudioSource`.
//!
//! ## Structure
//! - `types`: frames, boxes, detections
//! - `loader`: model loading with bounded retry

pub mod types;
pub mod loader;

pub use types::{
    BoundingBox, DetectorOptions, FaceDetection, FaceMesh, Frame, ObjectDetection, Point,
    FRAME_CHANNELS,
};
pub use loader::ModelLoader;

use async_trait::async_trait;

use super::error::DetectorError;

/// Opaque ML backend
#[async_trait]
pub trait Detector: Send + Sync {
    /// Load (or warm up) the backend models
    async fn load_models(&self) -> Result<(), DetectorError>;

    /// Best single face in the frame, if any
    async fn detect_face(
        &self,
        frame: &Frame,
        options: &DetectorOptions,
    ) -> Result<Option<FaceDetection>, DetectorError>;

    /// All recognised objects in the frame
    async fn detect_objects(&self, frame: &Frame) -> Result<Vec<ObjectDetection>, DetectorError>;

    /// Normalized meshes for every face in the frame.
    ///
    /// Backends without a mesh model fall back to `detect_face`, so at most
    /// one face is ever reported and multi-face alerts cannot fire.
    async fn detect_face_meshes(&self, frame: &Frame) -> Result<Vec<FaceMesh>, DetectorError> {
        let face = self.detect_face(frame, &DetectorOptions::default()).await?;
        Ok(face
            .map(|f| FaceMesh { landmarks: f.landmarks })
            .into_iter()
            .collect())
    }
}

/// Camera collaborator
pub trait FrameSource: Send + Sync {
    /// Latest frame; `None` while the camera is not delivering
    fn frame(&self) -> Option<Frame>;
}

/// Microphone collaborator
pub trait AudioSource: Send + Sync {
    /// Byte-valued frequency bins (0..=255) of the latest audio window
    fn frequency_bins(&self) -> Option<Vec<u8>>;
}
