//! Integrity Monitor - Continuous Multi-Modal Session Verification
//!
//! Enrolls a face reference, re-verifies it on every polling tick and fuses
//! identity, head-pose, forbidden-object and sound signals into alerts with
//! best-effort evidence capture. ML backends, cameras, microphones, storage
//! and alert delivery are injected through traits.

pub mod constants;
pub mod logic;

pub use logic::clock::{Clock, ManualClock, SystemClock, TokioClock};
pub use logic::config::MonitorConfig;
pub use logic::detector::{
    AudioSource, BoundingBox, Detector, DetectorOptions, FaceDetection, FaceMesh, Frame,
    FrameSource, ObjectDetection, Point,
};
pub use logic::enrollment::{EnrollmentResult, EnrollmentSource};
pub use logic::error::{DetectorError, MonitorError, MonitorResult, StoreError};
pub use logic::events::{AlertEvent, FaceStatus, LogNotifier, Notifier, Severity, SignalKind, StatusUpdate};
pub use logic::evidence::{Evidence, EvidencePayload, EvidenceSink, NullEvidenceSink};
pub use logic::monitor::{IntegrityMonitor, MonitorDeps};
pub use logic::reference::{
    BiometricTemplate, EnrollmentMethod, FileSessionStore, MemorySessionStore, ReferenceMetadata,
    SessionStore,
};
pub use logic::verification::{DetectionResult, QualityReport, StabilityVerdict};
