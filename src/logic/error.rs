//! Error Taxonomy
//!
//! Only enrollment and storage errors reach callers. Detector faults are
//! turned into degraded `DetectionResult`s inside the verification cycle.

use thiserror::Error;

/// Opaque failure reported by a detector backend
#[derive(Debug, Clone, Error, PartialEq)]
#[error("detector error: {0}")]
pub struct DetectorError(pub String);

impl DetectorError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Session store errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    /// Stored record is malformed, truncated or fails its checksum
    #[error("corrupt reference record: {0}")]
    Corrupt(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Write(err.to_string())
    }
}

/// Errors surfaced by the monitor to its collaborator
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MonitorError {
    /// Prerequisites missing (models, frame); retry later
    #[error("not ready: {0}")]
    NotReady(String),

    #[error("could not capture enough reference samples ({captured}/{required})")]
    InsufficientSamples { captured: usize, required: usize },

    #[error("no face detected in the provided image")]
    NoFaceDetected,

    #[error("detector fault: {0}")]
    DetectorFault(String),

    #[error("stored reference corrupted: {0}")]
    StorageCorruption(String),

    #[error("storage error: {0}")]
    Storage(StoreError),

    #[error("model initialization failed after {attempts} attempts: {last_error}")]
    MaxInitAttemptsExceeded { attempts: u32, last_error: String },

    #[error("invalid template: {0}")]
    InvalidTemplate(String),
}

impl From<StoreError> for MonitorError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Corrupt(msg) => MonitorError::StorageCorruption(msg),
            other => MonitorError::Storage(other),
        }
    }
}

impl From<DetectorError> for MonitorError {
    fn from(err: DetectorError) -> Self {
        MonitorError::DetectorFault(err.0)
    }
}

pub type MonitorResult<T> = Result<T, MonitorError>;
