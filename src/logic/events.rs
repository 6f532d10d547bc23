//! Event Emitter - Alert and Status Delivery
//!
//! Alerts and status updates leave the monitor through a `Notifier`.
//! Delivery is never assumed: failures are logged and dropped.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event names
pub mod events {
    pub const INTEGRITY_ALERT: &str = "integrity:alert";
    pub const FACE_STATUS: &str = "integrity:face-status";
}

/// Source signal of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Identity,
    MultipleFaces,
    HeadPose,
    ForbiddenObject,
    Sound,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Identity => "identity",
            SignalKind::MultipleFaces => "multiple_faces",
            SignalKind::HeadPose => "head_pose",
            SignalKind::ForbiddenObject => "forbidden_object",
            SignalKind::Sound => "sound",
        }
    }

    /// Severity attached to alerts from this signal
    pub fn severity(&self) -> Severity {
        match self {
            SignalKind::Identity | SignalKind::MultipleFaces | SignalKind::ForbiddenObject => {
                Severity::High
            }
            SignalKind::HeadPose => Severity::Medium,
            SignalKind::Sound => Severity::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// User-facing alert `{type, message, severity}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub signal: SignalKind,
    pub message: String,
    pub severity: Severity,
    pub timestamp_ms: u64,
}

impl AlertEvent {
    pub fn new(signal: SignalKind, message: impl Into<String>, timestamp_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            signal,
            message: message.into(),
            severity: signal.severity(),
            timestamp_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceStatus {
    Authorized,
    Unauthorized,
    NoFace,
    Error,
}

/// Face verification status pushed to the collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: FaceStatus,
    pub confidence: f32,
    pub detected: bool,
    pub message: String,
    pub timestamp_ms: u64,
}

/// Alert / status collaborator
pub trait Notifier: Send + Sync {
    fn notify(&self, alert: &AlertEvent) -> Result<(), String>;

    fn status(&self, _update: &StatusUpdate) -> Result<(), String> {
        Ok(())
    }
}

/// Notifier that only writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, alert: &AlertEvent) -> Result<(), String> {
        log::warn!(
            "[{}] {} ({:?})",
            alert.signal.as_str(),
            alert.message,
            alert.severity
        );
        Ok(())
    }

    fn status(&self, update: &StatusUpdate) -> Result<(), String> {
        log::info!("[{}] {}", events::FACE_STATUS, update.message);
        Ok(())
    }
}

/// Emit alert event, logging delivery failures
pub fn emit_alert(notifier: &dyn Notifier, alert: &AlertEvent) {
    if let Err(e) = notifier.notify(alert) {
        log::error!("Failed to emit {}: {}", events::INTEGRITY_ALERT, e);
    }
}

/// Emit status event, logging delivery failures
pub fn emit_status(notifier: &dyn Notifier, update: &StatusUpdate) {
    if let Err(e) = notifier.status(update) {
        log::error!("Failed to emit {}: {}", events::FACE_STATUS, e);
    }
}
