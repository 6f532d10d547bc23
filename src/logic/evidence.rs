//! Alert Dispatch & Evidence Capture
//!
//! Fused alerts go to the `Notifier`. When the policy grants it, a
//! low-resolution copy of the current frame is submitted to the
//! `EvidenceSink` on a detached task. Evidence is best effort: a missing
//! or malformed frame skips capture and sink errors are only logged.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::clock::Clock;
use super::config::EvidenceConfig;
use super::detector::{Frame, FrameSource, FRAME_CHANNELS};
use super::events::{emit_alert, AlertEvent, Notifier, SignalKind};
use super::fusion::FusedAlert;

pub const EVIDENCE_FORMAT: &str = "rgb8";

/// Compact image payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidencePayload {
    pub width: u32,
    pub height: u32,
    pub format: String,
    /// Base64 (standard alphabet) of the packed pixels
    pub data_base64: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub id: Uuid,
    pub signal: SignalKind,
    pub reason: String,
    pub payload: EvidencePayload,
    pub captured_at_ms: u64,
}

/// Evidence collaborator (fire-and-forget)
#[async_trait]
pub trait EvidenceSink: Send + Sync {
    async fn submit(&self, evidence: Evidence) -> Result<(), String>;
}

/// Sink that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEvidenceSink;

#[async_trait]
impl EvidenceSink for NullEvidenceSink {
    async fn submit(&self, evidence: Evidence) -> Result<(), String> {
        log::debug!("Evidence for {} discarded", evidence.signal.as_str());
        Ok(())
    }
}

/// Nearest-neighbour resize of a packed RGB frame.
///
/// `None` when the frame buffer does not match its dimensions.
pub fn downscale(frame: &Frame, width: u32, height: u32) -> Option<Vec<u8>> {
    if !frame.is_ready() || !frame.is_well_formed() || width == 0 || height == 0 {
        return None;
    }

    let (src_w, src_h) = (frame.width as usize, frame.height as usize);
    let (dst_w, dst_h) = (width as usize, height as usize);
    let mut out = Vec::with_capacity(dst_w * dst_h * FRAME_CHANNELS);

    for y in 0..dst_h {
        let sy = y * src_h / dst_h;
        for x in 0..dst_w {
            let sx = x * src_w / dst_w;
            let offset = (sy * src_w + sx) * FRAME_CHANNELS;
            out.extend_from_slice(&frame.pixels[offset..offset + FRAME_CHANNELS]);
        }
    }
    Some(out)
}

pub fn encode_frame(frame: &Frame, config: &EvidenceConfig) -> Option<EvidencePayload> {
    let pixels = downscale(frame, config.width, config.height)?;
    Some(EvidencePayload {
        width: config.width,
        height: config.height,
        format: EVIDENCE_FORMAT.to_string(),
        data_base64: STANDARD.encode(pixels),
    })
}

pub struct AlertDispatcher {
    notifier: Arc<dyn Notifier>,
    sink: Arc<dyn EvidenceSink>,
    frames: Arc<dyn FrameSource>,
    clock: Arc<dyn Clock>,
    config: EvidenceConfig,
}

impl AlertDispatcher {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        sink: Arc<dyn EvidenceSink>,
        frames: Arc<dyn FrameSource>,
        clock: Arc<dyn Clock>,
        config: EvidenceConfig,
    ) -> Self {
        Self {
            notifier,
            sink,
            frames,
            clock,
            config,
        }
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// Notify, then kick off evidence capture if the alert carries it.
    ///
    /// Returns the submission task, if one was spawned.
    pub fn dispatch(&self, alert: &FusedAlert) -> Option<JoinHandle<()>> {
        log::warn!(
            "Integrity alert [{}] ({:?}): {}",
            alert.event.signal.as_str(),
            alert.event.severity,
            alert.event.message
        );
        emit_alert(self.notifier.as_ref(), &alert.event);

        if alert.capture_evidence {
            self.capture_evidence(&alert.event)
        } else {
            None
        }
    }

    fn capture_evidence(&self, event: &AlertEvent) -> Option<JoinHandle<()>> {
        let Some(payload) = self
            .frames
            .frame()
            .and_then(|frame| encode_frame(&frame, &self.config))
        else {
            log::debug!("Evidence skipped for {}: no usable frame", event.signal.as_str());
            return None;
        };

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                log::warn!("Evidence skipped, no async runtime: {}", e);
                return None;
            }
        };

        let evidence = Evidence {
            id: Uuid::new_v4(),
            signal: event.signal,
            reason: event.message.trim_end_matches('!').to_string(),
            payload,
            captured_at_ms: self.clock.now_ms(),
        };
        let sink = self.sink.clone();

        Some(runtime.spawn(async move {
            let signal = evidence.signal;
            if let Err(e) = sink.submit(evidence).await {
                log::warn!("Evidence submission for {} failed: {}", signal.as_str(), e);
            }
        }))
    }
}
