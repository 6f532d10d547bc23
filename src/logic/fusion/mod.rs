//! Signal Fusion & Alert Policy
//!
//! Turns raw observations from each signal source into user-facing
//! alerts. Every signal has its own `AlertState`; alert and evidence
//! cooldowns are tracked independently.
//!
//! ## Structure
//! - `types`: `AlertState`, `FusedAlert`, `HeadDirection`
//! - `cooldown`: window checks, per-key cooldowns
//! - `head_pose`: mesh -> direction
//! - `objects`: seen-set with delayed re-arm
//! - `sound`: volume from frequency bins
//!
//! The policy is synchronous and takes `now_ms` from the caller so every
//! rule can be tested without timers.

pub mod types;
pub mod cooldown;
pub mod head_pose;
pub mod objects;
pub mod sound;


pub use types::{AlertState, FusedAlert, HeadDirection};
pub use cooldown::{window_open, KeyedCooldown};
pub use objects::ObjectTracker;

use std::collections::HashMap;

use super::config::AlertConfig;
use super::detector::{FaceMesh, ObjectDetection};
use super::events::{AlertEvent, SignalKind};
use super::verification::{CycleOutcome, DetectionResult};

// ============================================
// Alert messages
// ============================================

pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized person detected!";
pub const MULTIPLE_FACES_MESSAGE: &str = "Multiple faces detected";
pub const HEAD_POSE_MESSAGE: &str = "Look into the screen";
pub const SOUND_MESSAGE: &str = "Unwanted Sound Detected";

pub struct FusionPolicy {
    config: AlertConfig,
    states: HashMap<SignalKind, AlertState>,
    last_direction: HeadDirection,
    last_face_count: usize,
    objects: ObjectTracker,
    object_cooldowns: KeyedCooldown<String>,
}

impl FusionPolicy {
    pub fn new(config: AlertConfig) -> Self {
        let objects = ObjectTracker::new(
            &config.forbidden_objects,
            config.object_min_score,
            config.notification_display_ms,
            config.object_rearm_delay_ms,
        );
        let object_cooldowns = KeyedCooldown::new(config.alert_cooldown_ms);

        Self {
            config,
            states: HashMap::new(),
            last_direction: HeadDirection::Center,
            last_face_count: 0,
            objects,
            object_cooldowns,
        }
    }

    pub fn state(&self, signal: SignalKind) -> AlertState {
        self.states.get(&signal).cloned().unwrap_or_default()
    }

    pub fn head_direction(&self) -> HeadDirection {
        self.last_direction
    }

    /// Identity: alert after N consecutive detected-but-unmatched cycles
    pub fn observe_identity(&mut self, result: &DetectionResult, now_ms: u64) -> Option<FusedAlert> {
        if result.outcome != CycleOutcome::Detected {
            return None;
        }

        let threshold = self.config.unauthorized_threshold.max(1);
        let state = self.states.entry(SignalKind::Identity).or_default();

        if result.identity_match {
            state.consecutive_violations = 0;
            return None;
        }

        state.consecutive_violations += 1;
        log::debug!(
            "Unauthorized face ({}/{})",
            state.consecutive_violations,
            threshold
        );
        if state.consecutive_violations < threshold {
            return None;
        }

        state.consecutive_violations = 0;
        self.fire(SignalKind::Identity, UNAUTHORIZED_MESSAGE.to_string(), now_ms)
    }

    /// Multi-face (edge-triggered) and head-pose (transition into non-center)
    pub fn observe_faces(&mut self, meshes: &[FaceMesh], now_ms: u64) -> Vec<FusedAlert> {
        let mut alerts = Vec::new();
        let count = meshes.len();

        if count > 1 && self.last_face_count <= 1 {
            alerts.extend(self.fire(SignalKind::MultipleFaces, MULTIPLE_FACES_MESSAGE.to_string(), now_ms));
        }
        self.last_face_count = count;

        if count > 1 {
            return alerts;
        }

        let direction = meshes
            .first()
            .map(|mesh| head_pose::classify(mesh, self.config.yaw_threshold, self.config.pitch_threshold))
            .unwrap_or(HeadDirection::Center);
        let previous = std::mem::replace(&mut self.last_direction, direction);

        if direction != HeadDirection::Center && direction != previous {
            log::debug!("Head turned {} (was {})", direction.as_str(), previous.as_str());
            alerts.extend(self.fire(SignalKind::HeadPose, HEAD_POSE_MESSAGE.to_string(), now_ms));
        }
        alerts
    }

    /// One alert per newly seen forbidden class
    pub fn observe_objects(&mut self, detections: &[ObjectDetection], now_ms: u64) -> Vec<FusedAlert> {
        let fresh = self.objects.observe(detections, now_ms);

        let mut alerts = Vec::with_capacity(fresh.len());
        for class in fresh {
            if !self.object_cooldowns.try_fire(class.clone(), now_ms) {
                log::debug!("Object alert for '{}' suppressed by cooldown", class);
                continue;
            }
            let event = AlertEvent::new(SignalKind::ForbiddenObject, format!("{} detected", class), now_ms);
            let capture_evidence = self.claim_evidence(SignalKind::ForbiddenObject, now_ms);
            alerts.push(FusedAlert { event, capture_evidence });
        }
        alerts
    }

    /// Collaborator closed an object notification before its display time
    pub fn dismiss_object(&mut self, class: &str, now_ms: u64) {
        self.objects.dismiss(class, now_ms);
    }

    pub fn observe_sound(&mut self, bins: &[u8], now_ms: u64) -> Option<FusedAlert> {
        let level = sound::volume(bins);
        if level <= self.config.sound_threshold {
            return None;
        }
        log::debug!("Sound level {:.3} above threshold", level);
        self.fire(SignalKind::Sound, SOUND_MESSAGE.to_string(), now_ms)
    }

    /// Forget all alert state (monitoring restart / re-enrollment)
    pub fn reset(&mut self) {
        self.states.clear();
        self.last_direction = HeadDirection::Center;
        self.last_face_count = 0;
        self.objects.clear();
        self.object_cooldowns.clear();
    }

    fn cooldown_for(&self, signal: SignalKind) -> u64 {
        match signal {
            SignalKind::Sound => self.config.sound_debounce_ms,
            _ => self.config.alert_cooldown_ms,
        }
    }

    fn fire(&mut self, signal: SignalKind, message: String, now_ms: u64) -> Option<FusedAlert> {
        let cooldown = self.cooldown_for(signal);
        let state = self.states.entry(signal).or_default();

        if !window_open(state.last_alert_ms, now_ms, cooldown) {
            log::debug!("{} alert suppressed by cooldown", signal.as_str());
            return None;
        }
        state.last_alert_ms = Some(now_ms);

        let capture_evidence = self.claim_evidence(signal, now_ms);
        Some(FusedAlert {
            event: AlertEvent::new(signal, message, now_ms),
            capture_evidence,
        })
    }

    fn claim_evidence(&mut self, signal: SignalKind, now_ms: u64) -> bool {
        let cooldown = self.config.evidence_cooldown_ms;
        let state = self.states.entry(signal).or_default();
        if !window_open(state.last_evidence_ms, now_ms, cooldown) {
            return false;
        }
        state.last_evidence_ms = Some(now_ms);
        true
    }
}
