//! Monitor Configuration
//!
//! Every tunable of the monitor in one serde-friendly struct. Missing
//! fields fall back to the defaults in `constants.rs`.

use serde::{Deserialize, Serialize};

use crate::constants::*;

/// Enrollment settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnrollmentConfig {
    /// Live samples attempted
    pub sample_attempts: usize,

    /// Successful live samples required
    pub min_samples: usize,

    /// Delay before each live sample (ms)
    pub sample_interval_ms: u64,

    /// Poll interval while the video warms up (ms)
    pub frame_ready_poll_ms: u64,

    /// Maximum wait for the video to warm up (ms)
    pub frame_ready_timeout_ms: u64,

    /// Matcher threshold after live enrollment
    pub video_threshold: f32,

    /// Matcher threshold after image enrollment
    pub image_threshold: f32,
}

impl Default for EnrollmentConfig {
    fn default() -> Self {
        Self {
            sample_attempts: DEFAULT_ENROLL_SAMPLE_ATTEMPTS,
            min_samples: DEFAULT_ENROLL_MIN_SAMPLES,
            sample_interval_ms: DEFAULT_ENROLL_SAMPLE_INTERVAL_MS,
            frame_ready_poll_ms: DEFAULT_FRAME_READY_POLL_MS,
            frame_ready_timeout_ms: DEFAULT_FRAME_READY_TIMEOUT_MS,
            video_threshold: VIDEO_MATCH_THRESHOLD,
            image_threshold: IMAGE_MATCH_THRESHOLD,
        }
    }
}

/// Verification cycle and stability settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VerificationConfig {
    pub min_face_score: f32,
    pub input_size: u32,
    pub in_frame_margin: f32,
    /// Distance cut-off for identity match and confidence, independent of
    /// the matcher's labelling threshold
    pub match_threshold: f32,
    pub history_capacity: usize,
    pub stability_window: usize,
    pub stability_majority: usize,
    pub stability_min_history: usize,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            min_face_score: DEFAULT_MIN_FACE_SCORE,
            input_size: DEFAULT_DETECTOR_INPUT_SIZE,
            in_frame_margin: DEFAULT_IN_FRAME_MARGIN,
            match_threshold: DEFAULT_VERIFY_MATCH_THRESHOLD,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            stability_window: DEFAULT_STABILITY_WINDOW,
            stability_majority: DEFAULT_STABILITY_MAJORITY,
            stability_min_history: DEFAULT_STABILITY_MIN_HISTORY,
        }
    }
}

/// Fusion and alert policy settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlertConfig {
    pub alert_cooldown_ms: u64,
    pub evidence_cooldown_ms: u64,
    pub unauthorized_threshold: u32,
    pub yaw_threshold: f32,
    pub pitch_threshold: f32,
    pub object_min_score: f32,
    pub object_rearm_delay_ms: u64,
    pub notification_display_ms: u64,
    pub forbidden_objects: Vec<String>,
    pub sound_threshold: f32,
    pub sound_debounce_ms: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            alert_cooldown_ms: DEFAULT_ALERT_COOLDOWN_MS,
            evidence_cooldown_ms: DEFAULT_EVIDENCE_COOLDOWN_MS,
            unauthorized_threshold: DEFAULT_UNAUTHORIZED_THRESHOLD,
            yaw_threshold: DEFAULT_YAW_THRESHOLD,
            pitch_threshold: DEFAULT_PITCH_THRESHOLD,
            object_min_score: DEFAULT_OBJECT_MIN_SCORE,
            object_rearm_delay_ms: DEFAULT_OBJECT_REARM_DELAY_MS,
            notification_display_ms: DEFAULT_NOTIFICATION_DISPLAY_MS,
            forbidden_objects: DEFAULT_FORBIDDEN_OBJECTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            sound_threshold: DEFAULT_SOUND_THRESHOLD,
            sound_debounce_ms: DEFAULT_SOUND_DEBOUNCE_MS,
        }
    }
}

/// Polling interval per signal source (fixed delay after each cycle)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    pub identity_interval_ms: u64,
    pub head_pose_interval_ms: u64,
    pub object_interval_ms: u64,
    pub sound_interval_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            identity_interval_ms: DEFAULT_IDENTITY_INTERVAL_MS,
            head_pose_interval_ms: DEFAULT_HEAD_POSE_INTERVAL_MS,
            object_interval_ms: DEFAULT_OBJECT_INTERVAL_MS,
            sound_interval_ms: DEFAULT_SOUND_INTERVAL_MS,
        }
    }
}

/// Model loading retry policy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub max_init_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            max_init_attempts: DEFAULT_MAX_INIT_ATTEMPTS,
            retry_backoff_ms: DEFAULT_INIT_RETRY_BACKOFF_MS,
        }
    }
}

/// Evidence frame size
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EvidenceConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_EVIDENCE_WIDTH,
            height: DEFAULT_EVIDENCE_HEIGHT,
        }
    }
}

/// Complete monitor configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    pub enrollment: EnrollmentConfig,
    pub verification: VerificationConfig,
    pub alerts: AlertConfig,
    pub scheduler: SchedulerConfig,
    pub models: ModelConfig,
    pub evidence: EvidenceConfig,
}

impl MonitorConfig {
    /// Load configuration from environment variables on top of defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();

        let alerts = &mut config.alerts;
        alerts.alert_cooldown_ms = env_u64("MONITOR_ALERT_COOLDOWN_MS", alerts.alert_cooldown_ms);
        alerts.evidence_cooldown_ms =
            env_u64("MONITOR_EVIDENCE_COOLDOWN_MS", alerts.evidence_cooldown_ms);
        alerts.unauthorized_threshold =
            env_u32("MONITOR_UNAUTHORIZED_THRESHOLD", alerts.unauthorized_threshold);
        alerts.sound_threshold = env_f32("MONITOR_SOUND_THRESHOLD", alerts.sound_threshold);
        alerts.sound_debounce_ms = env_u64("MONITOR_SOUND_DEBOUNCE_MS", alerts.sound_debounce_ms);
        if let Some(list) = env_list("MONITOR_FORBIDDEN_OBJECTS") {
            alerts.forbidden_objects = list;
        }

        config.verification.match_threshold = env_f32(
            "MONITOR_MATCH_THRESHOLD",
            config.verification.match_threshold,
        );

        let scheduler = &mut config.scheduler;
        scheduler.identity_interval_ms =
            env_u64("MONITOR_IDENTITY_INTERVAL_MS", scheduler.identity_interval_ms);
        scheduler.head_pose_interval_ms =
            env_u64("MONITOR_HEAD_POSE_INTERVAL_MS", scheduler.head_pose_interval_ms);
        scheduler.object_interval_ms =
            env_u64("MONITOR_OBJECT_INTERVAL_MS", scheduler.object_interval_ms);
        scheduler.sound_interval_ms =
            env_u64("MONITOR_SOUND_INTERVAL_MS", scheduler.sound_interval_ms);

        config.models.max_init_attempts =
            env_u32("MONITOR_MAX_INIT_ATTEMPTS", config.models.max_init_attempts);
        config.models.retry_backoff_ms =
            env_u64("MONITOR_INIT_RETRY_BACKOFF_MS", config.models.retry_backoff_ms);

        config
    }

    /// Parse a (possibly partial) JSON document
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
