//! Central Configuration Constants
//!
//! Single source of truth for all monitor defaults.
//! `MonitorConfig::default()` is built from these values and
//! `MonitorConfig::from_env()` overrides them through the helpers below.

// ============================================
// Enrollment
// ============================================

/// Live-video samples attempted per enrollment
pub const DEFAULT_ENROLL_SAMPLE_ATTEMPTS: usize = 5;

/// Minimum successful live samples
pub const DEFAULT_ENROLL_MIN_SAMPLES: usize = 2;

/// Delay before each live sample (ms)
pub const DEFAULT_ENROLL_SAMPLE_INTERVAL_MS: u64 = 300;

/// Poll interval while waiting for the first frame (ms)
pub const DEFAULT_FRAME_READY_POLL_MS: u64 = 100;

/// Upper bound on the wait for the first frame (ms)
pub const DEFAULT_FRAME_READY_TIMEOUT_MS: u64 = 10_000;

/// Match threshold for live-video enrollment
pub const VIDEO_MATCH_THRESHOLD: f32 = 0.5;

/// Match threshold for single-image enrollment
pub const IMAGE_MATCH_THRESHOLD: f32 = 0.6;

/// Distance cut-off applied by the verification cycle
pub const DEFAULT_VERIFY_MATCH_THRESHOLD: f32 = 0.5;

// ============================================
// Verification
// ============================================

/// Minimum detector score for a face
pub const DEFAULT_MIN_FACE_SCORE: f32 = 0.3;

/// Detector input size
pub const DEFAULT_DETECTOR_INPUT_SIZE: u32 = 416;

/// Centering margin as a fraction of each frame dimension
pub const DEFAULT_IN_FRAME_MARGIN: f32 = 0.15;

/// Detection history capacity
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Stability window / majority / minimum history
pub const DEFAULT_STABILITY_WINDOW: usize = 5;
pub const DEFAULT_STABILITY_MAJORITY: usize = 3;
pub const DEFAULT_STABILITY_MIN_HISTORY: usize = 3;

// ============================================
// Alerts
// ============================================

pub const DEFAULT_ALERT_COOLDOWN_MS: u64 = 5_000;
pub const DEFAULT_EVIDENCE_COOLDOWN_MS: u64 = 5_000;

/// Consecutive detected-but-unmatched cycles before an identity alert
pub const DEFAULT_UNAUTHORIZED_THRESHOLD: u32 = 2;

pub const DEFAULT_YAW_THRESHOLD: f32 = 0.03;
pub const DEFAULT_PITCH_THRESHOLD: f32 = 0.05;

pub const DEFAULT_OBJECT_MIN_SCORE: f32 = 0.5;

/// Delay between a notification being dismissed and its class re-arming (ms)
pub const DEFAULT_OBJECT_REARM_DELAY_MS: u64 = 5_000;

/// How long a notification stays on screen when nobody dismisses it (ms)
pub const DEFAULT_NOTIFICATION_DISPLAY_MS: u64 = 1_000;

pub const DEFAULT_SOUND_THRESHOLD: f32 = 0.15;
pub const DEFAULT_SOUND_DEBOUNCE_MS: u64 = 5_000;

/// Object classes that are not allowed in view
pub const DEFAULT_FORBIDDEN_OBJECTS: &[&str] = &[
    "cell phone",
    "laptop",
    "keyboard",
    "mouse",
    "calculator",
    "book",
    "notebook",
    "paper",
    "document",
];

// ============================================
// Scheduler
// ============================================

pub const DEFAULT_IDENTITY_INTERVAL_MS: u64 = 800;
pub const DEFAULT_HEAD_POSE_INTERVAL_MS: u64 = 100;
pub const DEFAULT_OBJECT_INTERVAL_MS: u64 = 200;
pub const DEFAULT_SOUND_INTERVAL_MS: u64 = 50;

// ============================================
// Models & evidence
// ============================================

pub const DEFAULT_MAX_INIT_ATTEMPTS: u32 = 3;
pub const DEFAULT_INIT_RETRY_BACKOFF_MS: u64 = 2_000;

pub const DEFAULT_EVIDENCE_WIDTH: u32 = 240;
pub const DEFAULT_EVIDENCE_HEIGHT: u32 = 180;

/// Label given to the enrolled subject by the matcher
pub const AUTHORIZED_LABEL: &str = "authorized_user";

/// Label returned when no reference is close enough
pub const UNKNOWN_LABEL: &str = "unknown";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Read a `u64` from the environment or fall back to `default`
pub fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Read a `u32` from the environment or fall back to `default`
pub fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Read an `f32` from the environment or fall back to `default`
pub fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse::<f32>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

/// Read a comma separated list from the environment
pub fn env_list(key: &str) -> Option<Vec<String>> {
    std::env::var(key).ok().map(|s| {
        s.split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    })
}
