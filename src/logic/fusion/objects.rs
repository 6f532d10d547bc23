//! Forbidden-object tracking.
//!
//! A class alerts once when first seen. It stays "seen" while its
//! notification is up and for a re-arm delay after the notification closes.

use std::collections::HashMap;

use crate::logic::detector::ObjectDetection;

#[derive(Debug, Clone, Copy, PartialEq)]
struct SeenClass {
    /// When the notification for this class closes (or closed)
    closes_at_ms: u64,
}

#[derive(Debug, Clone)]
pub struct ObjectTracker {
    forbidden: Vec<String>,
    min_score: f32,
    display_ms: u64,
    rearm_delay_ms: u64,
    seen: HashMap<String, SeenClass>,
}

impl ObjectTracker {
    pub fn new(forbidden: &[String], min_score: f32, display_ms: u64, rearm_delay_ms: u64) -> Self {
        Self {
            forbidden: forbidden.iter().map(|c| c.to_lowercase()).collect(),
            min_score,
            display_ms,
            rearm_delay_ms,
            seen: HashMap::new(),
        }
    }

    pub fn is_forbidden(&self, class: &str) -> bool {
        let class = class.to_lowercase();
        self.forbidden.iter().any(|c| *c == class)
    }

    /// Newly seen forbidden classes in `detections`, each at most once
    pub fn observe(&mut self, detections: &[ObjectDetection], now_ms: u64) -> Vec<String> {
        self.evict(now_ms);

        let mut fresh = Vec::new();
        for detection in detections {
            if detection.score <= self.min_score || !self.is_forbidden(&detection.class) {
                continue;
            }
            let class = detection.class.to_lowercase();
            if self.seen.contains_key(&class) {
                continue;
            }
            self.seen.insert(
                class.clone(),
                SeenClass {
                    closes_at_ms: now_ms + self.display_ms,
                },
            );
            fresh.push(class);
        }
        fresh
    }

    /// The collaborator closed the notification for `class` early
    pub fn dismiss(&mut self, class: &str, now_ms: u64) {
        if let Some(entry) = self.seen.get_mut(&class.to_lowercase()) {
            entry.closes_at_ms = entry.closes_at_ms.min(now_ms);
        }
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }

    fn evict(&mut self, now_ms: u64) {
        let rearm = self.rearm_delay_ms;
        self.seen.retain(|class, entry| {
            let keep = now_ms < entry.closes_at_ms + rearm;
            if !keep {
                log::debug!("Object class '{}' re-armed", class);
            }
            keep
        });
    }
}
