//! Model Loader
//!
//! Loads detector models with a bounded number of attempts and a fixed
//! backoff. Exhaustion disables monitoring but never the process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::Detector;
use crate::logic::config::ModelConfig;
use crate::logic::error::{MonitorError, MonitorResult};

#[derive(Debug, Default)]
pub struct ModelLoader {
    loaded: AtomicBool,
}

impl ModelLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    /// Load models unless already loaded
    pub async fn ensure_loaded(
        &self,
        detector: &dyn Detector,
        config: &ModelConfig,
    ) -> MonitorResult<()> {
        if self.is_loaded() {
            log::debug!("Detector models already loaded, skipping");
            return Ok(());
        }

        let attempts = config.max_init_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match detector.load_models().await {
                Ok(()) => {
                    self.loaded.store(true, Ordering::SeqCst);
                    log::info!("Detector models loaded (attempt {}/{})", attempt, attempts);
                    return Ok(());
                }
                Err(e) => {
                    log::warn!("Model load attempt {}/{} failed: {}", attempt, attempts, e);
                    last_error = e.to_string();
                }
            }

            if attempt < attempts {
                tokio::time::sleep(Duration::from_millis(config.retry_backoff_ms)).await;
            }
        }

        log::error!("Max initialization attempts reached, monitoring disabled");
        Err(MonitorError::MaxInitAttemptsExceeded {
            attempts,
            last_error,
        })
    }

    /// Forget the loaded state (full teardown)
    pub fn unload(&self) {
        self.loaded.store(false, Ordering::SeqCst);
    }
}
