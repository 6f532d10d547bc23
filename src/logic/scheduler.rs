//! Monitoring Scheduler
//!
//! One Tokio task per signal source. Each loop re-arms with a fixed delay
//! after its cycle completes, so cycles of one source never overlap.
//! All loops watch a shared active flag: it is checked at the top of every
//! cycle and before re-arming, and flipping it wakes sleeping loops.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Shared on/off switch for every monitoring loop
#[derive(Debug, Clone)]
pub struct ActiveFlag {
    tx: Arc<watch::Sender<bool>>,
}

impl ActiveFlag {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn is_active(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn set(&self, active: bool) {
        self.tx.send_if_modified(|current| {
            let changed = *current != active;
            *current = active;
            changed
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for ActiveFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
pub struct MonitoringScheduler {
    active: ActiveFlag,
    handles: Mutex<Vec<(&'static str, JoinHandle<()>)>>,
}

impl MonitoringScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_active()
    }

    pub fn activate(&self) {
        self.active.set(true);
    }

    /// Flip the flag off; loops exit at their next check
    pub fn deactivate(&self) {
        self.active.set(false);
    }

    /// Spawn a loop that runs `cycle` then waits `interval`, until deactivated
    pub fn spawn_loop<F, Fut>(&self, name: &'static str, interval: Duration, mut cycle: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut active = self.active.subscribe();

        let handle = tokio::spawn(async move {
            log::info!("{} loop started ({} ms)", name, interval.as_millis());

            loop {
                if !*active.borrow_and_update() {
                    break;
                }

                cycle().await;

                if !*active.borrow_and_update() {
                    break;
                }

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    changed = active.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }

            log::info!("{} loop stopped", name);
        });

        self.handles.lock().push((name, handle));
    }

    /// Loops whose task has not finished yet
    pub fn running_loops(&self) -> usize {
        self.handles
            .lock()
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .count()
    }

    /// Deactivate and cancel every loop, including in-flight cycles
    pub fn stop(&self) {
        self.deactivate();

        let handles: Vec<_> = self.handles.lock().drain(..).collect();
        for (name, handle) in handles {
            handle.abort();
            log::debug!("{} loop cancelled", name);
        }
    }
}

impl Drop for MonitoringScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.handles.get_mut().drain(..) {
            handle.abort();
        }
    }
}
