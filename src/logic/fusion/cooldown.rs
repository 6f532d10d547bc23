//! Cooldown windows. Timestamps are clock millis.

use std::collections::HashMap;
use std::hash::Hash;

/// True when nothing fired yet or `cooldown_ms` has fully elapsed
pub fn window_open(last_ms: Option<u64>, now_ms: u64, cooldown_ms: u64) -> bool {
    match last_ms {
        None => true,
        Some(last) => now_ms.saturating_sub(last) >= cooldown_ms,
    }
}

/// Independent cooldown per key
#[derive(Debug, Clone)]
pub struct KeyedCooldown<K> {
    cooldown_ms: u64,
    last: HashMap<K, u64>,
}

impl<K: Eq + Hash> KeyedCooldown<K> {
    pub fn new(cooldown_ms: u64) -> Self {
        Self {
            cooldown_ms,
            last: HashMap::new(),
        }
    }

    /// Claim the window for `key`; false while it is still cooling down
    pub fn try_fire(&mut self, key: K, now_ms: u64) -> bool {
        if !window_open(self.last.get(&key).copied(), now_ms, self.cooldown_ms) {
            return false;
        }
        self.last.insert(key, now_ms);
        true
    }

    pub fn clear(&mut self) {
        self.last.clear();
    }
}
