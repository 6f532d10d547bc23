//! Logic Module - Monitoring Engines
//!
//! ## Structure
//! - `reference/` - template persistence in the session store
//! - `enrollment` - sample capture, matcher construction
//! - `verification/` - per-tick detection + match, history, stability
//! - `fusion/` - per-signal alert policy and cooldowns
//! - `evidence` - alert dispatch, evidence frames
//! - `scheduler` - polling loops with a shared active flag
//! - `monitor/` - session facade wiring everything together

// Collaborator contracts & shared types
pub mod clock;
pub mod config;
pub mod detector;
pub mod error;
pub mod events;

// Engines
pub mod reference;
pub mod matcher;
pub mod enrollment;
pub mod verification;
pub mod fusion;
pub mod evidence;
pub mod scheduler;
pub mod monitor;

#[cfg(test)]
pub(crate) mod testing;
