use serde::{Deserialize, Serialize};

use crate::logic::events::AlertEvent;

/// Per-signal alert bookkeeping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertState {
    pub consecutive_violations: u32,
    pub last_alert_ms: Option<u64>,
    pub last_evidence_ms: Option<u64>,
}

/// Alert that survived the policy, plus whether evidence should be grabbed
#[derive(Debug, Clone, PartialEq)]
pub struct FusedAlert {
    pub event: AlertEvent,
    pub capture_evidence: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadDirection {
    #[default]
    Center,
    Up,
    Left,
    Right,
}

impl HeadDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeadDirection::Center => "center",
            HeadDirection::Up => "up",
            HeadDirection::Left => "left",
            HeadDirection::Right => "right",
        }
    }
}
