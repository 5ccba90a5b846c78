//! Lifecycle state derived from event keys and the host view.

use crate::host::BotView;
use serde::Serialize;
use std::fmt;

/// What an online bot is busy with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Activity {
    Idle,
    Dead,
    InQueue,
    Grouped,
    InCombat,
    Traveling,
}

impl Activity {
    pub fn of(view: &BotView) -> Self {
        if view.dead {
            Activity::Dead
        } else if view.in_battleground || view.in_bg_queue {
            Activity::InQueue
        } else if view.group.is_some() {
            Activity::Grouped
        } else if view.in_combat {
            Activity::InCombat
        } else if view.in_flight || !view.travel_idle {
            Activity::Traveling
        } else {
            Activity::Idle
        }
    }
}

/// Exactly one of these holds for every bot at any instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BotState {
    Offline,
    LoggingIn,
    Active(Activity),
    /// Still loaded but no longer registered; logs out once ungrouped
    PendingLogout,
}

impl BotState {
    /// # Arguments
    ///
    /// * `registered` - The bot's `add` event is live
    /// * `login_pending` - A login was requested and not yet confirmed
    /// * `view` - Host view, `None` when the character is not loaded
    pub fn classify(registered: bool, login_pending: bool, view: Option<&BotView>) -> Self {
        match view {
            None if login_pending => BotState::LoggingIn,
            None => BotState::Offline,
            Some(v) if !v.in_world => BotState::LoggingIn,
            Some(_) if !registered => BotState::PendingLogout,
            Some(v) => BotState::Active(Activity::of(v)),
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, BotState::Active(_) | BotState::PendingLogout)
    }
}

impl fmt::Display for BotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotState::Offline => write!(f, "offline"),
            BotState::LoggingIn => write!(f, "logging in"),
            BotState::Active(activity) => write!(f, "active ({activity:?})"),
            BotState::PendingLogout => write!(f, "pending logout"),
        }
    }
}
