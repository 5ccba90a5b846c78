//! Messages accepted by the scheduler actor.

use super::errors::CommandResult;
use super::lifecycle::BotState;
use crate::world::BotId;
use tokio::sync::oneshot;

/// Scheduler inbox message
#[derive(Debug)]
pub enum SchedulerMessage {
    /// Operator console command
    Console {
        command: String,
        response: oneshot::Sender<CommandResult<String>>,
    },

    /// Remote protocol line `<command>,<characterId>`
    Remote {
        request: String,
        response: oneshot::Sender<String>,
    },

    /// Lifecycle state of one bot
    GetState {
        guid: BotId,
        response: oneshot::Sender<BotState>,
    },

    /// A real player entered the world
    PlayerLogin { guid: BotId },

    PlayerLogout { guid: BotId },

    /// The host finished a login it had reported as pending
    BotLoginCompleted { guid: BotId },

    /// A pending login failed on the host side
    BotLoginFailed { guid: BotId },

    /// Log out every bot and stop the actor
    Shutdown,
}
