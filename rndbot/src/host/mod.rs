//! Boundary to the simulation host.
//!
//! The scheduler never touches world objects directly. It reads immutable
//! views and issues mutation requests through [`WorldHost`]; the host decides
//! how (and whether) they are carried out.

pub mod clock;
pub mod sim;

pub use clock::{Clock, ManualClock, SystemClock};
pub use sim::{HostAction, SimulatedWorld};

use crate::queue::{LfgState, PvpBracket, QueueType};
use crate::world::{BotId, Faction, PlayerClass, Race, WorldLocation};
use serde::Serialize;

/// Group membership as seen from one member
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupView {
    pub leader: BotId,
    pub is_lfg: bool,
    /// The group master is a real player
    pub master_is_real_player: bool,
}

/// Live state of a logged-in bot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BotView {
    pub guid: BotId,
    pub name: String,
    pub level: u8,
    pub class: PlayerClass,
    pub race: Race,
    pub zone_id: u32,
    pub position: WorldLocation,
    pub in_world: bool,
    pub being_teleported: bool,
    pub dead: bool,
    pub in_flight: bool,
    pub in_combat: bool,
    pub moving: bool,
    pub mounted: bool,
    pub group: Option<GroupView>,
    /// Travel logic has no active objective
    pub travel_idle: bool,
    pub in_battleground: bool,
    pub in_bg_queue: bool,
    /// A real player took control of this character
    pub controlled_by_real_player: bool,
}

impl BotView {
    pub fn faction(&self) -> Faction {
        self.race.faction()
    }

    pub fn is_group_leader(&self) -> bool {
        self.group.as_ref().is_some_and(|g| g.leader == self.guid)
    }
}

/// One queue the participant is enrolled in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueSlot {
    pub queue: QueueType,
    /// Bracket for the participant's level, `None` when the level has no bracket
    pub bracket: Option<PvpBracket>,
    /// Rated arena team queue or invitation
    pub rated: bool,
}

/// Battleground instance the participant is inside
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BattlegroundView {
    pub instance_id: u32,
    pub is_arena: bool,
    pub is_rated: bool,
    pub waiting_to_leave: bool,
}

/// Group finder enrollment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LfgView {
    pub state: LfgState,
    pub dungeons: Vec<u32>,
}

/// Queue-relevant view of a player or bot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantView {
    pub guid: BotId,
    pub faction: Faction,
    pub level: u8,
    pub in_world: bool,
    pub is_gm: bool,
    pub queues: Vec<QueueSlot>,
    pub battleground: Option<BattlegroundView>,
    pub invited: bool,
    pub lfg: Option<LfgView>,
}

impl ParticipantView {
    pub fn in_bg_queue(&self) -> bool {
        !self.queues.is_empty()
    }
}

/// Immutable copy of queue participation taken on the scheduler task
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorldSnapshot {
    pub real_players: Vec<ParticipantView>,
    pub bots: Vec<ParticipantView>,
}

/// Result of a login request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Character is in the world now
    Completed,
    /// Host will report completion through the login hook
    Pending,
    Failed,
}

/// Result of a teleport attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeleportOutcome {
    Teleported,
    /// Destination unusable, try the next one
    Rejected,
    /// Stop trying for this bot (a real player is watching)
    Aborted,
}

/// Host operations the scheduler consumes
pub trait WorldHost: Send {
    /// Sessions held by real players
    fn active_session_count(&self) -> usize;

    /// View of a logged-in bot, `None` when the character is not loaded
    fn bot(&self, guid: BotId) -> Option<BotView>;

    /// Every bot character currently loaded
    fn online_bots(&self) -> Vec<BotId>;

    fn is_online(&self, guid: BotId) -> bool {
        self.bot(guid).is_some()
    }

    fn snapshot(&self) -> WorldSnapshot;

    fn login(&mut self, guid: BotId) -> LoginOutcome;

    fn logout(&mut self, guid: BotId);

    fn logout_all(&mut self);

    fn revive(&mut self, guid: BotId);

    /// Repair, restore resources, add money and drop the group
    fn refresh(&mut self, guid: BotId, money_bonus: u32);

    /// Reroll build and gear; `incremental` keeps talents and only tops up
    fn randomize(&mut self, guid: BotId, level: u8, incremental: bool);

    /// Strip everything the factory granted
    fn clear(&mut self, guid: BotId);

    fn try_teleport(&mut self, guid: BotId, to: &WorldLocation, set_hearth: bool) -> TeleportOutcome;

    fn leave_group(&mut self, guid: BotId);

    fn set_xp_gain(&mut self, guid: BotId, enabled: bool);

    /// Reset strategies after a placement change
    fn reset_ai(&mut self, guid: BotId);

    /// Forward a remote text command to the bot's AI
    fn remote_command(&mut self, guid: BotId, command: &str) -> String;
}
