use crate::world::Faction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Number of PvP level brackets tracked per queue
pub const MAX_BRACKETS: u8 = 16;

/// Battleground and arena queue types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QueueType {
    AlteracValley = 1,
    WarsongGulch = 2,
    ArathiBasin = 3,
    EyeOfTheStorm = 4,
    StrandOfTheAncients = 5,
    IsleOfConquest = 6,
    RandomBattleground = 7,
    Arena2v2 = 8,
    Arena3v3 = 9,
    Arena5v5 = 10,
}

impl QueueType {
    pub const ALL: [QueueType; 10] = [
        QueueType::AlteracValley,
        QueueType::WarsongGulch,
        QueueType::ArathiBasin,
        QueueType::EyeOfTheStorm,
        QueueType::StrandOfTheAncients,
        QueueType::IsleOfConquest,
        QueueType::RandomBattleground,
        QueueType::Arena2v2,
        QueueType::Arena3v3,
        QueueType::Arena5v5,
    ];

    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.id() == id)
    }

    pub fn id(self) -> u32 {
        self as u32
    }

    pub fn is_arena(self) -> bool {
        matches!(self, QueueType::Arena2v2 | QueueType::Arena3v3 | QueueType::Arena5v5)
    }

    /// Short tag used in configuration keys
    pub fn short_name(self) -> &'static str {
        match self {
            QueueType::AlteracValley => "av",
            QueueType::WarsongGulch => "ws",
            QueueType::ArathiBasin => "ab",
            QueueType::EyeOfTheStorm => "ey",
            QueueType::StrandOfTheAncients => "sa",
            QueueType::IsleOfConquest => "ic",
            QueueType::RandomBattleground => "rb",
            QueueType::Arena2v2 => "2v2",
            QueueType::Arena3v3 => "3v3",
            QueueType::Arena5v5 => "5v5",
        }
    }
}

impl fmt::Display for QueueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            QueueType::AlteracValley => "AV",
            QueueType::WarsongGulch => "WSG",
            QueueType::ArathiBasin => "AB",
            QueueType::EyeOfTheStorm => "EotS",
            QueueType::StrandOfTheAncients => "SotA",
            QueueType::IsleOfConquest => "IoC",
            QueueType::RandomBattleground => "Random",
            QueueType::Arena2v2 => "2v2",
            QueueType::Arena3v3 => "3v3",
            QueueType::Arena5v5 => "5v5",
        };
        write!(f, "{repr}")
    }
}

/// Level bracket a participant's queue resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PvpBracket {
    pub id: u8,
    pub min_level: u8,
    pub max_level: u8,
}

/// Group finder states, ordered as the host progresses through them
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LfgState {
    None,
    RoleCheck,
    Queued,
    Proposal,
    Boot,
    Dungeon,
    FinishedDungeon,
    RaidBrowser,
}

impl LfgState {
    /// Searching for a group but not yet inside the dungeon
    pub fn is_searching(self) -> bool {
        self != LfgState::None && self < LfgState::Dungeon
    }
}

/// Aggregated participation for one (queue, bracket) pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueBracketInfo {
    pub min_level: u8,
    pub max_level: u8,

    pub bg_alliance_players: u32,
    pub bg_horde_players: u32,
    pub bg_alliance_bots: u32,
    pub bg_horde_bots: u32,

    pub skirmish_arena_players: u32,
    pub rated_arena_players: u32,
    pub skirmish_arena_bots: u32,
    pub rated_arena_bots: u32,

    pub bg_instances: BTreeSet<u32>,
    pub bg_instance_count: u32,
    pub skirmish_arena_instances: BTreeSet<u32>,
    pub skirmish_arena_instance_count: u32,
    pub rated_arena_instances: BTreeSet<u32>,
    pub rated_arena_instance_count: u32,

    pub active_bg_queue: bool,
    pub active_skirmish_arena_queue: bool,
    pub active_rated_arena_queue: bool,
}

impl QueueBracketInfo {
    pub fn bg_count(&self, faction: Faction, bots: bool) -> u32 {
        match (faction, bots) {
            (Faction::Alliance, false) => self.bg_alliance_players,
            (Faction::Horde, false) => self.bg_horde_players,
            (Faction::Alliance, true) => self.bg_alliance_bots,
            (Faction::Horde, true) => self.bg_horde_bots,
        }
    }

    /// Whether any participant ever resolved into this bracket this cycle
    pub fn is_populated(&self) -> bool {
        self.min_level != 0
    }
}
