use crate::world::{Race, WorldLocation};
use serde::{Deserialize, Serialize};

/// Inclusive level range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelBracket {
    pub low: u8,
    pub high: u8,
}

impl LevelBracket {
    pub const fn new(low: u8, high: u8) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, level: u8) -> bool {
        (self.low..=self.high).contains(&level)
    }
}

/// Hostile creature cluster used as a grinding spot
#[derive(Debug, Clone, PartialEq)]
pub struct GrindSpawn {
    pub location: WorldLocation,
    pub min_level: u8,
    pub max_level: u8,
}

/// Innkeeper or flight master spawn
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceNpcSpot {
    pub guid: u32,
    pub entry: u32,
    pub location: WorldLocation,
    /// Faction template hostile mask (bit 2: hostile to alliance, bit 4: hostile to horde)
    pub hostile_mask: u32,
    pub zone_id: u32,
    pub is_flight_master: bool,
}

impl ServiceNpcSpot {
    pub fn serves_horde(&self) -> bool {
        self.hostile_mask & 4 == 0
    }

    pub fn serves_alliance(&self) -> bool {
        self.hostile_mask & 2 == 0
    }
}

/// Banker spawn with its creature level
#[derive(Debug, Clone, PartialEq)]
pub struct BankerSpot {
    pub location: WorldLocation,
    pub level: u8,
}

/// Character creation position for a race
#[derive(Debug, Clone, PartialEq)]
pub struct StartingPosition {
    pub race: Race,
    pub location: WorldLocation,
}

/// Battlemaster NPC with the faction data needed to derive its team
#[derive(Debug, Clone, PartialEq)]
pub struct BattleMasterEntry {
    pub entry: u32,
    pub bg_type: u32,
    pub faction_id: u32,
    pub parent_team: u32,
    pub location: WorldLocation,
}
