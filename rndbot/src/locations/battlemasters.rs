use super::errors::LocationResult;
use super::models::BattleMasterEntry;
use crate::db::SpawnRepository;
use crate::world::{Faction, WorldLocation};
use std::collections::HashMap;

const ALLIANCE_PARENT: u32 = 891;
const HORDE_PARENT: u32 = 892;
const ALLIANCE_FACTION: u32 = 189;
const HORDE_FACTION: u32 = 66;

/// Side a battlemaster serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BattleMasterTeam {
    Alliance,
    Horde,
    Neutral,
}

impl BattleMasterTeam {
    pub fn classify(entry: &BattleMasterEntry) -> Self {
        if entry.parent_team == ALLIANCE_PARENT || entry.faction_id == ALLIANCE_FACTION {
            BattleMasterTeam::Alliance
        } else if entry.parent_team == HORDE_PARENT || entry.faction_id == HORDE_FACTION {
            BattleMasterTeam::Horde
        } else {
            BattleMasterTeam::Neutral
        }
    }
}

impl From<Faction> for BattleMasterTeam {
    fn from(faction: Faction) -> Self {
        match faction {
            Faction::Alliance => BattleMasterTeam::Alliance,
            Faction::Horde => BattleMasterTeam::Horde,
        }
    }
}

/// Battlemasters grouped by team and battleground type
#[derive(Debug, Clone, Default)]
pub struct BattleMasterCache {
    entries: HashMap<(BattleMasterTeam, u32), Vec<BattleMasterEntry>>,
}

impl BattleMasterCache {
    pub async fn load(spawns: &dyn SpawnRepository) -> LocationResult<Self> {
        let cache = Self::build(spawns.battlemasters().await?);
        log::info!(">> {} battlemaster entries available", cache.len());
        Ok(cache)
    }

    pub fn build(masters: Vec<BattleMasterEntry>) -> Self {
        let mut entries: HashMap<(BattleMasterTeam, u32), Vec<BattleMasterEntry>> = HashMap::new();
        for master in masters {
            let team = BattleMasterTeam::classify(&master);
            entries.entry((team, master.bg_type)).or_default().push(master);
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Closest battlemaster on the same map; team-specific masters first, neutral ones as fallback
    pub fn nearest(
        &self,
        team: BattleMasterTeam,
        bg_type: u32,
        from: &WorldLocation,
    ) -> Option<&BattleMasterEntry> {
        let closest = |team: BattleMasterTeam| {
            self.entries.get(&(team, bg_type)).and_then(|list| {
                list.iter()
                    .filter_map(|m| m.location.distance_2d(from).map(|d| (d, m)))
                    .min_by(|a, b| a.0.total_cmp(&b.0))
                    .map(|(_, m)| m)
            })
        };
        closest(team).or_else(|| closest(BattleMasterTeam::Neutral))
    }
}
