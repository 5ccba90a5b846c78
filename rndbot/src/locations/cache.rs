use super::errors::LocationResult;
use super::models::{BankerSpot, GrindSpawn, LevelBracket, ServiceNpcSpot, StartingPosition};
use super::zones::zone_brackets;
use crate::config::RandomBotConfig;
use crate::db::SpawnRepository;
use crate::world::{Faction, WorldLocation};
use std::collections::BTreeMap;

/// Innkeepers the starter cache never uses
const EXCLUDED_SERVICE_ENTRIES: [u32; 2] = [3838, 29480];

/// Which per-level cache feeds level placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationPolicy {
    /// Hostile creature clusters around the bot's level
    Grind,
    /// Inns and flight masters in zones matching the bot's level
    Starter,
}

impl LocationPolicy {
    pub fn from_config(config: &RandomBotConfig) -> Self {
        if config.enable_new_rpg_strategy {
            LocationPolicy::Starter
        } else {
            LocationPolicy::Grind
        }
    }
}

/// Inputs of a cache build
#[derive(Debug, Clone, Default)]
pub struct WorldData {
    pub grind: Vec<GrindSpawn>,
    pub service_npcs: Vec<ServiceNpcSpot>,
    pub bankers: Vec<BankerSpot>,
    pub starts: Vec<StartingPosition>,
}

/// Build parameters taken from configuration
#[derive(Debug, Clone)]
pub struct LocationSettings {
    pub max_level: u8,
    pub lower_spread: u8,
    pub higher_spread: u8,
    pub build_starter: bool,
    pub zone_overrides: BTreeMap<u32, LevelBracket>,
}

impl LocationSettings {
    pub fn from_config(config: &RandomBotConfig) -> Self {
        Self {
            max_level: config.world_max_level,
            lower_spread: config.tele_lower_level,
            higher_spread: config.tele_higher_level,
            build_starter: config.enable_new_rpg_strategy,
            zone_overrides: config.zone_bracket_overrides.clone(),
        }
    }
}

type PerLevel = BTreeMap<u8, Vec<WorldLocation>>;

/// Level-indexed placement candidates. Read-only once built; a rebuild
/// replaces the whole cache.
#[derive(Debug, Clone, Default)]
pub struct LocationCache {
    grind: PerLevel,
    alliance_starter: PerLevel,
    horde_starter: PerLevel,
    bankers: PerLevel,
    alliance_flight_masters: Vec<u32>,
    horde_flight_masters: Vec<u32>,
    zone_brackets: BTreeMap<u32, LevelBracket>,
}

impl LocationCache {
    /// Fetch world data and build the cache
    pub async fn load(spawns: &dyn SpawnRepository, config: &RandomBotConfig) -> LocationResult<Self> {
        let maps = &config.random_bot_maps;
        let settings = LocationSettings::from_config(config);
        log::info!("Preparing random teleport caches for {} levels...", settings.max_level);

        let data = WorldData {
            grind: spawns.grind_spawns(maps).await?,
            service_npcs: if settings.build_starter {
                spawns.service_npc_spots(maps).await?
            } else {
                Vec::new()
            },
            bankers: spawns.banker_spots(maps).await?,
            starts: if settings.build_starter {
                spawns.starting_positions().await?
            } else {
                Vec::new()
            },
        };

        let cache = Self::build(&data, &settings);
        log::info!(
            ">> {} grind, {} starter, {} banker locations collected",
            data.grind.len(),
            data.service_npcs.len(),
            data.bankers.len()
        );
        Ok(cache)
    }

    /// Build every per-level index from raw world data
    pub fn build(data: &WorldData, settings: &LocationSettings) -> Self {
        let mut cache = LocationCache {
            zone_brackets: zone_brackets(&settings.zone_overrides),
            ..Self::default()
        };
        let max_level = settings.max_level;

        for spawn in &data.grind {
            let level = ((u16::from(spawn.min_level) + u16::from(spawn.max_level) + 1) / 2) as i32;
            let low = (level - i32::from(settings.lower_spread)).max(1);
            let high = (level + i32::from(settings.higher_spread)).min(i32::from(max_level));
            for l in low..=high {
                cache.grind.entry(l as u8).or_default().push(spawn.location);
            }
        }

        if settings.build_starter {
            for spot in &data.service_npcs {
                if EXCLUDED_SERVICE_ENTRIES.contains(&spot.entry) {
                    continue;
                }
                let loc = spot.location.in_front_of(5.0, 0.5);
                if spot.is_flight_master {
                    if spot.serves_horde() {
                        cache.horde_flight_masters.push(spot.guid);
                    }
                    if spot.serves_alliance() {
                        cache.alliance_flight_masters.push(spot.guid);
                    }
                }
                let Some(bracket) = cache.zone_brackets.get(&spot.zone_id).copied() else {
                    continue;
                };
                for l in bracket.low..=bracket.high {
                    if spot.serves_horde() {
                        cache.horde_starter.entry(l).or_default().push(loc);
                    }
                    if spot.serves_alliance() {
                        cache.alliance_starter.entry(l).or_default().push(loc);
                    }
                }
            }

            for start in &data.starts {
                let target = match start.race.faction() {
                    Faction::Alliance => &mut cache.alliance_starter,
                    Faction::Horde => &mut cache.horde_starter,
                };
                for l in 1..=5 {
                    target.entry(l).or_default().push(start.location);
                }
            }
        }

        for banker in &data.bankers {
            let loc = banker.location.in_front_of(6.0, 2.0);
            for l in 1..=max_level {
                if !banker_serves_level(banker.level, l) {
                    continue;
                }
                cache.bankers.entry(l).or_default().push(loc);
            }
        }

        cache
    }

    /// Placement candidates for a bot of `faction` at `level`
    pub fn for_level(&self, policy: LocationPolicy, faction: Faction, level: u8) -> &[WorldLocation] {
        let table = match (policy, faction) {
            (LocationPolicy::Grind, _) => &self.grind,
            (LocationPolicy::Starter, Faction::Alliance) => &self.alliance_starter,
            (LocationPolicy::Starter, Faction::Horde) => &self.horde_starter,
        };
        table.get(&level).map_or(&[], Vec::as_slice)
    }

    pub fn bankers_for(&self, level: u8) -> &[WorldLocation] {
        self.bankers.get(&level).map_or(&[], Vec::as_slice)
    }

    pub fn flight_masters(&self, faction: Faction) -> &[u32] {
        match faction {
            Faction::Alliance => &self.alliance_flight_masters,
            Faction::Horde => &self.horde_flight_masters,
        }
    }

    pub fn zone_bracket(&self, zone: u32) -> Option<LevelBracket> {
        self.zone_brackets.get(&zone).copied()
    }

    /// Total entries per index as (grind, starter, bankers)
    pub fn sizes(&self) -> (usize, usize, usize) {
        let total = |t: &PerLevel| t.values().map(Vec::len).sum::<usize>();
        (
            total(&self.grind),
            total(&self.alliance_starter) + total(&self.horde_starter),
            total(&self.bankers),
        )
    }
}

/// Bankers stay within their expansion tier
fn banker_serves_level(banker_level: u8, level: u8) -> bool {
    if level <= 60 && banker_level >= 60 {
        return false;
    }
    if level <= 70 && banker_level >= 70 {
        return false;
    }
    if level >= 70 && (60..=70).contains(&banker_level) {
        return false;
    }
    if level >= 30 && banker_level <= 30 {
        return false;
    }
    true
}
