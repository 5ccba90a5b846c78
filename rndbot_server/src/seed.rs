//! Roster and world data for the standalone process.
//!
//! In memory mode the repositories are filled with a synthetic roster so the
//! scheduler has accounts, characters and destinations to work with. In
//! postgres mode the simulated host is filled from the character table.

use rand::Rng;
use rand::seq::IndexedRandom;
use rndbot::config::RandomBotConfig;
use rndbot::db::{
    MemoryAccountRepository, MemoryCharacterRepository, MemoryEventRepository, MemorySpawnRepository,
    Repositories, StorageResult,
};
use rndbot::host::SimulatedWorld;
use rndbot::locations::{BankerSpot, BattleMasterEntry, GrindSpawn, ServiceNpcSpot, StartingPosition};
use rndbot::world::{CharacterInfo, Faction, PlayerClass, Race, WorldLocation};
use std::sync::Arc;

const ALLIANCE_RACES: [Race; 5] = [Race::Human, Race::Dwarf, Race::NightElf, Race::Gnome, Race::Draenei];
const HORDE_RACES: [Race; 5] = [Race::Orc, Race::Undead, Race::Tauren, Race::Troll, Race::BloodElf];

const NAME_STEMS: [&str; 12] = [
    "Ald", "Bren", "Cor", "Dar", "Eli", "Fen", "Gor", "Hal", "Ith", "Jor", "Kel", "Lun",
];

/// Seeded memory repositories and the host they describe
pub struct MemoryRoster {
    pub repos: Repositories,
    pub world: SimulatedWorld,
    pub characters: usize,
}

/// Build memory repositories holding `accounts` bot accounts
///
/// Characters alternate between alliance and horde; death knights start at
/// the heroic class level, everyone else at level 1.
///
/// # Arguments
///
/// * `config` - Bot configuration (account prefix, characters per account)
/// * `accounts` - Number of bot accounts to create
/// * `rng` - Class picks
pub fn memory_roster<R: Rng + ?Sized>(config: &RandomBotConfig, accounts: u32, rng: &mut R) -> MemoryRoster {
    let account_repo = MemoryAccountRepository::new();
    let character_repo = MemoryCharacterRepository::new();
    let mut world = SimulatedWorld::new();
    let mut characters = 0;

    for account in 1..=accounts {
        account_repo.add_account(account, &format!("{}{}", config.account_prefix, account));

        for slot in 0..config.chars_per_account {
            let guid = (account - 1) * config.chars_per_account + slot + 1;
            let character = synthetic_character(guid, account, config.heroic_start_level, rng);
            character_repo.insert(character.clone());
            world.add_character(character);
            characters += 1;
        }
    }

    let repos = Repositories {
        events: Arc::new(MemoryEventRepository::new()),
        accounts: Arc::new(account_repo),
        characters: Arc::new(character_repo),
        spawns: Arc::new(world_spawns(config.max_level)),
    };

    MemoryRoster {
        repos,
        world,
        characters,
    }
}

fn synthetic_character<R: Rng + ?Sized>(
    guid: u32,
    account: u32,
    heroic_level: u8,
    rng: &mut R,
) -> CharacterInfo {
    let races = if guid % 2 == 0 { &HORDE_RACES } else { &ALLIANCE_RACES };
    let race = races[(guid as usize / 2) % races.len()];
    let class = PlayerClass::ALL.choose(rng).copied().unwrap_or(PlayerClass::Warrior);
    let stem = NAME_STEMS[guid as usize % NAME_STEMS.len()];

    CharacterInfo {
        guid,
        account,
        name: format!("{stem}{guid}"),
        race,
        class,
        level: if class.is_death_knight() { heroic_level } else { 1 },
    }
}

/// Grind spots every five levels on both continents, plus a handful of
/// bankers, inns, race starts and battlemasters
pub fn world_spawns(max_level: u8) -> MemorySpawnRepository {
    let mut spawns = MemorySpawnRepository::new();

    for (map, base_x) in [(0u32, -9000.0f32), (1, 1500.0)] {
        for low in (1..=max_level).step_by(5) {
            let high = low.saturating_add(4).min(max_level);
            let offset = f32::from(low) * 40.0;
            spawns.grind.push(GrindSpawn {
                location: WorldLocation::new(map, base_x + offset, offset, 50.0, 0.0),
                min_level: low,
                max_level: high,
            });
        }
        for level in [1u8, 30, 60] {
            spawns.bankers.push(BankerSpot {
                location: WorldLocation::new(map, base_x - 200.0, f32::from(level) * 10.0, 60.0, 3.1),
                level,
            });
        }
    }

    // Goldshire and Razor Hill inns, flight masters beside them
    spawns.service_npcs = vec![
        service_npc(1, 295, WorldLocation::new(0, -9462.0, 16.0, 56.0, 0.0), 4, 12, false),
        service_npc(2, 352, WorldLocation::new(0, -9440.0, 60.0, 56.0, 0.0), 4, 12, true),
        service_npc(3, 6928, WorldLocation::new(1, 340.0, -4686.0, 16.0, 0.0), 2, 14, false),
        service_npc(4, 3310, WorldLocation::new(1, 320.0, -4720.0, 16.0, 0.0), 2, 14, true),
    ];

    spawns.starts = Race::ALL
        .iter()
        .map(|race| StartingPosition {
            race: *race,
            location: match race.faction() {
                Faction::Alliance => WorldLocation::new(0, -8949.0, -132.0, 83.0, 0.0),
                Faction::Horde => WorldLocation::new(1, -618.0, -4251.0, 38.0, 0.0),
            },
        })
        .collect();

    spawns.battlemasters = vec![
        BattleMasterEntry {
            entry: 14981,
            bg_type: 2,
            faction_id: 0,
            parent_team: 891,
            location: WorldLocation::new(0, -8454.0, 318.0, 120.0, 0.0),
        },
        BattleMasterEntry {
            entry: 14982,
            bg_type: 2,
            faction_id: 0,
            parent_team: 892,
            location: WorldLocation::new(1, 1980.0, -4787.0, 55.0, 0.0),
        },
    ];

    spawns
}

fn service_npc(
    guid: u32,
    entry: u32,
    location: WorldLocation,
    hostile_mask: u32,
    zone_id: u32,
    is_flight_master: bool,
) -> ServiceNpcSpot {
    ServiceNpcSpot {
        guid,
        entry,
        location,
        hostile_mask,
        zone_id,
        is_flight_master,
    }
}

/// Make every character on the bot accounts loadable by the simulated host
///
/// # Returns
///
/// * `StorageResult<usize>` - Number of characters added
pub async fn load_roster(
    repos: &Repositories,
    config: &RandomBotConfig,
    world: &mut SimulatedWorld,
) -> StorageResult<usize> {
    let mut loaded = 0;
    for account in repos.accounts.list_bot_accounts(&config.account_prefix).await? {
        for character in repos.characters.characters_by_account(account.id).await? {
            world.add_character(character);
            loaded += 1;
        }
    }
    Ok(loaded)
}
