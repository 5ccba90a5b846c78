use super::models::{MAX_BRACKETS, QueueBracketInfo, QueueType};
use crate::config::QueueFloorConfig;
use crate::host::{ParticipantView, WorldSnapshot};
use crate::world::{BotId, Faction};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Per (queue, bracket) participation, one entry for every declared pair
#[derive(Debug, Clone, Serialize)]
pub struct BattlegroundTable {
    entries: BTreeMap<(QueueType, u8), QueueBracketInfo>,
}

impl Default for BattlegroundTable {
    fn default() -> Self {
        let mut table = Self {
            entries: BTreeMap::new(),
        };
        table.reset();
        table
    }
}

impl BattlegroundTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every entry with an empty one
    pub fn reset(&mut self) {
        self.entries.clear();
        for queue in QueueType::ALL {
            for bracket in 0..MAX_BRACKETS {
                self.entries.insert((queue, bracket), QueueBracketInfo::default());
            }
        }
    }

    pub fn get(&self, queue: QueueType, bracket: u8) -> Option<&QueueBracketInfo> {
        self.entries.get(&(queue, bracket))
    }

    fn slot(&mut self, queue: QueueType, bracket: u8) -> Option<&mut QueueBracketInfo> {
        self.entries.get_mut(&(queue, bracket))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(QueueType, u8), &QueueBracketInfo)> {
        self.entries.iter()
    }

    /// Queues bots should currently join
    pub fn active_queues(&self) -> Vec<(QueueType, u8)> {
        self.entries
            .iter()
            .filter(|(_, info)| {
                info.active_bg_queue || info.active_rated_arena_queue || info.active_skirmish_arena_queue
            })
            .map(|(key, _)| *key)
            .collect()
    }
}

fn record_instance(set: &mut BTreeSet<u32>, count: &mut u32, instance: u32) {
    set.insert(instance);
    *count = set.len() as u32;
}

fn is_rated(participant: &ParticipantView, slot_rated: bool) -> bool {
    slot_rated
        || participant
            .battleground
            .as_ref()
            .is_some_and(|bg| bg.is_arena && bg.is_rated)
}

fn count_player(table: &mut BattlegroundTable, player: &ParticipantView) {
    for slot in &player.queues {
        let Some(bracket) = slot.bracket else {
            continue;
        };
        let Some(info) = table.slot(slot.queue, bracket.id) else {
            continue;
        };
        info.min_level = bracket.min_level;
        info.max_level = bracket.max_level;

        let rated = is_rated(player, slot.rated);
        if slot.queue.is_arena() {
            if rated {
                info.rated_arena_players += 1;
            } else {
                info.skirmish_arena_players += 1;
            }
        } else {
            match player.faction {
                Faction::Alliance => info.bg_alliance_players += 1,
                Faction::Horde => info.bg_horde_players += 1,
            }
            if let Some(bg) = &player.battleground {
                record_instance(&mut info.bg_instances, &mut info.bg_instance_count, bg.instance_id);
            }
        }

        if !player.invited && player.battleground.is_none() {
            if slot.queue.is_arena() {
                if rated {
                    info.active_rated_arena_queue = true;
                } else {
                    info.active_skirmish_arena_queue = true;
                }
            } else {
                info.active_bg_queue = true;
            }
        }
    }
}

fn count_bot(table: &mut BattlegroundTable, bot: &ParticipantView) {
    for slot in &bot.queues {
        let Some(bracket) = slot.bracket else {
            continue;
        };
        let Some(info) = table.slot(slot.queue, bracket.id) else {
            continue;
        };
        info.min_level = bracket.min_level;
        info.max_level = bracket.max_level;

        if slot.queue.is_arena() {
            if is_rated(bot, slot.rated) {
                info.rated_arena_bots += 1;
            } else {
                info.skirmish_arena_bots += 1;
            }
        } else {
            match bot.faction {
                Faction::Alliance => info.bg_alliance_bots += 1,
                Faction::Horde => info.bg_horde_bots += 1,
            }
        }

        if let Some(bg) = &bot.battleground {
            if bg.is_arena && bg.is_rated {
                record_instance(
                    &mut info.rated_arena_instances,
                    &mut info.rated_arena_instance_count,
                    bg.instance_id,
                );
            } else if bg.is_arena {
                record_instance(
                    &mut info.skirmish_arena_instances,
                    &mut info.skirmish_arena_instance_count,
                    bg.instance_id,
                );
            } else {
                record_instance(&mut info.bg_instances, &mut info.bg_instance_count, bg.instance_id);
            }
        }
    }
}

fn waiting_to_leave(participant: &ParticipantView) -> bool {
    participant
        .battleground
        .as_ref()
        .is_some_and(|bg| bg.waiting_to_leave)
}

/// Open queues for brackets whose live instances are below their floor
fn apply_floors(table: &mut BattlegroundTable, floors: &QueueFloorConfig) {
    for (queue, floor) in floors.rated_arena_floors() {
        if let Some(info) = table.slot(queue, floors.arena_bracket)
            && !info.active_rated_arena_queue
            && info.rated_arena_instance_count < floor
            && (info.rated_arena_instances.len() as u32) < floor
        {
            info.active_rated_arena_queue = true;
        }
    }

    for (queue, floor, brackets) in &floors.battlegrounds {
        for bracket in brackets {
            if let Some(info) = table.slot(*queue, *bracket)
                && !info.active_bg_queue
                && info.bg_instance_count < *floor
                && (info.bg_instances.len() as u32) < *floor
            {
                info.active_bg_queue = true;
            }
        }
    }
}

/// Rebuild `table` from a world snapshot.
///
/// # Arguments
///
/// * `table` - Table to rebuild; every entry is reset first
/// * `snapshot` - Queue participation taken on the scheduler task
/// * `is_random_bot` - Filters which bots are managed by this scheduler
/// * `floors` - Instance floors to enforce, `None` while bots are still logging in
pub fn aggregate_battlegrounds(
    table: &mut BattlegroundTable,
    snapshot: &WorldSnapshot,
    is_random_bot: impl Fn(BotId) -> bool,
    floors: Option<&QueueFloorConfig>,
) {
    log::debug!("Checking BG Queue...");
    table.reset();

    for player in &snapshot.real_players {
        if !player.in_bg_queue() || waiting_to_leave(player) {
            continue;
        }
        count_player(table, player);
    }

    for bot in &snapshot.bots {
        if !bot.in_bg_queue() || !bot.in_world || !is_random_bot(bot.guid) || waiting_to_leave(bot) {
            continue;
        }
        count_bot(table, bot);
    }

    if let Some(floors) = floors {
        apply_floors(table, floors);
    }
}

/// Log one line per populated bracket
pub fn log_battleground_info(table: &BattlegroundTable) {
    for ((queue, _), info) in table.iter() {
        if !info.is_populated() {
            continue;
        }
        let levels = format!("{}-{}", info.min_level, info.max_level);
        if queue.is_arena() {
            log::info!(
                "ARENA:{} {}: Player (Skirmish:{}, Rated:{}) Bots (Skirmish:{}, Rated:{}) Total (Skirmish:{} Rated:{}), Instances (Skirmish:{} Rated:{})",
                queue,
                levels,
                info.skirmish_arena_players,
                info.rated_arena_players,
                info.skirmish_arena_bots,
                info.rated_arena_bots,
                info.skirmish_arena_players + info.skirmish_arena_bots,
                info.rated_arena_players + info.rated_arena_bots,
                info.skirmish_arena_instance_count,
                info.rated_arena_instance_count
            );
        } else {
            log::info!(
                "BG:{} {}: Player ({}:{}) Bot ({}:{}) Total (A:{} H:{}), Instances {}, Active Queue: {}",
                queue,
                levels,
                info.bg_alliance_players,
                info.bg_horde_players,
                info.bg_alliance_bots,
                info.bg_horde_bots,
                info.bg_alliance_players + info.bg_alliance_bots,
                info.bg_horde_players + info.bg_horde_bots,
                info.bg_instance_count,
                u8::from(info.active_bg_queue)
            );
        }
    }
    log::debug!("BG Queue check finished");
}

/// Dungeons real players are searching for, per faction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LfgDungeons {
    pub alliance: Vec<u32>,
    pub horde: Vec<u32>,
}

impl LfgDungeons {
    pub fn for_faction(&self, faction: Faction) -> &[u32] {
        match faction {
            Faction::Alliance => &self.alliance,
            Faction::Horde => &self.horde,
        }
    }
}

/// Rebuild the group finder dungeon lists from real players
pub fn aggregate_lfg(snapshot: &WorldSnapshot) -> LfgDungeons {
    log::debug!("Checking LFG Queue...");
    let mut dungeons = LfgDungeons::default();
    for player in &snapshot.real_players {
        if !player.in_world {
            continue;
        }
        let Some(lfg) = &player.lfg else {
            continue;
        };
        if !lfg.state.is_searching() {
            continue;
        }
        let target = match player.faction {
            Faction::Alliance => &mut dungeons.alliance,
            Faction::Horde => &mut dungeons.horde,
        };
        target.extend(lfg.dungeons.iter().copied());
    }
    log::debug!("LFG Queue check finished");
    dungeons
}
