//! Population report built on the scheduler task and consumed elsewhere.

use crate::host::BotView;
use crate::world::{Faction, PlayerClass, Race};
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Online bots in a level range
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelBucket {
    pub from: u8,
    pub to: u8,
    pub alliance: u32,
    pub horde: u32,
}

/// Count and summed level for a race or class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GroupStat {
    pub count: u32,
    pub level_sum: u32,
}

impl GroupStat {
    /// Average level rounded down to one decimal
    pub fn average_level(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        (self.level_sum * 10 / self.count) as f32 / 10.0
    }
}

/// Pending-transition flags of one bot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DueFlags {
    pub randomize: bool,
    pub teleport: bool,
    pub change_strategy: bool,
}

/// Immutable population snapshot handed to the reporter
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsReport {
    pub online: u32,
    pub target: u32,
    pub tracked: u32,
    pub levels: Vec<LevelBucket>,
    pub per_race: BTreeMap<Race, GroupStat>,
    pub per_class: BTreeMap<PlayerClass, GroupStat>,
    pub alliance: u32,
    pub horde: u32,
    pub dead: u32,
    pub in_combat: u32,
    pub moving: u32,
    pub in_flight: u32,
    pub mounted: u32,
    pub in_battleground: u32,
    pub randomize_due: u32,
    pub teleport_due: u32,
    pub change_strategy_due: u32,
    /// Online bots backed by class coverage accounts
    pub class_coverage: u32,
}

impl StatsReport {
    /// # Arguments
    ///
    /// * `target` - Current target population
    /// * `tracked` - Bots in the current bot list
    /// * `bots` - Online bot views with their pending transitions
    pub fn collect(target: u32, tracked: u32, bots: &[(BotView, DueFlags)]) -> Self {
        let mut report = StatsReport {
            online: bots.len() as u32,
            target,
            tracked,
            ..Self::default()
        };

        let mut alliance_levels: BTreeMap<u8, u32> = BTreeMap::new();
        let mut horde_levels: BTreeMap<u8, u32> = BTreeMap::new();
        let mut max_level = 0u8;

        for (bot, due) in bots {
            match bot.faction() {
                Faction::Alliance => {
                    report.alliance += 1;
                    *alliance_levels.entry(bot.level).or_default() += 1;
                }
                Faction::Horde => {
                    report.horde += 1;
                    *horde_levels.entry(bot.level).or_default() += 1;
                }
            }
            max_level = max_level.max(bot.level);

            let race = report.per_race.entry(bot.race).or_default();
            race.count += 1;
            race.level_sum += u32::from(bot.level);
            let class = report.per_class.entry(bot.class).or_default();
            class.count += 1;
            class.level_sum += u32::from(bot.level);

            report.dead += u32::from(bot.dead);
            report.in_combat += u32::from(bot.in_combat);
            report.moving += u32::from(bot.moving);
            report.in_flight += u32::from(bot.in_flight);
            report.mounted += u32::from(bot.mounted);
            report.in_battleground += u32::from(bot.in_battleground);
            report.randomize_due += u32::from(due.randomize);
            report.teleport_due += u32::from(due.teleport);
            report.change_strategy_due += u32::from(due.change_strategy);
        }

        report.levels = level_buckets(max_level, &alliance_levels, &horde_levels);
        report
    }

    /// Write the report to the log
    pub fn log(&self) {
        log::info!("Random Bots Stats: {} online ({} tracked, target {})", self.online, self.tracked, self.target);
        log::info!("Bots level:");
        for bucket in &self.levels {
            log::info!("    {}..{}: {} alliance, {} horde", bucket.from, bucket.to, bucket.alliance, bucket.horde);
        }
        log::info!("Bots race:");
        for (race, stat) in &self.per_race {
            log::info!("    {}: {}, avg lvl: {}", race, stat.count, stat.average_level());
        }
        log::info!("Bots class:");
        for (class, stat) in &self.per_class {
            log::info!("    {}: {}, avg lvl: {}", class, stat.count, stat.average_level());
        }
        log::info!("Bots status:");
        log::info!("    Moving: {}", self.moving);
        log::info!("    In flight: {}", self.in_flight);
        log::info!("    On mount: {}", self.mounted);
        log::info!("    In combat: {}", self.in_combat);
        log::info!("    In BG: {}", self.in_battleground);
        log::info!("    Dead: {}", self.dead);
        log::info!("    Class coverage: {}", self.class_coverage);
        log::info!("Bots to:");
        log::info!("    randomize: {}", self.randomize_due);
        log::info!("    teleport: {}", self.teleport_due);
        log::info!("    change_strategy: {}", self.change_strategy_due);
    }
}

/// Group per-level counts into roughly eight ranges, skipping empty ones
fn level_buckets(max_level: u8, alliance: &BTreeMap<u8, u32>, horde: &BTreeMap<u8, u32>) -> Vec<LevelBucket> {
    let step = ((u32::from(max_level) + 4) / 8).max(1);
    let mut buckets = Vec::new();
    let (mut a, mut h) = (0, 0);
    let mut from = 1u8;

    for level in 1..=max_level {
        a += alliance.get(&level).copied().unwrap_or(0);
        h += horde.get(&level).copied().unwrap_or(0);

        if (u32::from(level) + 1) % step == 0 || level == max_level {
            if a > 0 || h > 0 {
                buckets.push(LevelBucket {
                    from,
                    to: level,
                    alliance: a,
                    horde: h,
                });
            }
            a = 0;
            h = 0;
            from = level.saturating_add(1);
        }
    }
    buckets
}

/// Spawn the background reporter.
///
/// Every received report is logged and then passed to `sink`. The task ends
/// when all senders are dropped.
pub fn spawn_stats_reporter<F>(mut rx: mpsc::Receiver<StatsReport>, sink: F) -> JoinHandle<()>
where
    F: Fn(&StatsReport) + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(report) = rx.recv().await {
            report.log();
            sink(&report);
        }
        log::debug!("Stats reporter stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::WorldLocation;
    use std::sync::{Arc, Mutex};

    fn bot(guid: u32, race: Race, class: PlayerClass, level: u8) -> BotView {
        BotView {
            guid,
            name: format!("Stat{guid}"),
            level,
            class,
            race,
            zone_id: 0,
            position: WorldLocation::new(0, 0.0, 0.0, 0.0, 0.0),
            in_world: true,
            being_teleported: false,
            dead: false,
            in_flight: false,
            in_combat: false,
            moving: false,
            mounted: false,
            group: None,
            travel_idle: true,
            in_battleground: false,
            in_bg_queue: false,
            controlled_by_real_player: false,
        }
    }

    #[test]
    fn test_collect_counts() {
        let mut dead = bot(3, Race::Orc, PlayerClass::Warrior, 80);
        dead.dead = true;
        let bots = vec![
            (bot(1, Race::Human, PlayerClass::Warrior, 10), DueFlags::default()),
            (
                bot(2, Race::Human, PlayerClass::Mage, 15),
                DueFlags {
                    randomize: true,
                    ..DueFlags::default()
                },
            ),
            (
                dead,
                DueFlags {
                    teleport: true,
                    change_strategy: true,
                    ..DueFlags::default()
                },
            ),
        ];
        let report = StatsReport::collect(50, 4, &bots);
        assert_eq!(report.online, 3);
        assert_eq!((report.alliance, report.horde), (2, 1));
        assert_eq!(report.dead, 1);
        assert_eq!(report.randomize_due, 1);
        assert_eq!(report.teleport_due, 1);
        assert_eq!(report.per_race[&Race::Human].count, 2);
        assert!((report.per_race[&Race::Human].average_level() - 12.5).abs() < 1e-4);
        assert_eq!(report.per_class[&PlayerClass::Warrior].level_sum, 90);
    }

    #[test]
    fn test_level_buckets_cover_levels() {
        let alliance = BTreeMap::from([(1, 2), (40, 1)]);
        let horde = BTreeMap::from([(80, 3)]);
        let buckets = level_buckets(80, &alliance, &horde);
        // step is 10: ranges close at 9, 19, ... 79 and at the max level
        assert_eq!(buckets.first().map(|b| (b.from, b.to, b.alliance)), Some((1, 9, 2)));
        assert_eq!(buckets.last().map(|b| (b.from, b.to, b.horde)), Some((80, 80, 3)));
        let total: u32 = buckets.iter().map(|b| b.alliance + b.horde).sum();
        assert_eq!(total, 6);
    }

    #[test]
    fn test_empty_report() {
        let report = StatsReport::collect(0, 0, &[]);
        assert!(report.levels.is_empty());
        assert_eq!(report.online, 0);
    }

    #[test]
    fn test_report_serializes_with_named_groups() {
        let bots = vec![(bot(1, Race::Dwarf, PlayerClass::Hunter, 20), DueFlags::default())];
        let json = serde_json::to_value(StatsReport::collect(10, 1, &bots)).unwrap();
        assert_eq!(json["online"], 1);
        assert_eq!(json["per_race"]["Dwarf"]["count"], 1);
        assert_eq!(json["per_class"]["Hunter"]["level_sum"], 20);
    }

    #[tokio::test]
    async fn test_reporter_receives_reports() {
        let (tx, rx) = mpsc::channel(4);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        let handle = spawn_stats_reporter(rx, move |r| {
            sink_seen.lock().unwrap().push(r.online);
        });
        tx.send(StatsReport {
            online: 7,
            ..StatsReport::default()
        })
        .await
        .unwrap();
        drop(tx);
        handle.await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![7]);
    }
}
