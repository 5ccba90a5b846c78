//! Population scheduler: target drift, phased logins and per-bot decisions.

use super::allocation::{allocate, split_quota};
use super::errors::SchedulerResult;
use super::lifecycle::BotState;
use super::stats::{DueFlags, StatsReport};
use super::timers::PeriodicTimer;
use crate::accounts::{AccountAssigner, AccountRole, ClassCoverageIndex, ReconcileReport};
use crate::config::RandomBotConfig;
use crate::db::Repositories;
use crate::events::{EventKey, EventStore, GLOBAL_BOT};
use crate::host::{BotView, Clock, GroupView, LoginOutcome, TeleportOutcome, WorldHost};
use crate::locations::{BattleMasterCache, LocationCache, LocationPolicy};
use crate::queue::{
    BattlegroundTable, LfgDungeons, aggregate_battlegrounds, aggregate_lfg, log_battleground_info,
};
use crate::world::{BotId, CharacterInfo, Faction, WorldLocation};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn secs(value: u32) -> chrono::Duration {
    chrono::Duration::seconds(i64::from(value))
}

/// What one control tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub target: u32,
    /// Online bots after the tick
    pub online: u32,
    /// Characters newly registered with `add`
    pub added: u32,
    /// Online bots whose state machine advanced
    pub updated: u32,
    /// Offline bots brought online
    pub logged_in: u32,
}

/// Scheduler context owning the event store, caches and the host seam.
///
/// Everything here is mutated from a single task; external callers go
/// through [`super::SchedulerHandle`] when the manager runs inside an actor.
pub struct RandomBotManager<H: WorldHost> {
    pub(super) config: RandomBotConfig,
    pub(super) host: H,
    pub(super) store: EventStore,
    pub(super) accounts: AccountAssigner,
    pub(super) repos: Repositories,
    clock: Arc<dyn Clock>,
    pub(super) rng: StdRng,

    pub(super) policy: LocationPolicy,
    pub(super) locations: LocationCache,
    battlemasters: BattleMasterCache,
    class_index: ClassCoverageIndex,

    /// Bots registered for this run, in admission order
    pub(super) current_bots: Vec<BotId>,
    /// Real players seen through the login hooks
    real_players: Vec<BotId>,
    /// Logins the host reported as pending
    pending_logins: HashSet<BotId>,

    target: u32,
    started_at: DateTime<Utc>,
    initializing: bool,
    /// Log every login until the target is first reached
    bot_logging: bool,
    next_check_delay: Duration,

    real_player_last_seen: Option<DateTime<Utc>>,
    delay_login_until: Option<DateTime<Utc>>,
    missing_bots_since: Option<DateTime<Utc>>,
    players_level: u8,

    bg_table: BattlegroundTable,
    lfg_dungeons: LfgDungeons,

    bg_timer: PeriodicTimer,
    lfg_timer: PeriodicTimer,
    players_timer: PeriodicTimer,
    stats_timer: PeriodicTimer,

    stats_tx: Option<mpsc::Sender<StatsReport>>,
}

impl<H: WorldHost> RandomBotManager<H> {
    /// Create a manager; call [`Self::init`] before the first tick
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `host` - Simulation host
    /// * `repos` - Storage backends
    /// * `clock` - Time source shared with the event store
    /// * `rng` - Seeded random source
    pub fn new(
        config: RandomBotConfig,
        host: H,
        repos: Repositories,
        clock: Arc<dyn Clock>,
        rng: StdRng,
    ) -> Self {
        let tuning = config.tuning.clone();
        let store = EventStore::new(repos.events.clone(), clock.clone());
        let accounts = AccountAssigner::new(repos.accounts.clone());
        let started_at = clock.now();

        Self {
            policy: LocationPolicy::from_config(&config),
            players_level: config.starting_level,
            host,
            store,
            accounts,
            repos,
            clock,
            rng,
            locations: LocationCache::default(),
            battlemasters: BattleMasterCache::default(),
            class_index: ClassCoverageIndex::default(),
            current_bots: Vec::new(),
            real_players: Vec::new(),
            pending_logins: HashSet::new(),
            target: 0,
            started_at,
            initializing: true,
            bot_logging: true,
            next_check_delay: Duration::from_secs(1),
            real_player_last_seen: None,
            delay_login_until: None,
            missing_bots_since: None,
            bg_table: BattlegroundTable::new(),
            lfg_dungeons: LfgDungeons::default(),
            bg_timer: PeriodicTimer::with_warmup(tuning.bg_check_secs),
            lfg_timer: PeriodicTimer::new(tuning.lfg_check_secs),
            players_timer: PeriodicTimer::new(tuning.players_check_secs),
            stats_timer: PeriodicTimer::with_warmup(tuning.stats_secs),
            stats_tx: None,
            config,
        }
    }

    /// Send stats reports over `tx` instead of logging them inline
    pub fn with_stats_channel(mut self, tx: mpsc::Sender<StatsReport>) -> Self {
        self.stats_tx = Some(tx);
        self
    }

    /// Reconcile accounts, drop stale registrations and build the caches
    pub async fn init(&mut self) -> SchedulerResult<ReconcileReport> {
        let report = self.accounts.reconcile(&self.config).await?;

        let stale = self.store.delete_key_everywhere(EventKey::Add).await?;
        if stale > 0 {
            log::info!("Removed {} stale bot registrations", stale);
        }

        self.class_index =
            ClassCoverageIndex::load(self.repos.characters.as_ref(), self.accounts.class_pool()).await?;
        self.locations = LocationCache::load(self.repos.spawns.as_ref(), &self.config).await?;
        self.battlemasters = BattleMasterCache::load(self.repos.spawns.as_ref()).await?;

        self.current_bots.clear();
        self.pending_logins.clear();
        self.started_at = self.clock.now();
        self.initializing = true;
        self.bot_logging = true;
        Ok(report)
    }

    /// Run one control tick
    pub async fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        if !self.config.enabled || !self.config.autologin {
            return report;
        }

        let now = self.store.now();
        let target = self.target_bot_count().await;
        report.target = target;
        self.load_current_bots(target).await;

        let online = self.host.online_bots().len() as u32;
        let focus = self.online_focus(online);

        if self.initializing {
            let uptime = (now - self.started_at).num_seconds().max(0) as f64;
            self.initializing =
                uptime < f64::from(self.config.max_random_bots) * self.config.tuning.init_window_factor;
        }
        let interval = self.update_interval();
        self.next_check_delay = Duration::from_millis(u64::from(interval) * u64::from(focus + 25) * 10);

        let gate_open = self.real_player_gate(now, online);
        if (self.current_bots.len() as u32) < target && gate_open {
            report.added = self.add_random_bots(target).await;
        } else {
            self.missing_bots_since = None;
        }
        let available = self.current_bots.clone();

        self.run_periodic_checks(now).await;

        let per_interval = self.config.bots_per_interval;
        let mut update_budget = per_interval * focus / 100;
        let max_new = if online < target && gate_open {
            target - online
        } else {
            0
        };
        let mut login_budget = per_interval.saturating_sub(update_budget).min(max_new);

        for &guid in &available {
            if update_budget == 0 {
                break;
            }
            if !self.host.is_online(guid) {
                continue;
            }
            if self.process_bot(guid).await {
                update_budget -= 1;
                report.updated += 1;
            }
        }

        if login_budget > 0 && self.pending_logins.is_empty() {
            login_budget = (login_budget + update_budget).min(max_new);
            log::debug!("{} new bots prepared to login", login_budget);

            for &guid in &available {
                if login_budget == 0 {
                    break;
                }
                if self.host.is_online(guid) {
                    continue;
                }
                if self.process_bot(guid).await {
                    login_budget -= 1;
                    report.logged_in += 1;
                }
            }
            self.delay_login_until = None;
        }

        report.online = self.host.online_bots().len() as u32;
        report
    }

    /// Persisted target population, redrawn when unset or out of range
    async fn target_bot_count(&mut self) -> u32 {
        let (min, max) = (self.config.min_random_bots, self.config.max_random_bots);
        let stored = self.store.get(GLOBAL_BOT, EventKey::BotCount).await;
        if stored != 0 && (min..=max).contains(&stored) {
            self.target = stored;
            return stored;
        }

        let target = if max > min {
            self.rng.random_range(min..=max)
        } else {
            min
        };
        let valid_for = self.config.bot_count_change.roll(&mut self.rng);
        self.store.set(GLOBAL_BOT, EventKey::BotCount, target, valid_for).await;
        log::debug!("Random bot target set to {} for {}s", target, valid_for);
        self.target = target;
        target
    }

    /// Rebuild the bot list from live `add` events when it is empty
    async fn load_current_bots(&mut self, target: u32) {
        if !self.current_bots.is_empty() {
            return;
        }
        let registered = match self.store.bots_with(EventKey::Add).await {
            Ok(bots) => bots,
            Err(e) => {
                log::error!("Failed to list registered bots: {}", e);
                return;
            }
        };
        for guid in registered {
            if self.current_bots.len() as u32 >= target {
                break;
            }
            if guid != GLOBAL_BOT && self.store.get(guid, EventKey::Add).await != 0 {
                self.current_bots.push(guid);
            }
        }
    }

    fn online_focus(&self, online: u32) -> u32 {
        let tuning = &self.config.tuning;
        let threshold = u64::from(self.config.min_random_bots) * u64::from(tuning.low_online_threshold_percent) / 100;
        if u64::from(online) < threshold {
            tuning.low_online_focus
        } else {
            tuning.online_focus
        }
    }

    fn update_interval(&self) -> u32 {
        if self.initializing {
            1
        } else {
            self.config.update_interval_secs
        }
    }

    /// Track real sessions; returns whether new logins are allowed
    fn real_player_gate(&mut self, now: DateTime<Utc>, online: u32) -> bool {
        if !self.config.disabled_without_real_player {
            return true;
        }

        let mut real_player_logged = false;
        if self.host.active_session_count() > 0 {
            self.real_player_last_seen = Some(now);
            real_player_logged = true;
            if self.delay_login_until.is_none() {
                let until = now + secs(self.config.real_player_login_delay_secs);
                log::info!("Real player session detected, bots will log in after {}", until);
                self.delay_login_until = Some(until);
            }
        } else {
            self.delay_login_until = None;
            if let Some(last_seen) = self.real_player_last_seen
                && online > 0
                && now > last_seen + secs(self.config.real_player_logout_delay_secs)
            {
                self.host.logout_all();
                log::info!("Logout all bots due no real player session.");
            }
        }

        real_player_logged && self.delay_login_until.is_some_and(|until| now >= until)
    }

    /// Register up to one interval's worth of new bots.
    ///
    /// # Returns
    ///
    /// * `u32` - Number of characters registered
    async fn add_random_bots(&mut self, target: u32) -> u32 {
        let wanted = self
            .config
            .bots_per_interval
            .min(target.saturating_sub(self.current_bots.len() as u32));
        if wanted == 0 {
            return 0;
        }
        let alliance_quota = split_quota(
            wanted,
            self.config.alliance_ratio,
            self.config.horde_ratio,
            &mut self.rng,
        );

        let mut accounts = self.accounts.general_pool().to_vec();
        if self.config.periodic_online_offline {
            accounts.shuffle(&mut self.rng);
            let ratio = self.config.periodic_online_offline_ratio.max(1) as usize;
            accounts.truncate(accounts.len().div_ceil(ratio));
        }

        let mut characters: Vec<CharacterInfo> = Vec::new();
        for account in accounts {
            match self.repos.characters.characters_by_account(account).await {
                Ok(found) => characters.extend(found),
                Err(e) => log::error!("Failed to load characters of account {}: {}", account, e),
            }
        }
        characters.shuffle(&mut self.rng);

        let mut alliance = Vec::new();
        let mut horde = Vec::new();
        for character in &characters {
            if !self.login_eligible(character).await {
                continue;
            }
            match character.faction() {
                Faction::Alliance => alliance.push(character.guid),
                Faction::Horde => horde.push(character.guid),
            }
        }

        let allocation = allocate(&alliance, &horde, wanted, alliance_quota);
        for guid in allocation.guids() {
            let in_world = if self.config.periodic_online_offline {
                self.config.in_world.roll(&mut self.rng)
            } else {
                self.config.permanently_in_world_secs
            };
            self.store.set(guid, EventKey::Add, 1, in_world).await;
            self.store.set(guid, EventKey::Logout, 0, 0).await;
            self.current_bots.push(guid);
        }
        log::debug!(
            "Registered {} alliance and {} horde bots ({} requested)",
            allocation.alliance.len(),
            allocation.horde.len(),
            wanted
        );

        self.report_missing_bots(allocation.unmet);
        allocation.len() as u32
    }

    async fn login_eligible(&mut self, character: &CharacterInfo) -> bool {
        if self.config.disable_death_knight_login && character.class.is_death_knight() {
            return false;
        }
        if self.current_bots.contains(&character.guid) || self.host.is_online(character.guid) {
            return false;
        }
        self.store.get(character.guid, EventKey::Add).await == 0
            && self.store.get(character.guid, EventKey::Logout).await == 0
    }

    /// Rate-limited supply exhaustion diagnostic
    fn report_missing_bots(&mut self, unmet: u32) {
        if unmet == 0 {
            self.missing_bots_since = None;
            return;
        }
        let now = self.store.now();
        let since = *self.missing_bots_since.get_or_insert(now);
        if now - since >= secs(self.config.tuning.missing_bots_report_secs) {
            let accounts_needed = unmet.div_ceil(self.config.chars_per_account.max(1));
            log::error!(
                "Can't log-in all the requested bots. Try adding bot accounts with the '{}' prefix. {} more accounts needed.",
                self.config.account_prefix,
                accounts_needed
            );
            self.missing_bots_since = None;
        }
    }

    async fn run_periodic_checks(&mut self, now: DateTime<Utc>) {
        if self.config.sync_level_with_players
            && !self.real_players.is_empty()
            && self.players_timer.fire(now)
        {
            self.check_players();
        }
        if self.config.join_bg && self.bg_timer.fire(now) {
            self.check_bg_queue();
        }
        if self.config.join_lfg && self.lfg_timer.fire(now) {
            self.check_lfg_queue();
        }
        if self.stats_timer.fire(now) {
            self.print_stats().await;
        }
    }

    /// Advance one bot's state machine.
    ///
    /// # Returns
    ///
    /// * `bool` - Whether the bot consumed budget (login started or decision step taken)
    pub async fn process_bot(&mut self, guid: BotId) -> bool {
        let view = self.host.bot(guid);

        if self.store.get(guid, EventKey::Add).await == 0 {
            self.retire(guid, view.as_ref()).await;
            return false;
        }

        let Some(view) = view else {
            return self.start_login(guid).await;
        };

        if !view.in_world || view.in_flight {
            return false;
        }
        if let Some(group) = &view.group {
            self.leave_bot_led_group(&view, group);
            return false;
        }
        if self.store.get(guid, EventKey::Update).await != 0 {
            return false;
        }

        if self.is_random_bot(guid) {
            self.decide(&view).await;
        }

        let next_update = self.config.revive.roll(&mut self.rng);
        self.store.set(guid, EventKey::Update, 1, next_update).await;
        true
    }

    /// Log out a bot whose registration ended; grouped bots are kept until free
    async fn retire(&mut self, guid: BotId, view: Option<&BotView>) {
        if view.is_some_and(|v| v.group.is_some()) {
            return;
        }
        match view {
            Some(v) => log::debug!("Bot #{} {}:{} <{}>: log out", guid, v.faction().tag(), v.level, v.name),
            None => log::debug!("Bot #{}: log out", guid),
        }

        self.store.set(guid, EventKey::Add, 0, 0).await;
        self.current_bots.retain(|b| *b != guid);

        if view.is_some() {
            if self.store.get(guid, EventKey::Logout).await == 0 {
                let cooldown = self.config.in_world.roll(&mut self.rng);
                self.store.set(guid, EventKey::Logout, 1, cooldown).await;
            }
            self.host.logout(guid);
        }
    }

    /// Bots do not stay in a world group led by another random bot.
    /// Group finder groups and groups mastered by a real player are left alone.
    fn leave_bot_led_group(&mut self, view: &BotView, group: &GroupView) {
        if group.is_lfg || group.master_is_real_player {
            return;
        }
        if !self.is_random_bot(view.guid) || !self.is_random_bot(group.leader) {
            return;
        }
        self.host.leave_group(view.guid);
        log::info!("Bot {} remove from group since leader is random bot.", view.name);
    }

    async fn start_login(&mut self, guid: BotId) -> bool {
        if self.pending_logins.contains(&guid) {
            return false;
        }
        match self.host.login(guid) {
            LoginOutcome::Completed => self.on_bot_login(guid),
            LoginOutcome::Pending => {
                self.pending_logins.insert(guid);
            }
            LoginOutcome::Failed => {
                self.on_login_error(guid).await;
                return false;
            }
        }

        let interval = self.update_interval();
        let update_in = self
            .rng
            .random_range(5.max(interval / 2)..=12.max(interval * 2));
        self.store.set(guid, EventKey::Update, 1, update_in).await;

        if self.store.get(guid, EventKey::Randomize).await == 0 {
            let randomize_in = self.rng.random_range(3..=4.max(interval * 2 / 5));
            self.schedule_randomize(guid, randomize_in).await;
        }
        if self.store.get(guid, EventKey::Teleport).await == 0 {
            let teleport_in = self
                .rng
                .random_range(7.max(interval * 7 / 10)..=14.max(interval * 14 / 10));
            self.schedule_teleport(guid, teleport_in).await;
        }
        true
    }

    /// One decision step for an online, ungrouped bot
    async fn decide(&mut self, view: &BotView) -> bool {
        let guid = view.guid;
        if view.in_battleground || view.in_bg_queue {
            return false;
        }

        if view.dead {
            if self.store.get(guid, EventKey::Dead).await == 0 {
                let revive_in = self.config.revive.roll(&mut self.rng);
                log::debug!("Mark bot {} as dead, will be revived in {}s.", view.name, revive_in);
                self.store
                    .set(guid, EventKey::Dead, 1, self.config.in_world.max)
                    .await;
                self.store.set(guid, EventKey::Revive, 1, revive_in).await;
                return false;
            }
            if self.store.get(guid, EventKey::Revive).await == 0 {
                self.revive(view).await;
                return true;
            }
            return false;
        }

        if !view.travel_idle {
            return false;
        }

        if self.store.get(guid, EventKey::Randomize).await == 0 {
            self.randomize(view).await;
            log::debug!("Bot #{} {}:{} <{}>: randomized", guid, view.faction().tag(), view.level, view.name);
            let next = self.config.randomize.roll(&mut self.rng);
            self.schedule_randomize(guid, next).await;
            return true;
        }

        if self.store.get(guid, EventKey::Teleport).await == 0 {
            log::debug!("Bot #{} <{}>: teleport for level and refresh", guid, view.name);
            self.refresh(view);
            self.teleport_for_level(guid, true);
            let next = self.config.teleport.roll(&mut self.rng);
            self.schedule_teleport(guid, next).await;
            return true;
        }

        false
    }

    pub(super) async fn revive(&mut self, view: &BotView) {
        log::debug!("Bot {} revived", view.name);
        self.store.set(view.guid, EventKey::Dead, 0, 0).await;
        self.store.set(view.guid, EventKey::Revive, 0, 0).await;
        self.host.revive(view.guid);
        self.refresh(view);
        self.teleport_grind(view.guid);
    }

    /// Restore the bot and hand out some pocket money
    pub(super) fn refresh(&mut self, view: &BotView) {
        if view.in_battleground {
            return;
        }
        let cap = u32::from(view.level.max(1)) * 5;
        let roll = self.rng.random_range(1..=cap);
        let bonus = (500.0 * f64::from(roll).sqrt()) as u32;
        self.host.refresh(view.guid, bonus);
    }

    pub(super) async fn randomize(&mut self, view: &BotView) {
        if view.in_battleground {
            return;
        }
        let low_death_knight =
            view.class.is_death_knight() && view.level <= self.config.heroic_start_level;
        if view.level < 3 || low_death_knight {
            self.randomize_first(view).await;
        } else if view.level < self.config.max_level || !self.config.downgrade_max_level_bot {
            self.host.randomize(view.guid, view.level, true);
        } else {
            self.randomize_first(view).await;
        }
    }

    /// Full reroll including a fresh level
    pub(super) async fn randomize_first(&mut self, view: &BotView) {
        let guid = view.guid;
        let level = self.roll_first_level(view);
        log::debug!("Bot #{} <{}>: rolled level {}", guid, view.name, level);

        self.store
            .set(guid, EventKey::Level, u32::from(level), self.config.in_world.max)
            .await;
        self.host.randomize(guid, level, false);

        let delete_in = self.config.randomize.roll(&mut self.rng);
        self.store.set(guid, EventKey::BotDelete, 1, delete_in).await;
        let logout_in = self.config.in_world.roll(&mut self.rng);
        self.store.set(guid, EventKey::Logout, 1, logout_in).await;

        self.host.reset_ai(guid);
        if view.group.is_some() {
            self.host.leave_group(guid);
        }
        self.teleport_for_level(guid, true);
    }

    fn roll_first_level(&mut self, view: &BotView) -> u8 {
        let config = &self.config;
        let death_knight = view.class.is_death_knight();
        let heroic = config.heroic_start_level;

        let mut max_level = config.max_level.min(config.world_max_level);
        if config.sync_level_with_players {
            max_level = config.min_level.max(self.players_level.min(config.world_max_level));
        }
        let mut min_level = config.min_level;
        if death_knight {
            min_level = min_level.max(heroic);
            max_level = max_level.max(heroic);
        }
        min_level = min_level.min(max_level);

        let level = if config.downgrade_max_level_bot && view.level >= config.max_level {
            if death_knight { heroic } else { min_level }
        } else {
            let roll = f64::from(self.rng.random_range(1..=100u32));
            if roll <= 100.0 * config.max_level_chance {
                max_level
            } else if roll <= 100.0 * (config.max_level_chance + config.min_level_chance) {
                min_level
            } else {
                self.rng.random_range(min_level..=max_level)
            }
        };

        if config.disable_random_levels {
            if death_knight {
                config.starting_level.max(heroic)
            } else {
                config.starting_level
            }
        } else {
            level
        }
    }

    /// Raise the bot one level within the configured cap
    pub(super) async fn increase_level(&mut self, guid: BotId) {
        let Some(view) = self.host.bot(guid) else {
            return;
        };
        let cap = self.config.max_level.min(self.config.world_max_level);
        let level = view.level.saturating_add(1).min(cap);
        if self.store.get(guid, EventKey::Level).await == u32::from(level) {
            return;
        }
        self.store
            .set(guid, EventKey::Level, u32::from(level), self.config.in_world.max)
            .await;
        self.host.randomize(guid, level, true);
        self.teleport_for_level(guid, true);
    }

    pub(super) async fn change_strategy(&mut self, guid: BotId) {
        let roll: f32 = self.rng.random_range(0.0..100.0);
        if roll > self.config.rpg_chance {
            log::debug!("Changing strategy for bot #{} to grinding", guid);
            let delay = self.config.tuning.strategy_teleport_delay_secs;
            self.schedule_teleport(guid, delay).await;
        } else {
            log::debug!("Changing strategy for bot #{} to RPG", guid);
            self.teleport_for_level(guid, true);
            self.store
                .set(guid, EventKey::Teleport, 1, self.config.in_world.max)
                .await;
        }
        self.schedule_change_strategy(guid, 0).await;
    }

    /// Move the bot to a location matching its level; levels 10+ may land at a banker
    pub(super) fn teleport_for_level(&mut self, guid: BotId, allow_bankers: bool) -> bool {
        let Some(view) = self.host.bot(guid) else {
            return false;
        };
        let level = view.level;
        if allow_bankers && level >= 10 {
            let chance = (self.config.prob_tele_to_bankers * 100.0) as u32;
            if self.rng.random_range(0..100) < chance {
                let bankers = self.locations.bankers_for(level).to_vec();
                if !bankers.is_empty() {
                    return self.teleport(&view, bankers, true);
                }
            }
        }
        let candidates = self.locations.for_level(self.policy, view.faction(), level).to_vec();
        self.teleport(&view, candidates, false)
    }

    /// Teleport to a grind spot regardless of the placement policy
    pub(super) fn teleport_grind(&mut self, guid: BotId) -> bool {
        let Some(view) = self.host.bot(guid) else {
            return false;
        };
        let candidates = self
            .locations
            .for_level(LocationPolicy::Grind, view.faction(), view.level)
            .to_vec();
        self.teleport(&view, candidates, false)
    }

    fn teleport(&mut self, view: &BotView, mut candidates: Vec<WorldLocation>, hearth: bool) -> bool {
        if view.being_teleported || !view.in_world || view.in_bg_queue || view.in_battleground {
            return false;
        }
        if view.group.is_some() && !view.is_group_leader() {
            return false;
        }

        candidates.retain(|loc| self.config.random_bot_maps.contains(&loc.map));
        candidates.shuffle(&mut self.rng);

        for loc in &candidates {
            match self.host.try_teleport(view.guid, loc, hearth) {
                TeleportOutcome::Teleported => {
                    log::debug!(
                        "Bot #{} <{}>: teleported to map {} ({:.1}, {:.1}, {:.1})",
                        view.guid,
                        view.name,
                        loc.map,
                        loc.x,
                        loc.y,
                        loc.z
                    );
                    return true;
                }
                TeleportOutcome::Rejected => continue,
                TeleportOutcome::Aborted => return false,
            }
        }
        log::debug!("Cannot teleport bot {} - no locations available", view.name);
        false
    }

    pub(super) async fn schedule_randomize(&mut self, guid: BotId, time: u32) {
        self.store.set(guid, EventKey::Randomize, 1, time).await;
    }

    /// A zero `time` picks the default teleport delay
    pub(super) async fn schedule_teleport(&mut self, guid: BotId, time: u32) {
        let time = if time == 0 {
            let interval = self.config.update_interval_secs;
            self.config.tuning.teleport_base_delay_secs
                + self.rng.random_range(interval..=interval.saturating_mul(3))
        } else {
            time
        };
        self.store.set(guid, EventKey::Teleport, 1, time).await;
    }

    /// A zero `time` picks a delay from the change-strategy window
    pub(super) async fn schedule_change_strategy(&mut self, guid: BotId, time: u32) {
        let time = if time == 0 {
            self.config.change_strategy.roll(&mut self.rng)
        } else {
            time
        };
        self.store.set(guid, EventKey::ChangeStrategy, 1, time).await;
    }

    /// Host hook: a bot character finished loading
    pub fn on_bot_login(&mut self, guid: BotId) {
        self.pending_logins.remove(&guid);
        let Some(view) = self.host.bot(guid) else {
            return;
        };
        if self.bot_logging {
            let online = self.host.online_bots().len() as u32;
            log::info!("{}/{} Bot {} logged in", online, self.target, view.name);
            if online >= self.target {
                self.bot_logging = false;
            }
        }
        self.host.set_xp_gain(guid, !self.config.fixed_level);
    }

    /// Host hook: a bot character could not be loaded
    pub async fn on_login_error(&mut self, guid: BotId) {
        log::warn!("Bot #{} failed to log in, dropping it from the population", guid);
        self.pending_logins.remove(&guid);
        self.store.set(guid, EventKey::Add, 0, 0).await;
        self.current_bots.retain(|b| *b != guid);
    }

    /// Host hook: a real player entered the world
    pub fn on_player_login(&mut self, guid: BotId) {
        if !self.real_players.contains(&guid) {
            self.real_players.push(guid);
        }
        log::debug!("Player #{} logged in, {} real players online", guid, self.real_players.len());
    }

    pub fn on_player_logout(&mut self, guid: BotId) {
        self.real_players.retain(|p| *p != guid);
    }

    /// Delete every event of a bot and log it out
    pub async fn remove_bot(&mut self, guid: BotId) {
        if let Err(e) = self.store.remove_bot(guid).await {
            log::error!("Failed to delete events of bot {}: {}", guid, e);
        }
        self.current_bots.retain(|b| *b != guid);
        if self.host.is_online(guid) {
            self.host.logout(guid);
        }
    }

    /// Log out every loaded bot, used at shutdown
    pub fn logout_all(&mut self) {
        log::info!("Logging out {} random bots", self.host.online_bots().len());
        self.host.logout_all();
    }

    /// Registered for this run and not driven by a real player
    pub fn is_random_bot(&self, guid: BotId) -> bool {
        self.current_bots.contains(&guid)
            && self.host.bot(guid).is_none_or(|v| !v.controlled_by_real_player)
    }

    /// Character belongs to a class coverage account
    pub async fn is_class_coverage_bot(&self, guid: BotId) -> bool {
        if self.class_index.contains(guid) {
            return true;
        }
        match self.repos.characters.account_of(guid).await {
            Ok(Some(account)) => self
                .accounts
                .is_account_type(account, AccountRole::ClassCoveragePool)
                .await
                .unwrap_or_else(|e| {
                    log::error!("Failed to read account type of {}: {}", account, e);
                    false
                }),
            Ok(None) => false,
            Err(e) => {
                log::error!("Failed to resolve account of bot {}: {}", guid, e);
                false
            }
        }
    }

    /// Lifecycle state derived from the `add` event and the host view
    pub async fn bot_state(&mut self, guid: BotId) -> BotState {
        let registered = self.store.get(guid, EventKey::Add).await != 0;
        let view = self.host.bot(guid);
        BotState::classify(registered, self.pending_logins.contains(&guid), view.as_ref())
    }

    /// Buy price multiplier for a vendor bot, redrawn when expired
    pub async fn buy_multiplier(&mut self, guid: BotId) -> f64 {
        self.price_multiplier(guid, EventKey::BuyMultiplier, 50, 120).await
    }

    pub async fn sell_multiplier(&mut self, guid: BotId) -> f64 {
        self.price_multiplier(guid, EventKey::SellMultiplier, 80, 250).await
    }

    async fn price_multiplier(&mut self, guid: BotId, key: EventKey, low: u32, high: u32) -> f64 {
        let mut value = self.store.get(guid, key).await;
        if value == 0 {
            value = self.rng.random_range(low..=high);
            let valid_for = self.config.price_change.roll(&mut self.rng);
            self.store.set(guid, key, value, valid_for).await;
        }
        f64::from(value) / 100.0
    }

    pub async fn trade_discount(&mut self, guid: BotId, master: BotId) -> u32 {
        self.store.get(guid, EventKey::TradeDiscount(master)).await
    }

    pub async fn set_trade_discount(&mut self, guid: BotId, master: BotId, value: u32) {
        self.store
            .set(guid, EventKey::TradeDiscount(master), value, self.config.in_world.max)
            .await;
    }

    /// Adjust a discount by `delta`, never below zero
    pub async fn add_trade_discount(&mut self, guid: BotId, master: BotId, delta: i32) {
        let current = i64::from(self.trade_discount(guid, master).await);
        let value = (current + i64::from(delta)).clamp(0, i64::from(u32::MAX)) as u32;
        self.set_trade_discount(guid, master, value).await;
    }

    /// Raise the bot level ceiling to follow the strongest real player
    pub fn check_players(&mut self) {
        let snapshot = self.host.snapshot();
        for player in &snapshot.real_players {
            if player.is_gm {
                continue;
            }
            if player.level > self.players_level {
                self.players_level = player.level.saturating_add(3);
            }
        }
        log::info!(
            "Max player level is {}, max bot level set to {}",
            self.players_level.saturating_sub(3),
            self.players_level
        );
    }

    /// Rebuild the battleground table; floors apply once the population is up
    pub fn check_bg_queue(&mut self) {
        let snapshot = self.host.snapshot();
        let online = self.host.online_bots().len() as u32;
        let floors = (self.config.auto_join_bg && online >= self.target).then_some(&self.config.queue_floors);

        let current = &self.current_bots;
        let host = &self.host;
        aggregate_battlegrounds(
            &mut self.bg_table,
            &snapshot,
            |guid| {
                current.contains(&guid)
                    && host.bot(guid).is_none_or(|v| !v.controlled_by_real_player)
            },
            floors,
        );
        log_battleground_info(&self.bg_table);
    }

    pub fn check_lfg_queue(&mut self) {
        self.lfg_dungeons = aggregate_lfg(&self.host.snapshot());
    }

    /// Build a stats report and hand it to the reporter (or log it inline)
    pub async fn print_stats(&mut self) -> StatsReport {
        let mut bots = Vec::new();
        for guid in self.host.online_bots() {
            if !self.current_bots.contains(&guid) {
                continue;
            }
            let Some(view) = self.host.bot(guid) else {
                continue;
            };
            let due = DueFlags {
                randomize: self.store.get(guid, EventKey::Randomize).await == 0,
                teleport: self.store.get(guid, EventKey::Teleport).await == 0,
                change_strategy: self.store.get(guid, EventKey::ChangeStrategy).await == 0,
            };
            bots.push((view, due));
        }

        let mut class_coverage = 0;
        for (view, _) in &bots {
            if self.is_class_coverage_bot(view.guid).await {
                class_coverage += 1;
            }
        }

        let mut report = StatsReport::collect(self.target, self.current_bots.len() as u32, &bots);
        report.class_coverage = class_coverage;
        match &self.stats_tx {
            Some(tx) => {
                if let Err(e) = tx.try_send(report.clone()) {
                    log::debug!("Stats report dropped: {}", e);
                }
            }
            None => report.log(),
        }
        report
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn store_mut(&mut self) -> &mut EventStore {
        &mut self.store
    }

    pub fn config(&self) -> &RandomBotConfig {
        &self.config
    }

    /// Swap the configuration; location caches are not rebuilt here
    pub fn set_config(&mut self, config: RandomBotConfig) {
        self.policy = LocationPolicy::from_config(&config);
        self.config = config;
    }

    pub fn current_bots(&self) -> &[BotId] {
        &self.current_bots
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    pub fn next_check_delay(&self) -> Duration {
        self.next_check_delay
    }

    pub fn battleground_table(&self) -> &BattlegroundTable {
        &self.bg_table
    }

    pub fn lfg_dungeons(&self) -> &LfgDungeons {
        &self.lfg_dungeons
    }

    pub fn battlemasters(&self) -> &BattleMasterCache {
        &self.battlemasters
    }

    pub fn locations(&self) -> &LocationCache {
        &self.locations
    }

    pub fn is_initializing(&self) -> bool {
        self.initializing
    }

    pub fn players_level(&self) -> u8 {
        self.players_level
    }
}
