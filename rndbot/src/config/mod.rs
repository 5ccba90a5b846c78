//! Random bot configuration.
//!
//! Every tunable the scheduler consumes lives here, loaded from `RNDBOT_*`
//! environment variables with defaults. Constants that shape scheduling
//! (focus split, initialization window, check cadences) are named fields in
//! [`SchedulerTuning`] rather than literals in the scheduler.

pub mod errors;

pub use errors::{ConfigError, ConfigResult};

use crate::locations::LevelBracket;
use crate::queue::QueueType;
use rand::Rng;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Inclusive range of seconds a scheduled transition may take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub min: u32,
    pub max: u32,
}

impl TimeRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Uniform draw in `[min, max]`
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        if self.max <= self.min {
            return self.min;
        }
        rng.random_range(self.min..=self.max)
    }

    fn validate(&self, var: &str) -> ConfigResult<()> {
        if self.min > self.max {
            return Err(ConfigError::invalid(
                var,
                format!("minimum {} exceeds maximum {}", self.min, self.max),
            ));
        }
        Ok(())
    }
}

/// Scheduling constants exposed as tunables
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerTuning {
    /// Share of the per-interval budget spent on online bots (percent)
    pub online_focus: u32,
    /// Focus used while the online count is far below the minimum
    pub low_online_focus: u32,
    /// Online count below this percentage of `min_random_bots` counts as "far below"
    pub low_online_threshold_percent: u32,
    /// Initialization lasts `max_random_bots * init_window_factor` seconds of uptime
    pub init_window_factor: f64,
    /// Battleground aggregation cadence
    pub bg_check_secs: u32,
    /// Group-finder aggregation cadence
    pub lfg_check_secs: u32,
    /// Player-level sync cadence
    pub players_check_secs: u32,
    /// Stats report cadence
    pub stats_secs: u32,
    /// Minimum spacing between supply exhaustion diagnostics
    pub missing_bots_report_secs: u32,
    /// Base delay added to a default teleport schedule
    pub teleport_base_delay_secs: u32,
    /// Teleport delay used when a strategy change sends a bot grinding
    pub strategy_teleport_delay_secs: u32,
}

impl Default for SchedulerTuning {
    fn default() -> Self {
        Self {
            online_focus: 75,
            low_online_focus: 25,
            low_online_threshold_percent: 90,
            init_window_factor: 0.51,
            bg_check_secs: 35,
            lfg_check_secs: 30,
            players_check_secs: 60,
            stats_secs: 300,
            missing_bots_report_secs: 10,
            teleport_base_delay_secs: 60,
            strategy_teleport_delay_secs: 30,
        }
    }
}

/// Minimum concurrent instances per queue, enforced once the population is up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueFloorConfig {
    /// Bracket used for rated arena floors
    pub arena_bracket: u8,
    pub rated_2v2: u32,
    pub rated_3v3: u32,
    pub rated_5v5: u32,
    /// Battleground floors: (queue, instance floor, brackets)
    pub battlegrounds: Vec<(QueueType, u32, Vec<u8>)>,
}

impl Default for QueueFloorConfig {
    fn default() -> Self {
        Self {
            arena_bracket: 14,
            rated_2v2: 0,
            rated_3v3: 0,
            rated_5v5: 0,
            battlegrounds: vec![
                (QueueType::IsleOfConquest, 0, vec![14]),
                (QueueType::EyeOfTheStorm, 0, vec![14]),
                (QueueType::AlteracValley, 0, vec![14]),
                (QueueType::ArathiBasin, 0, vec![14]),
                (QueueType::WarsongGulch, 0, vec![14]),
            ],
        }
    }
}

impl QueueFloorConfig {
    fn from_env() -> ConfigResult<Self> {
        let defaults = Self::default();
        let mut battlegrounds = Vec::with_capacity(defaults.battlegrounds.len());
        for (queue, count, brackets) in defaults.battlegrounds {
            let tag = queue.short_name().to_uppercase();
            let count = parse_env_or(&format!("RNDBOT_AUTOJOIN_{tag}_COUNT"), count);
            let var = format!("RNDBOT_AUTOJOIN_{tag}_BRACKETS");
            let brackets = match std::env::var(&var) {
                Ok(raw) => parse_brackets(&raw).map_err(|reason| ConfigError::invalid(&var, reason))?,
                Err(_) => brackets,
            };
            battlegrounds.push((queue, count, brackets));
        }

        Ok(Self {
            arena_bracket: parse_env_or("RNDBOT_AUTOJOIN_ARENA_BRACKET", defaults.arena_bracket),
            rated_2v2: parse_env_or("RNDBOT_AUTOJOIN_RATED_2V2_COUNT", defaults.rated_2v2),
            rated_3v3: parse_env_or("RNDBOT_AUTOJOIN_RATED_3V3_COUNT", defaults.rated_3v3),
            rated_5v5: parse_env_or("RNDBOT_AUTOJOIN_RATED_5V5_COUNT", defaults.rated_5v5),
            battlegrounds,
        })
    }

    /// Rated arena floors as (queue, floor) pairs
    pub fn rated_arena_floors(&self) -> [(QueueType, u32); 3] {
        [
            (QueueType::Arena2v2, self.rated_2v2),
            (QueueType::Arena3v3, self.rated_3v3),
            (QueueType::Arena5v5, self.rated_5v5),
        ]
    }
}

/// Complete random bot configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RandomBotConfig {
    pub enabled: bool,
    pub autologin: bool,

    // Population
    pub min_random_bots: u32,
    pub max_random_bots: u32,
    pub bot_count_change: TimeRange,
    pub bots_per_interval: u32,
    pub update_interval_secs: u32,
    pub alliance_ratio: u32,
    pub horde_ratio: u32,

    // Accounts
    pub account_prefix: String,
    pub chars_per_account: u32,
    pub add_class_pool_size: u32,
    pub periodic_online_offline: bool,
    pub periodic_online_offline_ratio: u32,

    // Transition windows
    pub in_world: TimeRange,
    pub permanently_in_world_secs: u32,
    pub randomize: TimeRange,
    pub revive: TimeRange,
    pub teleport: TimeRange,
    pub change_strategy: TimeRange,
    pub price_change: TimeRange,

    // Feature toggles
    pub disable_death_knight_login: bool,
    pub disabled_without_real_player: bool,
    pub real_player_login_delay_secs: u32,
    pub real_player_logout_delay_secs: u32,
    pub sync_level_with_players: bool,
    pub join_bg: bool,
    pub join_lfg: bool,
    pub auto_join_bg: bool,

    // Levels
    pub min_level: u8,
    pub max_level: u8,
    pub max_level_chance: f64,
    pub min_level_chance: f64,
    pub starting_level: u8,
    pub disable_random_levels: bool,
    pub downgrade_max_level_bot: bool,
    pub fixed_level: bool,
    pub world_max_level: u8,
    pub heroic_start_level: u8,

    // Placement
    pub tele_lower_level: u8,
    pub tele_higher_level: u8,
    pub prob_tele_to_bankers: f64,
    pub enable_new_rpg_strategy: bool,
    pub random_bot_maps: Vec<u32>,
    pub rpg_chance: f32,
    pub zone_bracket_overrides: BTreeMap<u32, LevelBracket>,

    pub queue_floors: QueueFloorConfig,
    pub tuning: SchedulerTuning,
}

impl Default for RandomBotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            autologin: true,
            min_random_bots: 50,
            max_random_bots: 50,
            bot_count_change: TimeRange::new(30 * 60, 2 * 3600),
            bots_per_interval: 60,
            update_interval_secs: 20,
            alliance_ratio: 50,
            horde_ratio: 50,
            account_prefix: "rndbot".to_string(),
            chars_per_account: 10,
            add_class_pool_size: 50,
            periodic_online_offline: false,
            periodic_online_offline_ratio: 2,
            in_world: TimeRange::new(3600, 43200),
            permanently_in_world_secs: 31_104_000,
            randomize: TimeRange::new(302_400, 1_209_600),
            revive: TimeRange::new(60, 300),
            teleport: TimeRange::new(3600, 18000),
            change_strategy: TimeRange::new(1800, 7200),
            price_change: TimeRange::new(2 * 3600, 48 * 3600),
            disable_death_knight_login: false,
            disabled_without_real_player: false,
            real_player_login_delay_secs: 30,
            real_player_logout_delay_secs: 300,
            sync_level_with_players: false,
            join_bg: true,
            join_lfg: true,
            auto_join_bg: false,
            min_level: 1,
            max_level: 80,
            max_level_chance: 0.1,
            min_level_chance: 0.1,
            starting_level: 5,
            disable_random_levels: false,
            downgrade_max_level_bot: false,
            fixed_level: false,
            world_max_level: 80,
            heroic_start_level: 55,
            tele_lower_level: 1,
            tele_higher_level: 3,
            prob_tele_to_bankers: 0.25,
            enable_new_rpg_strategy: false,
            random_bot_maps: vec![0, 1, 530, 571],
            rpg_chance: 20.0,
            zone_bracket_overrides: BTreeMap::new(),
            queue_floors: QueueFloorConfig::default(),
            tuning: SchedulerTuning::default(),
        }
    }
}

impl RandomBotConfig {
    /// Load configuration from environment variables
    ///
    /// Unset or unparsable numeric variables fall back to their defaults;
    /// structured values (map lists, bracket lists, zone overrides) are
    /// rejected with [`ConfigError::Invalid`] when malformed.
    ///
    /// # Returns
    ///
    /// * `ConfigResult<RandomBotConfig>` - Loaded (not yet validated) configuration
    pub fn from_env() -> ConfigResult<Self> {
        let d = Self::default();

        let random_bot_maps = match std::env::var("RNDBOT_MAPS") {
            Ok(raw) => parse_list::<u32>(&raw)
                .map_err(|reason| ConfigError::invalid("RNDBOT_MAPS", reason))?,
            Err(_) => d.random_bot_maps,
        };

        let zone_bracket_overrides = match std::env::var("RNDBOT_ZONE_BRACKETS") {
            Ok(raw) => parse_zone_brackets(&raw)
                .map_err(|reason| ConfigError::invalid("RNDBOT_ZONE_BRACKETS", reason))?,
            Err(_) => d.zone_bracket_overrides,
        };

        let tuning = SchedulerTuning {
            online_focus: parse_env_or("RNDBOT_ONLINE_FOCUS", d.tuning.online_focus),
            low_online_focus: parse_env_or("RNDBOT_LOW_ONLINE_FOCUS", d.tuning.low_online_focus),
            low_online_threshold_percent: parse_env_or(
                "RNDBOT_LOW_ONLINE_THRESHOLD_PERCENT",
                d.tuning.low_online_threshold_percent,
            ),
            init_window_factor: parse_env_or("RNDBOT_INIT_WINDOW_FACTOR", d.tuning.init_window_factor),
            bg_check_secs: parse_env_or("RNDBOT_BG_CHECK_SECS", d.tuning.bg_check_secs),
            lfg_check_secs: parse_env_or("RNDBOT_LFG_CHECK_SECS", d.tuning.lfg_check_secs),
            players_check_secs: parse_env_or("RNDBOT_PLAYERS_CHECK_SECS", d.tuning.players_check_secs),
            stats_secs: parse_env_or("RNDBOT_STATS_SECS", d.tuning.stats_secs),
            missing_bots_report_secs: parse_env_or(
                "RNDBOT_MISSING_BOTS_REPORT_SECS",
                d.tuning.missing_bots_report_secs,
            ),
            teleport_base_delay_secs: parse_env_or(
                "RNDBOT_TELEPORT_BASE_DELAY_SECS",
                d.tuning.teleport_base_delay_secs,
            ),
            strategy_teleport_delay_secs: parse_env_or(
                "RNDBOT_STRATEGY_TELEPORT_DELAY_SECS",
                d.tuning.strategy_teleport_delay_secs,
            ),
        };

        Ok(Self {
            enabled: parse_env_or("RNDBOT_ENABLED", d.enabled),
            autologin: parse_env_or("RNDBOT_AUTOLOGIN", d.autologin),
            min_random_bots: parse_env_or("RNDBOT_MIN_BOTS", d.min_random_bots),
            max_random_bots: parse_env_or("RNDBOT_MAX_BOTS", d.max_random_bots),
            bot_count_change: range_from_env("RNDBOT_COUNT_CHANGE", d.bot_count_change),
            bots_per_interval: parse_env_or("RNDBOT_BOTS_PER_INTERVAL", d.bots_per_interval),
            update_interval_secs: parse_env_or("RNDBOT_UPDATE_INTERVAL_SECS", d.update_interval_secs),
            alliance_ratio: parse_env_or("RNDBOT_ALLIANCE_RATIO", d.alliance_ratio),
            horde_ratio: parse_env_or("RNDBOT_HORDE_RATIO", d.horde_ratio),
            account_prefix: std::env::var("RNDBOT_ACCOUNT_PREFIX").unwrap_or(d.account_prefix),
            chars_per_account: parse_env_or("RNDBOT_CHARS_PER_ACCOUNT", d.chars_per_account),
            add_class_pool_size: parse_env_or("RNDBOT_ADD_CLASS_POOL_SIZE", d.add_class_pool_size),
            periodic_online_offline: parse_env_or(
                "RNDBOT_PERIODIC_ONLINE_OFFLINE",
                d.periodic_online_offline,
            ),
            periodic_online_offline_ratio: parse_env_or(
                "RNDBOT_PERIODIC_ONLINE_OFFLINE_RATIO",
                d.periodic_online_offline_ratio,
            ),
            in_world: range_from_env("RNDBOT_IN_WORLD", d.in_world),
            permanently_in_world_secs: parse_env_or(
                "RNDBOT_PERMANENTLY_IN_WORLD_SECS",
                d.permanently_in_world_secs,
            ),
            randomize: range_from_env("RNDBOT_RANDOMIZE", d.randomize),
            revive: range_from_env("RNDBOT_REVIVE", d.revive),
            teleport: range_from_env("RNDBOT_TELEPORT", d.teleport),
            change_strategy: range_from_env("RNDBOT_CHANGE_STRATEGY", d.change_strategy),
            price_change: range_from_env("RNDBOT_PRICE_CHANGE", d.price_change),
            disable_death_knight_login: parse_env_or(
                "RNDBOT_DISABLE_DEATH_KNIGHT_LOGIN",
                d.disable_death_knight_login,
            ),
            disabled_without_real_player: parse_env_or(
                "RNDBOT_DISABLED_WITHOUT_REAL_PLAYER",
                d.disabled_without_real_player,
            ),
            real_player_login_delay_secs: parse_env_or(
                "RNDBOT_REAL_PLAYER_LOGIN_DELAY_SECS",
                d.real_player_login_delay_secs,
            ),
            real_player_logout_delay_secs: parse_env_or(
                "RNDBOT_REAL_PLAYER_LOGOUT_DELAY_SECS",
                d.real_player_logout_delay_secs,
            ),
            sync_level_with_players: parse_env_or(
                "RNDBOT_SYNC_LEVEL_WITH_PLAYERS",
                d.sync_level_with_players,
            ),
            join_bg: parse_env_or("RNDBOT_JOIN_BG", d.join_bg),
            join_lfg: parse_env_or("RNDBOT_JOIN_LFG", d.join_lfg),
            auto_join_bg: parse_env_or("RNDBOT_AUTO_JOIN_BG", d.auto_join_bg),
            min_level: parse_env_or("RNDBOT_MIN_LEVEL", d.min_level),
            max_level: parse_env_or("RNDBOT_MAX_LEVEL", d.max_level),
            max_level_chance: parse_env_or("RNDBOT_MAX_LEVEL_CHANCE", d.max_level_chance),
            min_level_chance: parse_env_or("RNDBOT_MIN_LEVEL_CHANCE", d.min_level_chance),
            starting_level: parse_env_or("RNDBOT_STARTING_LEVEL", d.starting_level),
            disable_random_levels: parse_env_or("RNDBOT_DISABLE_RANDOM_LEVELS", d.disable_random_levels),
            downgrade_max_level_bot: parse_env_or(
                "RNDBOT_DOWNGRADE_MAX_LEVEL_BOT",
                d.downgrade_max_level_bot,
            ),
            fixed_level: parse_env_or("RNDBOT_FIXED_LEVEL", d.fixed_level),
            world_max_level: parse_env_or("RNDBOT_WORLD_MAX_LEVEL", d.world_max_level),
            heroic_start_level: parse_env_or("RNDBOT_HEROIC_START_LEVEL", d.heroic_start_level),
            tele_lower_level: parse_env_or("RNDBOT_TELE_LOWER_LEVEL", d.tele_lower_level),
            tele_higher_level: parse_env_or("RNDBOT_TELE_HIGHER_LEVEL", d.tele_higher_level),
            prob_tele_to_bankers: parse_env_or("RNDBOT_PROB_TELE_TO_BANKERS", d.prob_tele_to_bankers),
            enable_new_rpg_strategy: parse_env_or(
                "RNDBOT_ENABLE_NEW_RPG_STRATEGY",
                d.enable_new_rpg_strategy,
            ),
            random_bot_maps,
            rpg_chance: parse_env_or("RNDBOT_RPG_CHANCE", d.rpg_chance),
            zone_bracket_overrides,
            queue_floors: QueueFloorConfig::from_env()?,
            tuning,
        })
    }

    /// Validate configuration after loading
    ///
    /// # Returns
    ///
    /// * `ConfigResult<()>` - Success or the first violated constraint
    pub fn validate(&self) -> ConfigResult<()> {
        if self.min_random_bots > self.max_random_bots {
            return Err(ConfigError::invalid(
                "RNDBOT_MIN_BOTS",
                format!("must not exceed RNDBOT_MAX_BOTS ({})", self.max_random_bots),
            ));
        }

        if self.alliance_ratio > 100 {
            return Err(ConfigError::invalid("RNDBOT_ALLIANCE_RATIO", "must be a percentage"));
        }
        if self.horde_ratio > 100 {
            return Err(ConfigError::invalid("RNDBOT_HORDE_RATIO", "must be a percentage"));
        }
        if self.total_ratio() == 0 {
            return Err(ConfigError::invalid(
                "RNDBOT_ALLIANCE_RATIO",
                "alliance and horde ratios must not both be 0",
            ));
        }

        if self.chars_per_account == 0 {
            return Err(ConfigError::invalid("RNDBOT_CHARS_PER_ACCOUNT", "must be greater than 0"));
        }

        if self.periodic_online_offline && self.periodic_online_offline_ratio == 0 {
            return Err(ConfigError::invalid(
                "RNDBOT_PERIODIC_ONLINE_OFFLINE_RATIO",
                "must be greater than 0 when periodic online/offline is enabled",
            ));
        }

        self.bot_count_change.validate("RNDBOT_COUNT_CHANGE")?;
        self.in_world.validate("RNDBOT_IN_WORLD")?;
        self.randomize.validate("RNDBOT_RANDOMIZE")?;
        self.revive.validate("RNDBOT_REVIVE")?;
        self.teleport.validate("RNDBOT_TELEPORT")?;
        self.change_strategy.validate("RNDBOT_CHANGE_STRATEGY")?;
        self.price_change.validate("RNDBOT_PRICE_CHANGE")?;

        if self.min_level == 0 || self.min_level > self.max_level {
            return Err(ConfigError::invalid(
                "RNDBOT_MIN_LEVEL",
                format!("must be in 1..={}", self.max_level),
            ));
        }

        for (var, p) in [
            ("RNDBOT_MAX_LEVEL_CHANCE", self.max_level_chance),
            ("RNDBOT_MIN_LEVEL_CHANCE", self.min_level_chance),
            ("RNDBOT_PROB_TELE_TO_BANKERS", self.prob_tele_to_bankers),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::invalid(var, "must be within [0, 1]"));
            }
        }

        if self.max_level_chance + self.min_level_chance > 1.0 {
            return Err(ConfigError::invalid(
                "RNDBOT_MAX_LEVEL_CHANCE",
                "max and min level chances must sum to at most 1",
            ));
        }

        if !(0.0..=100.0).contains(&self.rpg_chance) {
            return Err(ConfigError::invalid("RNDBOT_RPG_CHANCE", "must be within [0, 100]"));
        }

        if self.tuning.online_focus > 100 || self.tuning.low_online_focus > 100 {
            return Err(ConfigError::invalid("RNDBOT_ONLINE_FOCUS", "must be a percentage"));
        }

        Ok(())
    }

    /// Combined faction ratio
    pub fn total_ratio(&self) -> u64 {
        u64::from(self.alliance_ratio) + u64::from(self.horde_ratio)
    }

    /// Maximum level a bot may be rolled to before player-level sync
    pub fn effective_max_level(&self) -> u8 {
        self.max_level.min(self.world_max_level)
    }
}

/// Parse environment variable or return default value
pub fn parse_env_or<T: FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn range_from_env(prefix: &str, default: TimeRange) -> TimeRange {
    TimeRange {
        min: parse_env_or(&format!("{prefix}_MIN_SECS"), default.min),
        max: parse_env_or(&format!("{prefix}_MAX_SECS"), default.max),
    }
}

fn parse_list<T: FromStr>(raw: &str) -> Result<Vec<T>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().map_err(|_| format!("'{s}' is not a number")))
        .collect()
}

/// Parse a comma separated bracket list such as `"0,1,2"`
pub fn parse_brackets(raw: &str) -> Result<Vec<u8>, String> {
    parse_list(raw)
}

/// Parse zone bracket overrides written as `"zone:low:high;zone:low:high"`
pub fn parse_zone_brackets(raw: &str) -> Result<BTreeMap<u32, LevelBracket>, String> {
    let mut out = BTreeMap::new();
    for entry in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        let parts: Vec<&str> = entry.split(':').map(str::trim).collect();
        let [zone, low, high] = parts.as_slice() else {
            return Err(format!("'{entry}' is not zone:low:high"));
        };
        let zone: u32 = zone.parse().map_err(|_| format!("bad zone id in '{entry}'"))?;
        let low: u8 = low.parse().map_err(|_| format!("bad low level in '{entry}'"))?;
        let high: u8 = high.parse().map_err(|_| format!("bad high level in '{entry}'"))?;
        if low > high {
            return Err(format!("low level above high level in '{entry}'"));
        }
        out.insert(zone, LevelBracket { low, high });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serial_test::serial;

    #[test]
    fn test_default_config_is_valid() {
        assert!(RandomBotConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_population() {
        let config = RandomBotConfig {
            min_random_bots: 100,
            max_random_bots: 10,
            ..RandomBotConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "RNDBOT_MIN_BOTS"));
    }

    #[test]
    fn test_validate_rejects_zero_ratio() {
        let config = RandomBotConfig {
            alliance_ratio: 0,
            horde_ratio: 0,
            ..RandomBotConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_ratio_above_percentage() {
        let config = RandomBotConfig {
            alliance_ratio: u32::MAX,
            horde_ratio: u32::MAX,
            ..RandomBotConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "RNDBOT_ALLIANCE_RATIO"));

        let config = RandomBotConfig {
            horde_ratio: 101,
            ..RandomBotConfig::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("RNDBOT_HORDE_RATIO"));
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let config = RandomBotConfig {
            revive: TimeRange::new(300, 60),
            ..RandomBotConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("RNDBOT_REVIVE"));
    }

    #[test]
    fn test_validate_rejects_chance_sum() {
        let config = RandomBotConfig {
            max_level_chance: 0.7,
            min_level_chance: 0.6,
            ..RandomBotConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_time_range_roll_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let range = TimeRange::new(5, 9);
        for _ in 0..200 {
            let v = range.roll(&mut rng);
            assert!((5..=9).contains(&v));
        }
        assert_eq!(TimeRange::new(4, 4).roll(&mut rng), 4);
    }

    #[test]
    fn test_parse_brackets() {
        assert_eq!(parse_brackets("0, 1,2").unwrap(), vec![0, 1, 2]);
        assert!(parse_brackets("0,x").is_err());
        assert!(parse_brackets("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_zone_brackets() {
        let parsed = parse_zone_brackets("12:1:10; 40:10:20").unwrap();
        assert_eq!(parsed.get(&12), Some(&LevelBracket { low: 1, high: 10 }));
        assert_eq!(parsed.get(&40), Some(&LevelBracket { low: 10, high: 20 }));
        assert!(parse_zone_brackets("12:20:10").is_err());
        assert!(parse_zone_brackets("12:1").is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        // SAFETY: serialized with other env tests
        unsafe {
            std::env::set_var("RNDBOT_MIN_BOTS", "10");
            std::env::set_var("RNDBOT_MAX_BOTS", "20");
            std::env::set_var("RNDBOT_MAPS", "0,1");
            std::env::set_var("RNDBOT_AUTOJOIN_WS_BRACKETS", "1,2");
            std::env::set_var("RNDBOT_AUTOJOIN_WS_COUNT", "2");
        }

        let config = RandomBotConfig::from_env().unwrap();
        assert_eq!(config.min_random_bots, 10);
        assert_eq!(config.max_random_bots, 20);
        assert_eq!(config.random_bot_maps, vec![0, 1]);
        let ws = config
            .queue_floors
            .battlegrounds
            .iter()
            .find(|(q, _, _)| *q == QueueType::WarsongGulch)
            .unwrap();
        assert_eq!(ws.1, 2);
        assert_eq!(ws.2, vec![1, 2]);

        unsafe {
            std::env::remove_var("RNDBOT_MIN_BOTS");
            std::env::remove_var("RNDBOT_MAX_BOTS");
            std::env::remove_var("RNDBOT_MAPS");
            std::env::remove_var("RNDBOT_AUTOJOIN_WS_BRACKETS");
            std::env::remove_var("RNDBOT_AUTOJOIN_WS_COUNT");
        }
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_map_list() {
        unsafe {
            std::env::set_var("RNDBOT_MAPS", "0,kalimdor");
        }
        let err = RandomBotConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "RNDBOT_MAPS"));
        unsafe {
            std::env::remove_var("RNDBOT_MAPS");
        }
    }
}
