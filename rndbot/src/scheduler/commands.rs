//! Operator console verbs and the remote text protocol.

use super::errors::{CommandError, CommandResult};
use super::manager::RandomBotManager;
use crate::config::RandomBotConfig;
use crate::host::WorldHost;
use crate::locations::LocationCache;
use crate::world::BotId;
use std::fmt;
use std::str::FromStr;

/// Per-bot console actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotAction {
    /// Full reroll with a fresh level
    Init,
    Clear,
    LevelUp,
    Refresh,
    Teleport,
    Revive,
    Grind,
    ChangeStrategy,
    /// Delete every event of the bot and log it out
    Remove,
}

impl BotAction {
    pub fn as_str(self) -> &'static str {
        match self {
            BotAction::Init => "init",
            BotAction::Clear => "clear",
            BotAction::LevelUp => "levelup",
            BotAction::Refresh => "refresh",
            BotAction::Teleport => "teleport",
            BotAction::Revive => "revive",
            BotAction::Grind => "grind",
            BotAction::ChangeStrategy => "change_strategy",
            BotAction::Remove => "remove",
        }
    }
}

impl fmt::Display for BotAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BotAction {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "init" => Ok(BotAction::Init),
            "clear" => Ok(BotAction::Clear),
            "level" | "levelup" => Ok(BotAction::LevelUp),
            "refresh" => Ok(BotAction::Refresh),
            "teleport" => Ok(BotAction::Teleport),
            "revive" => Ok(BotAction::Revive),
            "grind" => Ok(BotAction::Grind),
            "change_strategy" => Ok(BotAction::ChangeStrategy),
            "remove" => Ok(BotAction::Remove),
            other => Err(CommandError::UnknownCommand(other.to_string())),
        }
    }
}

/// Parsed console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Stats,
    /// Run one tick immediately
    Update,
    /// Delete every persisted event
    Reset,
    /// Re-read configuration and rebuild the location cache
    Reload,
    /// Apply `action` to every online random bot whose name matches `pattern`
    Bot { action: BotAction, pattern: String },
}

impl FromStr for ConsoleCommand {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CommandError::Usage);
        }
        let (verb, rest) = s.split_once(char::is_whitespace).unwrap_or((s, ""));
        let command = match verb {
            "stats" => ConsoleCommand::Stats,
            "update" => ConsoleCommand::Update,
            "reset" => ConsoleCommand::Reset,
            "reload" => ConsoleCommand::Reload,
            other => {
                let pattern = rest.trim();
                ConsoleCommand::Bot {
                    action: other.parse()?,
                    pattern: if pattern.is_empty() { "%".to_string() } else { pattern.to_string() },
                }
            }
        };
        Ok(command)
    }
}

/// `<command>,<characterId>` line of the remote protocol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRequest {
    pub command: String,
    /// Unparsable ids read as 0, which never names a bot
    pub guid: BotId,
}

impl RemoteRequest {
    pub fn parse(request: &str) -> CommandResult<Self> {
        let (command, guid) = request
            .split_once(',')
            .ok_or_else(|| CommandError::InvalidRequest(request.to_string()))?;
        Ok(Self {
            command: command.to_string(),
            guid: guid.trim().parse().unwrap_or(0),
        })
    }
}

impl<H: WorldHost> RandomBotManager<H> {
    /// Execute a console command
    ///
    /// # Arguments
    ///
    /// * `input` - Verb followed by an optional name pattern (SQL `LIKE` syntax)
    ///
    /// # Returns
    ///
    /// * `CommandResult<String>` - One-line summary of what was done
    pub async fn handle_console_command(&mut self, input: &str) -> CommandResult<String> {
        if !self.config.enabled {
            log::error!("Random bot system is currently disabled!");
            return Err(CommandError::Disabled);
        }

        match input.parse::<ConsoleCommand>()? {
            ConsoleCommand::Stats => {
                let report = self.print_stats().await;
                Ok(format!(
                    "{} bots online ({} alliance, {} horde), target {}",
                    report.online, report.alliance, report.horde, report.target
                ))
            }
            ConsoleCommand::Update => {
                let tick = self.tick().await;
                Ok(format!(
                    "{} online, {} added, {} updated, {} logged in",
                    tick.online, tick.added, tick.updated, tick.logged_in
                ))
            }
            ConsoleCommand::Reset => {
                self.store.reset_all().await?;
                log::info!("Random bots were reset for all players.");
                Ok("Random bots were reset for all players.".to_string())
            }
            ConsoleCommand::Reload => {
                let config = RandomBotConfig::from_env()?;
                config.validate()?;
                self.set_config(config);
                self.locations = LocationCache::load(self.repos.spawns.as_ref(), &self.config).await?;
                let (grind, starter, bankers) = self.locations.sizes();
                Ok(format!(
                    "Configuration reloaded: {grind} grind, {starter} starter, {bankers} banker locations"
                ))
            }
            ConsoleCommand::Bot { action, pattern } => self.run_bot_action(action, &pattern).await,
        }
    }

    async fn run_bot_action(&mut self, action: BotAction, pattern: &str) -> CommandResult<String> {
        let mut accounts = self.accounts.general_pool().to_vec();
        accounts.extend_from_slice(self.accounts.class_pool());

        let matched = self.repos.characters.find_by_name(&accounts, pattern).await?;
        let bots: Vec<BotId> = matched
            .iter()
            .map(|c| c.guid)
            .filter(|guid| self.is_random_bot(*guid) && self.host.is_online(*guid))
            .collect();

        if bots.is_empty() {
            log::info!("Nothing to do");
            return Err(CommandError::NothingToDo(pattern.to_string()));
        }

        let total = bots.len();
        let mut processed = 0;
        for guid in bots {
            let Some(view) = self.host.bot(guid) else {
                continue;
            };
            processed += 1;
            log::info!(
                "[{}/{}] Processing command {} for bot {}",
                processed,
                total,
                action,
                view.name
            );

            match action {
                BotAction::Init => self.randomize_first(&view).await,
                BotAction::Clear => self.host.clear(guid),
                BotAction::LevelUp => self.increase_level(guid).await,
                BotAction::Refresh => self.refresh(&view),
                BotAction::Teleport => {
                    self.teleport_for_level(guid, true);
                }
                BotAction::Revive => self.revive(&view).await,
                BotAction::Grind => {
                    self.teleport_grind(guid);
                    self.refresh(&view);
                }
                BotAction::ChangeStrategy => self.change_strategy(guid).await,
                BotAction::Remove => self.remove_bot(guid).await,
            }
        }
        Ok(format!("{action} applied to {processed} bots"))
    }

    /// Answer one remote protocol line; never fails, errors become the reply
    pub fn handle_remote_command(&mut self, request: &str) -> String {
        let request = match RemoteRequest::parse(request) {
            Ok(request) => request,
            Err(e) => return e.to_string(),
        };
        if !self.is_random_bot(request.guid) || !self.host.is_online(request.guid) {
            return "invalid guid".to_string();
        }
        self.host.remote_command(request.guid, &request.command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_console_verbs() {
        assert_eq!("stats".parse::<ConsoleCommand>().unwrap(), ConsoleCommand::Stats);
        assert_eq!(" reset ".parse::<ConsoleCommand>().unwrap(), ConsoleCommand::Reset);
        assert_eq!(
            "teleport Bob%".parse::<ConsoleCommand>().unwrap(),
            ConsoleCommand::Bot {
                action: BotAction::Teleport,
                pattern: "Bob%".to_string()
            }
        );
        assert_eq!(
            "level".parse::<ConsoleCommand>().unwrap(),
            ConsoleCommand::Bot {
                action: BotAction::LevelUp,
                pattern: "%".to_string()
            }
        );
    }

    #[test]
    fn test_parse_rejects_unknown_and_empty() {
        assert!(matches!("".parse::<ConsoleCommand>(), Err(CommandError::Usage)));
        assert!(matches!(
            "dance all".parse::<ConsoleCommand>(),
            Err(CommandError::UnknownCommand(v)) if v == "dance"
        ));
        // verbs match exactly, not by prefix
        assert!("teleporter".parse::<ConsoleCommand>().is_err());
    }

    #[test]
    fn test_remote_request_parsing() {
        let req = RemoteRequest::parse("stats,42").unwrap();
        assert_eq!(req.command, "stats");
        assert_eq!(req.guid, 42);
        assert_eq!(RemoteRequest::parse("stats,abc").unwrap().guid, 0);
        let err = RemoteRequest::parse("stats").unwrap_err();
        assert_eq!(err.to_string(), "invalid request: stats");
    }
}
