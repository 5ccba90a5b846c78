//! In-memory world used by tests and the standalone server.

use super::{
    BattlegroundView, BotView, GroupView, LfgView, LoginOutcome, ParticipantView, QueueSlot,
    TeleportOutcome, WorldHost, WorldSnapshot,
};
use crate::world::{BotId, CharacterInfo, Faction, WorldLocation};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Mutation the scheduler requested, recorded in order
#[derive(Debug, Clone, PartialEq)]
pub enum HostAction {
    Login(BotId),
    Logout(BotId),
    Revive(BotId),
    Refresh { guid: BotId, money_bonus: u32 },
    Randomize { guid: BotId, level: u8, incremental: bool },
    Clear(BotId),
    Teleport { guid: BotId, to: WorldLocation, hearth: bool },
    LeaveGroup(BotId),
    SetXpGain { guid: BotId, enabled: bool },
    ResetAi(BotId),
    Remote { guid: BotId, command: String },
}

/// Queue and group finder participation for one character
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Participation {
    pub queues: Vec<QueueSlot>,
    pub battleground: Option<BattlegroundView>,
    pub invited: bool,
    pub lfg: Option<LfgView>,
}

#[derive(Debug, Clone)]
struct SimBot {
    view: BotView,
    money: u64,
    xp_gain: bool,
}

#[derive(Debug, Clone)]
struct SimPlayer {
    guid: BotId,
    faction: Faction,
    level: u8,
    is_gm: bool,
}

/// Simulated host with an immediate-login roster
#[derive(Debug, Default)]
pub struct SimulatedWorld {
    roster: BTreeMap<BotId, CharacterInfo>,
    online: BTreeMap<BotId, SimBot>,
    players: BTreeMap<BotId, SimPlayer>,
    participation: HashMap<BotId, Participation>,
    failing_logins: HashSet<BotId>,
    deferred_logins: bool,
    blocked_maps: HashSet<u32>,
    watched_maps: HashSet<u32>,
    actions: Vec<HostAction>,
}

impl SimulatedWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a character loadable
    pub fn add_character(&mut self, character: CharacterInfo) {
        self.roster.insert(character.guid, character);
    }

    pub fn add_real_player(&mut self, guid: BotId, faction: Faction, level: u8, is_gm: bool) {
        self.players.insert(
            guid,
            SimPlayer {
                guid,
                faction,
                level,
                is_gm,
            },
        );
    }

    pub fn remove_real_player(&mut self, guid: BotId) {
        self.players.remove(&guid);
        self.participation.remove(&guid);
    }

    pub fn set_participation(&mut self, guid: BotId, participation: Participation) {
        self.participation.insert(guid, participation);
    }

    pub fn fail_login(&mut self, guid: BotId) {
        self.failing_logins.insert(guid);
    }

    /// Logins report `Pending` and must be finished with [`Self::complete_login`]
    pub fn defer_logins(&mut self, deferred: bool) {
        self.deferred_logins = deferred;
    }

    /// Teleports onto `map` are rejected
    pub fn block_map(&mut self, map: u32) {
        self.blocked_maps.insert(map);
    }

    /// Teleports onto `map` abort because a real player is nearby
    pub fn watch_map(&mut self, map: u32) {
        self.watched_maps.insert(map);
    }

    pub fn actions(&self) -> &[HostAction] {
        &self.actions
    }

    pub fn clear_actions(&mut self) {
        self.actions.clear();
    }

    pub fn money(&self, guid: BotId) -> Option<u64> {
        self.online.get(&guid).map(|b| b.money)
    }

    pub fn xp_gain(&self, guid: BotId) -> Option<bool> {
        self.online.get(&guid).map(|b| b.xp_gain)
    }

    /// Mutate the live view of a loaded bot
    pub fn update_bot(&mut self, guid: BotId, f: impl FnOnce(&mut BotView)) {
        if let Some(bot) = self.online.get_mut(&guid) {
            f(&mut bot.view);
        }
    }

    /// Load a character whose login was deferred
    pub fn complete_login(&mut self, guid: BotId) -> bool {
        let Some(info) = self.roster.get(&guid) else {
            return false;
        };
        let view = BotView {
            guid,
            name: info.name.clone(),
            level: info.level,
            class: info.class,
            race: info.race,
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
        };
        self.online.insert(
            guid,
            SimBot {
                view,
                money: 0,
                xp_gain: true,
            },
        );
        true
    }

    fn participant(&self, guid: BotId, faction: Faction, level: u8, is_gm: bool) -> ParticipantView {
        let p = self.participation.get(&guid).cloned().unwrap_or_default();
        ParticipantView {
            guid,
            faction,
            level,
            in_world: true,
            is_gm,
            queues: p.queues,
            battleground: p.battleground,
            invited: p.invited,
            lfg: p.lfg,
        }
    }
}

impl WorldHost for SimulatedWorld {
    fn active_session_count(&self) -> usize {
        self.players.len()
    }

    fn bot(&self, guid: BotId) -> Option<BotView> {
        let bot = self.online.get(&guid)?;
        let mut view = bot.view.clone();
        if let Some(p) = self.participation.get(&guid) {
            view.in_bg_queue = !p.queues.is_empty();
            view.in_battleground = p.battleground.is_some();
        }
        Some(view)
    }

    fn online_bots(&self) -> Vec<BotId> {
        self.online.keys().copied().collect()
    }

    fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            real_players: self
                .players
                .values()
                .map(|p| self.participant(p.guid, p.faction, p.level, p.is_gm))
                .collect(),
            bots: self
                .online
                .values()
                .map(|b| self.participant(b.view.guid, b.view.faction(), b.view.level, false))
                .collect(),
        }
    }

    fn login(&mut self, guid: BotId) -> LoginOutcome {
        self.actions.push(HostAction::Login(guid));
        if self.failing_logins.contains(&guid) || !self.roster.contains_key(&guid) {
            return LoginOutcome::Failed;
        }
        if self.deferred_logins {
            return LoginOutcome::Pending;
        }
        if self.complete_login(guid) {
            LoginOutcome::Completed
        } else {
            LoginOutcome::Failed
        }
    }

    fn logout(&mut self, guid: BotId) {
        self.actions.push(HostAction::Logout(guid));
        if let Some(bot) = self.online.remove(&guid)
            && let Some(info) = self.roster.get_mut(&guid)
        {
            info.level = bot.view.level;
        }
    }

    fn logout_all(&mut self) {
        let guids: Vec<BotId> = self.online.keys().copied().collect();
        for guid in guids {
            self.logout(guid);
        }
    }

    fn revive(&mut self, guid: BotId) {
        self.actions.push(HostAction::Revive(guid));
        self.update_bot(guid, |v| v.dead = false);
    }

    fn refresh(&mut self, guid: BotId, money_bonus: u32) {
        self.actions.push(HostAction::Refresh { guid, money_bonus });
        if let Some(bot) = self.online.get_mut(&guid) {
            bot.view.dead = false;
            bot.view.group = None;
            bot.money += u64::from(money_bonus);
        }
    }

    fn randomize(&mut self, guid: BotId, level: u8, incremental: bool) {
        self.actions.push(HostAction::Randomize {
            guid,
            level,
            incremental,
        });
        self.update_bot(guid, |v| v.level = level);
    }

    fn clear(&mut self, guid: BotId) {
        self.actions.push(HostAction::Clear(guid));
    }

    fn try_teleport(&mut self, guid: BotId, to: &WorldLocation, set_hearth: bool) -> TeleportOutcome {
        if !self.online.contains_key(&guid) || self.blocked_maps.contains(&to.map) {
            return TeleportOutcome::Rejected;
        }
        if self.watched_maps.contains(&to.map) {
            return TeleportOutcome::Aborted;
        }
        self.actions.push(HostAction::Teleport {
            guid,
            to: *to,
            hearth: set_hearth,
        });
        self.update_bot(guid, |v| v.position = *to);
        TeleportOutcome::Teleported
    }

    fn leave_group(&mut self, guid: BotId) {
        self.actions.push(HostAction::LeaveGroup(guid));
        self.update_bot(guid, |v| v.group = None);
    }

    fn set_xp_gain(&mut self, guid: BotId, enabled: bool) {
        self.actions.push(HostAction::SetXpGain { guid, enabled });
        if let Some(bot) = self.online.get_mut(&guid) {
            bot.xp_gain = enabled;
        }
    }

    fn reset_ai(&mut self, guid: BotId) {
        self.actions.push(HostAction::ResetAi(guid));
    }

    fn remote_command(&mut self, guid: BotId, command: &str) -> String {
        self.actions.push(HostAction::Remote {
            guid,
            command: command.to_string(),
        });
        match self.online.get(&guid) {
            Some(bot) => format!("{} ({}): {command} ok", bot.view.name, bot.view.level),
            None => "offline".to_string(),
        }
    }
}

/// Convenience for tests building grouped bots
pub fn group_led_by(leader: BotId, is_lfg: bool) -> GroupView {
    GroupView {
        leader,
        is_lfg,
        master_is_real_player: false,
    }
}
