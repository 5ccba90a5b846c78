//! Integration tests for the population scheduler.
//!
//! Drives `RandomBotManager` tick by tick over in-memory repositories, the
//! simulated host and a manual clock.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rndbot::accounts::{AccountAssigner, AccountRole};
use rndbot::config::RandomBotConfig;
use rndbot::db::{
    MemoryAccountRepository, MemoryCharacterRepository, MemoryEventRepository, MemorySpawnRepository,
    Repositories,
};
use rndbot::events::EventKey;
use rndbot::host::{HostAction, ManualClock, SimulatedWorld, WorldHost};
use rndbot::world::{BotId, CharacterInfo, Faction, PlayerClass, Race};
use rndbot::RandomBotManager;
use std::sync::Arc;

/// Accounts and characters shared by the repositories and the host
struct Roster {
    accounts: Arc<MemoryAccountRepository>,
    characters: Arc<MemoryCharacterRepository>,
    world: SimulatedWorld,
}

/// `accounts` bot accounts with `per_account` characters each; odd guids
/// are alliance, even guids horde
fn roster(accounts: u32, per_account: u32, class_of: impl Fn(BotId) -> PlayerClass) -> Roster {
    let account_repo = Arc::new(MemoryAccountRepository::new());
    let character_repo = Arc::new(MemoryCharacterRepository::new());
    let mut world = SimulatedWorld::new();

    for account in 1..=accounts {
        account_repo.add_account(account, &format!("rndbot{account}"));
        for slot in 0..per_account {
            let guid = (account - 1) * per_account + slot + 1;
            let character = CharacterInfo {
                guid,
                account,
                name: format!("Bot{guid}"),
                race: if guid % 2 == 1 { Race::Human } else { Race::Orc },
                class: class_of(guid),
                level: 1,
            };
            character_repo.insert(character.clone());
            world.add_character(character);
        }
    }

    Roster {
        accounts: account_repo,
        characters: character_repo,
        world,
    }
}

fn warriors(_: BotId) -> PlayerClass {
    PlayerClass::Warrior
}

fn config(min: u32, max: u32) -> RandomBotConfig {
    RandomBotConfig {
        min_random_bots: min,
        max_random_bots: max,
        bots_per_interval: 10,
        chars_per_account: 10,
        add_class_pool_size: 0,
        alliance_ratio: 50,
        horde_ratio: 50,
        ..RandomBotConfig::default()
    }
}

async fn manager(
    config: RandomBotConfig,
    roster: Roster,
) -> (RandomBotManager<SimulatedWorld>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let repos = Repositories {
        events: Arc::new(MemoryEventRepository::new()),
        accounts: roster.accounts,
        characters: roster.characters,
        spawns: Arc::new(MemorySpawnRepository::new()),
    };
    let mut mgr = RandomBotManager::new(config, roster.world, repos, clock.clone(), StdRng::seed_from_u64(5));
    mgr.init().await.expect("init should succeed");
    (mgr, clock)
}

fn online_by_faction(mgr: &RandomBotManager<SimulatedWorld>, guids: &[BotId]) -> (usize, usize) {
    let alliance = guids
        .iter()
        .filter_map(|g| mgr.host().bot(*g))
        .filter(|v| v.faction() == Faction::Alliance)
        .count();
    let horde = guids
        .iter()
        .filter_map(|g| mgr.host().bot(*g))
        .filter(|v| v.faction() == Faction::Horde)
        .count();
    (alliance, horde)
}

#[tokio::test]
async fn test_tick_admits_one_interval_split_by_faction() {
    let (mut mgr, _) = manager(config(100, 100), roster(12, 10, warriors)).await;

    // 40 bots already online and busy until their next update
    for guid in 1..=40 {
        mgr.store_mut().set(guid, EventKey::Add, 1, 3600).await;
        mgr.store_mut().set(guid, EventKey::Update, 1, 3600).await;
        mgr.host_mut().login(guid);
    }

    let report = mgr.tick().await;

    assert_eq!(report.target, 100);
    assert_eq!(report.added, 10);
    assert_eq!(report.logged_in, 10);
    assert_eq!(report.online, 50);
    assert_eq!(mgr.current_bots().len(), 50);

    let newcomers: Vec<BotId> = mgr.current_bots().iter().copied().filter(|g| *g > 40).collect();
    assert_eq!(newcomers.len(), 10);
    assert_eq!(online_by_faction(&mgr, &newcomers), (5, 5));
}

#[tokio::test]
async fn test_population_never_exceeds_target() {
    let (mut mgr, clock) = manager(config(15, 15), roster(4, 10, warriors)).await;

    for _ in 0..6 {
        let report = mgr.tick().await;
        assert!(report.online <= 15);
        assert!(mgr.current_bots().len() <= 15);
        clock.advance_secs(2);
    }
    assert_eq!(mgr.host().online_bots().len(), 15);
}

#[tokio::test]
async fn test_randomize_runs_before_teleport() {
    let (mut mgr, _) = manager(config(1, 1), roster(1, 2, warriors)).await;
    let report = mgr.tick().await;
    assert_eq!(report.logged_in, 1);
    let guid = mgr.current_bots()[0];

    mgr.store_mut().set(guid, EventKey::Update, 0, 0).await;
    mgr.store_mut().set(guid, EventKey::Randomize, 0, 0).await;
    mgr.store_mut().set(guid, EventKey::Teleport, 1, 120).await;
    mgr.host_mut().clear_actions();

    assert!(mgr.process_bot(guid).await);

    let actions = mgr.host().actions();
    assert!(actions.iter().any(|a| matches!(a, HostAction::Randomize { guid: g, .. } if *g == guid)));
    assert!(!actions.iter().any(|a| matches!(a, HostAction::Refresh { .. })));
    assert_eq!(mgr.store_mut().get(guid, EventKey::Randomize).await, 1);
    assert_eq!(mgr.store_mut().get(guid, EventKey::Teleport).await, 1);
    // next decision waits for the update timer
    assert!(mgr.store_mut().get(guid, EventKey::Update).await != 0);
}

#[tokio::test]
async fn test_reset_logs_bots_out_on_next_tick() {
    let (mut mgr, _) = manager(config(4, 4), roster(1, 10, warriors)).await;
    let report = mgr.tick().await;
    assert_eq!(report.online, 4);

    let reply = mgr.handle_console_command("reset").await.unwrap();
    assert!(reply.contains("reset"));
    for guid in mgr.current_bots().to_vec() {
        assert_eq!(mgr.store_mut().get(guid, EventKey::Add).await, 0);
    }

    let report = mgr.tick().await;
    assert_eq!(report.online, 0);
    assert!(mgr.current_bots().is_empty());
    let logouts = mgr
        .host()
        .actions()
        .iter()
        .filter(|a| matches!(a, HostAction::Logout(_)))
        .count();
    assert_eq!(logouts, 4);
}

#[tokio::test]
async fn test_death_knights_never_log_in_when_disabled() {
    let dk_on_odd = |guid: BotId| {
        if guid % 2 == 1 {
            PlayerClass::DeathKnight
        } else {
            PlayerClass::Priest
        }
    };

    let banned = RandomBotConfig {
        disable_death_knight_login: true,
        ..config(10, 10)
    };
    let (mut mgr, _) = manager(banned, roster(1, 10, dk_on_odd)).await;
    let report = mgr.tick().await;
    assert_eq!(report.online, 5);
    for guid in mgr.host().online_bots() {
        let view = mgr.host().bot(guid).unwrap();
        assert!(!view.class.is_death_knight());
    }

    let (mut allowed, _) = manager(config(10, 10), roster(1, 10, dk_on_odd)).await;
    assert_eq!(allowed.tick().await.online, 10);
}

#[tokio::test]
async fn test_reconcile_is_idempotent() {
    let roster = roster(6, 10, warriors);
    let accounts = roster.accounts.clone();
    let config = RandomBotConfig {
        max_random_bots: 30,
        min_random_bots: 30,
        add_class_pool_size: 2,
        ..config(30, 30)
    };

    let mut assigner = AccountAssigner::new(accounts.clone());
    let first = assigner.reconcile(&config).await.unwrap();
    assert_eq!(first.accounts_found, 6);
    assert_eq!(first.newly_registered, 6);
    assert_eq!(first.general_promoted, 3);
    assert_eq!(first.class_promoted, 2);
    let general = assigner.general_pool().to_vec();
    let class = assigner.class_pool().to_vec();

    let mut again = AccountAssigner::new(accounts.clone());
    let second = again.reconcile(&config).await.unwrap();
    assert_eq!(second.newly_registered, 0);
    assert_eq!(second.general_promoted, 0);
    assert_eq!(second.class_promoted, 0);
    assert_eq!(second.general_total, 3);
    assert_eq!(second.class_total, 2);
    assert_eq!(again.general_pool(), general.as_slice());
    assert_eq!(again.class_pool(), class.as_slice());

    let unassigned = (1..=6)
        .filter(|id| accounts.role_of(*id) == Some(AccountRole::Unassigned))
        .count();
    assert_eq!(unassigned, 1);
}

#[tokio::test]
async fn test_remote_protocol_answers_one_line() {
    let (mut mgr, _) = manager(config(1, 1), roster(1, 4, warriors)).await;
    mgr.tick().await;
    let guid = mgr.current_bots()[0];
    let name = mgr.host().bot(guid).unwrap().name;

    let reply = mgr.handle_remote_command(&format!("whois,{guid}"));
    assert!(reply.starts_with(&name), "unexpected reply: {reply}");
    assert!(reply.ends_with("whois ok"));

    let offline = (1..=4).find(|g| *g != guid).unwrap();
    assert_eq!(mgr.handle_remote_command(&format!("whois,{offline}")), "invalid guid");
    assert_eq!(mgr.handle_remote_command("whois,abc"), "invalid guid");
    assert_eq!(mgr.handle_remote_command("whois"), "invalid request: whois");
}

#[tokio::test]
async fn test_console_bot_action_matches_names() {
    let (mut mgr, _) = manager(config(2, 2), roster(1, 10, warriors)).await;
    mgr.tick().await;
    assert_eq!(mgr.host().online_bots().len(), 2);
    mgr.host_mut().clear_actions();

    let reply = mgr.handle_console_command("refresh Bot%").await.unwrap();
    assert_eq!(reply, "refresh applied to 2 bots");
    let refreshed = mgr
        .host()
        .actions()
        .iter()
        .filter(|a| matches!(a, HostAction::Refresh { .. }))
        .count();
    assert_eq!(refreshed, 2);

    assert!(mgr.handle_console_command("revive Nobody%").await.is_err());
}

#[tokio::test]
async fn test_console_remove_deletes_bot_state() {
    let (mut mgr, _) = manager(config(1, 1), roster(1, 4, warriors)).await;
    mgr.tick().await;
    let guid = mgr.current_bots()[0];
    let name = mgr.host().bot(guid).unwrap().name;
    assert_ne!(mgr.store_mut().get(guid, EventKey::Randomize).await, 0);

    let reply = mgr.handle_console_command(&format!("remove {name}")).await.unwrap();
    assert_eq!(reply, "remove applied to 1 bots");
    assert!(!mgr.host().is_online(guid));
    assert!(mgr.current_bots().is_empty());
    assert_eq!(mgr.store_mut().get(guid, EventKey::Add).await, 0);
    assert_eq!(mgr.store_mut().get(guid, EventKey::Randomize).await, 0);
}

#[tokio::test]
async fn test_real_player_gate_delays_and_logs_out() {
    let gated = RandomBotConfig {
        disabled_without_real_player: true,
        real_player_login_delay_secs: 30,
        real_player_logout_delay_secs: 300,
        ..config(2, 2)
    };
    let (mut mgr, clock) = manager(gated, roster(1, 10, warriors)).await;

    let report = mgr.tick().await;
    assert_eq!(report.added, 0);
    assert_eq!(report.logged_in, 0);

    mgr.host_mut().add_real_player(9000, Faction::Alliance, 70, false);
    assert_eq!(mgr.tick().await.logged_in, 0);

    clock.advance_secs(31);
    let report = mgr.tick().await;
    assert_eq!(report.logged_in, 2);
    assert_eq!(report.online, 2);

    mgr.host_mut().remove_real_player(9000);
    assert_eq!(mgr.tick().await.online, 2);

    clock.advance_secs(301);
    let report = mgr.tick().await;
    assert_eq!(report.online, 0);
    assert_eq!(report.logged_in, 0);
}

#[tokio::test]
async fn test_failed_login_drops_bot_from_population() {
    let mut roster = roster(1, 10, warriors);
    for guid in 1..=10 {
        roster.world.fail_login(guid);
    }
    let (mut mgr, _) = manager(config(3, 3), roster).await;

    let report = mgr.tick().await;
    assert_eq!(report.added, 3);
    assert_eq!(report.logged_in, 0);
    assert!(mgr.current_bots().is_empty());
}
