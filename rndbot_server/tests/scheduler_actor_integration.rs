//! Integration tests for the scheduler actor as the server runs it.
//!
//! The actor owns a manager over in-memory repositories and the simulated
//! host; requests arrive through cloned handles like the remote front end
//! sends them.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rndbot::config::RandomBotConfig;
use rndbot::db::{
    MemoryAccountRepository, MemoryCharacterRepository, MemoryEventRepository, MemorySpawnRepository,
    Repositories,
};
use rndbot::host::{HostAction, SimulatedWorld, SystemClock, WorldHost};
use rndbot::scheduler::BotState;
use rndbot::world::{BotId, CharacterInfo, PlayerClass, Race};
use rndbot::{RandomBotManager, SchedulerActor, SchedulerHandle};
use std::sync::Arc;
use std::time::Duration;

const ROSTER: u32 = 8;

async fn manager(target: u32) -> RandomBotManager<SimulatedWorld> {
    let accounts = MemoryAccountRepository::new().with_account(1, "rndbot1");
    let characters = MemoryCharacterRepository::new();
    let mut world = SimulatedWorld::new();
    for guid in 1..=ROSTER {
        let character = CharacterInfo {
            guid,
            account: 1,
            name: format!("Actor{guid}"),
            race: if guid % 2 == 1 { Race::Gnome } else { Race::Tauren },
            class: PlayerClass::Druid,
            level: 10,
        };
        characters.insert(character.clone());
        world.add_character(character);
    }

    let config = RandomBotConfig {
        min_random_bots: target,
        max_random_bots: target,
        bots_per_interval: 10,
        chars_per_account: 10,
        add_class_pool_size: 0,
        ..RandomBotConfig::default()
    };
    let repos = Repositories {
        events: Arc::new(MemoryEventRepository::new()),
        accounts: Arc::new(accounts),
        characters: Arc::new(characters),
        spawns: Arc::new(MemorySpawnRepository::new()),
    };
    let mut manager = RandomBotManager::new(
        config,
        world,
        repos,
        Arc::new(SystemClock),
        StdRng::seed_from_u64(21),
    );
    manager.init().await.expect("init should succeed");
    manager
}

async fn active_bots(handle: &SchedulerHandle) -> Vec<BotId> {
    let mut active = Vec::new();
    for guid in 1..=ROSTER {
        if matches!(handle.bot_state(guid).await.unwrap(), BotState::Active(_)) {
            active.push(guid);
        }
    }
    active
}

/// Poll until `expected` bots are active or give up after about two seconds
async fn wait_for_population(handle: &SchedulerHandle, expected: usize) -> Vec<BotId> {
    for _ in 0..100 {
        let active = active_bots(handle).await;
        if active.len() == expected {
            return active;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    active_bots(handle).await
}

#[tokio::test]
async fn test_actor_reaches_target_and_logs_out_on_shutdown() {
    let (actor, handle) = SchedulerActor::new(manager(4).await);
    let task = tokio::spawn(actor.run());

    let active = wait_for_population(&handle, 4).await;
    assert_eq!(active.len(), 4);

    let reply = handle.remote(&format!("whois,{}", active[0])).await.unwrap();
    assert!(reply.ends_with("whois ok"), "unexpected reply: {reply}");

    handle.shutdown().await.unwrap();
    let manager = task.await.unwrap();
    assert!(manager.host().online_bots().is_empty());

    let logouts = manager
        .host()
        .actions()
        .iter()
        .filter(|a| matches!(a, HostAction::Logout(_)))
        .count();
    assert_eq!(logouts, 4);
}

#[tokio::test]
async fn test_concurrent_clients_share_one_scheduler() {
    let (actor, handle) = SchedulerActor::new(manager(2).await);
    let task = tokio::spawn(actor.run());
    wait_for_population(&handle, 2).await;

    let mut clients = Vec::new();
    for _ in 0..8 {
        let handle = handle.clone();
        clients.push(tokio::spawn(async move {
            handle.console("stats").await
        }));
    }
    for client in clients {
        let reply = client.await.unwrap().unwrap();
        assert!(reply.contains("bots online"), "unexpected reply: {reply}");
    }

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_dropping_every_handle_stops_the_actor() {
    let (actor, handle) = SchedulerActor::new(manager(2).await);
    let task = tokio::spawn(actor.run());
    wait_for_population(&handle, 2).await;

    drop(handle);
    let manager = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("actor should stop once every handle is gone")
        .unwrap();
    assert!(manager.host().online_bots().is_empty());
}
