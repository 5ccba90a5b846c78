//! Integration tests for battleground and group finder aggregation driven
//! through the scheduler.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rndbot::config::{QueueFloorConfig, RandomBotConfig};
use rndbot::db::{
    MemoryAccountRepository, MemoryCharacterRepository, MemoryEventRepository, MemorySpawnRepository,
    Repositories,
};
use rndbot::host::sim::Participation;
use rndbot::host::{BattlegroundView, LfgView, ManualClock, QueueSlot, SimulatedWorld};
use rndbot::queue::{LfgState, PvpBracket, QueueType};
use rndbot::world::{BotId, CharacterInfo, Faction, PlayerClass, Race};
use rndbot::RandomBotManager;
use std::sync::Arc;

const BRACKET_80: PvpBracket = PvpBracket {
    id: 14,
    min_level: 80,
    max_level: 80,
};

fn warsong_floor(floor: u32) -> QueueFloorConfig {
    QueueFloorConfig {
        battlegrounds: vec![(QueueType::WarsongGulch, floor, vec![14])],
        ..QueueFloorConfig::default()
    }
}

/// Manager with `bots` characters, every one of them logged in after one tick
async fn populated_manager(bots: u32, floors: QueueFloorConfig) -> RandomBotManager<SimulatedWorld> {
    let accounts = MemoryAccountRepository::new().with_account(1, "rndbot1");
    let characters = MemoryCharacterRepository::new();
    let mut world = SimulatedWorld::new();
    for guid in 1..=bots {
        let character = CharacterInfo {
            guid,
            account: 1,
            name: format!("Queue{guid}"),
            race: if guid % 2 == 1 { Race::Dwarf } else { Race::Troll },
            class: PlayerClass::Paladin,
            level: 80,
        };
        characters.insert(character.clone());
        world.add_character(character);
    }

    let config = RandomBotConfig {
        min_random_bots: bots,
        max_random_bots: bots,
        bots_per_interval: 10,
        chars_per_account: 10,
        add_class_pool_size: 0,
        auto_join_bg: true,
        queue_floors: floors,
        ..RandomBotConfig::default()
    };
    let repos = Repositories {
        events: Arc::new(MemoryEventRepository::new()),
        accounts: Arc::new(accounts),
        characters: Arc::new(characters),
        spawns: Arc::new(MemorySpawnRepository::new()),
    };
    let mut mgr = RandomBotManager::new(
        config,
        world,
        repos,
        Arc::new(ManualClock::default()),
        StdRng::seed_from_u64(3),
    );
    mgr.init().await.unwrap();
    let report = mgr.tick().await;
    assert_eq!(report.online, bots);
    mgr
}

fn in_warsong(instance_id: u32) -> Participation {
    Participation {
        queues: vec![QueueSlot {
            queue: QueueType::WarsongGulch,
            bracket: Some(BRACKET_80),
            rated: false,
        }],
        battleground: Some(BattlegroundView {
            instance_id,
            is_arena: false,
            is_rated: false,
            waiting_to_leave: false,
        }),
        invited: false,
        lfg: None,
    }
}

fn queued_for_warsong() -> Participation {
    Participation {
        battleground: None,
        ..in_warsong(0)
    }
}

#[tokio::test]
async fn test_instance_below_floor_opens_queue() {
    let mut mgr = populated_manager(2, warsong_floor(2)).await;
    mgr.host_mut().set_participation(1, in_warsong(7));

    mgr.check_bg_queue();

    let info = mgr
        .battleground_table()
        .get(QueueType::WarsongGulch, 14)
        .expect("warsong bracket tracked");
    assert_eq!(info.bg_instance_count, 1);
    assert_eq!(info.bg_alliance_bots, 1);
    assert!(info.active_bg_queue);
}

#[tokio::test]
async fn test_floor_met_leaves_queue_closed() {
    let mut mgr = populated_manager(2, warsong_floor(1)).await;
    mgr.host_mut().set_participation(1, in_warsong(7));
    mgr.host_mut().set_participation(2, in_warsong(7));

    mgr.check_bg_queue();

    let info = mgr.battleground_table().get(QueueType::WarsongGulch, 14).unwrap();
    assert_eq!(info.bg_instance_count, 1);
    assert_eq!((info.bg_alliance_bots, info.bg_horde_bots), (1, 1));
    assert!(!info.active_bg_queue);
}

#[tokio::test]
async fn test_real_player_in_queue_marks_active() {
    let mut mgr = populated_manager(2, warsong_floor(0)).await;
    let player: BotId = 5000;
    mgr.host_mut().add_real_player(player, Faction::Horde, 80, false);
    mgr.host_mut().set_participation(player, queued_for_warsong());

    mgr.check_bg_queue();

    let info = mgr.battleground_table().get(QueueType::WarsongGulch, 14).unwrap();
    assert_eq!(info.bg_horde_players, 1);
    assert!(info.active_bg_queue);
    assert_eq!(
        mgr.battleground_table().active_queues(),
        vec![(QueueType::WarsongGulch, 14)]
    );
}

#[tokio::test]
async fn test_table_is_rebuilt_every_run() {
    let mut mgr = populated_manager(2, warsong_floor(0)).await;
    mgr.host_mut().set_participation(1, queued_for_warsong());
    mgr.check_bg_queue();
    assert_eq!(
        mgr.battleground_table()
            .get(QueueType::WarsongGulch, 14)
            .unwrap()
            .bg_alliance_bots,
        1
    );

    mgr.host_mut().set_participation(1, Participation::default());
    mgr.check_bg_queue();
    let info = mgr.battleground_table().get(QueueType::WarsongGulch, 14).unwrap();
    assert_eq!(info.bg_alliance_bots, 0);
    assert!(!info.active_bg_queue);
}

#[tokio::test]
async fn test_lfg_dungeons_follow_searching_players() {
    let mut mgr = populated_manager(2, QueueFloorConfig::default()).await;
    mgr.host_mut().add_real_player(6000, Faction::Alliance, 75, false);
    mgr.host_mut().add_real_player(6001, Faction::Horde, 80, false);
    mgr.host_mut().set_participation(
        6000,
        Participation {
            lfg: Some(LfgView {
                state: LfgState::Queued,
                dungeons: vec![261, 262],
            }),
            ..Participation::default()
        },
    );
    mgr.host_mut().set_participation(
        6001,
        Participation {
            lfg: Some(LfgView {
                state: LfgState::Dungeon,
                dungeons: vec![300],
            }),
            ..Participation::default()
        },
    );

    mgr.check_lfg_queue();
    assert_eq!(mgr.lfg_dungeons().for_faction(Faction::Alliance), &[261, 262]);
    assert!(mgr.lfg_dungeons().for_faction(Faction::Horde).is_empty());

    mgr.host_mut().remove_real_player(6000);
    mgr.check_lfg_queue();
    assert!(mgr.lfg_dungeons().for_faction(Faction::Alliance).is_empty());
}
