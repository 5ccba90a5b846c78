//! # rndbot
//!
//! Population manager for randomly behaving bot characters in a simulated
//! multiplayer world.
//!
//! The scheduler keeps a target number of bots online, admits new ones in
//! faction-balanced batches and advances each bot through a small lifecycle
//! (log in, randomize, teleport, revive, log out). Every scheduling decision
//! is derived from TTL-tagged facts persisted per bot, so a lost write only
//! delays a transition.
//!
//! ## Core Modules
//!
//! - [`events`]: TTL event store with a per-bot write-through cache
//! - [`accounts`]: Bot account classification into general and class coverage pools
//! - [`locations`]: Level-indexed teleport destinations and battlemasters
//! - [`scheduler`]: Population scheduler, bot lifecycle, commands and the actor
//! - [`queue`]: Battleground and group finder queue aggregation
//! - [`host`]: Seam to the simulation host, plus an in-memory world
//! - [`db`]: PostgreSQL and in-memory repositories
//! - [`config`]: Environment-driven configuration
//!
//! ## Example
//!
//! ```no_run
//! use rndbot::config::RandomBotConfig;
//! use rndbot::db::{
//!     MemoryAccountRepository, MemoryCharacterRepository, MemoryEventRepository,
//!     MemorySpawnRepository, Repositories,
//! };
//! use rndbot::host::{SimulatedWorld, SystemClock};
//! use rndbot::scheduler::RandomBotManager;
//! use rand::SeedableRng;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let repos = Repositories {
//!     events: Arc::new(MemoryEventRepository::new()),
//!     accounts: Arc::new(MemoryAccountRepository::new()),
//!     characters: Arc::new(MemoryCharacterRepository::new()),
//!     spawns: Arc::new(MemorySpawnRepository::new()),
//! };
//! let mut manager = RandomBotManager::new(
//!     RandomBotConfig::default(),
//!     SimulatedWorld::new(),
//!     repos,
//!     Arc::new(SystemClock),
//!     rand::rngs::StdRng::from_os_rng(),
//! );
//! manager.init().await?;
//! let report = manager.tick().await;
//! println!("{} bots online", report.online);
//! # Ok(())
//! # }
//! ```

pub mod accounts;
pub mod config;
pub mod db;
pub mod events;
pub mod host;
pub mod locations;
pub mod queue;
pub mod scheduler;
pub mod world;

pub use config::RandomBotConfig;
pub use events::{EventKey, EventStore};
pub use host::{Clock, WorldHost};
pub use scheduler::{RandomBotManager, SchedulerActor, SchedulerHandle};
pub use world::{AccountId, BotId};
