//! Population scheduler.
//!
//! [`RandomBotManager`] is the single owner of scheduling state: the event
//! store cache, the current bot list and the location caches. It is driven
//! one tick at a time, either directly (tests, embedding hosts) or through a
//! [`SchedulerActor`] that interleaves ticks with inbox messages.

pub mod actor;
pub mod allocation;
pub mod commands;
pub mod errors;
pub mod lifecycle;
pub mod manager;
pub mod messages;
pub mod stats;
pub mod timers;

pub use actor::{SchedulerActor, SchedulerHandle, TickObserver};
pub use allocation::{Allocation, allocate, split_quota};
pub use commands::{BotAction, ConsoleCommand, RemoteRequest};
pub use errors::{CommandError, CommandResult, SchedulerError, SchedulerResult};
pub use lifecycle::{Activity, BotState};
pub use manager::{RandomBotManager, TickReport};
pub use messages::SchedulerMessage;
pub use stats::{DueFlags, GroupStat, LevelBucket, StatsReport, spawn_stats_reporter};
pub use timers::PeriodicTimer;
