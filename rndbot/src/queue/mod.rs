//! Battleground, arena and group finder queue aggregation.
//!
//! Every run rebuilds the participation table from an immutable
//! [`crate::host::WorldSnapshot`]; nothing is carried over between runs.

pub mod aggregator;
pub mod models;

pub use aggregator::{
    BattlegroundTable, LfgDungeons, aggregate_battlegrounds, aggregate_lfg, log_battleground_info,
};
pub use models::{LfgState, MAX_BRACKETS, PvpBracket, QueueBracketInfo, QueueType};
