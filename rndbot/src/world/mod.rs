//! Shared world vocabulary: character identity, classes, races and positions.

pub mod models;

pub use models::{
    AccountId, BotId, CharacterInfo, Faction, PlayerClass, Race, WorldLocation,
};
