//! Teleport destination caches.
//!
//! Built once from world data at startup (or on reload) and read-only
//! afterwards. Level placement draws from either the grind cache or the
//! per-faction starter cache depending on [`LocationPolicy`].

pub mod battlemasters;
pub mod cache;
pub mod errors;
pub mod models;
pub mod zones;

pub use battlemasters::{BattleMasterCache, BattleMasterTeam};
pub use cache::{LocationCache, LocationPolicy, LocationSettings, WorldData};
pub use errors::{LocationError, LocationResult};
pub use models::{
    BankerSpot, BattleMasterEntry, GrindSpawn, LevelBracket, ServiceNpcSpot, StartingPosition,
};
pub use zones::zone_brackets;
