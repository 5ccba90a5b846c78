//! Random bot account classification.
//!
//! Accounts matching the bot prefix start unassigned and are promoted once,
//! either to the general population pool or to the class coverage pool.

pub mod class_index;
pub mod errors;
pub mod manager;
pub mod models;

pub use class_index::ClassCoverageIndex;
pub use errors::{AccountError, AccountResult};
pub use manager::{AccountAssigner, PromotionPlan, general_accounts_needed, plan_promotions};
pub use models::{AccountRole, BotAccount, ReconcileReport};
