use crate::world::AccountId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a random bot account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AccountRole {
    Unassigned = 0,
    GeneralPool = 1,
    ClassCoveragePool = 2,
}

impl AccountRole {
    pub fn id(self) -> i16 {
        self as i16
    }

    /// Unknown ids read back from storage are treated as unassigned
    pub fn from_id(id: i16) -> Self {
        match id {
            1 => AccountRole::GeneralPool,
            2 => AccountRole::ClassCoveragePool,
            _ => AccountRole::Unassigned,
        }
    }
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            AccountRole::Unassigned => "unassigned",
            AccountRole::GeneralPool => "general",
            AccountRole::ClassCoveragePool => "class coverage",
        };
        write!(f, "{repr}")
    }
}

/// Account matching the bot naming convention
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotAccount {
    pub id: AccountId,
    pub username: String,
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub accounts_found: usize,
    pub newly_registered: usize,
    pub general_needed: usize,
    pub class_needed: usize,
    pub general_promoted: usize,
    pub class_promoted: usize,
    pub general_total: usize,
    pub class_total: usize,
    pub general_shortfall: usize,
    pub class_shortfall: usize,
}

impl ReconcileReport {
    pub fn transitions(&self) -> usize {
        self.general_promoted + self.class_promoted
    }
}
