use super::errors::{AccountError, AccountResult};
use super::models::{AccountRole, BotAccount, ReconcileReport};
use crate::config::RandomBotConfig;
use crate::db::AccountRepository;
use crate::world::AccountId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Promotions computed from the current classification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromotionPlan {
    pub general: Vec<AccountId>,
    pub class_coverage: Vec<AccountId>,
    pub general_shortfall: usize,
    pub class_shortfall: usize,
}

/// General pool size needed to back `max_bots`
pub fn general_accounts_needed(
    max_bots: u32,
    periodic: bool,
    periodic_ratio: u32,
    chars_per_account: u32,
) -> usize {
    if max_bots == 0 || chars_per_account == 0 {
        return 0;
    }
    let bots = if periodic {
        u64::from(max_bots) * u64::from(periodic_ratio)
    } else {
        u64::from(max_bots)
    };
    bots.div_ceil(u64::from(chars_per_account)) as usize
}

/// Decide which unassigned accounts to promote.
///
/// General pool candidates are taken from the lowest ids, class coverage
/// candidates from the highest, so both pools only compete for the middle
/// of the id space. Already assigned accounts are never touched.
///
/// # Arguments
///
/// * `accounts` - Bot account ids, ascending
/// * `roles` - Current classification (accounts missing here count as unassigned)
/// * `general_needed` - Target general pool size
/// * `class_needed` - Target class coverage pool size
pub fn plan_promotions(
    accounts: &[AccountId],
    roles: &HashMap<AccountId, AccountRole>,
    general_needed: usize,
    class_needed: usize,
) -> PromotionPlan {
    let count = |role: AccountRole| roles.values().filter(|r| **r == role).count();
    let role_of = |id: &AccountId| roles.get(id).copied().unwrap_or(AccountRole::Unassigned);

    let mut plan = PromotionPlan::default();

    let general_missing = general_needed.saturating_sub(count(AccountRole::GeneralPool));
    plan.general = accounts
        .iter()
        .filter(|id| role_of(id) == AccountRole::Unassigned)
        .take(general_missing)
        .copied()
        .collect();
    plan.general_shortfall = general_missing - plan.general.len();

    let class_missing = class_needed.saturating_sub(count(AccountRole::ClassCoveragePool));
    plan.class_coverage = accounts
        .iter()
        .rev()
        .filter(|id| role_of(id) == AccountRole::Unassigned && !plan.general.contains(id))
        .take(class_missing)
        .copied()
        .collect();
    plan.class_shortfall = class_missing - plan.class_coverage.len();

    plan
}

/// Keeps bot accounts classified into disjoint pools
pub struct AccountAssigner {
    repo: Arc<dyn AccountRepository>,
    general: Vec<AccountId>,
    class_coverage: Vec<AccountId>,
}

impl AccountAssigner {
    pub fn new(repo: Arc<dyn AccountRepository>) -> Self {
        Self {
            repo,
            general: Vec::new(),
            class_coverage: Vec::new(),
        }
    }

    /// Register new bot accounts and promote unassigned ones until both
    /// pools reach their configured size.
    ///
    /// # Returns
    ///
    /// * `AccountResult<ReconcileReport>` - Counts of what changed and what is missing
    pub async fn reconcile(&mut self, config: &RandomBotConfig) -> AccountResult<ReconcileReport> {
        if config.chars_per_account == 0 {
            return Err(AccountError::NoCharacterSlots);
        }
        log::info!("Assigning account types for random bot accounts...");

        let accounts: Vec<AccountId> = self
            .repo
            .list_bot_accounts(&config.account_prefix)
            .await?
            .into_iter()
            .map(|BotAccount { id, .. }| id)
            .collect();
        log::info!("Found {} total random bot accounts", accounts.len());

        let mut roles = self.repo.load_roles().await?;
        // classifications of accounts that no longer carry the prefix are ignored
        let known: HashSet<AccountId> = accounts.iter().copied().collect();
        roles.retain(|id, _| known.contains(id));
        let unregistered: Vec<AccountId> = accounts
            .iter()
            .filter(|id| !roles.contains_key(id))
            .copied()
            .collect();
        self.repo.insert_unassigned(&unregistered).await?;
        for id in &unregistered {
            roles.insert(*id, AccountRole::Unassigned);
        }

        let general_needed = general_accounts_needed(
            config.max_random_bots,
            config.periodic_online_offline,
            config.periodic_online_offline_ratio,
            config.chars_per_account,
        );
        let class_needed = config.add_class_pool_size as usize;
        let plan = plan_promotions(&accounts, &roles, general_needed, class_needed);

        let general_promoted = self.repo.promote(&plan.general, AccountRole::GeneralPool).await? as usize;
        for id in &plan.general {
            roles.insert(*id, AccountRole::GeneralPool);
        }
        let class_promoted = self
            .repo
            .promote(&plan.class_coverage, AccountRole::ClassCoveragePool)
            .await? as usize;
        for id in &plan.class_coverage {
            roles.insert(*id, AccountRole::ClassCoveragePool);
        }

        if plan.general_shortfall > 0 {
            log::error!(
                "Not enough unassigned accounts to fulfill general pool requirements. Need {} more accounts.",
                plan.general_shortfall
            );
        }
        if plan.class_shortfall > 0 {
            log::error!(
                "Not enough unassigned accounts to fulfill class coverage requirements. Need {} more accounts.",
                plan.class_shortfall
            );
        }

        let mut general: Vec<AccountId> = pool_of(&roles, AccountRole::GeneralPool);
        let mut class_coverage: Vec<AccountId> = pool_of(&roles, AccountRole::ClassCoveragePool);
        general.sort_unstable();
        class_coverage.sort_unstable();
        self.general = general;
        self.class_coverage = class_coverage;

        let report = ReconcileReport {
            accounts_found: accounts.len(),
            newly_registered: unregistered.len(),
            general_needed,
            class_needed,
            general_promoted,
            class_promoted,
            general_total: self.general.len(),
            class_total: self.class_coverage.len(),
            general_shortfall: plan.general_shortfall,
            class_shortfall: plan.class_shortfall,
        };
        log::info!(
            "Account type assignment complete: {} general accounts, {} class coverage accounts, {} unassigned",
            report.general_total,
            report.class_total,
            roles.len() - report.general_total - report.class_total
        );
        Ok(report)
    }

    /// Direct classification lookup against storage
    pub async fn is_account_type(&self, account: AccountId, role: AccountRole) -> AccountResult<bool> {
        Ok(self.repo.has_role(account, role).await?)
    }

    pub fn general_pool(&self) -> &[AccountId] {
        &self.general
    }

    pub fn class_pool(&self) -> &[AccountId] {
        &self.class_coverage
    }
}

fn pool_of(roles: &HashMap<AccountId, AccountRole>, role: AccountRole) -> Vec<AccountId> {
    roles
        .iter()
        .filter(|(_, r)| **r == role)
        .map(|(id, _)| *id)
        .collect()
}
