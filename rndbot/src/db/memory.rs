//! In-memory repositories.
//!
//! Used by tests, benchmarks and the server's `memory` storage mode. Writes
//! can be made to fail on demand to exercise persistence-failure handling.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::errors::{StorageError, StorageResult};
use super::repository::{
    AccountRepository, CharacterRepository, EventRepository, EventRow, SpawnRepository,
};
use crate::accounts::{AccountRole, BotAccount};
use crate::locations::{BankerSpot, BattleMasterEntry, GrindSpawn, ServiceNpcSpot, StartingPosition};
use crate::world::{AccountId, BotId, CharacterInfo};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// SQL `LIKE` matching with `%` and `_` wildcards
pub fn like_match(value: &str, pattern: &str) -> bool {
    fn matches(v: &[char], p: &[char]) -> bool {
        match p.split_first() {
            None => v.is_empty(),
            Some(('%', rest)) => (0..=v.len()).any(|i| matches(&v[i..], rest)),
            Some(('_', rest)) => !v.is_empty() && matches(&v[1..], rest),
            Some((c, rest)) => v.first() == Some(c) && matches(&v[1..], rest),
        }
    }
    let v: Vec<char> = value.chars().collect();
    let p: Vec<char> = pattern.chars().collect();
    matches(&v, &p)
}

/// In-memory event table
#[derive(Default)]
pub struct MemoryEventRepository {
    rows: Mutex<BTreeMap<BotId, HashMap<String, EventRow>>>,
    fail_writes: AtomicBool,
    loads: AtomicUsize,
}

impl MemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail until reset
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// How many per-bot loads have been served
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Number of stored rows
    pub fn row_count(&self) -> usize {
        lock(&self.rows).values().map(HashMap::len).sum()
    }

    /// Stored row, ignoring expiry
    pub fn raw(&self, bot: BotId, event: &str) -> Option<EventRow> {
        lock(&self.rows).get(&bot).and_then(|m| m.get(event)).cloned()
    }

    fn check_writable(&self) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl EventRepository for MemoryEventRepository {
    async fn load_bot(&self, bot: BotId) -> StorageResult<Vec<EventRow>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.rows)
            .get(&bot)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn replace(&self, bot: BotId, row: &EventRow) -> StorageResult<()> {
        self.check_writable()?;
        let mut rows = lock(&self.rows);
        let entry = rows.entry(bot).or_default();
        entry.remove(&row.event);
        if row.value != 0 {
            entry.insert(row.event.clone(), row.clone());
        }
        if entry.is_empty() {
            rows.remove(&bot);
        }
        Ok(())
    }

    async fn bots_with_event(&self, event: &str) -> StorageResult<Vec<BotId>> {
        Ok(lock(&self.rows)
            .iter()
            .filter(|(_, m)| m.contains_key(event))
            .map(|(bot, _)| *bot)
            .collect())
    }

    async fn delete_all(&self) -> StorageResult<()> {
        self.check_writable()?;
        lock(&self.rows).clear();
        Ok(())
    }

    async fn delete_bot(&self, bot: BotId) -> StorageResult<()> {
        self.check_writable()?;
        lock(&self.rows).remove(&bot);
        Ok(())
    }

    async fn delete_event_everywhere(&self, event: &str) -> StorageResult<u64> {
        self.check_writable()?;
        let mut rows = lock(&self.rows);
        let mut removed = 0;
        for m in rows.values_mut() {
            if m.remove(event).is_some() {
                removed += 1;
            }
        }
        rows.retain(|_, m| !m.is_empty());
        Ok(removed)
    }
}

/// In-memory account tables
#[derive(Default)]
pub struct MemoryAccountRepository {
    accounts: Mutex<BTreeMap<AccountId, String>>,
    roles: Mutex<HashMap<AccountId, AccountRole>>,
}

impl MemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, id: AccountId, username: &str) -> Self {
        self.add_account(id, username);
        self
    }

    pub fn add_account(&self, id: AccountId, username: &str) {
        lock(&self.accounts).insert(id, username.to_string());
    }

    pub fn role_of(&self, id: AccountId) -> Option<AccountRole> {
        lock(&self.roles).get(&id).copied()
    }
}

#[async_trait]
impl AccountRepository for MemoryAccountRepository {
    async fn list_bot_accounts(&self, prefix: &str) -> StorageResult<Vec<BotAccount>> {
        Ok(lock(&self.accounts)
            .iter()
            .filter(|(_, name)| name.starts_with(prefix))
            .map(|(id, name)| BotAccount {
                id: *id,
                username: name.clone(),
            })
            .collect())
    }

    async fn load_roles(&self) -> StorageResult<HashMap<AccountId, AccountRole>> {
        Ok(lock(&self.roles).clone())
    }

    async fn insert_unassigned(&self, accounts: &[AccountId]) -> StorageResult<()> {
        let mut roles = lock(&self.roles);
        for id in accounts {
            roles.entry(*id).or_insert(AccountRole::Unassigned);
        }
        Ok(())
    }

    async fn promote(&self, accounts: &[AccountId], role: AccountRole) -> StorageResult<u64> {
        let mut roles = lock(&self.roles);
        let mut changed = 0;
        for id in accounts {
            if let Some(current) = roles.get_mut(id)
                && *current == AccountRole::Unassigned
            {
                *current = role;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn has_role(&self, account: AccountId, role: AccountRole) -> StorageResult<bool> {
        Ok(lock(&self.roles).get(&account) == Some(&role))
    }
}

/// In-memory character roster
#[derive(Default)]
pub struct MemoryCharacterRepository {
    characters: Mutex<BTreeMap<BotId, CharacterInfo>>,
}

impl MemoryCharacterRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, character: CharacterInfo) {
        lock(&self.characters).insert(character.guid, character);
    }

    pub fn remove(&self, guid: BotId) {
        lock(&self.characters).remove(&guid);
    }
}

#[async_trait]
impl CharacterRepository for MemoryCharacterRepository {
    async fn characters_by_account(&self, account: AccountId) -> StorageResult<Vec<CharacterInfo>> {
        Ok(lock(&self.characters)
            .values()
            .filter(|c| c.account == account)
            .cloned()
            .collect())
    }

    async fn find_by_name(
        &self,
        accounts: &[AccountId],
        pattern: &str,
    ) -> StorageResult<Vec<CharacterInfo>> {
        Ok(lock(&self.characters)
            .values()
            .filter(|c| accounts.contains(&c.account) && like_match(&c.name, pattern))
            .cloned()
            .collect())
    }

    async fn account_of(&self, guid: BotId) -> StorageResult<Option<AccountId>> {
        Ok(lock(&self.characters).get(&guid).map(|c| c.account))
    }
}

/// In-memory world data
#[derive(Default)]
pub struct MemorySpawnRepository {
    pub grind: Vec<GrindSpawn>,
    pub service_npcs: Vec<ServiceNpcSpot>,
    pub bankers: Vec<BankerSpot>,
    pub starts: Vec<StartingPosition>,
    pub battlemasters: Vec<BattleMasterEntry>,
}

impl MemorySpawnRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SpawnRepository for MemorySpawnRepository {
    async fn grind_spawns(&self, maps: &[u32]) -> StorageResult<Vec<GrindSpawn>> {
        let mut out: Vec<GrindSpawn> = self
            .grind
            .iter()
            .filter(|s| maps.contains(&s.location.map))
            .cloned()
            .collect();
        out.sort_by_key(|s| s.min_level);
        Ok(out)
    }

    async fn service_npc_spots(&self, maps: &[u32]) -> StorageResult<Vec<ServiceNpcSpot>> {
        Ok(self
            .service_npcs
            .iter()
            .filter(|s| maps.contains(&s.location.map))
            .cloned()
            .collect())
    }

    async fn banker_spots(&self, maps: &[u32]) -> StorageResult<Vec<BankerSpot>> {
        let mut out: Vec<BankerSpot> = self
            .bankers
            .iter()
            .filter(|s| maps.contains(&s.location.map))
            .cloned()
            .collect();
        out.sort_by_key(|s| s.level);
        Ok(out)
    }

    async fn starting_positions(&self) -> StorageResult<Vec<StartingPosition>> {
        Ok(self.starts.clone())
    }

    async fn battlemasters(&self) -> StorageResult<Vec<BattleMasterEntry>> {
        Ok(self.battlemasters.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{PlayerClass, Race};
    use chrono::Utc;

    fn row(event: &str, value: u32) -> EventRow {
        EventRow {
            event: event.to_string(),
            value,
            time: Utc::now(),
            valid_for: 60,
            data: None,
        }
    }

    #[test]
    fn test_like_match() {
        assert!(like_match("Aldor", "%"));
        assert!(like_match("Aldor", "Al%"));
        assert!(like_match("Aldor", "_ldor"));
        assert!(like_match("Aldor", "%do%"));
        assert!(!like_match("Aldor", "Bl%"));
        assert!(!like_match("Aldor", "Ald"));
        assert!(like_match("", "%"));
    }

    #[tokio::test]
    async fn test_replace_with_zero_deletes() {
        let repo = MemoryEventRepository::new();
        repo.replace(1, &row("add", 1)).await.unwrap();
        assert_eq!(repo.row_count(), 1);
        repo.replace(1, &row("add", 0)).await.unwrap();
        assert_eq!(repo.row_count(), 0);
        assert!(repo.load_bot(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_rows() {
        let repo = MemoryEventRepository::new();
        repo.replace(1, &row("add", 1)).await.unwrap();
        repo.set_fail_writes(true);
        assert!(repo.replace(1, &row("add", 0)).await.is_err());
        assert_eq!(repo.raw(1, "add").map(|r| r.value), Some(1));
    }

    #[tokio::test]
    async fn test_delete_event_everywhere() {
        let repo = MemoryEventRepository::new();
        repo.replace(1, &row("add", 1)).await.unwrap();
        repo.replace(2, &row("add", 1)).await.unwrap();
        repo.replace(2, &row("logout", 1)).await.unwrap();
        assert_eq!(repo.delete_event_everywhere("add").await.unwrap(), 2);
        assert_eq!(repo.bots_with_event("logout").await.unwrap(), vec![2]);
        assert!(repo.bots_with_event("add").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_promote_only_unassigned() {
        let repo = MemoryAccountRepository::new().with_account(1, "rndbot1");
        repo.insert_unassigned(&[1]).await.unwrap();
        assert_eq!(repo.promote(&[1], AccountRole::GeneralPool).await.unwrap(), 1);
        assert_eq!(repo.promote(&[1], AccountRole::ClassCoveragePool).await.unwrap(), 0);
        assert_eq!(repo.role_of(1), Some(AccountRole::GeneralPool));
    }

    #[tokio::test]
    async fn test_find_by_name_restricted_to_accounts() {
        let repo = MemoryCharacterRepository::new();
        for (guid, account, name) in [(1, 10, "Anna"), (2, 11, "Annika"), (3, 10, "Bert")] {
            repo.insert(CharacterInfo {
                guid,
                account,
                name: name.to_string(),
                race: Race::Human,
                class: PlayerClass::Warrior,
                level: 1,
            });
        }
        let found = repo.find_by_name(&[10], "Ann%").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].guid, 1);
        assert_eq!(repo.account_of(3).await.unwrap(), Some(10));
    }
}
