use super::errors::EventResult;
use super::models::{Event, EventKey};
use crate::db::{EventRepository, EventRow};
use crate::host::Clock;
use crate::world::BotId;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

/// Owner id of population-wide values such as the target bot count
pub const GLOBAL_BOT: BotId = 0;

/// Write-through cache over the persisted event table.
///
/// All of a bot's rows are loaded on its first access; a bot present in the
/// cache is considered loaded. The cache is only touched after the durable
/// write succeeded, so a failed write never leaves it ahead of storage.
pub struct EventStore {
    repo: Arc<dyn EventRepository>,
    clock: Arc<dyn Clock>,
    cache: HashMap<BotId, HashMap<EventKey, Event>>,
}

impl EventStore {
    pub fn new(repo: Arc<dyn EventRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            clock,
            cache: HashMap::new(),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn is_loaded(&self, bot: BotId) -> bool {
        self.cache.contains_key(&bot)
    }

    pub fn loaded_bots(&self) -> usize {
        self.cache.len()
    }

    /// Load every row of `bot` into the cache unless already loaded
    pub async fn warm(&mut self, bot: BotId) -> EventResult<()> {
        if self.cache.contains_key(&bot) {
            return Ok(());
        }

        let rows = self.repo.load_bot(bot).await?;
        let mut events = HashMap::with_capacity(rows.len());
        for row in rows {
            match row.event.parse::<EventKey>() {
                Ok(key) => {
                    events.insert(
                        key,
                        Event {
                            value: row.value,
                            last_change: row.time,
                            valid_for: row.valid_for,
                            payload: row.data,
                        },
                    );
                }
                Err(_) => log::debug!("Ignoring unknown event '{}' of bot {}", row.event, bot),
            }
        }
        self.cache.insert(bot, events);
        Ok(())
    }

    /// Current value of `key`, 0 when absent, expired or unreadable
    pub async fn get(&mut self, bot: BotId, key: EventKey) -> u32 {
        if let Err(e) = self.warm(bot).await {
            log::error!("Failed to load events of bot {}: {}", bot, e);
            return 0;
        }
        let now = self.clock.now();
        self.cache
            .get(&bot)
            .and_then(|events| events.get(&key))
            .map_or(0, |e| e.value_at(key, now))
    }

    /// Side payload of `key`, only while its value is set
    pub async fn get_payload(&mut self, bot: BotId, key: EventKey) -> Option<String> {
        if self.get(bot, key).await == 0 {
            return None;
        }
        self.cache
            .get(&bot)
            .and_then(|events| events.get(&key))
            .and_then(|e| e.payload.clone())
    }

    /// Replace `key` for `bot`; a value of 0 deletes it
    ///
    /// # Arguments
    ///
    /// * `bot` - Bot id (or [`GLOBAL_BOT`])
    /// * `key` - Event kind
    /// * `value` - New value, 0 to delete
    /// * `valid_for` - Seconds until the value reads as 0
    /// * `payload` - Optional side data
    ///
    /// # Returns
    ///
    /// * `EventResult<u32>` - The written value
    pub async fn try_set(
        &mut self,
        bot: BotId,
        key: EventKey,
        value: u32,
        valid_for: u32,
        payload: Option<&str>,
    ) -> EventResult<u32> {
        let now = self.clock.now();
        let payload = payload.filter(|p| !p.is_empty()).map(str::to_string);
        let row = EventRow {
            event: key.as_str(),
            value,
            time: now,
            valid_for,
            data: payload.clone(),
        };
        self.repo.replace(bot, &row).await?;

        if let Some(events) = self.cache.get_mut(&bot) {
            if value == 0 {
                events.remove(&key);
            } else {
                events.insert(
                    key,
                    Event {
                        value,
                        last_change: now,
                        valid_for,
                        payload,
                    },
                );
            }
        }
        Ok(value)
    }

    /// Fire-and-forget variant of [`Self::try_set`]: failures are logged and
    /// the requested value is returned anyway
    pub async fn set(&mut self, bot: BotId, key: EventKey, value: u32, valid_for: u32) -> u32 {
        self.set_with_payload(bot, key, value, valid_for, None).await
    }

    pub async fn set_with_payload(
        &mut self,
        bot: BotId,
        key: EventKey,
        value: u32,
        valid_for: u32,
        payload: Option<&str>,
    ) -> u32 {
        if let Err(e) = self.try_set(bot, key, value, valid_for, payload).await {
            log::error!("Failed to persist {} = {} for bot {}: {}", key, value, bot, e);
        }
        value
    }

    /// Delete every persisted event and drop the cache
    pub async fn reset_all(&mut self) -> EventResult<()> {
        self.repo.delete_all().await?;
        self.cache.clear();
        Ok(())
    }

    /// Delete every event of one bot
    pub async fn remove_bot(&mut self, bot: BotId) -> EventResult<()> {
        self.repo.delete_bot(bot).await?;
        self.cache.remove(&bot);
        Ok(())
    }

    /// Bots with a stored row for `key`, live or not
    pub async fn bots_with(&self, key: EventKey) -> EventResult<Vec<BotId>> {
        Ok(self.repo.bots_with_event(&key.as_str()).await?)
    }

    /// Delete `key` for every bot
    pub async fn delete_key_everywhere(&mut self, key: EventKey) -> EventResult<u64> {
        let removed = self.repo.delete_event_everywhere(&key.as_str()).await?;
        for events in self.cache.values_mut() {
            events.remove(&key);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryEventRepository;
    use crate::host::ManualClock;

    fn store() -> (EventStore, Arc<MemoryEventRepository>, Arc<ManualClock>) {
        let repo = Arc::new(MemoryEventRepository::new());
        let clock = Arc::new(ManualClock::default());
        let store = EventStore::new(repo.clone(), clock.clone());
        (store, repo, clock)
    }

    #[tokio::test]
    async fn test_value_expires_after_validity() {
        let (mut store, _, clock) = store();
        store.set(7, EventKey::Teleport, 1, 120).await;
        assert_eq!(store.get(7, EventKey::Teleport).await, 1);
        clock.advance_secs(119);
        assert_eq!(store.get(7, EventKey::Teleport).await, 1);
        clock.advance_secs(1);
        assert_eq!(store.get(7, EventKey::Teleport).await, 0);
    }

    #[tokio::test]
    async fn test_talent_keys_never_expire() {
        let (mut store, _, clock) = store();
        store.set(7, EventKey::SpecNo, 3, 1).await;
        clock.advance_secs(10_000);
        assert_eq!(store.get(7, EventKey::SpecNo).await, 3);
    }

    #[tokio::test]
    async fn test_zero_write_reads_zero_immediately() {
        let (mut store, repo, _) = store();
        store.set(7, EventKey::Add, 1, 3600).await;
        store.get(7, EventKey::Add).await;
        store.set(7, EventKey::Add, 0, 3600).await;
        assert_eq!(store.get(7, EventKey::Add).await, 0);
        assert!(repo.raw(7, "add").is_none());
    }

    #[tokio::test]
    async fn test_first_access_loads_all_keys_once() {
        let (mut store, repo, _) = store();
        let row = |event: &str| EventRow {
            event: event.to_string(),
            value: 1,
            time: Utc::now(),
            valid_for: 3600,
            data: None,
        };
        repo.replace(9, &row("add")).await.unwrap();
        repo.replace(9, &row("teleport")).await.unwrap();

        assert_eq!(store.get(9, EventKey::Add).await, 1);
        assert_eq!(store.get(9, EventKey::Teleport).await, 1);
        assert_eq!(store.get(9, EventKey::Randomize).await, 0);
        assert_eq!(repo.load_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_cache() {
        let (mut store, repo, _) = store();
        store.set(7, EventKey::Logout, 1, 3600).await;
        assert_eq!(store.get(7, EventKey::Logout).await, 1);

        repo.set_fail_writes(true);
        assert!(store.try_set(7, EventKey::Logout, 0, 0, None).await.is_err());
        assert_eq!(store.set(7, EventKey::Logout, 0, 0).await, 0);
        assert_eq!(store.get(7, EventKey::Logout).await, 1);
    }

    #[tokio::test]
    async fn test_payload_only_while_set() {
        let (mut store, _, clock) = store();
        store
            .set_with_payload(7, EventKey::SpecLink, 1, 10, Some("0-0-5"))
            .await;
        assert_eq!(store.get_payload(7, EventKey::SpecLink).await.as_deref(), Some("0-0-5"));

        store.set_with_payload(7, EventKey::Update, 1, 10, Some("x")).await;
        clock.advance_secs(10);
        assert_eq!(store.get_payload(7, EventKey::Update).await, None);
    }

    #[tokio::test]
    async fn test_reset_clears_storage_and_cache() {
        let (mut store, repo, _) = store();
        store.set(1, EventKey::Add, 1, 3600).await;
        store.set(2, EventKey::Teleport, 1, 3600).await;
        store.get(1, EventKey::Add).await;

        store.reset_all().await.unwrap();
        assert_eq!(repo.row_count(), 0);
        assert_eq!(store.loaded_bots(), 0);
        assert_eq!(store.get(1, EventKey::Add).await, 0);
        assert_eq!(store.get(2, EventKey::Teleport).await, 0);
    }

    #[tokio::test]
    async fn test_delete_key_everywhere_updates_cache() {
        let (mut store, _, _) = store();
        store.set(1, EventKey::Add, 1, 3600).await;
        store.set(1, EventKey::Logout, 1, 3600).await;
        store.get(1, EventKey::Add).await;

        assert_eq!(store.delete_key_everywhere(EventKey::Add).await.unwrap(), 1);
        assert_eq!(store.get(1, EventKey::Add).await, 0);
        assert_eq!(store.get(1, EventKey::Logout).await, 1);
    }
}
