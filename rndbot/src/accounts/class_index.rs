use super::errors::AccountResult;
use crate::db::CharacterRepository;
use crate::world::{AccountId, BotId, CharacterInfo, Faction, PlayerClass};
use std::collections::{BTreeMap, HashSet};

/// Characters on class coverage accounts, keyed by faction and class
#[derive(Debug, Clone, Default)]
pub struct ClassCoverageIndex {
    by_slot: BTreeMap<(Faction, PlayerClass), Vec<BotId>>,
    members: HashSet<BotId>,
}

impl ClassCoverageIndex {
    pub async fn load(
        characters: &dyn CharacterRepository,
        class_pool: &[AccountId],
    ) -> AccountResult<Self> {
        let mut index = Self::default();
        for account in class_pool {
            for character in characters.characters_by_account(*account).await? {
                index.insert(&character);
            }
        }
        log::info!(
            ">> {} characters collected for class coverage across {} accounts",
            index.len(),
            class_pool.len()
        );
        Ok(index)
    }

    pub fn insert(&mut self, character: &CharacterInfo) {
        if self.members.insert(character.guid) {
            self.by_slot
                .entry((character.faction(), character.class))
                .or_default()
                .push(character.guid);
        }
    }

    pub fn contains(&self, guid: BotId) -> bool {
        self.members.contains(&guid)
    }

    pub fn candidates(&self, faction: Faction, class: PlayerClass) -> &[BotId] {
        self.by_slot.get(&(faction, class)).map_or(&[], Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryCharacterRepository;
    use crate::world::Race;

    fn character(guid: BotId, account: AccountId, race: Race, class: PlayerClass) -> CharacterInfo {
        CharacterInfo {
            guid,
            account,
            name: format!("Cover{guid}"),
            race,
            class,
            level: 70,
        }
    }

    #[tokio::test]
    async fn test_index_only_class_pool_accounts() {
        let repo = MemoryCharacterRepository::new();
        repo.insert(character(1, 10, Race::Human, PlayerClass::Mage));
        repo.insert(character(2, 10, Race::Orc, PlayerClass::Mage));
        repo.insert(character(3, 11, Race::Dwarf, PlayerClass::Mage));
        repo.insert(character(4, 99, Race::Human, PlayerClass::Mage));

        let index = ClassCoverageIndex::load(&repo, &[10, 11]).await.unwrap();
        assert_eq!(index.len(), 3);
        assert!(!index.contains(4));
        let mut alliance_mages = index.candidates(Faction::Alliance, PlayerClass::Mage).to_vec();
        alliance_mages.sort_unstable();
        assert_eq!(alliance_mages, vec![1, 3]);
        assert_eq!(index.candidates(Faction::Horde, PlayerClass::Mage), &[2]);
        assert!(index.candidates(Faction::Horde, PlayerClass::Druid).is_empty());
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut index = ClassCoverageIndex::default();
        let c = character(5, 1, Race::Tauren, PlayerClass::Druid);
        index.insert(&c);
        index.insert(&c);
        assert_eq!(index.candidates(Faction::Horde, PlayerClass::Druid), &[5]);
    }
}
