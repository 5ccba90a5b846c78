//! World models shared by every scheduler component.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Character id (low guid)
pub type BotId = u32;

/// Login account id
pub type AccountId = u32;

/// Playable faction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Faction {
    Alliance,
    Horde,
}

impl Faction {
    /// Single-letter tag used in per-bot log lines
    pub fn tag(self) -> &'static str {
        match self {
            Faction::Alliance => "A",
            Faction::Horde => "H",
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Faction::Alliance => write!(f, "alliance"),
            Faction::Horde => write!(f, "horde"),
        }
    }
}

/// Character class, numbered as stored in the character table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlayerClass {
    Warrior = 1,
    Paladin = 2,
    Hunter = 3,
    Rogue = 4,
    Priest = 5,
    DeathKnight = 6,
    Shaman = 7,
    Mage = 8,
    Warlock = 9,
    Druid = 11,
}

impl PlayerClass {
    /// All playable classes in id order
    pub const ALL: [PlayerClass; 10] = [
        PlayerClass::Warrior,
        PlayerClass::Paladin,
        PlayerClass::Hunter,
        PlayerClass::Rogue,
        PlayerClass::Priest,
        PlayerClass::DeathKnight,
        PlayerClass::Shaman,
        PlayerClass::Mage,
        PlayerClass::Warlock,
        PlayerClass::Druid,
    ];

    /// Convert a stored class id
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }

    /// Stored class id
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn is_death_knight(self) -> bool {
        self == PlayerClass::DeathKnight
    }
}

impl fmt::Display for PlayerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlayerClass::Warrior => "Warrior",
            PlayerClass::Paladin => "Paladin",
            PlayerClass::Hunter => "Hunter",
            PlayerClass::Rogue => "Rogue",
            PlayerClass::Priest => "Priest",
            PlayerClass::DeathKnight => "Death Knight",
            PlayerClass::Shaman => "Shaman",
            PlayerClass::Mage => "Mage",
            PlayerClass::Warlock => "Warlock",
            PlayerClass::Druid => "Druid",
        };
        f.write_str(name)
    }
}

/// Character race, numbered as stored in the character table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Race {
    Human = 1,
    Orc = 2,
    Dwarf = 3,
    NightElf = 4,
    Undead = 5,
    Tauren = 6,
    Gnome = 7,
    Troll = 8,
    BloodElf = 10,
    Draenei = 11,
}

impl Race {
    /// All playable races in id order
    pub const ALL: [Race; 10] = [
        Race::Human,
        Race::Orc,
        Race::Dwarf,
        Race::NightElf,
        Race::Undead,
        Race::Tauren,
        Race::Gnome,
        Race::Troll,
        Race::BloodElf,
        Race::Draenei,
    ];

    /// Convert a stored race id
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.id() == id)
    }

    /// Stored race id
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Faction the race belongs to
    pub fn faction(self) -> Faction {
        match self {
            Race::Human | Race::Dwarf | Race::NightElf | Race::Gnome | Race::Draenei => {
                Faction::Alliance
            }
            Race::Orc | Race::Undead | Race::Tauren | Race::Troll | Race::BloodElf => Faction::Horde,
        }
    }
}

impl fmt::Display for Race {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Race::Human => "Human",
            Race::Orc => "Orc",
            Race::Dwarf => "Dwarf",
            Race::NightElf => "Night Elf",
            Race::Undead => "Undead",
            Race::Tauren => "Tauren",
            Race::Gnome => "Gnome",
            Race::Troll => "Troll",
            Race::BloodElf => "Blood Elf",
            Race::Draenei => "Draenei",
        };
        f.write_str(name)
    }
}

/// Character row as seen by the scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterInfo {
    pub guid: BotId,
    pub account: AccountId,
    pub name: String,
    pub race: Race,
    pub class: PlayerClass,
    pub level: u8,
}

impl CharacterInfo {
    pub fn faction(&self) -> Faction {
        self.race.faction()
    }
}

/// A point in the world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldLocation {
    pub map: u32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub orientation: f32,
}

impl WorldLocation {
    pub fn new(map: u32, x: f32, y: f32, z: f32, orientation: f32) -> Self {
        Self {
            map,
            x,
            y,
            z,
            orientation,
        }
    }

    /// Spot `distance` units in front of an NPC, lifted by `lift`, facing back at it
    pub fn in_front_of(&self, distance: f32, lift: f32) -> Self {
        Self {
            map: self.map,
            x: self.x + self.orientation.cos() * distance,
            y: self.y + self.orientation.sin() * distance,
            z: self.z + lift,
            orientation: self.orientation + std::f32::consts::PI,
        }
    }

    /// Planar distance, `None` across maps
    pub fn distance_2d(&self, other: &WorldLocation) -> Option<f32> {
        if self.map != other.map {
            return None;
        }
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        Some((dx * dx + dy * dy).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_race_faction_split() {
        let alliance: Vec<u8> = Race::ALL
            .iter()
            .filter(|r| r.faction() == Faction::Alliance)
            .map(|r| r.id())
            .collect();
        assert_eq!(alliance, vec![1, 3, 4, 7, 11]);
    }

    #[test]
    fn test_class_ids_skip_ten() {
        assert!(PlayerClass::from_id(10).is_none());
        assert_eq!(PlayerClass::from_id(6), Some(PlayerClass::DeathKnight));
        assert_eq!(PlayerClass::from_id(11), Some(PlayerClass::Druid));
    }

    #[test]
    fn test_in_front_of_faces_back() {
        let npc = WorldLocation::new(0, 10.0, 10.0, 5.0, 0.0);
        let spot = npc.in_front_of(5.0, 0.5);
        assert!((spot.x - 15.0).abs() < 1e-4);
        assert!((spot.y - 10.0).abs() < 1e-4);
        assert!((spot.z - 5.5).abs() < 1e-4);
        assert!((spot.orientation - std::f32::consts::PI).abs() < 1e-4);
    }

    #[test]
    fn test_distance_across_maps() {
        let a = WorldLocation::new(0, 0.0, 0.0, 0.0, 0.0);
        let b = WorldLocation::new(1, 3.0, 4.0, 0.0, 0.0);
        assert_eq!(a.distance_2d(&b), None);
        let c = WorldLocation::new(0, 3.0, 4.0, 0.0, 0.0);
        assert_eq!(a.distance_2d(&c), Some(5.0));
    }
}
