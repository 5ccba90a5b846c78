use crate::world::BotId;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

use super::errors::EventError;

/// Kinds of TTL'd facts kept per bot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKey {
    /// Global target population (stored under bot 0)
    BotCount,
    Add,
    Update,
    Logout,
    Dead,
    Revive,
    Randomize,
    Teleport,
    ChangeStrategy,
    Level,
    BotDelete,
    BuyMultiplier,
    SellMultiplier,
    /// Discount granted to one master
    TradeDiscount(BotId),
    SpecNo,
    SpecLink,
}

impl EventKey {
    pub fn as_str(&self) -> String {
        match self {
            EventKey::BotCount => "bot_count".into(),
            EventKey::Add => "add".into(),
            EventKey::Update => "update".into(),
            EventKey::Logout => "logout".into(),
            EventKey::Dead => "dead".into(),
            EventKey::Revive => "revive".into(),
            EventKey::Randomize => "randomize".into(),
            EventKey::Teleport => "teleport".into(),
            EventKey::ChangeStrategy => "change_strategy".into(),
            EventKey::Level => "level".into(),
            EventKey::BotDelete => "bot_delete".into(),
            EventKey::BuyMultiplier => "buymultiplier".into(),
            EventKey::SellMultiplier => "sellmultiplier".into(),
            EventKey::TradeDiscount(master) => format!("trade_discount_{master}"),
            EventKey::SpecNo => "specNo".into(),
            EventKey::SpecLink => "specLink".into(),
        }
    }

    /// Keys whose value survives past its validity window
    pub fn never_expires(&self) -> bool {
        matches!(self, EventKey::SpecNo | EventKey::SpecLink)
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl FromStr for EventKey {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = match s {
            "bot_count" => EventKey::BotCount,
            "add" => EventKey::Add,
            "update" => EventKey::Update,
            "logout" => EventKey::Logout,
            "dead" => EventKey::Dead,
            "revive" => EventKey::Revive,
            "randomize" => EventKey::Randomize,
            "teleport" => EventKey::Teleport,
            "change_strategy" => EventKey::ChangeStrategy,
            "level" => EventKey::Level,
            "bot_delete" => EventKey::BotDelete,
            "buymultiplier" => EventKey::BuyMultiplier,
            "sellmultiplier" => EventKey::SellMultiplier,
            "specNo" => EventKey::SpecNo,
            "specLink" => EventKey::SpecLink,
            other => {
                let master = other
                    .strip_prefix("trade_discount_")
                    .and_then(|id| id.parse().ok())
                    .ok_or_else(|| EventError::UnknownKey(other.to_string()))?;
                EventKey::TradeDiscount(master)
            }
        };
        Ok(key)
    }
}

/// Cached event value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub value: u32,
    pub last_change: DateTime<Utc>,
    pub valid_for: u32,
    pub payload: Option<String>,
}

impl Event {
    /// Value as of `now`, 0 once the validity window has elapsed
    pub fn value_at(&self, key: EventKey, now: DateTime<Utc>) -> u32 {
        if !key.never_expires() && (now - self.last_change).num_seconds() >= i64::from(self.valid_for) {
            return 0;
        }
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_key_names_parse_back() {
        for key in [
            EventKey::BotCount,
            EventKey::ChangeStrategy,
            EventKey::TradeDiscount(42),
            EventKey::SpecNo,
        ] {
            assert_eq!(key.as_str().parse::<EventKey>().unwrap(), key);
        }
        assert!("trade_discount_x".parse::<EventKey>().is_err());
        assert!("bg".parse::<EventKey>().is_err());
    }

    #[test]
    fn test_value_expires_at_boundary() {
        let now = Utc::now();
        let event = Event {
            value: 3,
            last_change: now,
            valid_for: 10,
            payload: None,
        };
        assert_eq!(event.value_at(EventKey::Teleport, now + Duration::seconds(9)), 3);
        assert_eq!(event.value_at(EventKey::Teleport, now + Duration::seconds(10)), 0);
        assert_eq!(event.value_at(EventKey::SpecNo, now + Duration::seconds(1000)), 3);
    }

    #[test]
    fn test_zero_validity_is_expired_immediately() {
        let now = Utc::now();
        let event = Event {
            value: 1,
            last_change: now,
            valid_for: 0,
            payload: None,
        };
        assert_eq!(event.value_at(EventKey::Randomize, now), 0);
    }
}
