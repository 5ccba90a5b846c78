//! Default level brackets of questing zones, keyed by zone id.

use super::models::LevelBracket;
use std::collections::BTreeMap;

const DEFAULT_ZONE_BRACKETS: &[(u32, u8, u8)] = &[
    // Starting zones
    (1, 5, 12),
    (12, 5, 12),
    (14, 5, 12),
    (85, 5, 12),
    (141, 5, 12),
    (215, 5, 12),
    (3430, 5, 12),
    (3524, 5, 12),
    (17, 10, 25),
    (38, 10, 20),
    (40, 10, 21),
    (130, 10, 23),
    (148, 10, 21),
    (3433, 10, 22),
    (3525, 10, 21),
    (10, 19, 33),
    (11, 21, 30),
    (44, 16, 28),
    (267, 20, 34),
    (331, 18, 33),
    (400, 24, 36),
    (406, 16, 29),
    (3, 36, 46),
    (8, 36, 46),
    (15, 35, 46),
    (16, 45, 52),
    (33, 32, 47),
    (45, 30, 42),
    (47, 42, 51),
    (51, 45, 51),
    (357, 40, 52),
    (405, 30, 41),
    (440, 41, 52),
    (4, 52, 57),
    (28, 50, 60),
    (46, 51, 60),
    (139, 54, 62),
    (361, 47, 57),
    (490, 49, 56),
    (618, 54, 61),
    (1377, 54, 63),
    // Outland
    (3483, 58, 66),
    (3518, 64, 70),
    (3519, 62, 73),
    (3520, 66, 73),
    (3521, 60, 67),
    (3522, 64, 73),
    (3523, 67, 73),
    (4080, 68, 73),
    // Northrend
    (65, 71, 77),
    (66, 74, 80),
    (67, 77, 80),
    (210, 77, 80),
    (394, 72, 78),
    (495, 68, 74),
    (2817, 77, 80),
    (3537, 68, 75),
    (3711, 75, 80),
    (4197, 79, 80),
];

/// Default table with `overrides` applied on top
pub fn zone_brackets(overrides: &BTreeMap<u32, LevelBracket>) -> BTreeMap<u32, LevelBracket> {
    let mut table: BTreeMap<u32, LevelBracket> = DEFAULT_ZONE_BRACKETS
        .iter()
        .map(|&(zone, low, high)| (zone, LevelBracket::new(low, high)))
        .collect();
    table.extend(overrides.iter().map(|(zone, bracket)| (*zone, *bracket)));
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_defaults() {
        let overrides = BTreeMap::from([(12, LevelBracket::new(1, 8)), (9999, LevelBracket::new(2, 3))]);
        let table = zone_brackets(&overrides);
        assert_eq!(table[&12], LevelBracket::new(1, 8));
        assert_eq!(table[&9999], LevelBracket::new(2, 3));
        assert_eq!(table[&17], LevelBracket::new(10, 25));
    }
}
