//! Faction quota split and phased login allocation.

use crate::world::BotId;
use rand::Rng;

/// Characters picked for login this round
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allocation {
    pub alliance: Vec<BotId>,
    pub horde: Vec<BotId>,
    /// Part of the requested total no eligible character could cover
    pub unmet: u32,
}

impl Allocation {
    pub fn len(&self) -> usize {
        self.alliance.len() + self.horde.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Alliance picks first, then horde
    pub fn guids(&self) -> impl Iterator<Item = BotId> + '_ {
        self.alliance.iter().chain(&self.horde).copied()
    }
}

/// Alliance share of `total` for the configured ratio.
///
/// The fractional remainder is granted with probability proportional to its
/// size, so repeated calls do not always round the same way.
pub fn split_quota<R: Rng + ?Sized>(total: u32, alliance_ratio: u32, horde_ratio: u32, rng: &mut R) -> u32 {
    let ratio_sum = u64::from(alliance_ratio) + u64::from(horde_ratio);
    if ratio_sum == 0 {
        return 0;
    }
    let scaled = u64::from(total) * u64::from(alliance_ratio);
    let mut alliance = scaled / ratio_sum;
    let remainder = scaled % ratio_sum;
    if remainder > 0 && rng.random_range(1..=ratio_sum) <= remainder {
        alliance += 1;
    }
    alliance.min(u64::from(total)) as u32
}

/// Pick characters for login.
///
/// Alliance candidates fill the alliance quota, horde candidates fill what
/// is left of `total`, then remaining alliance candidates make up for a
/// horde shortage. Candidate order is preserved within each faction.
///
/// # Arguments
///
/// * `alliance` - Eligible alliance characters, already shuffled
/// * `horde` - Eligible horde characters, already shuffled
/// * `total` - Characters wanted this round
/// * `alliance_quota` - Alliance share of `total`
pub fn allocate(alliance: &[BotId], horde: &[BotId], total: u32, alliance_quota: u32) -> Allocation {
    let total = total as usize;
    let quota = (alliance_quota as usize).min(total);

    let first = quota.min(alliance.len());
    let horde_take = (total - first).min(horde.len());
    let extra = (total - first - horde_take).min(alliance.len() - first);

    let picked = first + horde_take + extra;
    Allocation {
        alliance: alliance[..first + extra].to_vec(),
        horde: horde[..horde_take].to_vec(),
        unmet: (total - picked) as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_even_split() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(split_quota(10, 50, 50, &mut rng), 5);
        assert_eq!(split_quota(0, 50, 50, &mut rng), 0);
        assert_eq!(split_quota(10, 0, 0, &mut rng), 0);
        assert_eq!(split_quota(10, 100, 0, &mut rng), 10);
    }

    #[test]
    fn test_extreme_ratios_do_not_overflow() {
        let mut rng = StdRng::seed_from_u64(9);
        assert_eq!(split_quota(10, u32::MAX, 0, &mut rng), 10);
        assert_eq!(split_quota(10, 0, u32::MAX, &mut rng), 0);
        assert!(split_quota(u32::MAX, u32::MAX, u32::MAX, &mut rng) >= u32::MAX / 2);
    }

    #[test]
    fn test_remainder_goes_both_ways() {
        let mut rng = StdRng::seed_from_u64(42);
        let results: Vec<u32> = (0..200).map(|_| split_quota(1, 50, 50, &mut rng)).collect();
        assert!(results.contains(&0));
        assert!(results.contains(&1));
    }

    #[test]
    fn test_phases_in_order() {
        let alliance = [1, 2, 3, 4, 5, 6];
        let horde = [10, 11];
        let allocation = allocate(&alliance, &horde, 6, 3);
        // Phase 1 takes 3 alliance, phase 2 both horde, phase 3 one more alliance
        assert_eq!(allocation.alliance, vec![1, 2, 3, 4]);
        assert_eq!(allocation.horde, vec![10, 11]);
        assert_eq!(allocation.unmet, 0);
    }

    #[test]
    fn test_horde_covers_alliance_shortage() {
        let allocation = allocate(&[1], &[10, 11, 12, 13], 4, 2);
        assert_eq!(allocation.alliance, vec![1]);
        assert_eq!(allocation.horde, vec![10, 11, 12]);
        assert_eq!(allocation.unmet, 0);
    }

    #[test]
    fn test_unmet_reported() {
        let allocation = allocate(&[1], &[10], 5, 2);
        assert_eq!(allocation.len(), 2);
        assert_eq!(allocation.unmet, 3);
        assert_eq!(allocation.guids().collect::<Vec<_>>(), vec![1, 10]);
    }

    proptest! {
        #[test]
        fn prop_allocation_fills_what_it_can(
            alliance_count in 0usize..40,
            horde_count in 0usize..40,
            total in 0u32..60,
            quota_pct in 0u32..=100,
        ) {
            let alliance: Vec<BotId> = (0..alliance_count as u32).collect();
            let horde: Vec<BotId> = (1000..1000 + horde_count as u32).collect();
            let quota = total * quota_pct / 100;
            let allocation = allocate(&alliance, &horde, total, quota);

            let expected = (total as usize).min(alliance_count + horde_count);
            prop_assert_eq!(allocation.len(), expected);
            prop_assert!(allocation.len() <= total as usize);
            prop_assert_eq!(allocation.unmet as usize, total as usize - expected);
            prop_assert!(allocation.alliance.iter().all(|g| alliance.contains(g)));
            prop_assert!(allocation.horde.iter().all(|g| horde.contains(g)));
        }

        #[test]
        fn prop_split_within_total(total in 0u32..500, a in 0u32..100, h in 1u32..100, seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let alliance = split_quota(total, a, h, &mut rng);
            prop_assert!(alliance <= total);
            let floor = (u64::from(total) * u64::from(a) / u64::from(a + h)) as u32;
            prop_assert!(alliance == floor || alliance == floor + 1);
        }
    }
}
