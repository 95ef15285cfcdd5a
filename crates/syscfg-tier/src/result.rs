//! Classification result.

use crate::tier::Tier;

/// Packages partitioned into the five tiers, each bucket sorted by name.
#[derive(Debug, Clone)]
pub struct TierMap<T> {
    buckets: [Vec<T>; 5],
}

impl<T> Default for TierMap<T> {
    fn default() -> Self {
        Self {
            buckets: [Vec::new(), Vec::new(), Vec::new(), Vec::new(), Vec::new()],
        }
    }
}

impl<T> TierMap<T> {
    pub(crate) fn push(&mut self, tier: Tier, item: T) {
        self.buckets[tier.index()].push(item);
    }

    pub(crate) fn sort_each_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&T, &T) -> std::cmp::Ordering,
    {
        for bucket in self.buckets.iter_mut() {
            bucket.sort_by(&mut compare);
        }
    }

    /// Members of one tier, in name order.
    pub fn get(&self, tier: Tier) -> &[T] {
        &self.buckets[tier.index()]
    }

    /// Iterate tiers lowest priority first, including empty ones.
    pub fn iter(&self) -> impl Iterator<Item = (Tier, &[T])> {
        Tier::ALL
            .iter()
            .map(move |tier| (*tier, self.buckets[tier.index()].as_slice()))
    }

    /// Total number of classified packages.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// True when no package was classified.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
