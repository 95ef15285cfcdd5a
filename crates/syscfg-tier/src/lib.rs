//! Priority-tier classification for syscfg package sets.
//!
//! Every package contributing configuration belongs to one of five tiers.
//! Merging visits tiers lowest priority first; inside a tier, packages are
//! visited in name order so results do not depend on input order.

mod result;
mod tier;

pub use result::TierMap;
pub use tier::{Tier, UnknownTier};

/// Anything that can be placed into a tier.
pub trait Tiered {
    /// Name used for the deterministic in-tier order.
    fn name(&self) -> &str;

    /// Tier this item belongs to.
    fn tier(&self) -> Tier;
}

impl<T: Tiered + ?Sized> Tiered for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn tier(&self) -> Tier {
        (**self).tier()
    }
}

/// Partition items into tiers and sort each tier by name.
///
/// The sort is stable, so items sharing a name keep their input order.
/// The resolver rejects duplicate package names before classifying, so its
/// merge order never depends on that input order.
pub fn classify<T, I>(items: I) -> TierMap<T>
where
    T: Tiered,
    I: IntoIterator<Item = T>,
{
    let mut map = TierMap::default();
    for item in items {
        let tier = item.tier();
        map.push(tier, item);
    }
    map.sort_each_by(|a, b| a.name().cmp(b.name()));
    map
}
