//! Resource totals credited when collectors consume items.

use std::collections::BTreeMap;

use gridforge_core::OreKind;

/// Per-ore resource totals.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ledger {
    totals: BTreeMap<OreKind, u64>,
}

impl Ledger {
    pub(crate) fn credit(&mut self, ore: OreKind, amount: u64) {
        let total = self.totals.entry(ore).or_insert(0);
        *total = total.saturating_add(amount);
    }

    /// Amount collected for `ore`.
    #[must_use]
    pub fn total(&self, ore: OreKind) -> u64 {
        self.totals.get(&ore).copied().unwrap_or(0)
    }

    /// Amount collected across every ore kind.
    #[must_use]
    pub fn grand_total(&self) -> u64 {
        self.totals.values().copied().fold(0, u64::saturating_add)
    }

    /// Totals in ore order, omitting kinds never collected.
    pub fn iter(&self) -> impl Iterator<Item = (OreKind, u64)> + '_ {
        self.totals.iter().map(|(ore, amount)| (*ore, *amount))
    }
}
