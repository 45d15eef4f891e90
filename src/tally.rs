//! Per-palette-entry usage counts of a quantization pass.

use crate::PaletteEntry;
use serde::{Deserialize, Serialize};

/// How the first occurrence of a palette entry is counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TallyMode {
    /// Every occurrence is counted, so the counts sum to the number of grid cells.
    #[default]
    Exact,
    /// The first occurrence creates the entry with a count of `0` and is not counted,
    /// so each present entry reports one less than its number of occurrences.
    FirstSightZero,
}

/// A palette entry and the number of grid cells assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct TallyItem {
    /// A copy of the palette entry's descriptive fields.
    pub entry: PaletteEntry,
    /// The number of cells (see [`TallyMode`]).
    pub count: u64,
}

/// Usage counts keyed by palette entry, in first-seen order.
///
/// Only entries that were actually used are present.
#[derive(Debug, Clone, PartialEq)]
pub struct Tally {
    /// The used entries in first-seen order.
    items: Vec<TallyItem>,
    /// For each palette index, the position of its item in `items`.
    slots: Vec<Option<usize>>,
    /// How first occurrences are counted.
    mode: TallyMode,
}

impl Tally {
    /// Creates an empty tally for a palette with `palette_len` entries.
    #[must_use]
    pub fn new(palette_len: usize, mode: TallyMode) -> Self {
        Self {
            items: Vec::new(),
            slots: vec![None; palette_len],
            mode,
        }
    }

    /// Records one use of `entry`, the entry at `index` in its palette.
    pub(crate) fn record(&mut self, index: usize, entry: &PaletteEntry) {
        if let Some(pos) = self.slots[index] {
            self.items[pos].count += 1;
        } else {
            let count = match self.mode {
                TallyMode::Exact => 1,
                TallyMode::FirstSightZero => 0,
            };
            self.slots[index] = Some(self.items.len());
            self.items.push(TallyItem { entry: entry.clone(), count });
        }
    }

    /// The used entries in first-seen order.
    #[must_use]
    pub fn items(&self) -> &[TallyItem] {
        &self.items
    }

    /// Iterates over the used entries in first-seen order.
    pub fn iter(&self) -> std::slice::Iter<'_, TallyItem> {
        self.items.iter()
    }

    /// The count for the entry with the given id, or `None` if it was never used.
    #[must_use]
    pub fn count(&self, id: &str) -> Option<u64> {
        self.items
            .iter()
            .find(|item| item.entry.id() == id)
            .map(|item| item.count)
    }

    /// The sum of all counts.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.items.iter().map(|item| item.count).sum()
    }

    /// The number of distinct entries used.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no entry was used.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The counting mode of this tally.
    #[must_use]
    pub fn mode(&self) -> TallyMode {
        self.mode
    }
}

impl<'a> IntoIterator for &'a Tally {
    type Item = &'a TallyItem;
    type IntoIter = std::slice::Iter<'a, TallyItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::*;

    fn record_all(mode: TallyMode, indices: &[usize]) -> Tally {
        let store = rgb_palette();
        let mut tally = Tally::new(store.len(), mode);
        for &i in indices {
            tally.record(i, &store.entries()[i]);
        }
        tally
    }

    #[test]
    fn keeps_first_seen_order() {
        let tally = record_all(TallyMode::Exact, &[2, 0, 2, 1, 0]);
        let ids = tally.iter().map(|item| item.entry.id()).collect::<Vec<_>>();
        assert_eq!(ids, ["B", "R", "G"]);
        assert_eq!(tally.count("B"), Some(2));
        assert_eq!(tally.count("G"), Some(1));
        assert_eq!(tally.total(), 5);
    }

    #[test]
    fn first_sight_zero_undercounts_by_one() {
        let tally = record_all(TallyMode::FirstSightZero, &[2, 0, 2, 1, 0]);
        assert_eq!(tally.count("B"), Some(1));
        assert_eq!(tally.count("R"), Some(1));
        assert_eq!(tally.count("G"), Some(0));
        assert_eq!(tally.total(), 2);
    }

    #[test]
    fn unused_entries_are_absent() {
        let tally = record_all(TallyMode::Exact, &[1, 1]);
        assert_eq!(tally.len(), 1);
        assert_eq!(tally.count("R"), None);

        let empty = record_all(TallyMode::Exact, &[]);
        assert!(empty.is_empty());
        assert_eq!(empty.total(), 0);
    }
}
