//! Nearest palette color lookup.

use crate::{EncodedLab, NormalizedLab, PaletteEntry, PaletteStore, QuantizeError};

/// Returns the index of the color in `colors` closest to `query`.
///
/// This is a linear scan; on equal distances the earliest color wins.
/// Returns `None` only if `colors` is empty.
pub(crate) fn nearest_index(
    colors: impl IntoIterator<Item = NormalizedLab>,
    query: NormalizedLab,
) -> Option<usize> {
    let mut best = None;
    let mut min_dist = f32::INFINITY;

    for (i, color) in colors.into_iter().enumerate() {
        let dist = color.distance(query);
        // strict `<` keeps the first of equally distant colors
        if best.is_none() || dist < min_dist {
            min_dist = dist;
            best = Some(i);
        }
    }

    best
}

impl PaletteStore {
    /// Returns the index of the entry closest to `color`,
    /// or `None` if the palette is empty.
    #[must_use]
    pub fn nearest_index(&self, color: EncodedLab) -> Option<usize> {
        nearest_index(
            self.iter().map(PaletteEntry::perceptual_color_normalized),
            color.normalize(),
        )
    }

    /// Returns the entry closest to `color`.
    ///
    /// Ties are resolved in favor of the entry that was loaded first.
    ///
    /// # Errors
    /// Returns [`QuantizeError::EmptyPalette`] if the palette has no entries.
    pub fn resolve(&self, color: EncodedLab) -> Result<&PaletteEntry, QuantizeError> {
        self.nearest_index(color)
            .and_then(|i| self.get(i))
            .ok_or(QuantizeError::EmptyPalette)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{tests::*, PaletteRecord};
    use palette::Srgb;
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoroshiro128PlusPlus;

    #[test]
    fn exact_colors_resolve_to_themselves() {
        let store = rgb_palette();
        for entry in &store {
            let resolved = store.resolve(entry.perceptual_color()).unwrap();
            assert_eq!(resolved.id(), entry.id());
        }
    }

    #[test]
    fn near_colors_resolve_to_closest() {
        let store = rgb_palette();
        let dark_red = EncodedLab::from_srgb(Srgb::new(200, 30, 20));
        assert_eq!(store.resolve(dark_red).unwrap().id(), "R");
        let teal = EncodedLab::from_srgb(Srgb::new(20, 60, 230));
        assert_eq!(store.resolve(teal).unwrap().id(), "B");
    }

    #[test]
    fn empty_palette_is_an_error() {
        let store = PaletteStore::load(Vec::<PaletteRecord>::new()).unwrap();
        assert_eq!(
            store.resolve(EncodedLab::new(0, 128, 128)),
            Err(QuantizeError::EmptyPalette)
        );
        assert_eq!(store.nearest_index(EncodedLab::new(0, 128, 128)), None);
    }

    #[test]
    fn duplicate_colors_resolve_to_first_loaded() {
        let store = PaletteStore::load([
            PaletteRecord::new("4", "Red", "C91A09", "f"),
            PaletteRecord::new("36", "Trans-Red", "C91A09", "t"),
        ])
        .unwrap();

        let query = EncodedLab::from_srgb(Srgb::new(201, 26, 9));
        for _ in 0..10 {
            assert_eq!(store.resolve(query).unwrap().id(), "4");
        }
    }

    #[test]
    fn equal_distances_keep_earliest() {
        let query = NormalizedLab([50.0, 0.0, 0.0]);
        let colors = [
            NormalizedLab([50.0, 10.0, 0.0]),
            NormalizedLab([50.0, -10.0, 0.0]),
            NormalizedLab([50.0, 0.0, 10.0]),
        ];
        assert_eq!(nearest_index(colors, query), Some(0));
        assert_eq!(nearest_index(colors[1..].iter().copied(), query), Some(0));

        let closer_last = [colors[0], colors[1], NormalizedLab([50.0, 0.0, 9.0])];
        assert_eq!(nearest_index(closer_last, query), Some(2));
    }

    #[test]
    fn random_queries_always_resolve_to_a_palette_entry() {
        let store = test_palette();
        let mut rng = Xoroshiro128PlusPlus::seed_from_u64(42);

        for _ in 0..1000 {
            let query = EncodedLab::new(rng.gen(), rng.gen(), rng.gen());
            let entry = store.resolve(query).unwrap();
            assert!(store.iter().any(|e| std::ptr::eq(e, entry)));

            let best = entry.perceptual_color_normalized().distance(query.normalize());
            for other in &store {
                assert!(best <= other.perceptual_color_normalized().distance(query.normalize()));
            }
        }
    }
}
