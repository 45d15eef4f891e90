//! Shared fixtures for unit tests.

use crate::{PaletteRecord, PaletteStore, Tally};
use image::{Rgb, RgbImage};

/// A palette of opaque colors from `(id, name, hex)` triples.
fn palette(colors: &[(&str, &str, &str)]) -> PaletteStore {
    PaletteStore::load(
        colors
            .iter()
            .map(|&(id, name, rgb)| PaletteRecord::new(id, name, rgb, "f")),
    )
    .unwrap()
}

/// Pure red and green, with ids `R` and `G`.
pub fn rg_palette() -> PaletteStore {
    palette(&[("R", "Red", "FF0000"), ("G", "Green", "00FF00")])
}

/// Pure red, green, and blue, with ids `R`, `G`, and `B`.
pub fn rgb_palette() -> PaletteStore {
    palette(&[
        ("R", "Red", "FF0000"),
        ("G", "Green", "00FF00"),
        ("B", "Blue", "0000FF"),
    ])
}

/// Well separated colors, none sharing an 8-bit Lab encoding.
pub fn test_palette() -> PaletteStore {
    palette(&[
        ("0", "Black", "000000"),
        ("1", "White", "FFFFFF"),
        ("2", "Red", "FF0000"),
        ("3", "Green", "00FF00"),
        ("4", "Blue", "0000FF"),
        ("5", "Yellow", "FFFF00"),
        ("6", "Cyan", "00FFFF"),
        ("7", "Magenta", "FF00FF"),
        ("8", "Gray", "808080"),
        ("9", "Orange", "FF8000"),
        ("10", "Purple", "800080"),
        ("11", "Brown", "804000"),
        ("12", "Navy", "000080"),
        ("13", "Dark Green", "008000"),
    ])
}

/// An image with the given pixels in row-major order.
pub fn image_from(width: u32, height: u32, pixels: &[[u8; 3]]) -> RgbImage {
    assert_eq!(pixels.len(), (width * height) as usize);
    RgbImage::from_fn(width, height, |x, y| Rgb(pixels[(y * width + x) as usize]))
}

/// The ids and counts of `tally`, in tally order.
pub fn tally_counts(tally: &Tally) -> Vec<(&str, u64)> {
    tally
        .iter()
        .map(|item| (item.entry.id(), item.count))
        .collect()
}
