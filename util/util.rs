#![allow(dead_code)]

use std::{fs::File, path::Path, sync::OnceLock};

use brickquant::PaletteStore;
use image::{Rgb, RgbImage};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoroshiro128PlusPlus;

pub const PALETTE_PATH: &str = "data/colors.csv";

pub fn load_palette() -> PaletteStore {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(PALETTE_PATH);
    let file = File::open(&path).expect("opened palette file");
    PaletteStore::from_csv_reader(file).expect("loaded palette")
}

/// A smooth gradient with some noise, closer to a photo than pure noise.
pub fn gradient_image(width: u32, height: u32, seed: u64) -> RgbImage {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
    RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        let b = ((x + y) * 255 / (width + height).max(1)) as u8;
        let noise = rng.gen_range(0..16);
        Rgb([r.saturating_add(noise), g.saturating_add(noise), b.saturating_sub(noise)])
    })
}

pub fn noise_image(width: u32, height: u32, seed: u64) -> RgbImage {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
    RgbImage::from_fn(width, height, |_, _| Rgb(rng.gen()))
}

static PALETTE: OnceLock<PaletteStore> = OnceLock::new();

pub fn palette() -> &'static PaletteStore {
    PALETTE.get_or_init(load_palette)
}

static BENCHMARK_IMAGES: OnceLock<Vec<(String, RgbImage)>> = OnceLock::new();

pub fn load_benchmark_images() -> Vec<(String, RgbImage)> {
    vec![
        ("gradient 1920x1080".to_owned(), gradient_image(1920, 1080, 0)),
        ("noise 1024x768".to_owned(), noise_image(1024, 768, 1)),
    ]
}

pub fn benchmark_images() -> &'static [(String, RgbImage)] {
    BENCHMARK_IMAGES.get_or_init(load_benchmark_images)
}
