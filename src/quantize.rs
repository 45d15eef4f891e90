//! Resampling an image onto the unit grid and replacing every cell with its nearest palette color.
//!
//! The source image is resampled to the grid dimensions first and colors are matched on the
//! resampled pixels, not on an aggregate of the source region each cell covers.

use crate::{EncodedLab, GridPlan, PaletteStore, QuantizeError, Tally, TallyMode};
use image::{imageops, RgbImage};
use palette::{
    cast::{ComponentsAs, IntoComponents},
    Srgb,
};
#[cfg(feature = "threads")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

/// The interpolation filter used to resample the source image onto the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResampleFilter {
    /// Nearest neighbor.
    Nearest,
    /// Linear.
    Triangle,
    /// Cubic (Catmull-Rom).
    #[default]
    CatmullRom,
    /// Lanczos with window 3.
    Lanczos3,
}

impl From<ResampleFilter> for imageops::FilterType {
    fn from(filter: ResampleFilter) -> Self {
        match filter {
            ResampleFilter::Nearest => imageops::FilterType::Nearest,
            ResampleFilter::Triangle => imageops::FilterType::Triangle,
            ResampleFilter::CatmullRom => imageops::FilterType::CatmullRom,
            ResampleFilter::Lanczos3 => imageops::FilterType::Lanczos3,
        }
    }
}

/// Resamples `source` to `width` x `height`.
///
/// An image that already has the target size is copied unchanged,
/// and a zero-area target gives an empty image.
///
/// # Errors
/// Returns [`QuantizeError::EmptySource`] if `source` has no pixels but the target does.
pub fn resample(
    source: &RgbImage,
    (width, height): (u32, u32),
    filter: ResampleFilter,
) -> Result<RgbImage, QuantizeError> {
    if width == 0 || height == 0 {
        return Ok(RgbImage::new(width, height));
    }

    let (source_width, source_height) = source.dimensions();
    if source_width == 0 || source_height == 0 {
        return Err(QuantizeError::EmptySource {
            width: source_width,
            height: source_height,
        });
    }

    if (source_width, source_height) == (width, height) {
        Ok(source.clone())
    } else {
        Ok(imageops::resize(source, width, height, filter.into()))
    }
}

/// The pixels of `grid` as a flat slice of colors.
fn grid_pixels(grid: &RgbImage) -> &[Srgb<u8>] {
    let len = grid.pixels().len() * 3;
    grid.as_raw()[..len].components_as()
}

/// The result of a quantization pass.
#[derive(Debug, Clone)]
pub struct Mosaic {
    /// The recolored grid, one pixel per unit.
    image: RgbImage,
    /// The palette index of each cell in row-major order.
    indices: Vec<usize>,
    /// The usage count of each palette entry.
    tally: Tally,
}

impl Mosaic {
    /// The recolored grid image, one pixel per unit, using each entry's palette color.
    #[must_use]
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// The palette index of each cell in row-major order.
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// The usage counts.
    #[must_use]
    pub fn tally(&self) -> &Tally {
        &self.tally
    }

    /// Splits the mosaic into its grid image and tally.
    #[must_use]
    pub fn into_parts(self) -> (RgbImage, Tally) {
        (self.image, self.tally)
    }
}

/// Quantizes images onto the unit grid using a fixed palette.
///
/// # Examples
/// ```
/// # use brickquant::{GridPlan, PaletteRecord, PaletteStore, Quantizer, UnitMode};
/// # use image::RgbImage;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let palette = PaletteStore::load([
///     PaletteRecord::new("R", "Red", "FF0000", "f"),
///     PaletteRecord::new("G", "Green", "00FF00", "f"),
/// ])?;
///
/// let source = RgbImage::from_pixel(64, 32, image::Rgb([250, 10, 10]));
/// let plan = GridPlan::compute(80.0, UnitMode::Fine, 2.0, 8.0);
///
/// let mosaic = Quantizer::new(&palette).quantize(&source, &plan)?;
/// assert_eq!(mosaic.image().dimensions(), (10, 5));
/// assert_eq!(mosaic.tally().count("R"), Some(50));
/// # Ok(())
/// # }
/// ```
#[must_use]
#[derive(Debug, Clone, Copy)]
pub struct Quantizer<'a> {
    /// The palette to match against.
    palette: &'a PaletteStore,
    /// How first occurrences are counted.
    tally_mode: TallyMode,
    /// The resampling filter.
    filter: ResampleFilter,
    /// Set to `true` to abandon an in-flight pass.
    cancel: Option<&'a AtomicBool>,
}

impl<'a> Quantizer<'a> {
    /// Creates a [`Quantizer`] with exact counting and cubic resampling.
    pub fn new(palette: &'a PaletteStore) -> Self {
        Self {
            palette,
            tally_mode: TallyMode::default(),
            filter: ResampleFilter::default(),
            cancel: None,
        }
    }

    /// Sets how first occurrences are counted.
    ///
    /// The default is [`TallyMode::Exact`].
    pub fn tally_mode(mut self, tally_mode: TallyMode) -> Self {
        self.tally_mode = tally_mode;
        self
    }

    /// Sets the resampling filter.
    ///
    /// The default is [`ResampleFilter::CatmullRom`].
    pub fn filter(mut self, filter: ResampleFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Sets a flag that is polled once per grid row.
    /// Once it reads `true` the pass stops with [`QuantizeError::Cancelled`].
    pub fn cancel_flag(mut self, cancel: &'a AtomicBool) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Fails if there is nothing to match against.
    fn check_palette(&self) -> Result<(), QuantizeError> {
        if self.palette.is_empty() {
            Err(QuantizeError::EmptyPalette)
        } else {
            Ok(())
        }
    }

    /// Whether the cancel flag has been raised.
    fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|cancel| cancel.load(Ordering::Relaxed))
    }

    /// Maps one row of grid pixels to palette indices.
    fn remap_row(&self, row: &[Srgb<u8>]) -> Result<Vec<usize>, QuantizeError> {
        if self.is_cancelled() {
            return Err(QuantizeError::Cancelled);
        }

        crate::color::encode_pixels(row)
            .into_iter()
            .map(|lab: EncodedLab| {
                self.palette
                    .nearest_index(lab)
                    .ok_or(QuantizeError::EmptyPalette)
            })
            .collect()
    }

    /// Builds the recolored image and the tally from the cell indices.
    fn assemble(&self, (width, height): (u32, u32), indices: Vec<usize>) -> Mosaic {
        let entries = self.palette.entries();

        let mut tally = Tally::new(entries.len(), self.tally_mode);
        for &i in &indices {
            tally.record(i, &entries[i]);
        }

        let buf = indices
            .iter()
            .map(|&i| entries[i].source_color())
            .collect::<Vec<_>>()
            .into_components();

        #[allow(clippy::expect_used)]
        let image = {
            // indices.len() is width * height, so buf is large enough by construction
            RgbImage::from_vec(width, height, buf).expect("large enough buffer")
        };

        log::debug!("quantized {width}x{height} grid into {} palette colors", tally.len());

        Mosaic { image, indices, tally }
    }

    /// Resamples `source` onto the grid of `plan` and quantizes it.
    ///
    /// # Errors
    /// Returns [`QuantizeError::EmptyPalette`] if the palette is empty,
    /// [`QuantizeError::EmptySource`] if `source` has no pixels but the grid does,
    /// and [`QuantizeError::Cancelled`] if the pass was cancelled.
    pub fn quantize(&self, source: &RgbImage, plan: &GridPlan) -> Result<Mosaic, QuantizeError> {
        self.check_palette()?;
        let grid = resample(source, plan.dimensions(), self.filter)?;
        self.quantize_grid(&grid)
    }

    /// Quantizes an image that already has one pixel per grid unit.
    ///
    /// Cells are visited in row-major order, so tally entries appear in the order
    /// their colors are first seen.
    ///
    /// # Errors
    /// Returns [`QuantizeError::EmptyPalette`] if the palette is empty
    /// and [`QuantizeError::Cancelled`] if the pass was cancelled.
    pub fn quantize_grid(&self, grid: &RgbImage) -> Result<Mosaic, QuantizeError> {
        self.check_palette()?;

        let (width, height) = grid.dimensions();
        let pixels = grid_pixels(grid);

        let mut indices = Vec::with_capacity(pixels.len());
        if width > 0 {
            for row in pixels.chunks_exact(width as usize) {
                indices.extend(self.remap_row(row)?);
            }
        }

        Ok(self.assemble((width, height), indices))
    }
}

#[cfg(feature = "threads")]
impl<'a> Quantizer<'a> {
    /// Resamples `source` onto the grid of `plan` and quantizes it in parallel.
    ///
    /// The result is identical to [`Quantizer::quantize`].
    ///
    /// # Errors
    /// See [`Quantizer::quantize`].
    pub fn quantize_par(
        &self,
        source: &RgbImage,
        plan: &GridPlan,
    ) -> Result<Mosaic, QuantizeError> {
        self.check_palette()?;
        let grid = resample(source, plan.dimensions(), self.filter)?;
        self.quantize_grid_par(&grid)
    }

    /// Quantizes an image that already has one pixel per grid unit, matching rows in parallel.
    ///
    /// Rows are matched independently and joined back in row-major order before counting,
    /// so the tally order is the same first-seen order as [`Quantizer::quantize_grid`].
    ///
    /// # Errors
    /// See [`Quantizer::quantize_grid`].
    pub fn quantize_grid_par(&self, grid: &RgbImage) -> Result<Mosaic, QuantizeError> {
        self.check_palette()?;

        let (width, height) = grid.dimensions();
        let pixels = grid_pixels(grid);

        let indices = if width > 0 {
            pixels
                .par_chunks_exact(width as usize)
                .map(|row| self.remap_row(row))
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .flatten()
                .collect()
        } else {
            Vec::new()
        };

        Ok(self.assemble((width, height), indices))
    }
}
