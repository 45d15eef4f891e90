//! A library for turning images into brick mosaics with a fixed palette.
//!
//! `brickquant` resamples an image onto a grid of square units of a physical size,
//! replaces every unit with the perceptually nearest color of a palette of real brick colors,
//! and counts how many units of each color the mosaic needs.
//!
//! Colors are compared in CIELAB (D65) using an 8-bit encoding, see [`EncodedLab`].
//!
//! # Features
//! - `threads`: exposes parallel versions of the quantization functions via [`rayon`].
//!
//! # Overview
//! A palette is loaded into a [`PaletteStore`], a [`GridPlanner`] turns a desired width into a
//! [`GridPlan`], and a [`Quantizer`] produces a [`Mosaic`] with its [`Tally`].
//! [`MosaicSession`] ties these together and keeps the last good result across passes:
//! ```no_run
//! # use brickquant::{MosaicConfig, MosaicSession, PaletteStore, RenderStatus, UnitMode};
//! # use brickquant::report::CsvFileSink;
//! # use std::sync::Arc;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let palette = PaletteStore::from_csv_reader(std::fs::File::open("colors.csv")?)?;
//! let img = image::open("some image")?.into_rgb8();
//!
//! let mut session = MosaicSession::new(Arc::new(palette), MosaicConfig::default())
//!     .with_sink(CsvFileSink::new("bom.csv"));
//!
//! // a 48 cm wide mosaic
//! if let RenderStatus::Rendered = session.render(&img, 480.0, UnitMode::Fine) {
//!     let rendered = session.last_render().expect("just rendered");
//!     println!("{} pieces", rendered.plan);
//!     rendered.mosaic.image().save("mosaic.png")?;
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::expect_used,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::many_single_char_names,
    clippy::missing_panics_doc,
    clippy::unreadable_literal,
    clippy::wildcard_imports
)]

mod color;
mod config;
mod error;
mod grid;
mod nearest;
mod palette_store;
mod quantize;
mod session;
mod tally;

pub mod report;

pub use color::*;
pub use config::*;
pub use error::*;
pub use grid::*;
pub use palette_store::*;
pub use quantize::*;
pub use session::*;
pub use tally::*;

#[cfg(test)]
mod tests;
