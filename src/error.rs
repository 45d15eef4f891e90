//! Error types returned across the crate.

use thiserror::Error;

/// An error raised while loading a palette with [`PaletteStore::load`](crate::PaletteStore::load)
/// or [`PaletteStore::from_csv_reader`](crate::PaletteStore::from_csv_reader).
///
/// `row` is the zero-based position of the offending record in the input sequence.
#[derive(Debug, Error)]
pub enum PaletteError {
    /// A record lacks one of the required fields.
    #[error("palette record {row}: missing required field `{field}`")]
    MissingField {
        /// Position of the record.
        row: usize,
        /// Name of the missing field.
        field: &'static str,
    },
    /// The color is not a 6 digit hex string.
    #[error("palette record {row}: invalid color {value:?}, expected 6 hex digits")]
    InvalidColor {
        /// Position of the record.
        row: usize,
        /// The rejected color text.
        value: String,
    },
    /// The special-attribute flag is not boolean-like.
    #[error("palette record {row}: invalid special-attribute flag {value:?}")]
    InvalidFlag {
        /// Position of the record.
        row: usize,
        /// The rejected flag text.
        value: String,
    },
    /// Two records share the same id.
    #[error("palette record {row}: duplicate id {id:?}")]
    DuplicateId {
        /// Position of the second record with this id.
        row: usize,
        /// The repeated id.
        id: String,
    },
    /// The palette table could not be read or parsed.
    #[error("failed to read palette table: {0}")]
    Table(#[from] csv::Error),
}

impl PaletteError {
    /// Whether this error is a malformed record (as opposed to a palette integrity error).
    #[must_use]
    pub fn is_malformed_record(&self) -> bool {
        !matches!(self, PaletteError::DuplicateId { .. })
    }
}

/// An error that ends a single quantization pass.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QuantizeError {
    /// There are no palette colors to match against.
    #[error("the palette is empty, there are no colors to match against")]
    EmptyPalette,
    /// The pass was cancelled before it completed.
    #[error("the quantization pass was cancelled")]
    Cancelled,
    /// The source image has no pixels but the grid does.
    #[error("cannot resample an empty {width}x{height} source image")]
    EmptySource {
        /// Source width in pixels.
        width: u32,
        /// Source height in pixels.
        height: u32,
    },
}

/// An error raised while writing a bill-of-materials report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The CSV writer failed.
    #[error("failed to write report: {0}")]
    Csv(#[from] csv::Error),
    /// The report file could not be created or replaced.
    #[error("failed to write report file: {0}")]
    Io(#[from] std::io::Error),
}

/// Any failure of a render pass, caught at the pass boundary by
/// [`MosaicSession::render`](crate::MosaicSession::render).
#[derive(Debug, Error)]
pub enum RenderFailure {
    /// Quantization failed.
    #[error(transparent)]
    Quantize(#[from] QuantizeError),
    /// The report could not be written.
    #[error(transparent)]
    Report(#[from] ReportError),
    /// The pass panicked.
    #[error("render pass panicked: {0}")]
    Panicked(String),
}

/// An error raised while parsing a [`MosaicConfig`](crate::MosaicConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML text could not be parsed.
    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
    /// A value is out of its valid range.
    #[error("invalid config: {0}")]
    Invalid(String),
}
