//! Settings for a [`MosaicSession`](crate::MosaicSession), loadable from TOML.

use crate::{ConfigError, ResampleFilter, TallyMode, BASE_UNIT_SIZE, MIN_OUTPUT_WIDTH};
use serde::{Deserialize, Serialize};

/// Mosaic settings. Missing fields take their default values.
///
/// # Examples
/// ```
/// # use brickquant::{MosaicConfig, TallyMode};
/// let config = MosaicConfig::from_toml_str(r#"
///     base_unit_size = 8.0
///     tally_mode = "first-sight-zero"
/// "#).unwrap();
/// assert_eq!(config.tally_mode, TallyMode::FirstSightZero);
/// assert_eq!(config.min_output_width, 40.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MosaicConfig {
    /// Physical size of one base unit in millimetres.
    pub base_unit_size: f64,
    /// Minimum accepted output width in millimetres.
    pub min_output_width: f64,
    /// How first occurrences are counted.
    pub tally_mode: TallyMode,
    /// Filter used to resample the source onto the grid.
    pub filter: ResampleFilter,
    /// Whether to quantize in parallel (needs the `threads` feature).
    pub parallel: bool,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            base_unit_size: BASE_UNIT_SIZE,
            min_output_width: MIN_OUTPUT_WIDTH,
            tally_mode: TallyMode::default(),
            filter: ResampleFilter::default(),
            parallel: true,
        }
    }
}

impl MosaicConfig {
    /// Parses and validates a TOML config.
    ///
    /// # Errors
    /// Returns [`ConfigError::Toml`] for malformed TOML or unknown keys
    /// and [`ConfigError::Invalid`] for out of range values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that all values are in range.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_unit_size.is_finite() && self.base_unit_size > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "base_unit_size must be positive, got {}",
                self.base_unit_size
            )));
        }
        if !(self.min_output_width.is_finite() && self.min_output_width >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "min_output_width must not be negative, got {}",
                self.min_output_width
            )));
        }
        Ok(())
    }
}
