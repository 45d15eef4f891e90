//! Planning of the unit grid from a desired physical output size.
//!
//! All physical measurements are in millimetres.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// The default physical size of one grid unit (one stud), in millimetres.
pub const BASE_UNIT_SIZE: f64 = 8.0;

/// The default minimum accepted output width, in millimetres.
pub const MIN_OUTPUT_WIDTH: f64 = 40.0;

/// The minimum unit dimension setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitMode {
    /// One grid unit is one base unit.
    #[default]
    Fine,
    /// One grid unit is two base units wide and high.
    Coarse,
}

impl UnitMode {
    /// The size of one grid unit for the given base unit size.
    #[must_use]
    pub fn unit_size(self, base_unit_size: f64) -> f64 {
        match self {
            UnitMode::Fine => base_unit_size,
            UnitMode::Coarse => base_unit_size * 2.0,
        }
    }
}

/// The integer unit grid and the physical footprint it covers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridPlan {
    /// Number of units across.
    pub unit_count_width: u32,
    /// Number of units down.
    pub unit_count_height: u32,
    /// Physical size of one unit.
    pub unit_size: f64,
    /// `unit_count_width * unit_size`.
    pub physical_width: f64,
    /// `unit_count_height * unit_size`.
    pub physical_height: f64,
}

impl GridPlan {
    /// Computes the grid for an output of `output_width` at the given source aspect ratio
    /// (width / height).
    ///
    /// Unit counts are floored, so a dimension smaller than one unit yields `0` units.
    /// The physical size is recomputed from the unit counts and
    /// so reflects the actual grid rather than the requested width.
    #[must_use]
    pub fn compute(
        output_width: f64,
        mode: UnitMode,
        aspect_ratio: f64,
        base_unit_size: f64,
    ) -> Self {
        let output_height = output_width / aspect_ratio;
        let unit_size = mode.unit_size(base_unit_size);

        let unit_count_width = floor_units(output_width, unit_size);
        let unit_count_height = floor_units(output_height, unit_size);

        Self {
            unit_count_width,
            unit_count_height,
            unit_size,
            physical_width: f64::from(unit_count_width) * unit_size,
            physical_height: f64::from(unit_count_height) * unit_size,
        }
    }

    /// The grid dimensions as `(width, height)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.unit_count_width, self.unit_count_height)
    }

    /// The total number of units (pieces) in the grid.
    #[must_use]
    pub fn pieces(&self) -> u64 {
        u64::from(self.unit_count_width) * u64::from(self.unit_count_height)
    }

    /// Whether the grid has no units at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pieces() == 0
    }
}

impl Display for GridPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}x{})",
            self.pieces(),
            self.unit_count_width,
            self.unit_count_height
        )
    }
}

/// Floors `length / unit` into a unit count. Negative or NaN lengths give `0`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn floor_units(length: f64, unit: f64) -> u32 {
    // `as` saturates
    (length / unit).floor() as u32
}

/// Why [`GridPlanner::plan`] did not produce a new plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// The desired width is below the minimum output width.
    BelowMinimum,
    /// The desired width equals the last accepted width.
    Unchanged,
}

impl Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::BelowMinimum => write!(f, "desired width is below the minimum"),
            Rejection::Unchanged => write!(f, "desired width is unchanged"),
        }
    }
}

/// The result of [`GridPlanner::plan`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlanOutcome {
    /// A new plan was computed.
    Accepted(GridPlan),
    /// No new plan; the previous one stays in effect.
    Rejected(Rejection),
}

impl PlanOutcome {
    /// The accepted plan, if any.
    #[must_use]
    pub fn accepted(self) -> Option<GridPlan> {
        match self {
            PlanOutcome::Accepted(plan) => Some(plan),
            PlanOutcome::Rejected(_) => None,
        }
    }
}

/// Plans unit grids, suppressing recomputation when the desired width has not changed.
///
/// The last accepted desired width is the only state kept between calls.
#[derive(Debug, Clone)]
pub struct GridPlanner {
    /// Physical size of one base unit.
    base_unit_size: f64,
    /// Minimum accepted desired width.
    min_output_width: f64,
    /// The last accepted desired width.
    previous_desired_width: Option<f64>,
}

impl GridPlanner {
    /// Creates a planner with the given base unit size and minimum output width.
    #[must_use]
    pub const fn new(base_unit_size: f64, min_output_width: f64) -> Self {
        Self {
            base_unit_size,
            min_output_width,
            previous_desired_width: None,
        }
    }

    /// Plans the grid for `desired_width`.
    ///
    /// Returns [`Rejection::Unchanged`] if `desired_width` equals the last accepted width,
    /// even if `mode` or `aspect_ratio` differ, and [`Rejection::BelowMinimum`] if it is below
    /// the minimum output width. A rejected call does not change the planner's state.
    pub fn plan(&mut self, desired_width: f64, mode: UnitMode, aspect_ratio: f64) -> PlanOutcome {
        #[allow(clippy::float_cmp)]
        if self.previous_desired_width == Some(desired_width) {
            log::debug!("skipping plan, desired width {desired_width} is unchanged");
            return PlanOutcome::Rejected(Rejection::Unchanged);
        }

        if desired_width.is_nan() || desired_width < self.min_output_width {
            log::debug!(
                "skipping plan, desired width {desired_width} is below {}",
                self.min_output_width
            );
            return PlanOutcome::Rejected(Rejection::BelowMinimum);
        }

        self.previous_desired_width = Some(desired_width);

        let plan = GridPlan::compute(desired_width, mode, aspect_ratio, self.base_unit_size);
        log::debug!(
            "planned {}x{} grid with unit size {}",
            plan.unit_count_width,
            plan.unit_count_height,
            plan.unit_size
        );
        PlanOutcome::Accepted(plan)
    }

    /// The last accepted desired width.
    #[must_use]
    pub fn previous_desired_width(&self) -> Option<f64> {
        self.previous_desired_width
    }

    /// Forgets the last accepted width, so that the next call to [`GridPlanner::plan`]
    /// recomputes even for an unchanged width.
    pub fn reset(&mut self) {
        self.previous_desired_width = None;
    }
}

impl Default for GridPlanner {
    fn default() -> Self {
        Self::new(BASE_UNIT_SIZE, MIN_OUTPUT_WIDTH)
    }
}
