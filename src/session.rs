//! The render pass boundary: planning, quantizing, reporting, and keeping the last good result.

use crate::{
    report::BomSink, GridPlan, GridPlanner, Mosaic, MosaicConfig, PaletteStore, PlanOutcome,
    Quantizer, Rejection, RenderFailure, UnitMode,
};
use image::RgbImage;
use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::{atomic::AtomicBool, Arc},
};

/// A completed render pass.
#[derive(Debug, Clone)]
pub struct Rendered {
    /// The grid the source was quantized onto.
    pub plan: GridPlan,
    /// The quantized grid and its tally.
    pub mosaic: Mosaic,
}

/// The outcome of [`MosaicSession::render`].
#[derive(Debug)]
pub enum RenderStatus {
    /// A new render replaced the previous one.
    Rendered,
    /// The planner rejected the input; the previous render stays current.
    Unchanged(Rejection),
    /// The pass failed; the previous render and report stay current.
    Failed(RenderFailure),
}

/// Runs render passes for a palette and keeps the result of the last successful one.
///
/// A pass either completes, replacing the last render and writing a new report,
/// or leaves both untouched. Failures are logged and returned, never propagated as panics.
pub struct MosaicSession {
    /// The palette shared with the caller. Replaced wholesale, never mutated.
    palette: Arc<PaletteStore>,
    /// Session settings.
    config: MosaicConfig,
    /// Plans grids and remembers the last accepted width.
    planner: GridPlanner,
    /// Receives the report of each completed pass.
    sink: Option<Box<dyn BomSink>>,
    /// The last successful render.
    last: Option<Rendered>,
}

impl MosaicSession {
    /// Creates a session for `palette` with the given settings.
    #[must_use]
    pub fn new(palette: Arc<PaletteStore>, config: MosaicConfig) -> Self {
        let planner = GridPlanner::new(config.base_unit_size, config.min_output_width);
        Self {
            palette,
            config,
            planner,
            sink: None,
            last: None,
        }
    }

    /// Sets where the report of each completed pass is written.
    #[must_use]
    pub fn with_sink(mut self, sink: impl BomSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// The current palette.
    #[must_use]
    pub fn palette(&self) -> &Arc<PaletteStore> {
        &self.palette
    }

    /// The session settings.
    #[must_use]
    pub fn config(&self) -> &MosaicConfig {
        &self.config
    }

    /// The last successful render, if any.
    #[must_use]
    pub fn last_render(&self) -> Option<&Rendered> {
        self.last.as_ref()
    }

    /// Replaces the palette. The next pass recomputes even if the width is unchanged.
    pub fn set_palette(&mut self, palette: Arc<PaletteStore>) {
        self.palette = palette;
        self.planner.reset();
    }

    /// Forgets the last accepted width, so that the next pass recomputes even if the width
    /// is unchanged. Call this after loading a new source image.
    pub fn reset_debounce(&mut self) {
        self.planner.reset();
    }

    /// Runs a render pass for `source` at `desired_width` millimetres.
    pub fn render(
        &mut self,
        source: &RgbImage,
        desired_width: f64,
        mode: UnitMode,
    ) -> RenderStatus {
        self.render_inner(source, desired_width, mode, None)
    }

    /// Like [`MosaicSession::render`], but the pass is abandoned once `cancel` reads `true`.
    /// An abandoned pass reports [`QuantizeError::Cancelled`](crate::QuantizeError::Cancelled)
    /// and surfaces no partial result.
    pub fn render_cancellable(
        &mut self,
        source: &RgbImage,
        desired_width: f64,
        mode: UnitMode,
        cancel: &AtomicBool,
    ) -> RenderStatus {
        self.render_inner(source, desired_width, mode, Some(cancel))
    }

    /// Plans the grid and runs the pass.
    fn render_inner(
        &mut self,
        source: &RgbImage,
        desired_width: f64,
        mode: UnitMode,
        cancel: Option<&AtomicBool>,
    ) -> RenderStatus {
        let (width, height) = source.dimensions();
        let aspect_ratio = f64::from(width) / f64::from(height);

        let plan = match self.planner.plan(desired_width, mode, aspect_ratio) {
            PlanOutcome::Accepted(plan) => plan,
            PlanOutcome::Rejected(rejection) => {
                match rejection {
                    Rejection::BelowMinimum => log::warn!("render skipped: {rejection}"),
                    Rejection::Unchanged => log::debug!("render skipped: {rejection}"),
                }
                return RenderStatus::Unchanged(rejection);
            }
        };

        match self.run_pass(source, &plan, cancel) {
            Ok(mosaic) => {
                log::info!("rendered {plan} pieces in {} colors", mosaic.tally().len());
                self.last = Some(Rendered { plan, mosaic });
                RenderStatus::Rendered
            }
            Err(failure) => {
                log::warn!("render failed, keeping previous result: {failure}");
                RenderStatus::Failed(failure)
            }
        }
    }

    /// Quantizes and reports, catching any panic.
    fn run_pass(
        &mut self,
        source: &RgbImage,
        plan: &GridPlan,
        cancel: Option<&AtomicBool>,
    ) -> Result<Mosaic, RenderFailure> {
        let palette: &PaletteStore = &self.palette;
        let config = &self.config;
        let sink = &mut self.sink;

        let pass = || -> Result<Mosaic, RenderFailure> {
            let mut quantizer = Quantizer::new(palette)
                .tally_mode(config.tally_mode)
                .filter(config.filter);
            if let Some(cancel) = cancel {
                quantizer = quantizer.cancel_flag(cancel);
            }

            #[cfg(feature = "threads")]
            let mosaic = if config.parallel {
                quantizer.quantize_par(source, plan)?
            } else {
                quantizer.quantize(source, plan)?
            };
            #[cfg(not(feature = "threads"))]
            let mosaic = quantizer.quantize(source, plan)?;

            if let Some(sink) = sink {
                sink.write(mosaic.tally())?;
            }
            Ok(mosaic)
        };

        panic::catch_unwind(AssertUnwindSafe(pass))
            .unwrap_or_else(|payload| Err(RenderFailure::Panicked(panic_message(&*payload))))
    }
}

/// Extracts the message of a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}
