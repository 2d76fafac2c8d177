use crate::{
    core::{FrameNumber, Resolution},
    error::MaskweaveResult,
    settings::{params_for, EngineParams, QualityTier},
};

/// The external rendering engine.
///
/// `render` blocks until every file for the currently wired compositor output
/// slots has been written, with `#` in each slot template expanded to the
/// frame number. The core issues at most one render at a time and never
/// changes compositor wiring while a render is in flight. There is no
/// cancellation or timeout: a hung render blocks the pipeline, and any
/// timeout policy belongs to the invoker.
pub trait RenderEngine {
    /// Apply tile size, sample count, bounce depth, and resolution.
    fn configure(&mut self, params: &EngineParams);

    /// Render the current scene through the wired compositor graph.
    fn render(&mut self, frame: FrameNumber) -> MaskweaveResult<()>;
}

/// Configure the engine for a quality tier and run one blocking render.
pub fn render_pass(
    engine: &mut dyn RenderEngine,
    tier: QualityTier,
    resolution: Resolution,
    frame: FrameNumber,
) -> MaskweaveResult<()> {
    let params = params_for(tier, resolution);
    engine.configure(&params);
    tracing::debug!(?tier, %frame, samples = params.samples, "render pass");
    engine.render(frame)
}
