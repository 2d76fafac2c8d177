use std::{collections::BTreeMap, path::PathBuf};

use anyhow::Context;

use crate::{
    annotate::AnnotationWriter,
    compositor::{CompositorGraph, CompositorManager},
    core::{expand_frame, slot_template, FrameNumber, InstanceId},
    engine::{render_pass, RenderEngine},
    error::MaskweaveResult,
    model::{MaskRegistry, RenderNodeOpts, Scene, VisibilityClassification},
    reconcile::remove_solo_artifacts,
    resolver::resolve_visibility,
    settings::QualityTier,
};

/// Logged node name for boundary errors.
const NODE_NAME: &str = "RenderNode";

/// Per-invocation handle to the shared mutable render state: the engine, the
/// compositor graph, the output tree, and the current frame.
///
/// Constructed once per pipeline invocation and dropped after the frame. No
/// other actor may mutate the engine or graph while an invocation runs.
pub struct RenderContext<'a> {
    pub engine: &'a mut dyn RenderEngine,
    pub graph: &'a mut dyn CompositorGraph,
    pub output_root: PathBuf,
    pub frame: FrameNumber,
}

impl RenderContext<'_> {
    pub fn images_dir(&self) -> PathBuf {
        self.output_root.join("images")
    }

    pub fn masks_dir(&self) -> PathBuf {
        self.output_root.join("masks")
    }

    pub fn preview_path(&self) -> PathBuf {
        self.output_root.join("preview.png")
    }
}

/// Terminal state of one pipeline invocation.
///
/// Preview mode is an intentional early exit, not an error: it terminates the
/// node successfully with one low-resolution image and nothing else.
#[derive(Clone, Debug)]
pub enum PipelineOutcome {
    Preview {
        preview_path: PathBuf,
    },
    Complete {
        classifications: BTreeMap<InstanceId, VisibilityClassification>,
        solo_renders: usize,
    },
}

/// Execute the render node: stage the scene, run the preview/full/masks/solo
/// pass sequence, write annotations, and reconcile transient artifacts.
///
/// Every failure is logged once here (single line, node name attached) and
/// re-raised; the invoking pipeline decides whether to abort or skip the data
/// sample. There is no partial success: if resolution or annotation writing
/// fails, no annotation/metadata files for this frame are valid.
#[tracing::instrument(skip_all, fields(frame = %ctx.frame))]
pub fn exec(
    ctx: &mut RenderContext,
    scene: &mut Scene,
    opts: &RenderNodeOpts,
    registry: &MaskRegistry,
    annotations: &mut dyn AnnotationWriter,
) -> MaskweaveResult<PipelineOutcome> {
    tracing::info!(node = NODE_NAME, "executing");
    match run(ctx, scene, opts, registry, annotations) {
        Ok(outcome) => Ok(outcome),
        Err(err) => {
            let msg = err.to_string().replace('\n', " ");
            tracing::error!(node = NODE_NAME, error = %msg, "render node failed");
            Err(err)
        }
    }
}

fn run(
    ctx: &mut RenderContext,
    scene: &mut Scene,
    opts: &RenderNodeOpts,
    registry: &MaskRegistry,
    annotations: &mut dyn AnnotationWriter,
) -> MaskweaveResult<PipelineOutcome> {
    opts.validate()?;
    scene.stage(opts)?;

    let slot = slot_template(opts.sequence, &opts.sensor);
    let mut manager = CompositorManager::new(slot.clone(), slot.clone());
    let images_dir = ctx.images_dir();
    manager.wire_initial(ctx.graph, &images_dir.to_string_lossy())?;

    if opts.preview {
        tracing::info!("low resolution render for preview");
        render_pass(ctx.engine, QualityTier::Preview, scene.resolution, ctx.frame)?;
        let rendered = images_dir.join(slot_file(manager.image_slot(), ctx.frame));
        let preview_path = ctx.preview_path();
        if let Some(parent) = preview_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        std::fs::copy(&rendered, &preview_path).with_context(|| {
            format!(
                "copy preview '{}' to '{}'",
                rendered.display(),
                preview_path.display()
            )
        })?;
        return Ok(PipelineOutcome::Preview { preview_path });
    }

    // The primary composite: this is the image that ships with the dataset.
    render_pass(ctx.engine, QualityTier::High, scene.resolution, ctx.frame)?;

    // Composite masks pass: all per-object masks still feed the image pass
    // output, producing the authoritative composite mask.
    manager.rewire_for_masks(ctx.graph)?;
    render_pass(ctx.engine, QualityTier::Masks, scene.resolution, ctx.frame)?;

    let masks_dir = ctx.masks_dir();
    let composite_mask = masks_dir.join(slot_file(manager.mask_slot(), ctx.frame));

    let outcome = resolve_visibility(
        ctx.engine,
        ctx.graph,
        &mut manager,
        &scene.objects,
        registry,
        &composite_mask,
        scene.resolution,
        ctx.frame,
        opts.calculate_obstruction,
    )?;

    annotations.write_annotations(scene, &outcome.classifications, opts.calculate_obstruction)?;
    annotations.write_metadata(scene)?;

    tracing::info!(rendered = outcome.rendered_count(), "objects rendered");

    remove_solo_artifacts(&masks_dir, manager.mask_slot(), ctx.frame)?;
    remove_solo_artifacts(&images_dir, manager.image_slot(), ctx.frame)?;

    Ok(PipelineOutcome::Complete {
        classifications: outcome.classifications,
        solo_renders: outcome.solo_renders,
    })
}

/// Concrete file name an output slot resolves to for one frame.
fn slot_file(slot: &str, frame: FrameNumber) -> String {
    format!("{}.png", expand_frame(slot, frame))
}
