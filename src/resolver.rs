use std::{collections::BTreeMap, path::Path};

use crate::{
    compositor::{CompositorGraph, CompositorManager},
    core::{FrameNumber, InstanceId, Resolution},
    engine::{render_pass, RenderEngine},
    error::MaskweaveResult,
    mask,
    model::{MaskRegistry, SceneObject, VisibilityClassification},
    settings::QualityTier,
};

/// Result of visibility resolution: one classification per candidate, plus
/// the number of solo renders issued.
#[derive(Clone, Debug)]
pub struct ResolveOutcome {
    pub classifications: BTreeMap<InstanceId, VisibilityClassification>,
    pub solo_renders: usize,
}

impl ResolveOutcome {
    pub fn rendered_count(&self) -> usize {
        self.classifications.values().filter(|c| c.rendered).count()
    }
}

/// Determine which candidates are actually visible in the composite mask and,
/// when the obstruction gate is open, render one clean solo mask per visible
/// object.
///
/// A candidate absent from the composite mask's non-zero value set is fully
/// occluded or out of frame; it is classified immediately and never receives
/// a solo render, so the dataset carries no mask file for it. Candidates are
/// visited in object list order, which keeps solo file naming reproducible.
///
/// Each isolation strictly completes (render, re-hide, unlink) before the
/// next begins: the compositor graph and engine state are shared and mutated
/// in place, so solo passes never overlap. Re-hiding runs after every solo
/// render, including the last, to leave the scene consistent for downstream
/// consumers.
#[allow(clippy::too_many_arguments)]
pub fn resolve_visibility(
    engine: &mut dyn RenderEngine,
    graph: &mut dyn CompositorGraph,
    manager: &mut CompositorManager,
    objects: &[SceneObject],
    registry: &MaskRegistry,
    composite_mask: &Path,
    resolution: Resolution,
    frame: FrameNumber,
    solo: bool,
) -> MaskweaveResult<ResolveOutcome> {
    let rendered_ids = mask::visible_instances(composite_mask)?;
    tracing::info!(visible = rendered_ids.len(), "decoded composite mask");

    let mut classifications = BTreeMap::new();
    for obj in objects {
        if !rendered_ids.contains(&obj.instance) {
            classifications.insert(obj.instance, VisibilityClassification::hidden());
        }
    }

    if !solo {
        // Gate closed: classify from the composite alone and leave object
        // visibility untouched.
        for obj in objects {
            if rendered_ids.contains(&obj.instance) {
                classifications.insert(
                    obj.instance,
                    VisibilityClassification {
                        rendered: true,
                        solo_mask_id: None,
                    },
                );
            }
        }
        return Ok(ResolveOutcome {
            classifications,
            solo_renders: 0,
        });
    }

    // Baseline for the solo loop: everything hidden from the renderer.
    for obj in objects {
        graph.set_hide_render(obj.instance, true)?;
    }

    manager.begin_solo_phase(graph, registry)?;

    let mut solo_renders = 0usize;
    for obj in objects {
        if !rendered_ids.contains(&obj.instance) {
            continue;
        }
        let solo_mask_id = obj.instance.solo_mask_id();
        manager.set_solo_paths(graph, &solo_mask_id)?;
        manager.isolate(graph, registry, obj.instance)?;

        render_pass(engine, QualityTier::Masks, resolution, frame)?;
        solo_renders += 1;

        manager.release(graph, registry, obj.instance)?;

        classifications.insert(
            obj.instance,
            VisibilityClassification {
                rendered: true,
                solo_mask_id: Some(solo_mask_id),
            },
        );
    }

    manager.restore_paths(graph)?;

    tracing::info!(solo_renders, "solo mask passes complete");
    Ok(ResolveOutcome {
        classifications,
        solo_renders,
    })
}
