use std::collections::BTreeMap;

use crate::{
    core::InstanceId,
    error::MaskweaveResult,
    model::{Scene, VisibilityClassification},
};

/// The external annotation/metadata writer.
///
/// Invoked once per frame after mask resolution. When `with_obstruction` is
/// set, the writer compares each solo mask silhouette against the expected
/// unoccluded silhouette; that per-pixel metric is its job, not this core's.
/// Any failure propagates and the whole frame must be treated as unusable —
/// there is no partial-success output.
pub trait AnnotationWriter {
    fn write_annotations(
        &mut self,
        scene: &Scene,
        classifications: &BTreeMap<InstanceId, VisibilityClassification>,
        with_obstruction: bool,
    ) -> MaskweaveResult<()>;

    fn write_metadata(&mut self, scene: &Scene) -> MaskweaveResult<()>;
}
