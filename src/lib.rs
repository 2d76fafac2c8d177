#![forbid(unsafe_code)]

pub mod annotate;
pub mod compositor;
pub mod core;
pub mod engine;
pub mod error;
pub mod mask;
pub mod model;
pub mod pipeline;
pub mod reconcile;
pub mod resolver;
pub mod settings;

pub use annotate::AnnotationWriter;
pub use compositor::{CompositorGraph, CompositorManager, SocketRef};
pub use crate::core::{FrameNumber, InstanceId, Resolution, SequenceNumber, MAX_AXIS_PX};
pub use engine::{render_pass, RenderEngine};
pub use error::{MaskweaveError, MaskweaveResult};
pub use mask::visible_instances;
pub use model::{
    MaskNode, MaskRegistry, RenderNodeOpts, Scene, SceneObject, VisibilityClassification,
};
pub use pipeline::{exec, PipelineOutcome, RenderContext};
pub use reconcile::remove_solo_artifacts;
pub use resolver::{resolve_visibility, ResolveOutcome};
pub use settings::{params_for, EngineParams, QualityTier};
