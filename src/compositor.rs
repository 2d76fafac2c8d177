use crate::{
    core::InstanceId,
    error::MaskweaveResult,
    model::MaskRegistry,
};

/// A named socket on a named compositor node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SocketRef {
    pub node: String,
    pub socket: String,
}

impl SocketRef {
    pub fn new(node: impl Into<String>, socket: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            socket: socket.into(),
        }
    }
}

/// The external compositor/scene-graph runtime.
///
/// The core only configures this graph; it never processes pixels itself.
/// Node lookup is by name, links connect named sockets, and the file-output
/// sink exposes templated output slots (`#` expands to the frame number at
/// render time, the sink appends the format extension).
pub trait CompositorGraph {
    fn add_node(&mut self, name: &str, kind: &str) -> MaskweaveResult<()>;
    fn remove_node(&mut self, name: &str) -> MaskweaveResult<()>;
    fn link(&mut self, from: &SocketRef, to: &SocketRef) -> MaskweaveResult<()>;
    fn unlink(&mut self, from: &SocketRef, to: &SocketRef) -> MaskweaveResult<()>;
    /// Remove every link whose source is `from`.
    fn unlink_all_from(&mut self, from: &SocketRef) -> MaskweaveResult<()>;

    fn clear_output_slots(&mut self, node: &str) -> MaskweaveResult<()>;
    fn add_output_slot(&mut self, node: &str, template: &str) -> MaskweaveResult<()>;
    fn set_output_slot_path(&mut self, node: &str, slot: usize, template: &str)
        -> MaskweaveResult<()>;
    fn set_output_base_path(&mut self, node: &str, base: &str) -> MaskweaveResult<()>;

    /// Toggle an object's render visibility (`hide_render`).
    fn set_hide_render(&mut self, instance: InstanceId, hidden: bool) -> MaskweaveResult<()>;
}

/// Well-known node and socket names in the graph this core wires.
pub mod nodes {
    pub const RENDER_LAYERS: &str = "Render Layers";
    pub const COMPOSITE: &str = "Composite";
    pub const DENOISE: &str = "Denoise";
    pub const IMAGE_OUT: &str = "File Output";
    pub const MASK_OUT: &str = "Mask Output";
    /// Upstream-provided image sink replaced during initial wiring.
    pub const UPSTREAM_IMGOUT: &str = "imgout";

    pub const SOCK_IMAGE: &str = "Image";
    pub const SOCK_ALPHA: &str = "Alpha";
}

/// Wiring policy for the pixel-processing graph: initial composite wiring,
/// the masks-pass rewire, and solo-object isolation.
///
/// Tracks the base (non-solo) slot templates so solo paths can be derived and
/// restored without re-reading graph state.
pub struct CompositorManager {
    image_slot: String,
    mask_slot: String,
    solo_linked: Option<InstanceId>,
}

impl CompositorManager {
    pub fn new(image_slot: String, mask_slot: String) -> Self {
        Self {
            image_slot,
            mask_slot,
            solo_linked: None,
        }
    }

    /// Base template of the image output slot (no solo suffix).
    pub fn image_slot(&self) -> &str {
        &self.image_slot
    }

    /// Base template of the mask output slot (no solo suffix).
    pub fn mask_slot(&self) -> &str {
        &self.mask_slot
    }

    /// Wire the composite path: raw render output through a denoise stage into
    /// both the composite preview and a fresh file-output sink. Replaces the
    /// upstream `imgout` node.
    pub fn wire_initial(
        &mut self,
        graph: &mut dyn CompositorGraph,
        images_base_path: &str,
    ) -> MaskweaveResult<()> {
        tracing::debug!(images_base_path, "wiring initial compositor graph");

        graph.add_node(nodes::DENOISE, "denoise")?;
        graph.remove_node(nodes::UPSTREAM_IMGOUT)?;
        graph.add_node(nodes::IMAGE_OUT, "file-output")?;
        graph.set_output_base_path(nodes::IMAGE_OUT, images_base_path)?;
        graph.clear_output_slots(nodes::IMAGE_OUT)?;
        graph.add_output_slot(nodes::IMAGE_OUT, &self.image_slot)?;

        let raw = SocketRef::new(nodes::RENDER_LAYERS, nodes::SOCK_IMAGE);
        let denoise_in = SocketRef::new(nodes::DENOISE, nodes::SOCK_IMAGE);
        let denoise_out = SocketRef::new(nodes::DENOISE, nodes::SOCK_IMAGE);
        graph.link(&raw, &denoise_in)?;
        graph.link(&denoise_out, &SocketRef::new(nodes::COMPOSITE, nodes::SOCK_IMAGE))?;
        graph.link(&denoise_out, &SocketRef::new(nodes::IMAGE_OUT, nodes::SOCK_IMAGE))?;
        Ok(())
    }

    /// Rewire the sink for the composite masks pass: clear the configured
    /// output slot, re-register it, and reconnect the denoise output.
    pub fn rewire_for_masks(&mut self, graph: &mut dyn CompositorGraph) -> MaskweaveResult<()> {
        tracing::debug!("rewiring file output for masks pass");
        graph.clear_output_slots(nodes::IMAGE_OUT)?;
        graph.add_output_slot(nodes::IMAGE_OUT, &self.image_slot)?;
        graph.link(
            &SocketRef::new(nodes::DENOISE, nodes::SOCK_IMAGE),
            &SocketRef::new(nodes::IMAGE_OUT, nodes::SOCK_IMAGE),
        )?;
        Ok(())
    }

    /// Enter the solo phase: detach the image layer's default output from the
    /// sink and detach every per-object mask link, so no mask feeds the sink
    /// until [`isolate`](Self::isolate) connects exactly one.
    pub fn begin_solo_phase(
        &mut self,
        graph: &mut dyn CompositorGraph,
        registry: &MaskRegistry,
    ) -> MaskweaveResult<()> {
        tracing::debug!("detaching composite links for solo phase");
        for mask in registry.nodes() {
            graph.unlink_all_from(&SocketRef::new(&mask.node, nodes::SOCK_ALPHA))?;
        }
        graph.unlink_all_from(&SocketRef::new(nodes::RENDER_LAYERS, nodes::SOCK_IMAGE))?;
        Ok(())
    }

    /// Point both output slots at `{base}-{solo_mask_id}` for one solo pass.
    pub fn set_solo_paths(
        &mut self,
        graph: &mut dyn CompositorGraph,
        solo_mask_id: &str,
    ) -> MaskweaveResult<()> {
        let image = crate::core::solo_slot_template(&self.image_slot, solo_mask_id);
        let mask = crate::core::solo_slot_template(&self.mask_slot, solo_mask_id);
        graph.set_output_slot_path(nodes::IMAGE_OUT, 0, &image)?;
        graph.set_output_slot_path(nodes::MASK_OUT, 0, &mask)?;
        Ok(())
    }

    /// Restore both output slots to their base (non-solo) templates.
    pub fn restore_paths(&mut self, graph: &mut dyn CompositorGraph) -> MaskweaveResult<()> {
        graph.set_output_slot_path(nodes::IMAGE_OUT, 0, &self.image_slot)?;
        graph.set_output_slot_path(nodes::MASK_OUT, 0, &self.mask_slot)?;
        Ok(())
    }

    /// Isolate one object for a solo mask render: un-hide it and connect its
    /// MaskNode alpha output to the downstream socket it normally feeds.
    ///
    /// Never superimposes two solo masks: isolating while another object is
    /// still linked is a compositor error.
    pub fn isolate(
        &mut self,
        graph: &mut dyn CompositorGraph,
        registry: &MaskRegistry,
        instance: InstanceId,
    ) -> MaskweaveResult<()> {
        if let Some(prev) = self.solo_linked {
            return Err(crate::error::MaskweaveError::compositor(format!(
                "cannot isolate instance {instance}: instance {prev} is still linked"
            )));
        }
        let mask = registry.get(instance).ok_or_else(|| {
            crate::error::MaskweaveError::compositor(format!(
                "no mask node registered for instance {instance}"
            ))
        })?;
        graph.set_hide_render(instance, false)?;
        graph.link(&SocketRef::new(&mask.node, nodes::SOCK_ALPHA), &mask.restore_to)?;
        self.solo_linked = Some(instance);
        tracing::debug!(%instance, node = %mask.node, "isolated object for solo render");
        Ok(())
    }

    /// Undo [`isolate`](Self::isolate): re-hide the object and remove its mask
    /// link. Mandatory after every solo render, including the last one.
    pub fn release(
        &mut self,
        graph: &mut dyn CompositorGraph,
        registry: &MaskRegistry,
        instance: InstanceId,
    ) -> MaskweaveResult<()> {
        let mask = registry.get(instance).ok_or_else(|| {
            crate::error::MaskweaveError::compositor(format!(
                "no mask node registered for instance {instance}"
            ))
        })?;
        graph.set_hide_render(instance, true)?;
        graph.unlink(&SocketRef::new(&mask.node, nodes::SOCK_ALPHA), &mask.restore_to)?;
        if self.solo_linked == Some(instance) {
            self.solo_linked = None;
        }
        Ok(())
    }

    /// Instance currently linked for a solo render, if any.
    pub fn solo_linked(&self) -> Option<InstanceId> {
        self.solo_linked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MaskNode;

    #[derive(Default)]
    struct NullGraph {
        links: Vec<(SocketRef, SocketRef)>,
        hidden: std::collections::BTreeMap<InstanceId, bool>,
    }

    impl CompositorGraph for NullGraph {
        fn add_node(&mut self, _name: &str, _kind: &str) -> MaskweaveResult<()> {
            Ok(())
        }
        fn remove_node(&mut self, _name: &str) -> MaskweaveResult<()> {
            Ok(())
        }
        fn link(&mut self, from: &SocketRef, to: &SocketRef) -> MaskweaveResult<()> {
            self.links.push((from.clone(), to.clone()));
            Ok(())
        }
        fn unlink(&mut self, from: &SocketRef, to: &SocketRef) -> MaskweaveResult<()> {
            self.links.retain(|(f, t)| !(f == from && t == to));
            Ok(())
        }
        fn unlink_all_from(&mut self, from: &SocketRef) -> MaskweaveResult<()> {
            self.links.retain(|(f, _)| f != from);
            Ok(())
        }
        fn clear_output_slots(&mut self, _node: &str) -> MaskweaveResult<()> {
            Ok(())
        }
        fn add_output_slot(&mut self, _node: &str, _template: &str) -> MaskweaveResult<()> {
            Ok(())
        }
        fn set_output_slot_path(
            &mut self,
            _node: &str,
            _slot: usize,
            _template: &str,
        ) -> MaskweaveResult<()> {
            Ok(())
        }
        fn set_output_base_path(&mut self, _node: &str, _base: &str) -> MaskweaveResult<()> {
            Ok(())
        }
        fn set_hide_render(&mut self, instance: InstanceId, hidden: bool) -> MaskweaveResult<()> {
            self.hidden.insert(instance, hidden);
            Ok(())
        }
    }

    fn registry() -> MaskRegistry {
        MaskRegistry::new([1u32, 2].map(|i| MaskNode {
            node: format!("obj{i}_mask"),
            instance: InstanceId(i),
            restore_to: SocketRef::new("Mask Output", "Image"),
        }))
    }

    #[test]
    fn isolate_links_one_mask_and_unhides_one_object() {
        let mut graph = NullGraph::default();
        let reg = registry();
        let mut mgr = CompositorManager::new("a".into(), "b".into());

        mgr.isolate(&mut graph, &reg, InstanceId(1)).unwrap();
        assert_eq!(graph.links.len(), 1);
        assert_eq!(graph.hidden.get(&InstanceId(1)), Some(&false));
        assert_eq!(mgr.solo_linked(), Some(InstanceId(1)));

        mgr.release(&mut graph, &reg, InstanceId(1)).unwrap();
        assert!(graph.links.is_empty());
        assert_eq!(graph.hidden.get(&InstanceId(1)), Some(&true));
        assert_eq!(mgr.solo_linked(), None);
    }

    #[test]
    fn isolate_refuses_to_superimpose_solo_masks() {
        let mut graph = NullGraph::default();
        let reg = registry();
        let mut mgr = CompositorManager::new("a".into(), "b".into());

        mgr.isolate(&mut graph, &reg, InstanceId(1)).unwrap();
        let err = mgr.isolate(&mut graph, &reg, InstanceId(2)).unwrap_err();
        assert!(err.to_string().contains("still linked"));
    }

    #[test]
    fn isolate_unknown_instance_is_compositor_error() {
        let mut graph = NullGraph::default();
        let reg = registry();
        let mut mgr = CompositorManager::new("a".into(), "b".into());

        let err = mgr.isolate(&mut graph, &reg, InstanceId(9)).unwrap_err();
        assert!(err.to_string().contains("no mask node"));
    }
}
