use std::collections::BTreeMap;

use crate::{
    compositor::SocketRef,
    core::{InstanceId, Resolution, SequenceNumber},
    error::{MaskweaveError, MaskweaveResult},
};

/// A candidate object placed in the scene by an upstream pipeline stage.
///
/// Candidates are read-only here; visibility outcomes live in the
/// [`VisibilityClassification`] map the resolver produces, not in flags on the
/// shared object records.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SceneObject {
    pub name: String,
    pub instance: InstanceId,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Camera {
    pub name: String,
    pub location: [f64; 3],
    /// Object the camera is constrained to track.
    pub track_target: String,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Light {
    pub name: String,
    pub kind: LightKind,
    pub energy: f64,
    pub location: [f64; 3],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LightKind {
    Spot,
}

/// The scene handed in by the invoking pipeline step: candidate objects of
/// interest, the other placed objects (floor plane and the like), one active
/// camera, lights, and the configured render resolution. This core inserts
/// the camera and light and assigns the (clamped) resolution.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Scene {
    /// Candidate objects of interest, produced by the upstream drop stage.
    pub objects: Vec<SceneObject>,
    /// Placed objects that are part of the set but not candidates.
    pub fixtures: Vec<SceneObject>,
    pub camera: Option<Camera>,
    pub lights: Vec<Light>,
    pub resolution: Resolution,
}

/// Maximum supported camera height above the floor plane.
pub const MAX_CAMERA_HEIGHT: f64 = 0.55;

impl Scene {
    pub fn new(objects: Vec<SceneObject>, fixtures: Vec<SceneObject>) -> Self {
        Self {
            objects,
            fixtures,
            camera: None,
            lights: Vec::new(),
            resolution: Resolution::new(0, 0),
        }
    }

    /// The floor object the camera tracks (any placed object whose name
    /// contains `"Plane"`).
    pub fn floor(&self) -> Option<&SceneObject> {
        self.fixtures
            .iter()
            .chain(self.objects.iter())
            .find(|o| o.name.contains("Plane"))
    }

    /// Assign the clamped resolution and insert the light and the
    /// floor-tracking camera. Fails with a configuration error when the scene
    /// has no floor object to target.
    pub fn stage(&mut self, opts: &RenderNodeOpts) -> MaskweaveResult<()> {
        self.resolution = Resolution::new(opts.width, opts.height).clamped();

        let floor = self
            .floor()
            .ok_or_else(|| {
                MaskweaveError::configuration("no floor object found for camera targeting")
            })?
            .name
            .clone();

        self.lights.push(Light {
            name: "light 1".to_string(),
            kind: LightKind::Spot,
            energy: 10.0,
            location: [0.0, 0.0, 1.0],
        });

        let height = opts.camera_height;
        let y = (MAX_CAMERA_HEIGHT * MAX_CAMERA_HEIGHT - height * height).sqrt();
        self.camera = Some(Camera {
            name: "Camera 1".to_string(),
            location: [0.15, y, height],
            track_target: floor,
        });
        Ok(())
    }
}

/// A compositor mask node associated 1:1 with an object instance. Created by
/// upstream mask setup; `restore_to` records the downstream socket its output
/// normally feeds, so solo isolation can reconnect it.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct MaskNode {
    pub node: String,
    pub instance: InstanceId,
    pub restore_to: SocketRef,
}

/// Registry of per-object mask nodes, looked up by instance index.
#[derive(Clone, Debug, Default)]
pub struct MaskRegistry {
    nodes: BTreeMap<InstanceId, MaskNode>,
}

impl MaskRegistry {
    pub fn new(nodes: impl IntoIterator<Item = MaskNode>) -> Self {
        Self {
            nodes: nodes.into_iter().map(|n| (n.instance, n)).collect(),
        }
    }

    pub fn get(&self, instance: InstanceId) -> Option<&MaskNode> {
        self.nodes.get(&instance)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &MaskNode> {
        self.nodes.values()
    }
}

/// Per-object outcome of visibility resolution, keyed by instance index.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VisibilityClassification {
    /// Whether the object is actually visible in the composite.
    pub rendered: bool,
    /// Set only when a solo mask pass was rendered for this object.
    pub solo_mask_id: Option<String>,
}

impl VisibilityClassification {
    pub fn hidden() -> Self {
        Self {
            rendered: false,
            solo_mask_id: None,
        }
    }
}

/// Upstream configuration for one invocation of the render node.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct RenderNodeOpts {
    /// Requested image width in pixels (clamped to the per-axis cap).
    pub width: u32,
    /// Requested image height in pixels (clamped to the per-axis cap).
    pub height: u32,
    /// Render one low-resolution preview and exit, producing no annotations.
    pub preview: bool,
    /// Obstruction gate: when false, no per-object solo passes run.
    pub calculate_obstruction: bool,
    /// Camera height above the floor plane, supplied upstream.
    pub camera_height: f64,
    /// Sensor name embedded in output file names.
    pub sensor: String,
    /// Dataset sequence counter used as the output file prefix.
    pub sequence: SequenceNumber,
}

impl RenderNodeOpts {
    pub fn validate(&self) -> MaskweaveResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(MaskweaveError::configuration(
                "render width/height must be > 0",
            ));
        }
        if self.sensor.trim().is_empty() {
            return Err(MaskweaveError::configuration("sensor name must be non-empty"));
        }
        if !(self.camera_height > 0.0 && self.camera_height <= MAX_CAMERA_HEIGHT) {
            return Err(MaskweaveError::configuration(format!(
                "camera_height must be in (0, {MAX_CAMERA_HEIGHT}]"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MAX_AXIS_PX;

    fn basic_opts() -> RenderNodeOpts {
        RenderNodeOpts {
            width: 1920,
            height: 1080,
            preview: false,
            calculate_obstruction: true,
            camera_height: 0.4,
            sensor: "RGBCamera".to_string(),
            sequence: SequenceNumber(1),
        }
    }

    fn basic_scene() -> Scene {
        Scene::new(
            vec![SceneObject {
                name: "box".to_string(),
                instance: InstanceId(1),
            }],
            vec![SceneObject {
                name: "Plane".to_string(),
                instance: InstanceId(0),
            }],
        )
    }

    #[test]
    fn stage_inserts_camera_tracking_floor() {
        let mut scene = basic_scene();
        scene.stage(&basic_opts()).unwrap();
        let cam = scene.camera.as_ref().unwrap();
        assert_eq!(cam.track_target, "Plane");
        assert_eq!(scene.lights.len(), 1);
        assert_eq!(scene.resolution, Resolution::new(1920, 1080));
    }

    #[test]
    fn stage_clamps_oversized_resolution() {
        let mut scene = basic_scene();
        let mut opts = basic_opts();
        opts.width = 5000;
        scene.stage(&opts).unwrap();
        assert_eq!(scene.resolution.width, MAX_AXIS_PX);
    }

    #[test]
    fn stage_without_floor_is_configuration_error() {
        let mut scene = Scene::new(
            vec![SceneObject {
                name: "box".to_string(),
                instance: InstanceId(1),
            }],
            Vec::new(),
        );
        let err = scene.stage(&basic_opts()).unwrap_err();
        assert!(err.to_string().contains("configuration error:"));
    }

    #[test]
    fn validate_rejects_bad_inputs() {
        let mut opts = basic_opts();
        opts.width = 0;
        assert!(opts.validate().is_err());

        let mut opts = basic_opts();
        opts.sensor = "  ".to_string();
        assert!(opts.validate().is_err());

        let mut opts = basic_opts();
        opts.camera_height = 0.9;
        assert!(opts.validate().is_err());

        assert!(basic_opts().validate().is_ok());
    }

    #[test]
    fn registry_lookup_by_instance() {
        let reg = MaskRegistry::new(vec![MaskNode {
            node: "box_mask".to_string(),
            instance: InstanceId(1),
            restore_to: SocketRef::new("Mask Output", "Image"),
        }]);
        assert!(reg.get(InstanceId(1)).is_some());
        assert!(reg.get(InstanceId(2)).is_none());
    }

    #[test]
    fn classification_json_roundtrip() {
        let c = VisibilityClassification {
            rendered: true,
            solo_mask_id: Some("obj001".to_string()),
        };
        let s = serde_json::to_string(&c).unwrap();
        let de: VisibilityClassification = serde_json::from_str(&s).unwrap();
        assert_eq!(de, c);
    }
}
