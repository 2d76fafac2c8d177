use std::fmt;

/// Hard per-axis cap on the configured render resolution.
pub const MAX_AXIS_PX: u32 = 3000;

/// Per-scene unique object instance index. Stable across render passes; the
/// composite mask encodes these as pixel values.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct InstanceId(pub u32);

impl InstanceId {
    /// Stable per-object token used to distinguish solo output files, e.g. `obj001`.
    pub fn solo_mask_id(self) -> String {
        format!("obj{:03}", self.0)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Frame number substituted for the `#` placeholder in output slot templates.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameNumber(pub u64);

impl fmt::Display for FrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dataset sequence counter, rendered as a zero-padded 10-digit file prefix.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct SequenceNumber(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Clamp both axes to [`MAX_AXIS_PX`].
    pub fn clamped(self) -> Self {
        Self {
            width: self.width.min(MAX_AXIS_PX),
            height: self.height.min(MAX_AXIS_PX),
        }
    }
}

/// Output slot template for one sensor: `{seq:010}-#-{sensor}`.
///
/// The file-output sink appends the format extension; `#` is expanded to the
/// frame number by the engine at render time.
pub fn slot_template(seq: SequenceNumber, sensor: &str) -> String {
    format!("{:010}-#-{}", seq.0, sensor)
}

/// Solo variant of an output slot template: `{base}-{solo_mask_id}`.
pub fn solo_slot_template(base: &str, solo_mask_id: &str) -> String {
    format!("{base}-{solo_mask_id}")
}

/// Expand the `#` frame placeholder in a slot template.
pub fn expand_frame(template: &str, frame: FrameNumber) -> String {
    template.replace('#', &frame.0.to_string())
}
