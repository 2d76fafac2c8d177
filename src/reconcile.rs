use std::path::Path;

use anyhow::Context;

use crate::{
    core::{expand_frame, FrameNumber},
    error::MaskweaveResult,
};

/// Delete every transient per-object file for one frame: anything in `dir`
/// whose name starts with the slot template (frame placeholder expanded)
/// followed by the solo-id separator.
///
/// Zero matches is success — the obstruction gate may have been closed, in
/// which case no solo files exist. A missing directory is also success.
/// Returns the number of files removed.
pub fn remove_solo_artifacts(
    dir: &Path,
    slot_base: &str,
    frame: FrameNumber,
) -> MaskweaveResult<usize> {
    let prefix = format!("{}-", expand_frame(slot_base, frame));

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(err) => {
            return Err(anyhow::Error::new(err)
                .context(format!("list output dir '{}'", dir.display()))
                .into())
        }
    };

    let mut removed = 0usize;
    for entry in entries {
        let entry = entry.with_context(|| format!("list output dir '{}'", dir.display()))?;
        let name = entry.file_name();
        if name.to_string_lossy().starts_with(&prefix) {
            std::fs::remove_file(entry.path())
                .with_context(|| format!("remove '{}'", entry.path().display()))?;
            removed += 1;
        }
    }

    tracing::debug!(removed, dir = %dir.display(), "reconciled solo artifacts");
    Ok(removed)
}
