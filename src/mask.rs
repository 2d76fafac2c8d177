use std::{collections::BTreeSet, path::Path};

use anyhow::Context;

use crate::{core::InstanceId, error::MaskweaveResult};

/// Decode a composite mask image and collect the set of distinct non-zero
/// pixel values, the instance indices of the objects actually visible in the
/// composite (not occluded, not clipped, not behind the view).
///
/// Pixel values are read at the stored bit depth: a `to_luma16` conversion
/// would rescale 8-bit values (v becomes v * 257) and corrupt the instance
/// indices. An all-zero mask yields an empty set, which is a valid outcome,
/// not an error.
pub fn visible_instances(path: &Path) -> MaskweaveResult<BTreeSet<InstanceId>> {
    let img = image::open(path)
        .with_context(|| format!("decode composite mask '{}'", path.display()))?;

    let mut ids = BTreeSet::new();
    match img {
        image::DynamicImage::ImageLuma8(buf) => {
            for px in buf.pixels() {
                let v = u32::from(px.0[0]);
                if v != 0 {
                    ids.insert(InstanceId(v));
                }
            }
        }
        image::DynamicImage::ImageLuma16(buf) => {
            for px in buf.pixels() {
                let v = u32::from(px.0[0]);
                if v != 0 {
                    ids.insert(InstanceId(v));
                }
            }
        }
        other => {
            return Err(crate::error::MaskweaveError::render(format!(
                "composite mask '{}' is not a grayscale image ({:?})",
                path.display(),
                other.color()
            )))
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "maskweave_mask_{name}_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join("mask.png")
    }

    fn temp_png(name: &str, pixels: &[u16], width: u32, height: u32) -> std::path::PathBuf {
        let path = temp_path(name);
        let img = image::ImageBuffer::<image::Luma<u16>, _>::from_raw(
            width,
            height,
            pixels.to_vec(),
        )
        .unwrap();
        img.save(&path).unwrap();
        path
    }

    fn temp_png8(name: &str, pixels: &[u8], width: u32, height: u32) -> std::path::PathBuf {
        let path = temp_path(name);
        let img = image::ImageBuffer::<image::Luma<u8>, _>::from_raw(
            width,
            height,
            pixels.to_vec(),
        )
        .unwrap();
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn collects_distinct_nonzero_values() {
        let path = temp_png("distinct", &[0, 1, 1, 3, 0, 300], 3, 2);
        let ids = visible_instances(&path).unwrap();
        let expect: BTreeSet<_> = [InstanceId(1), InstanceId(3), InstanceId(300)]
            .into_iter()
            .collect();
        assert_eq!(ids, expect);
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn eight_bit_mask_values_decode_unscaled() {
        let path = temp_png8("eight_bit", &[0, 3], 2, 1);
        let ids = visible_instances(&path).unwrap();
        let expect: BTreeSet<_> = [InstanceId(3)].into_iter().collect();
        assert_eq!(ids, expect);
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn non_grayscale_mask_is_render_error() {
        let path = temp_path("rgba");
        image::RgbaImage::from_pixel(1, 1, image::Rgba([3, 0, 0, 255]))
            .save(&path)
            .unwrap();
        let err = visible_instances(&path).unwrap_err();
        assert!(err.to_string().contains("not a grayscale image"));
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn all_zero_mask_is_empty_not_error() {
        let path = temp_png("zero", &[0, 0, 0, 0], 2, 2);
        let ids = visible_instances(&path).unwrap();
        assert!(ids.is_empty());
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn missing_file_propagates_error() {
        let path = std::env::temp_dir().join("maskweave_definitely_missing.png");
        assert!(visible_instances(&path).is_err());
    }
}
