//! YCbCr to RGB conversion
//!
//! The background shader samples luma and chroma separately and converts
//! with [`ycbcr_to_rgb_matrix`] (full-range BT.601). [`preview_image`] runs the
//! same conversion on the CPU for snapshots and diagnostics.

use image::{Rgba, RgbaImage};

use crate::foundation::math::{Mat4, Vec4};
use crate::tracking::frame::{PlanarImage, PlaneFormat};

use super::texture_bridge::{CHROMA_PLANE, LUMA_PLANE};

/// Full-range BT.601 conversion applied to `(y, cb, cr, 1)` with components in `[0, 1]`
#[rustfmt::skip]
pub fn ycbcr_to_rgb_matrix() -> Mat4 {
    Mat4::new(
        1.0,  0.0,     1.402,  -0.701,
        1.0, -0.3441, -0.7141,  0.5291,
        1.0,  1.772,   0.0,    -0.886,
        0.0,  0.0,     0.0,     1.0,
    )
}

/// Convert one 8-bit sample to RGB
pub fn ycbcr_to_rgb(y: u8, cb: u8, cr: u8) -> [u8; 3] {
    let input = Vec4::new(y as f32, cb as f32, cr as f32, 255.0) / 255.0;
    let rgb = ycbcr_to_rgb_matrix() * input;
    [to_unorm8(rgb.x), to_unorm8(rgb.y), to_unorm8(rgb.z)]
}

fn to_unorm8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Convert a bi-planar camera image to RGBA at luma resolution
///
/// Returns `None` unless the image has a luma and a chroma plane.
pub fn preview_image(image: &PlanarImage) -> Option<RgbaImage> {
    let luma = image.plane(LUMA_PLANE)?;
    let chroma = image.plane(CHROMA_PLANE)?;
    if luma.format != PlaneFormat::Luma8 || chroma.format != PlaneFormat::Chroma8x2 {
        return None;
    }
    if !luma.is_complete() || !chroma.is_complete() {
        log::debug!("Camera image planes are empty or shorter than their stride; no preview");
        return None;
    }

    let mut output = RgbaImage::new(luma.width, luma.height);
    for (x, y, pixel) in output.enumerate_pixels_mut() {
        let chroma_x = (x as u64 * chroma.width as u64 / luma.width as u64) as u32;
        let chroma_y = (y as u64 * chroma.height as u64 / luma.height as u64) as u32;
        let (Some(y_sample), Some(cbcr)) = (luma.sample(x, y), chroma.sample(chroma_x, chroma_y)) else {
            continue;
        };
        let [r, g, b] = ycbcr_to_rgb(y_sample[0], cbcr[0], cbcr[1]);
        *pixel = Rgba([r, g, b, 255]);
    }
    Some(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::simulated::synthetic_ycbcr;

    #[test]
    fn test_neutral_chroma_is_gray() {
        for y in [0u8, 64, 128, 255] {
            let [r, g, b] = ycbcr_to_rgb(y, 128, 128);
            assert!(r.abs_diff(y) <= 1 && g.abs_diff(y) <= 1 && b.abs_diff(y) <= 1, "{} -> {:?}", y, [r, g, b]);
        }
    }

    #[test]
    fn test_saturated_chroma() {
        // High Cr pushes red up and green down.
        let [r, g, _] = ycbcr_to_rgb(128, 128, 255);
        assert_eq!(r, 255);
        assert!(g < 128);
        // High Cb pushes blue up.
        let [_, _, b] = ycbcr_to_rgb(128, 255, 128);
        assert_eq!(b, 255);
    }

    #[test]
    fn test_preview_has_luma_resolution() {
        let preview = preview_image(&synthetic_ycbcr(33, 17)).unwrap();
        assert_eq!(preview.dimensions(), (33, 17));
        assert_eq!(preview.get_pixel(0, 0)[3], 255);
    }

    #[test]
    fn test_preview_rejects_truncated_plane() {
        let mut image = synthetic_ycbcr(8, 8);
        let chroma = &mut image.planes[CHROMA_PLANE];
        chroma.data = chroma.data[..chroma.data.len() - 1].into();
        assert!(preview_image(&image).is_none());
    }

    #[test]
    fn test_preview_requires_chroma_plane() {
        let mut image = synthetic_ycbcr(8, 8);
        image.planes.truncate(1);
        assert!(preview_image(&image).is_none());
    }
}
