//! Edge and skeleton extraction from an RGB raster.

use image::RgbImage;
use rayon::prelude::*;
use tracing::info;

use crate::edge::{canny, Channel};
use crate::error::{Error, Result};
use crate::mask::BinaryMask;
use crate::skeleton::thin;

/// Luma of every pixel, `0.299 R + 0.587 G + 0.114 B`, in column-major order.
pub fn intensity(image: &RgbImage) -> Channel {
    let (width, height) = image.dimensions();
    (0..width)
        .into_par_iter()
        .map(|x| {
            (0..height)
                .map(|y| {
                    let [r, g, b] = image.get_pixel(x, y).0;
                    0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
                })
                .collect()
        })
        .collect()
}

fn check_shape(expected: (u32, u32), mask: &BinaryMask) -> Result<()> {
    if mask.dimensions() != expected {
        return Err(Error::Shape {
            expected,
            actual: mask.dimensions(),
        });
    }
    Ok(())
}

/// Detects edges in `image` and thins them to a one pixel wide skeleton.
///
/// Returns `(edges, skeleton)`, both with the dimensions of `image`.
pub fn extract(
    image: &RgbImage,
    low_threshold: f32,
    high_threshold: f32,
    blur_kernel_size: usize,
) -> Result<(BinaryMask, BinaryMask)> {
    let dimensions = image.dimensions();
    if dimensions.0 == 0 || dimensions.1 == 0 {
        return Err(Error::Shape {
            expected: (1, 1),
            actual: dimensions,
        });
    }
    let edges = canny(&intensity(image), low_threshold, high_threshold, blur_kernel_size);
    check_shape(dimensions, &edges)?;
    let skeleton = thin(&edges);
    check_shape(dimensions, &skeleton)?;
    info!(
        width = dimensions.0,
        height = dimensions.1,
        edge_pixels = edges.count(),
        skeleton_pixels = skeleton.count(),
        "extracted skeleton"
    );
    Ok((edges, skeleton))
}
