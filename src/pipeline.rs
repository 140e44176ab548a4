//! Edge pipeline glue over `image` and `imageproc`.
//!
//! Each stage is one library call, wrapped in [`timeit`] and traced, so a run
//! prints one `[<stage>] spent: ...` line per step:
//!
//! 1. [`load_image`]: decode and convert to 8-bit grayscale
//! 2. [`EdgeModel::detect_edges`]: Sobel gradient magnitude
//! 3. [`EdgeModel::compute_orientation`]: per-pixel gradient angle in `[0, π)`
//! 4. [`EdgeModel::suppress`]: non-maximum suppression along the gradient
//!
//! [`list_frames`] collects the decodable images of a frame directory.

use std::{
    f32::consts::PI,
    fs, io,
    path::{Path, PathBuf},
};

use image::{GrayImage, ImageBuffer, ImageFormat, ImageResult, Luma};
use imageproc::gradients::{horizontal_sobel, sobel_gradients, vertical_sobel};
use rayon::prelude::*;

use crate::timeit::{timeit, try_timeit};

/// Gradient magnitude per pixel.
pub type EdgeMap = ImageBuffer<Luma<u16>, Vec<u16>>;

/// Gradient orientation per pixel, in radians within `[0, π)`.
pub type OrientationMap = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Non-maximum suppression settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NmsParams {
    /// A pixel survives only if no pixel within `radius` steps along its
    /// gradient direction, on either side, is stronger.
    pub radius: u32,
}

impl Default for NmsParams {
    fn default() -> Self {
        Self { radius: 2 }
    }
}

/// Loaded edge detector. Holds the suppression settings used by
/// [`EdgeModel::suppress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeModel {
    nms: NmsParams,
}

/// Opens `path` and converts it to 8-bit grayscale, traced as `image load`.
///
/// Decoding errors are returned unchanged and nothing is traced.
pub fn load_image<P: AsRef<Path>>(path: P) -> ImageResult<GrayImage> {
    let path = path.as_ref();
    let image = try_timeit("image load", || image::open(path).map(|img| img.into_luma8()))?;
    Ok(image.trace())
}

impl EdgeModel {
    pub fn load(nms: NmsParams) -> Self {
        timeit("edge detector model load", || Self { nms }).trace()
    }

    pub fn nms_params(&self) -> NmsParams {
        self.nms
    }

    pub fn detect_edges(&self, image: &GrayImage) -> EdgeMap {
        timeit("edge detect", || sobel_gradients(image)).trace()
    }

    pub fn compute_orientation(&self, image: &GrayImage) -> OrientationMap {
        timeit("compute orientation", || {
            let gx = horizontal_sobel(image);
            let gy = vertical_sobel(image);

            let mut orientation = OrientationMap::new(image.width(), image.height());
            let angles: &mut [f32] = &mut orientation;
            angles
                .par_iter_mut()
                .zip(gx.as_raw().par_iter().zip(gy.as_raw().par_iter()))
                .for_each(|(angle, (&h, &v))| {
                    *angle = fold_half_turn(f32::from(v).atan2(f32::from(h)));
                });

            orientation
        })
        .trace()
    }

    /// Thins edge ridges to their crest across the edge, traced as `nms`.
    pub fn suppress(&self, edges: &EdgeMap, orientation: &OrientationMap) -> EdgeMap {
        timeit("nms", || suppress_along_gradient(edges, orientation, self.nms.radius)).trace()
    }
}

/// Files in `dir` whose extension names a known image format, sorted by path.
pub fn list_frames<P: AsRef<Path>>(dir: P) -> io::Result<Vec<PathBuf>> {
    let mut frames = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && ImageFormat::from_path(&path).is_ok() {
            frames.push(path);
        }
    }
    frames.sort();
    Ok(frames)
}

fn suppress_along_gradient(
    edges: &EdgeMap,
    orientation: &OrientationMap,
    radius: u32,
) -> EdgeMap {
    /// Conversion factor from radians to degrees
    const RADIANS_TO_DEGREES: f32 = 180f32 / PI;

    let (width, height) = edges.dimensions();
    let mut out = EdgeMap::new(width, height);
    if width == 0 || height == 0 {
        return out;
    }

    let magnitude_at = |x: i64, y: i64| -> u16 {
        if x < 0 || y < 0 || x >= i64::from(width) || y >= i64::from(height) {
            0
        } else {
            edges.get_pixel(x as u32, y as u32)[0]
        }
    };

    let cells: &mut [u16] = &mut out;
    cells
        .par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, cell) in row.iter_mut().enumerate() {
                let (x, y) = (x as u32, y as u32);
                let magnitude = edges.get_pixel(x, y)[0];
                if magnitude == 0 {
                    continue;
                }

                let angle = orientation.get_pixel_checked(x, y).map_or(0.0, |p| p[0])
                    * RADIANS_TO_DEGREES;
                let (dx, dy) = gradient_step(angle);
                let (x, y) = (i64::from(x), i64::from(y));

                // Ties survive, so a two-pixel ridge of equal strength stays connected.
                let is_crest = (1..=i64::from(radius)).all(|d| {
                    magnitude_at(x + d * dx, y + d * dy) <= magnitude
                        && magnitude_at(x - d * dx, y - d * dy) <= magnitude
                });
                if is_crest {
                    *cell = magnitude;
                }
            }
        });

    out
}

/// Pixel step along a gradient angle in degrees, quantised to 0°, 45°, 90° or 135°.
fn gradient_step(angle: f32) -> (i64, i64) {
    if !(22.5..157.5).contains(&angle) {
        (1, 0)
    } else if angle < 67.5 {
        (1, 1)
    } else if angle < 112.5 {
        (0, 1)
    } else {
        (-1, 1)
    }
}

/// Rescales an edge map to 8 bits by its peak value. All-zero maps stay black.
pub fn edges_to_gray(edges: &EdgeMap) -> GrayImage {
    let peak = edges.iter().copied().max().unwrap_or(0);
    if peak == 0 {
        return GrayImage::new(edges.width(), edges.height());
    }

    let scale = 255.0 / f32::from(peak);
    GrayImage::from_fn(edges.width(), edges.height(), |x, y| {
        let v = f32::from(edges.get_pixel(x, y)[0]) * scale;
        Luma([v.round().clamp(0.0, 255.0) as u8])
    })
}

/// Maps an angle in `(-π, π]` onto `[0, π)`; edges have no direction sign.
pub(crate) fn fold_half_turn(angle: f32) -> f32 {
    let folded = angle.rem_euclid(PI);
    if folded >= PI {
        0.0
    } else {
        folded
    }
}
