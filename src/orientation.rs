//! Block-wise ridge orientation estimation with coherence.
//!
//! Overview
//! - Smooths the input with an isotropic Gaussian to suppress pixel noise,
//!   then computes Sobel gradients.
//! - For each non-overlapping block the gradient covariance sums
//!   `Gxx = ΣGx²`, `Gyy = ΣGy²`, `Gxy = ΣGxGy` yield the least-squares
//!   dominant direction `θ = 0.5·atan2(2Gxy, Gxx−Gyy)` and a coherence
//!   value `sqrt((Gxx−Gyy)² + 4Gxy²) / (Gxx+Gyy)` in [0, 1].
//! - A π/2 shift folds the gradient direction onto the ridge direction and
//!   all angles live in [0, π).
//! - A 5×5 circular-neighborhood average denoises the block grid; blocks in
//!   a high-dispersion neighborhood keep their own estimate, which protects
//!   singularities and creases from over-smoothing.
//!
//! Per-pixel expansion either broadcasts block values or interpolates
//! bilinearly in the doubled-angle complex domain so the blend stays
//! continuous across the π wraparound.
use crate::angle::{average_orientation, doubled_angle_mean, normalize_half_pi};
use crate::gauss::gaussian_blur;
use crate::gradients::sobel_gradients;
use crate::image::ImageF32;
use serde::Serialize;
use std::f32::consts::{FRAC_PI_2, PI};

/// Knobs for orientation-field estimation.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct OrientationParams {
    /// Side length of the square estimation block in pixels.
    pub block_size: usize,
    /// σ of the Gaussian applied before gradient computation.
    pub smooth_sigma: f32,
    /// Angular std (radians) above which a 5×5 neighborhood is considered
    /// too noisy to average; the block then keeps its own estimate.
    pub neighborhood_std_threshold: f32,
}

impl Default for OrientationParams {
    fn default() -> Self {
        Self {
            block_size: 16,
            smooth_sigma: 2.0,
            neighborhood_std_threshold: 0.4,
        }
    }
}

/// Block-resolution ridge orientation field with per-block coherence.
#[derive(Clone, Debug, Serialize)]
pub struct OrientationField {
    pub block_size: usize,
    pub blocks_x: usize,
    pub blocks_y: usize,
    theta: Vec<f32>,
    coherence: Vec<f32>,
}

impl OrientationField {
    #[inline]
    fn idx(&self, i: usize, j: usize) -> usize {
        j * self.blocks_x + i
    }

    /// Orientation of block `(i, j)` in [0, π).
    #[inline]
    pub fn theta(&self, i: usize, j: usize) -> f32 {
        self.theta[self.idx(i, j)]
    }

    /// Coherence of block `(i, j)` in [0, 1].
    #[inline]
    pub fn coherence(&self, i: usize, j: usize) -> f32 {
        self.coherence[self.idx(i, j)]
    }

    /// Orientation of the block containing pixel `(x, y)`; pixels in the
    /// boundary remainder map to the nearest block.
    #[inline]
    pub fn theta_at_pixel(&self, x: usize, y: usize) -> f32 {
        let i = (x / self.block_size).min(self.blocks_x - 1);
        let j = (y / self.block_size).min(self.blocks_y - 1);
        self.theta(i, j)
    }

    /// Coherence of the block containing pixel `(x, y)`.
    #[inline]
    pub fn coherence_at_pixel(&self, x: usize, y: usize) -> f32 {
        let i = (x / self.block_size).min(self.blocks_x - 1);
        let j = (y / self.block_size).min(self.blocks_y - 1);
        self.coherence(i, j)
    }

    /// Expand to per-pixel orientation and coherence maps of size `w × h`.
    ///
    /// Without interpolation every pixel takes its block's value. With
    /// interpolation, interior pixels blend the four surrounding block
    /// centers bilinearly (orientations in the doubled-angle complex
    /// domain, coherence linearly) and the half-block border the stencil
    /// cannot cover falls back to the nearest block value.
    pub fn to_pixel_maps(&self, w: usize, h: usize, interpolate: bool) -> (ImageF32, ImageF32) {
        let mut theta = ImageF32::from_fn(w, h, |x, y| self.theta_at_pixel(x, y));
        let mut coherence = ImageF32::from_fn(w, h, |x, y| self.coherence_at_pixel(x, y));
        if !interpolate || self.blocks_x < 2 || self.blocks_y < 2 {
            return (theta, coherence);
        }

        let bs = self.block_size;
        let half = bs / 2;
        let total = (bs * bs) as f32;
        for j in 0..self.blocks_y - 1 {
            for i in 0..self.blocks_x - 1 {
                let corners = [
                    self.theta(i, j),
                    self.theta(i, j + 1),
                    self.theta(i + 1, j),
                    self.theta(i + 1, j + 1),
                ];
                let coh_corners = [
                    self.coherence(i, j),
                    self.coherence(i, j + 1),
                    self.coherence(i + 1, j),
                    self.coherence(i + 1, j + 1),
                ];
                for dy in 0..bs {
                    let y = j * bs + half + dy;
                    if y >= h {
                        break;
                    }
                    for dx in 0..bs {
                        let x = i * bs + half + dx;
                        if x >= w {
                            break;
                        }
                        let fy = dy as f32;
                        let fx = dx as f32;
                        let weights = [
                            (bs as f32 - fy) * (bs as f32 - fx),
                            fy * (bs as f32 - fx),
                            (bs as f32 - fy) * fx,
                            fy * fx,
                        ];
                        let blended = doubled_angle_mean(&corners, &weights, corners[0]);
                        theta.set(x, y, blended);
                        let coh = weights
                            .iter()
                            .zip(&coh_corners)
                            .map(|(&w, &c)| w * c)
                            .sum::<f32>()
                            / total;
                        coherence.set(x, y, coh);
                    }
                }
            }
        }
        (theta, coherence)
    }
}

/// Estimate the block orientation field of a normalized grayscale image.
///
/// The image must span at least one block in each dimension; boundary
/// remainders smaller than a block are excluded from the grid.
pub fn estimate_orientation(img: &ImageF32, params: &OrientationParams) -> OrientationField {
    let bs = params.block_size;
    assert!(bs > 0, "block size must be positive");
    assert!(
        img.w >= bs && img.h >= bs,
        "image {}x{} smaller than one {}px block",
        img.w,
        img.h,
        bs
    );

    let smoothed = gaussian_blur(img, params.smooth_sigma);
    let grads = sobel_gradients(&smoothed);

    let blocks_x = img.w / bs;
    let blocks_y = img.h / bs;
    let mut theta = vec![0.0f32; blocks_x * blocks_y];
    let mut coherence = vec![0.0f32; blocks_x * blocks_y];

    for j in 0..blocks_y {
        for i in 0..blocks_x {
            let mut gxx = 0.0f32;
            let mut gyy = 0.0f32;
            let mut gxy = 0.0f32;
            for y in j * bs..(j + 1) * bs {
                for x in i * bs..(i + 1) * bs {
                    let gx = grads.gx.get(x, y);
                    let gy = grads.gy.get(x, y);
                    gxx += gx * gx;
                    gyy += gy * gy;
                    gxy += gx * gy;
                }
            }
            let raw = 0.5 * (2.0 * gxy).atan2(gxx - gyy);
            theta[j * blocks_x + i] = normalize_half_pi(raw + FRAC_PI_2);

            let denominator = gxx + gyy;
            coherence[j * blocks_x + i] = if denominator > 0.0 {
                let numerator = ((gxx - gyy) * (gxx - gyy) + 4.0 * gxy * gxy).sqrt();
                (numerator / denominator).clamp(0.0, 1.0)
            } else {
                0.0
            };
        }
    }

    let theta = denoise_block_grid(
        &theta,
        blocks_x,
        blocks_y,
        params.neighborhood_std_threshold,
    );

    OrientationField {
        block_size: bs,
        blocks_x,
        blocks_y,
        theta,
        coherence,
    }
}

/// Circular 5×5 neighborhood average over the block grid with replicated
/// borders. Neighborhoods whose angular std exceeds `std_threshold` keep
/// the center block's own value.
fn denoise_block_grid(
    theta: &[f32],
    blocks_x: usize,
    blocks_y: usize,
    std_threshold: f32,
) -> Vec<f32> {
    let mut out = vec![0.0f32; theta.len()];
    let mut neighborhood = Vec::with_capacity(25);
    for j in 0..blocks_y {
        for i in 0..blocks_x {
            neighborhood.clear();
            for dj in -2i32..=2 {
                for di in -2i32..=2 {
                    let nj = (j as i32 + dj).clamp(0, blocks_y as i32 - 1) as usize;
                    let ni = (i as i32 + di).clamp(0, blocks_x as i32 - 1) as usize;
                    neighborhood.push(theta[nj * blocks_x + ni]);
                }
            }
            let (mean, std) = average_orientation(&neighborhood, None);
            out[j * blocks_x + i] = if std > std_threshold {
                theta[j * blocks_x + i]
            } else {
                normalize_half_pi(mean)
            };
        }
    }
    out
}

/// All orientations must stay in [0, π); used by debug assertions and tests.
pub fn orientation_in_range(theta: f32) -> bool {
    (0.0..PI).contains(&theta)
}
