//! Per-block ridge frequency estimation.
//!
//! Overview
//! - Each block is rotated by its orientation plus π/2 so ridges run
//!   vertically, then cropped to the analytic largest interior rectangle so
//!   no out-of-bounds samples survive.
//! - Column sums collapse the crop into a 1-D ridge-crossing signal whose
//!   peak spacing gives the local wavelength; spacings outside the
//!   plausible ridge range are rejected.
//! - Missing estimates are `None`, filled where possible by a 3×3
//!   neighborhood median in a post-pass; isolated cells stay `None` and
//!   every consumer filters on validity before averaging.
//!
//! Rotating to align ridges turns 2-D periodicity detection into 1-D peak
//! spacing, which is robust and cheap.
use crate::image::ImageF32;
use crate::normalize::normalize_signal;
use crate::orientation::OrientationField;
use nalgebra::{Rotation2, Vector2};
use serde::Serialize;
use std::f32::consts::FRAC_PI_2;

/// Knobs for ridge-frequency estimation.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct FrequencyParams {
    /// Side length of the square estimation block in pixels. Wider than the
    /// orientation block so several ridge periods fit the window.
    pub block_size: usize,
    /// Minimum plausible ridge wavelength in pixels.
    pub min_wavelength: f32,
    /// Maximum plausible ridge wavelength in pixels.
    pub max_wavelength: f32,
    /// Minimum separation between detected peaks in pixels.
    pub min_peak_distance: usize,
}

impl Default for FrequencyParams {
    fn default() -> Self {
        Self {
            block_size: 32,
            min_wavelength: 5.0,
            max_wavelength: 15.0,
            min_peak_distance: 3,
        }
    }
}

/// Block-resolution ridge frequency field in cycles per pixel.
///
/// `None` marks cells where no valid estimate exists.
#[derive(Clone, Debug, Serialize)]
pub struct FrequencyField {
    pub block_size: usize,
    pub blocks_x: usize,
    pub blocks_y: usize,
    freq: Vec<Option<f32>>,
}

impl FrequencyField {
    /// Assemble a field from per-block values in row-major order.
    pub fn from_blocks(
        block_size: usize,
        blocks_x: usize,
        blocks_y: usize,
        freq: Vec<Option<f32>>,
    ) -> Self {
        assert_eq!(freq.len(), blocks_x * blocks_y, "block count mismatch");
        Self {
            block_size,
            blocks_x,
            blocks_y,
            freq,
        }
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Option<f32> {
        self.freq[j * self.blocks_x + i]
    }

    /// Frequency of the block containing pixel `(x, y)`.
    #[inline]
    pub fn at_pixel(&self, x: usize, y: usize) -> Option<f32> {
        let i = (x / self.block_size).min(self.blocks_x - 1);
        let j = (y / self.block_size).min(self.blocks_y - 1);
        self.get(i, j)
    }

    /// Fraction of blocks carrying a valid estimate.
    pub fn valid_fraction(&self) -> f32 {
        if self.freq.is_empty() {
            return 0.0;
        }
        self.freq.iter().filter(|v| v.is_some()).count() as f32 / self.freq.len() as f32
    }

    /// Area-weighted mean of valid frequencies under the pixel rectangle at
    /// `(x, y)` of size `w × h`, or `None` when no valid cell overlaps it.
    pub fn mean_valid_in_rect(&self, x: usize, y: usize, w: usize, h: usize) -> Option<f32> {
        let bs = self.block_size;
        let x_end = x + w;
        let y_end = y + h;
        let mut sum = 0.0f64;
        let mut area = 0.0f64;
        for j in 0..self.blocks_y {
            let by = j * bs;
            let overlap_y = (y_end.min(by + bs)).saturating_sub(y.max(by));
            if overlap_y == 0 {
                continue;
            }
            for i in 0..self.blocks_x {
                let Some(f) = self.get(i, j) else {
                    continue;
                };
                let bx = i * bs;
                let overlap_x = (x_end.min(bx + bs)).saturating_sub(x.max(bx));
                if overlap_x == 0 {
                    continue;
                }
                let overlap = (overlap_x * overlap_y) as f64;
                sum += f as f64 * overlap;
                area += overlap;
            }
        }
        (area > 0.0).then(|| (sum / area) as f32)
    }
}

/// Estimate per-block ridge frequencies from a normalized image and its
/// orientation field.
pub fn estimate_frequencies(
    img: &ImageF32,
    orientations: &OrientationField,
    params: &FrequencyParams,
) -> FrequencyField {
    let bs = params.block_size;
    assert!(bs > 0, "block size must be positive");
    assert!(
        img.w >= bs && img.h >= bs,
        "image {}x{} smaller than one {}px block",
        img.w,
        img.h,
        bs
    );

    let blocks_x = img.w / bs;
    let blocks_y = img.h / bs;

    use rayon::prelude::*;
    let raw: Vec<Option<f32>> = (0..blocks_x * blocks_y)
        .into_par_iter()
        .map(|idx| {
            let i = idx % blocks_x;
            let j = idx / blocks_x;
            let theta = orientations.theta_at_pixel(i * bs + bs / 2, j * bs + bs / 2);
            let block = img.crop(i * bs, j * bs, bs, bs);
            estimate_block_frequency(&block, theta, params)
        })
        .collect();

    FrequencyField {
        block_size: bs,
        blocks_x,
        blocks_y,
        freq: median_fill(&raw, blocks_x, blocks_y),
    }
}

/// Frequency of a single block, or `None` when it cannot be estimated.
fn estimate_block_frequency(
    block: &ImageF32,
    theta: f32,
    params: &FrequencyParams,
) -> Option<f32> {
    let aligned = rotate_and_crop(block, theta + FRAC_PI_2);
    if aligned.w == 0 || aligned.h == 0 {
        return None;
    }

    let mut columns = vec![0.0f32; aligned.w];
    for j in 0..aligned.h {
        for (i, c) in columns.iter_mut().enumerate() {
            *c += aligned.get(i, j);
        }
    }
    normalize_signal(&mut columns);

    let peaks = find_peaks(&columns, params.min_peak_distance);
    if peaks.len() < 2 {
        return None;
    }
    let spacing = (peaks[peaks.len() - 1] - peaks[0]) as f32 / (peaks.len() - 1) as f32;
    (params.min_wavelength..=params.max_wavelength)
        .contains(&spacing)
        .then(|| 1.0 / spacing)
}

/// Rotate a block about its center and crop to the largest axis-aligned
/// rectangle guaranteed to contain only source pixels.
///
/// Sampling is bilinear; out-of-bounds samples read as 0, so the crop
/// dimensions (derived from |sin|/|cos| of the rotation angle, with a
/// two-pixel guard per side for the bilinear footprint and integer
/// centering) are what keeps padding out of the result. Degenerate crops
/// return an empty image.
pub fn rotate_and_crop(block: &ImageF32, angle: f32) -> ImageF32 {
    let (w, h) = (block.w, block.h);
    if w == 0 || h == 0 {
        return ImageF32::new(0, 0);
    }

    let (crop_w, crop_h) = interior_rect(w, h, angle);
    if crop_w == 0 || crop_h == 0 {
        return ImageF32::new(0, 0);
    }

    let rotation = Rotation2::new(angle);
    let cx = (w as f32 - 1.0) * 0.5;
    let cy = (h as f32 - 1.0) * 0.5;
    let x0 = (w - crop_w) / 2;
    let y0 = (h - crop_h) / 2;

    let mut out = ImageF32::new(crop_w, crop_h);
    for j in 0..crop_h {
        for i in 0..crop_w {
            let p = Vector2::new((x0 + i) as f32 - cx, (y0 + j) as f32 - cy);
            let s = rotation * p;
            out.set(i, j, bilinear_sample(block, s.x + cx, s.y + cy));
        }
    }
    out
}

/// Largest axis-aligned rectangle inside a `w × h` rectangle rotated by
/// `angle`, shrunk by 2 px per side for the bilinear sampling footprint
/// and clamped to the canvas.
fn interior_rect(w: usize, h: usize, angle: f32) -> (usize, usize) {
    let sin = angle.sin().abs();
    let cos = angle.cos().abs();
    // Geometry over pixel centers, not pixel edges: valid bilinear samples
    // span (w-1) × (h-1).
    let (wf, hf) = ((w as f32 - 1.0).max(0.0), (h as f32 - 1.0).max(0.0));
    let landscape = w >= h;
    let (long_side, short_side) = if landscape { (wf, hf) } else { (hf, wf) };

    let sin2a = 2.0 * sin * cos;
    let (new_w, new_h) = if short_side <= sin2a * long_side || (sin - cos).abs() < 1e-6 {
        // Two inscribed corners touch the same long side; the rectangle
        // degenerates towards a square of half the short side.
        let x = 0.5 * short_side;
        if landscape {
            (x / sin, x / cos)
        } else {
            (x / cos, x / sin)
        }
    } else {
        let cos2a = cos * cos - sin * sin;
        ((wf * cos - hf * sin) / cos2a, (hf * cos - wf * sin) / cos2a)
    };

    let new_w = new_w.min(wf).max(0.0) as usize;
    let new_h = new_h.min(hf).max(0.0) as usize;
    (new_w.saturating_sub(4), new_h.saturating_sub(4))
}

#[inline]
fn bilinear_sample(img: &ImageF32, x: f32, y: f32) -> f32 {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let sample = |ix: f32, iy: f32| -> f32 {
        if ix < 0.0 || iy < 0.0 || ix >= img.w as f32 || iy >= img.h as f32 {
            0.0
        } else {
            img.get(ix as usize, iy as usize)
        }
    };
    let v00 = sample(x0, y0);
    let v10 = sample(x0 + 1.0, y0);
    let v01 = sample(x0, y0 + 1.0);
    let v11 = sample(x0 + 1.0, y0 + 1.0);
    v00 * (1.0 - fx) * (1.0 - fy) + v10 * fx * (1.0 - fy) + v01 * (1.0 - fx) * fy + v11 * fx * fy
}

/// Strict local maxima with a minimum index separation. When two candidates
/// fall closer than `min_distance`, the taller one wins.
fn find_peaks(signal: &[f32], min_distance: usize) -> Vec<usize> {
    let mut peaks: Vec<usize> = Vec::new();
    for i in 1..signal.len().saturating_sub(1) {
        if !(signal[i] > signal[i - 1] && signal[i] >= signal[i + 1]) {
            continue;
        }
        match peaks.last().copied() {
            Some(last) if i - last < min_distance => {
                if signal[i] > signal[last] {
                    if let Some(slot) = peaks.last_mut() {
                        *slot = i;
                    }
                }
            }
            _ => peaks.push(i),
        }
    }
    peaks
}

/// 3×3 neighborhood median of valid cells with replicated borders; cells
/// with no valid neighbor stay `None`.
fn median_fill(freq: &[Option<f32>], blocks_x: usize, blocks_y: usize) -> Vec<Option<f32>> {
    let mut out = vec![None; freq.len()];
    let mut neighborhood = Vec::with_capacity(9);
    for j in 0..blocks_y {
        for i in 0..blocks_x {
            neighborhood.clear();
            for dj in -1i32..=1 {
                for di in -1i32..=1 {
                    let nj = (j as i32 + dj).clamp(0, blocks_y as i32 - 1) as usize;
                    let ni = (i as i32 + di).clamp(0, blocks_x as i32 - 1) as usize;
                    if let Some(v) = freq[nj * blocks_x + ni] {
                        neighborhood.push(v);
                    }
                }
            }
            out[j * blocks_x + i] = median(&mut neighborhood);
        }
    }
    out
}

fn median(values: &mut [f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f32::total_cmp);
    let n = values.len();
    Some(if n % 2 == 1 {
        values[n / 2]
    } else {
        0.5 * (values[n / 2 - 1] + values[n / 2])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageF32;
    use std::f32::consts::PI;

    #[test]
    fn peaks_respect_minimum_separation() {
        let signal = [0.0, 1.0, 0.0, 0.9, 0.0, 0.0, 0.0, 1.0, 0.0];
        let peaks = find_peaks(&signal, 3);
        assert_eq!(peaks, vec![1, 7]);
    }

    #[test]
    fn taller_candidate_replaces_close_neighbor() {
        let signal = [0.0, 0.5, 0.2, 1.0, 0.0];
        let peaks = find_peaks(&signal, 3);
        assert_eq!(peaks, vec![3]);
    }

    #[test]
    fn rotated_binary_rectangle_has_no_padding_artifacts() {
        // Out-of-bounds samples read as 0, so on an all-ones rectangle any
        // padding bleeding into the crop shows up as a value below 1.
        let img = ImageF32::from_fn(300, 200, |_, _| 1.0);
        for &angle in &[0.15f32, 0.3, 0.7, 1.2, 2.0] {
            let cropped = rotate_and_crop(&img, angle);
            assert!(cropped.w > 0 && cropped.h > 0, "empty crop at {angle}");
            for &v in &cropped.data {
                assert!((v - 1.0).abs() < 1e-5, "padding bled into crop at {angle}: {v}");
            }
        }
    }

    #[test]
    fn interior_rect_handles_the_45_degree_square() {
        let (w, h) = interior_rect(32, 32, PI / 4.0);
        // 31 / (sin + cos) ≈ 21.9, minus the sampling guard.
        assert_eq!(w, 17);
        assert_eq!(h, 17);
    }

    #[test]
    fn flat_block_yields_no_estimate() {
        let block = ImageF32::from_fn(32, 32, |_, _| 0.5);
        let freq = estimate_block_frequency(&block, 0.3, &FrequencyParams::default());
        assert!(freq.is_none());
    }

    #[test]
    fn median_fill_repairs_isolated_gaps() {
        // 3×3 grid with a hole in the middle.
        let raw = vec![
            Some(0.1),
            Some(0.1),
            Some(0.1),
            Some(0.1),
            None,
            Some(0.1),
            Some(0.1),
            Some(0.1),
            Some(0.1),
        ];
        let filled = median_fill(&raw, 3, 3);
        assert_eq!(filled[4], Some(0.1));
    }

    #[test]
    fn all_invalid_grid_stays_invalid() {
        let raw = vec![None; 9];
        let filled = median_fill(&raw, 3, 3);
        assert!(filled.iter().all(|v| v.is_none()));
    }

    #[test]
    fn rect_mean_ignores_invalid_cells() {
        let field = FrequencyField::from_blocks(4, 2, 1, vec![Some(0.2), None]);
        let mean = field.mean_valid_in_rect(0, 0, 8, 4);
        assert_eq!(mean, Some(0.2));
        assert_eq!(field.mean_valid_in_rect(4, 0, 4, 4), None);
    }
}
