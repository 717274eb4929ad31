//! Variance-based foreground segmentation.
//!
//! Ridge-bearing regions carry much more local intensity variance than the
//! empty background of a scan. Each block is compared against a fraction of
//! the global standard deviation; a binary open/close with a disc-shaped
//! structuring element then removes speckle and fills pores.
//!
//! The pipeline only uses this when the caller supplies no mask; an
//! externally produced mask always takes precedence.
use crate::image::{ImageF32, Mask};
use serde::Serialize;

/// Knobs for foreground segmentation.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct SegmentationParams {
    /// Side length of the variance block in pixels.
    pub block_size: usize,
    /// Fraction of the global intensity std below which a block counts as
    /// background.
    pub variance_threshold: f32,
}

impl Default for SegmentationParams {
    fn default() -> Self {
        Self {
            block_size: 16,
            variance_threshold: 0.3,
        }
    }
}

/// Segment the ridge-bearing foreground of a normalized grayscale image.
pub fn segment_foreground(img: &ImageF32, params: &SegmentationParams) -> Mask {
    let bs = params.block_size;
    assert!(bs > 0, "block size must be positive");

    let threshold = params.variance_threshold * global_std(img);

    let mut mask = Mask::new(img.w, img.h);
    let mut y = 0;
    while y < img.h {
        let bh = bs.min(img.h - y);
        let mut x = 0;
        while x < img.w {
            let bw = bs.min(img.w - x);
            // Strict comparison so a zero-variance image (threshold 0)
            // segments as background.
            let keep = block_std(img, x, y, bw, bh) > threshold;
            if keep {
                for j in y..y + bh {
                    for i in x..x + bw {
                        mask.set(i, j, true);
                    }
                }
            }
            x += bs;
        }
        y += bs;
    }

    let disc = disc_offsets(bs as i32);
    let eroded = erode(&mask, &disc);
    let opened = dilate(&eroded, &disc);
    let dilated = dilate(&opened, &disc);
    erode(&dilated, &disc)
}

fn global_std(img: &ImageF32) -> f32 {
    if img.data.is_empty() {
        return 0.0;
    }
    let mean = img.mean();
    let var = img
        .data
        .iter()
        .map(|&v| (v - mean) * (v - mean))
        .sum::<f32>()
        / img.data.len() as f32;
    var.sqrt()
}

fn block_std(img: &ImageF32, x: usize, y: usize, w: usize, h: usize) -> f32 {
    let n = (w * h) as f32;
    if n == 0.0 {
        return 0.0;
    }
    let mut sum = 0.0f32;
    let mut sum_sq = 0.0f32;
    for j in y..y + h {
        for i in x..x + w {
            let v = img.get(i, j);
            sum += v;
            sum_sq += v * v;
        }
    }
    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0).sqrt()
}

/// Offsets of a disc of the given radius, used as the structuring element.
fn disc_offsets(radius: i32) -> Vec<(i32, i32)> {
    let mut offsets = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                offsets.push((dx, dy));
            }
        }
    }
    offsets
}

fn erode(mask: &Mask, offsets: &[(i32, i32)]) -> Mask {
    let mut out = Mask::new(mask.w, mask.h);
    for y in 0..mask.h {
        for x in 0..mask.w {
            let mut keep = true;
            for &(dx, dy) in offsets {
                let nx = x as i32 + dx;
                let ny = y as i32 + dy;
                // Out-of-bounds neighbors count as background.
                if nx < 0
                    || ny < 0
                    || nx >= mask.w as i32
                    || ny >= mask.h as i32
                    || !mask.get(nx as usize, ny as usize)
                {
                    keep = false;
                    break;
                }
            }
            out.set(x, y, keep);
        }
    }
    out
}

fn dilate(mask: &Mask, offsets: &[(i32, i32)]) -> Mask {
    let mut out = Mask::new(mask.w, mask.h);
    for y in 0..mask.h {
        for x in 0..mask.w {
            if !mask.get(x, y) {
                continue;
            }
            for &(dx, dy) in offsets {
                let nx = x as i32 + dx;
                let ny = y as i32 + dy;
                if nx >= 0 && ny >= 0 && nx < mask.w as i32 && ny < mask.h as i32 {
                    out.set(nx as usize, ny as usize, true);
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageF32;
    use std::f32::consts::PI;

    #[test]
    fn flat_image_is_all_background() {
        let img = ImageF32::from_fn(64, 64, |_, _| 0.5);
        let mask = segment_foreground(&img, &SegmentationParams::default());
        assert_eq!(mask.count_foreground(), 0);
    }

    #[test]
    fn textured_center_survives_morphology() {
        // High-variance stripes in the middle, flat border around them.
        let img = ImageF32::from_fn(128, 128, |x, y| {
            if (32..96).contains(&x) && (32..96).contains(&y) {
                0.5 + 0.5 * ((x as f32) * 2.0 * PI / 8.0).cos()
            } else {
                0.1
            }
        });
        let params = SegmentationParams {
            block_size: 8,
            ..Default::default()
        };
        let mask = segment_foreground(&img, &params);
        assert!(mask.get(64, 64), "center should be foreground");
        assert!(!mask.get(2, 2), "corner should be background");
    }
}
