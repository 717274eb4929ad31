//! Quality signals derived from the estimated ridge structure.
//!
//! Each scoring function is a pure function of the per-block descriptors
//! and the foreground mask: coherence, frequency and filter-response maps
//! are min-max normalized across foreground blocks, combined with fixed
//! weights into local block scores, and aggregated into a global mean and
//! a centre-weighted score (fingerprint cores sit near the middle of a
//! scan, so central blocks matter more). SNR, CNR and clarity statistics
//! complement the block scores.
//!
//! Background blocks never enter any statistic.
use crate::frequency::FrequencyField;
use crate::image::{ImageF32, Mask};
use crate::orientation::OrientationField;
use serde::Serialize;

/// Relative weights of the block-score components.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct ScoreWeights {
    pub coherence: f32,
    pub frequency: f32,
    pub gabor: f32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            coherence: 0.5,
            frequency: 0.3,
            gabor: 0.2,
        }
    }
}

/// Combined per-block scores and their aggregates.
#[derive(Clone, Debug, Serialize)]
pub struct BlockScores {
    pub blocks_x: usize,
    pub blocks_y: usize,
    /// Per-block combined score in [0, 1]; `None` for background blocks.
    pub local_scores: Vec<Option<f32>>,
    /// Mean of the weighted component means over foreground blocks.
    pub global_score: f32,
    /// Local scores averaged with weights falling off from the grid centre.
    pub center_weighted_score: f32,
}

/// Full quality summary for one image, assembled by the pipeline.
#[derive(Clone, Debug, Serialize)]
pub struct QualityScores {
    pub blocks_x: usize,
    pub blocks_y: usize,
    /// Per-block combined score in [0, 1]; `None` for background blocks.
    pub local_scores: Vec<Option<f32>>,
    /// Mean of the weighted component means over foreground blocks.
    pub global_score: f32,
    /// Local scores averaged with weights falling off from the grid centre.
    pub center_weighted_score: f32,
    /// Signal-to-noise ratio of the filtered image in decibels.
    pub snr_db: f32,
    /// Contrast-to-noise ratio between foreground and background.
    pub cnr: f32,
    /// Mean per-block intensity std over fully-foreground blocks.
    pub clarity_mean: f32,
    /// Spread of the per-block clarity values.
    pub clarity_std: f32,
}

/// Signal-to-noise ratio in dB between an image and its filtered version,
/// over foreground pixels. +∞ when the noise power vanishes.
pub fn snr(img: &ImageF32, filtered: &ImageF32, mask: &Mask) -> f32 {
    assert_eq!((img.w, img.h), (filtered.w, filtered.h), "shape mismatch");
    assert_eq!((img.w, img.h), (mask.w, mask.h), "mask shape mismatch");

    let mut signal_power = 0.0f64;
    let mut noise_power = 0.0f64;
    let mut count = 0usize;
    for y in 0..img.h {
        for x in 0..img.w {
            if !mask.get(x, y) {
                continue;
            }
            let s = img.get(x, y) as f64;
            let n = s - filtered.get(x, y) as f64;
            signal_power += s * s;
            noise_power += n * n;
            count += 1;
        }
    }
    if count == 0 || noise_power == 0.0 {
        return f32::INFINITY;
    }
    (10.0 * (signal_power / noise_power).log10()) as f32
}

/// Contrast-to-noise ratio: |mean(foreground) − mean(background)| divided
/// by the background std. +∞ when there is no background noise to compare
/// against.
pub fn cnr(img: &ImageF32, mask: &Mask) -> f32 {
    assert_eq!((img.w, img.h), (mask.w, mask.h), "mask shape mismatch");

    let mut fg_sum = 0.0f64;
    let mut fg_n = 0usize;
    let mut bg_sum = 0.0f64;
    let mut bg_sq = 0.0f64;
    let mut bg_n = 0usize;
    for y in 0..img.h {
        for x in 0..img.w {
            let v = img.get(x, y) as f64;
            if mask.get(x, y) {
                fg_sum += v;
                fg_n += 1;
            } else {
                bg_sum += v;
                bg_sq += v * v;
                bg_n += 1;
            }
        }
    }
    if fg_n == 0 || bg_n == 0 {
        return f32::INFINITY;
    }
    let fg_mean = fg_sum / fg_n as f64;
    let bg_mean = bg_sum / bg_n as f64;
    let bg_std = (bg_sq / bg_n as f64 - bg_mean * bg_mean).max(0.0).sqrt();
    if bg_std == 0.0 {
        return f32::INFINITY;
    }
    ((fg_mean - bg_mean).abs() / bg_std) as f32
}

/// Mean and std of per-block intensity std over fully-foreground blocks.
/// `(0, 0)` when no block lies entirely inside the mask.
pub fn clarity(img: &ImageF32, mask: &Mask, block_size: usize) -> (f32, f32) {
    assert!(block_size > 0, "block size must be positive");
    let blocks_x = img.w / block_size;
    let blocks_y = img.h / block_size;

    let mut stds = Vec::new();
    for j in 0..blocks_y {
        for i in 0..blocks_x {
            let x = i * block_size;
            let y = j * block_size;
            let area = block_size * block_size;
            if mask.count_foreground_in_rect(x, y, block_size, block_size) < area {
                continue;
            }
            let mut sum = 0.0f32;
            let mut sum_sq = 0.0f32;
            for yy in y..y + block_size {
                for xx in x..x + block_size {
                    let v = img.get(xx, yy);
                    sum += v;
                    sum_sq += v * v;
                }
            }
            let n = area as f32;
            let mean = sum / n;
            stds.push((sum_sq / n - mean * mean).max(0.0).sqrt());
        }
    }
    mean_and_std(&stds)
}

/// Combine coherence, frequency and filter-response block maps into local
/// and aggregate quality scores.
///
/// The block grid follows the orientation field. Frequency cells are looked
/// up at each block's centre; missing frequencies contribute the lowest
/// normalized value (an unestimable frequency is itself a quality defect).
/// A block is foreground when at least half its pixels are masked in.
pub fn score_blocks(
    orientations: &OrientationField,
    frequencies: &FrequencyField,
    filtered: &ImageF32,
    mask: &Mask,
    weights: &ScoreWeights,
) -> BlockScores {
    let bs = orientations.block_size;
    let blocks_x = orientations.blocks_x;
    let blocks_y = orientations.blocks_y;
    let n_blocks = blocks_x * blocks_y;

    let mut foreground = vec![false; n_blocks];
    let mut coherence = vec![0.0f32; n_blocks];
    let mut frequency = vec![0.0f32; n_blocks];
    let mut freq_valid = vec![false; n_blocks];
    let mut gabor = vec![0.0f32; n_blocks];

    for j in 0..blocks_y {
        for i in 0..blocks_x {
            let idx = j * blocks_x + i;
            let x = i * bs;
            let y = j * bs;
            foreground[idx] = mask.count_foreground_in_rect(x, y, bs, bs) * 2 >= bs * bs;
            coherence[idx] = orientations.coherence(i, j);
            if let Some(f) = frequencies.at_pixel(x + bs / 2, y + bs / 2) {
                frequency[idx] = f;
                freq_valid[idx] = true;
            }
            gabor[idx] = block_std(filtered, x, y, bs);
        }
    }

    let norm_coherence = min_max_normalize(&coherence, &foreground);
    let norm_gabor = min_max_normalize(&gabor, &foreground);
    // Invalid frequencies stay at the floor of the normalized range.
    let fg_and_valid: Vec<bool> = foreground
        .iter()
        .zip(&freq_valid)
        .map(|(&f, &v)| f && v)
        .collect();
    let mut norm_frequency = min_max_normalize(&frequency, &fg_and_valid);
    for (nf, &valid) in norm_frequency.iter_mut().zip(&freq_valid) {
        if !valid {
            *nf = 0.0;
        }
    }

    let total_weight = weights.coherence + weights.frequency + weights.gabor;
    let mut local_scores = vec![None; n_blocks];
    let mut component_sums = [0.0f32; 3];
    let mut fg_count = 0usize;
    for idx in 0..n_blocks {
        if !foreground[idx] {
            continue;
        }
        let score = (weights.coherence * norm_coherence[idx]
            + weights.frequency * norm_frequency[idx]
            + weights.gabor * norm_gabor[idx])
            / total_weight;
        local_scores[idx] = Some(score);
        component_sums[0] += norm_coherence[idx];
        component_sums[1] += norm_frequency[idx];
        component_sums[2] += norm_gabor[idx];
        fg_count += 1;
    }

    let global_score = if fg_count > 0 {
        let n = fg_count as f32;
        (weights.coherence * component_sums[0] / n
            + weights.frequency * component_sums[1] / n
            + weights.gabor * component_sums[2] / n)
            / total_weight
    } else {
        0.0
    };

    BlockScores {
        blocks_x,
        blocks_y,
        center_weighted_score: center_weighted_mean(&local_scores, blocks_x, blocks_y),
        local_scores,
        global_score,
    }
}

/// Weighted mean of local scores with weights falling off linearly with
/// block distance from the grid centre.
fn center_weighted_mean(
    local_scores: &[Option<f32>],
    blocks_x: usize,
    blocks_y: usize,
) -> f32 {
    if blocks_x == 0 || blocks_y == 0 {
        return 0.0;
    }
    let cx = (blocks_x / 2) as f32;
    let cy = (blocks_y / 2) as f32;
    let mut max_dist = 0.0f32;
    for j in 0..blocks_y {
        for i in 0..blocks_x {
            let d = ((i as f32 - cx).powi(2) + (j as f32 - cy).powi(2)).sqrt();
            max_dist = max_dist.max(d);
        }
    }

    let mut weighted = 0.0f32;
    let mut total = 0.0f32;
    for j in 0..blocks_y {
        for i in 0..blocks_x {
            let Some(score) = local_scores[j * blocks_x + i] else {
                continue;
            };
            let d = ((i as f32 - cx).powi(2) + (j as f32 - cy).powi(2)).sqrt();
            let w = if max_dist > 0.0 { 1.0 - d / max_dist } else { 1.0 };
            weighted += w * score;
            total += w;
        }
    }
    if total > 0.0 {
        weighted / total
    } else {
        0.0
    }
}

/// Min-max normalize `values` over the selected cells; a constant selection
/// maps to the neutral 0.5. Unselected cells keep their normalized position
/// relative to the selected range, clamped into [0, 1].
fn min_max_normalize(values: &[f32], selected: &[bool]) -> Vec<f32> {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for (&v, &s) in values.iter().zip(selected) {
        if s {
            min = min.min(v);
            max = max.max(v);
        }
    }
    if !min.is_finite() || !max.is_finite() {
        return vec![0.0; values.len()];
    }
    let range = max - min;
    values
        .iter()
        .map(|&v| {
            if range > 0.0 {
                ((v - min) / range).clamp(0.0, 1.0)
            } else {
                0.5
            }
        })
        .collect()
}

fn block_std(img: &ImageF32, x: usize, y: usize, block_size: usize) -> f32 {
    let x_end = (x + block_size).min(img.w);
    let y_end = (y + block_size).min(img.h);
    let n = ((x_end - x) * (y_end - y)) as f32;
    if n == 0.0 {
        return 0.0;
    }
    let mut sum = 0.0f32;
    let mut sum_sq = 0.0f32;
    for j in y..y_end {
        for i in x..x_end {
            let v = img.get(i, j);
            sum += v;
            sum_sq += v * v;
        }
    }
    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0).sqrt()
}

fn mean_and_std(values: &[f32]) -> (f32, f32) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    let var = values.iter().map(|&v| (v - mean) * (v - mean)).sum::<f32>() / n;
    (mean, var.sqrt())
}
