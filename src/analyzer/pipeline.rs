//! Analyzer pipeline running the ridge-structure stages end-to-end.
//!
//! The [`QualityAnalyzer`] exposes a simple API: feed a grayscale image
//! (plus an optional foreground mask) and get back the estimated fields,
//! the ridge-enhanced image and the quality scores, with per-stage timings.
//!
//! Typical usage:
//! ```no_run
//! use ridge_quality::{QualityAnalyzer, QualityParams};
//! use ridge_quality::image::ImageU8;
//!
//! # fn example(gray: ImageU8) {
//! let analyzer = QualityAnalyzer::new(QualityParams::default());
//! let report = analyzer.process(gray, None);
//! println!("global quality: {:.3}", report.scores.global_score);
//! # }
//! ```
use super::params::QualityParams;
use crate::frequency::{estimate_frequencies, FrequencyField};
use crate::image::{ImageF32, ImageU8, Mask};
use crate::normalize::normalize_max;
use crate::orientation::{estimate_orientation, OrientationField};
use crate::quality::{clarity, cnr, score_blocks, snr, QualityScores};
use crate::ridgefilter::apply_ridge_filter;
use crate::segmentation::segment_foreground;
use log::debug;
use serde::Serialize;
use std::time::Instant;

/// Wall-clock milliseconds spent in each pipeline stage.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct StageTimings {
    pub normalize_ms: f64,
    pub segmentation_ms: f64,
    pub orientation_ms: f64,
    pub frequency_ms: f64,
    pub filter_ms: f64,
    pub scoring_ms: f64,
    pub total_ms: f64,
}

/// Everything the pipeline produces for one image.
#[derive(Clone, Debug)]
pub struct AnalysisReport {
    /// Block orientation field with per-block coherence.
    pub orientation: OrientationField,
    /// Block ridge-frequency field; invalid cells are `None`.
    pub frequency: FrequencyField,
    /// Ridge-enhanced image, same shape as the input.
    pub filtered: ImageF32,
    /// Foreground mask that statistics were restricted to.
    pub mask: Mask,
    /// Local and aggregate quality scores.
    pub scores: QualityScores,
    /// Per-stage wall-clock timings.
    pub timings: StageTimings,
}

/// Quality analyzer orchestrating normalization, segmentation, orientation
/// and frequency estimation, ridge filtering and scoring.
pub struct QualityAnalyzer {
    params: QualityParams,
}

impl QualityAnalyzer {
    /// Create an analyzer with the supplied parameters.
    pub fn new(params: QualityParams) -> Self {
        Self { params }
    }

    /// Current parameters.
    pub fn params(&self) -> &QualityParams {
        &self.params
    }

    /// Run the full pipeline on an 8-bit grayscale view.
    ///
    /// Panics when the image is smaller than one estimation block or when
    /// the supplied mask does not match the image shape.
    pub fn process(&self, gray: ImageU8<'_>, mask: Option<&Mask>) -> AnalysisReport {
        let total_start = Instant::now();
        let norm_start = Instant::now();
        let img = normalize_max(&gray.to_f32());
        let normalize_ms = elapsed_ms(norm_start);
        self.run(img, mask, total_start, normalize_ms)
    }

    /// Run the full pipeline on an already-normalized float image.
    pub fn process_f32(&self, img: &ImageF32, mask: Option<&Mask>) -> AnalysisReport {
        let total_start = Instant::now();
        let norm_start = Instant::now();
        let img = normalize_max(img);
        let normalize_ms = elapsed_ms(norm_start);
        self.run(img, mask, total_start, normalize_ms)
    }

    fn run(
        &self,
        img: ImageF32,
        mask: Option<&Mask>,
        total_start: Instant,
        normalize_ms: f64,
    ) -> AnalysisReport {
        let params = &self.params;
        let min_extent = params.orientation.block_size.max(params.frequency.block_size);
        assert!(
            img.w >= min_extent && img.h >= min_extent,
            "image {}x{} smaller than one {}px block",
            img.w,
            img.h,
            min_extent
        );

        let seg_start = Instant::now();
        let mask = match mask {
            Some(m) => {
                assert_eq!((m.w, m.h), (img.w, img.h), "mask shape mismatch");
                m.clone()
            }
            None => segment_foreground(&img, &params.segmentation),
        };
        let segmentation_ms = elapsed_ms(seg_start);
        debug!(
            "QualityAnalyzer::process segmentation {:.3} ms, foreground {}px",
            segmentation_ms,
            mask.count_foreground()
        );

        let ori_start = Instant::now();
        let orientation = estimate_orientation(&img, &params.orientation);
        let orientation_ms = elapsed_ms(ori_start);
        debug!(
            "QualityAnalyzer::process orientation {:.3} ms, grid {}x{}",
            orientation_ms, orientation.blocks_x, orientation.blocks_y
        );

        let freq_start = Instant::now();
        let frequency = estimate_frequencies(&img, &orientation, &params.frequency);
        let frequency_ms = elapsed_ms(freq_start);
        debug!(
            "QualityAnalyzer::process frequency {:.3} ms, valid {:.1}%",
            frequency_ms,
            frequency.valid_fraction() * 100.0
        );

        let filter_start = Instant::now();
        let (theta, _) = orientation.to_pixel_maps(img.w, img.h, params.interpolate_orientation);
        let filtered = apply_ridge_filter(&img, &theta, &frequency, &params.filter);
        let filter_ms = elapsed_ms(filter_start);
        debug!("QualityAnalyzer::process ridge filter {:.3} ms", filter_ms);

        let score_start = Instant::now();
        let blocks = score_blocks(&orientation, &frequency, &filtered, &mask, &params.weights);
        let snr_db = snr(&img, &filtered, &mask);
        let cnr_value = cnr(&img, &mask);
        let (clarity_mean, clarity_std) = clarity(&img, &mask, params.orientation.block_size);
        let scores = QualityScores {
            blocks_x: blocks.blocks_x,
            blocks_y: blocks.blocks_y,
            local_scores: blocks.local_scores,
            global_score: blocks.global_score,
            center_weighted_score: blocks.center_weighted_score,
            snr_db,
            cnr: cnr_value,
            clarity_mean,
            clarity_std,
        };
        let scoring_ms = elapsed_ms(score_start);

        let timings = StageTimings {
            normalize_ms,
            segmentation_ms,
            orientation_ms,
            frequency_ms,
            filter_ms,
            scoring_ms,
            total_ms: elapsed_ms(total_start),
        };
        debug!(
            "QualityAnalyzer::process done in {:.3} ms, global={:.3}",
            timings.total_ms, scores.global_score
        );

        AnalysisReport {
            orientation,
            frequency,
            filtered,
            mask,
            scores,
            timings,
        }
    }
}

#[inline]
fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
