//! Parameter types configuring the analyzer stages.
//!
//! This module groups the knobs for segmentation, orientation estimation,
//! frequency estimation, ridge filtering and score weighting into one
//! structure threaded through the pipeline, so block sizes and thresholds
//! live in exactly one place.
//!
//! Defaults follow the common fingerprint-processing literature: 16 px
//! orientation blocks, 32 px frequency blocks (frequency needs several
//! ridge periods in view), 5–15 px plausible ridge wavelengths.

use crate::frequency::FrequencyParams;
use crate::orientation::OrientationParams;
use crate::quality::ScoreWeights;
use crate::ridgefilter::FilterParams;
use crate::segmentation::SegmentationParams;
use serde::Serialize;

/// Analyzer-wide parameters controlling the multi-stage pipeline.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct QualityParams {
    /// Foreground segmentation (used only when no mask is supplied).
    pub segmentation: SegmentationParams,
    /// Block orientation estimation.
    pub orientation: OrientationParams,
    /// Per-block ridge frequency estimation.
    pub frequency: FrequencyParams,
    /// Orientation-adaptive ridge filter.
    pub filter: FilterParams,
    /// Relative weights of the block-score components.
    pub weights: ScoreWeights,
    /// Expand the orientation field with doubled-angle interpolation
    /// instead of flat per-block broadcast.
    pub interpolate_orientation: bool,
}
