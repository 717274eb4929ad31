#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod analyzer;
pub mod image;
pub mod normalize;
pub mod quality;
pub mod segmentation;

// “Expert” modules – still public, but considered unstable internals.
pub mod angle;
pub mod frequency;
pub mod gauss;
pub mod gradients;
pub mod orientation;
pub mod ridgefilter;

// --- High-level re-exports -------------------------------------------------

// Main entry points: analyzer + results.
pub use crate::analyzer::{AnalysisReport, QualityAnalyzer, QualityParams, StageTimings};
pub use crate::quality::QualityScores;

// Field types handed to external scoring/plotting collaborators.
pub use crate::frequency::FrequencyField;
pub use crate::orientation::OrientationField;

/// Small prelude for quick experiments.
///
/// ```no_run
/// use ridge_quality::prelude::*;
///
/// # fn main() {
/// let (w, h) = (320usize, 480usize);
/// let gray = vec![0u8; w * h];
/// let img = ImageU8 { w, h, stride: w, data: &gray };
///
/// let analyzer = QualityAnalyzer::new(QualityParams::default());
/// let report = analyzer.process(img, None);
/// println!(
///     "global={:.3} in {:.1} ms",
///     report.scores.global_score, report.timings.total_ms
/// );
/// # }
/// ```
pub mod prelude {
    pub use crate::image::{ImageF32, ImageU8, Mask};
    pub use crate::{AnalysisReport, QualityAnalyzer, QualityParams};
}
