//! Quality analyzer orchestrating the ridge-structure pipeline.
//!
//! Overview
//! - Normalizes the raw grayscale input into [0, 1].
//! - Segments the ridge-bearing foreground unless the caller supplies a
//!   mask (an external mask always wins).
//! - Estimates the block orientation field with coherence, then per-block
//!   ridge frequencies, then runs the orientation-adaptive ridge filter.
//! - Derives local and global quality scores plus SNR/CNR/clarity signals
//!   from the estimated fields and the filtered image.
//!
//! Modules
//! - [`params`] – configuration types aggregating every stage's knobs.
//! - `pipeline` – the [`QualityAnalyzer`] implementation with per-stage
//!   timings.
//!
//! Key Ideas
//! - Orientation is ambiguous modulo π; every averaging step works in
//!   [0, π) via the shared circular statistics in [`crate::angle`].
//! - Missing frequency estimates are `Option`-typed and filtered before
//!   every average; they never enter arithmetic as fake numbers.

pub mod params;
mod pipeline;

pub use params::QualityParams;
pub use pipeline::{AnalysisReport, QualityAnalyzer, StageTimings};
