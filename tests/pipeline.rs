mod common;

use common::synthetic::sinusoidal_stripes;
use ridge_quality::image::{ImageView, Mask};
use ridge_quality::{QualityAnalyzer, QualityParams};

fn stripes_u8_buffer(width: usize, height: usize) -> Vec<u8> {
    let img = sinusoidal_stripes(width, height, 8.0, 0.6);
    let mut buffer = Vec::with_capacity(width * height);
    for y in 0..height {
        for &v in img.row(y) {
            buffer.push((v * 255.0).round().clamp(0.0, 255.0) as u8);
        }
    }
    buffer
}

#[test]
fn analyzer_produces_consistent_report_with_supplied_mask() {
    let (w, h) = (160usize, 192usize);
    let buffer = stripes_u8_buffer(w, h);
    let image = ridge_quality::image::ImageU8 {
        w,
        h,
        stride: w,
        data: &buffer,
    };

    let analyzer = QualityAnalyzer::new(QualityParams::default());
    let report = analyzer.process(image, Some(&Mask::filled(w, h)));

    assert_eq!(report.filtered.w, w);
    assert_eq!(report.filtered.h, h);
    assert_eq!(report.orientation.blocks_x, w / 16);
    assert_eq!(report.orientation.blocks_y, h / 16);
    assert_eq!(report.frequency.blocks_x, w / 32);
    assert_eq!(report.frequency.blocks_y, h / 32);
    assert_eq!(report.mask.count_foreground(), w * h);

    let scores = &report.scores;
    assert_eq!(scores.local_scores.len(), scores.blocks_x * scores.blocks_y);
    for score in scores.local_scores.iter().flatten() {
        assert!((0.0..=1.0).contains(score), "local score {score}");
    }
    assert!((0.0..=1.0).contains(&scores.global_score));
    assert!((0.0..=1.0).contains(&scores.center_weighted_score));
    assert!(scores.clarity_mean > 0.0);
    assert!(scores.snr_db.is_finite() || scores.snr_db.is_infinite());

    assert!(report.timings.total_ms >= 0.0);
    assert!(report.timings.orientation_ms >= 0.0);
}

#[test]
fn analyzer_segments_on_its_own_when_no_mask_is_given() {
    let (w, h) = (160usize, 160usize);
    let buffer = stripes_u8_buffer(w, h);
    let image = ridge_quality::image::ImageU8 {
        w,
        h,
        stride: w,
        data: &buffer,
    };

    let analyzer = QualityAnalyzer::new(QualityParams::default());
    let report = analyzer.process(image, None);
    // Uniform stripes carry variance everywhere, so most of the frame
    // survives segmentation.
    assert!(report.mask.count_foreground() > w * h / 2);
}

#[test]
fn interpolated_orientation_changes_nothing_structural() {
    let (w, h) = (128usize, 128usize);
    let buffer = stripes_u8_buffer(w, h);
    let image = ridge_quality::image::ImageU8 {
        w,
        h,
        stride: w,
        data: &buffer,
    };

    let params = QualityParams {
        interpolate_orientation: true,
        ..Default::default()
    };
    let analyzer = QualityAnalyzer::new(params);
    let report = analyzer.process(image, Some(&Mask::filled(w, h)));
    assert_eq!(report.filtered.w, w);
    assert!((0.0..=1.0).contains(&report.scores.global_score));
}

#[test]
#[should_panic(expected = "mask shape mismatch")]
fn mismatched_mask_fails_fast() {
    let (w, h) = (96usize, 96usize);
    let buffer = stripes_u8_buffer(w, h);
    let image = ridge_quality::image::ImageU8 {
        w,
        h,
        stride: w,
        data: &buffer,
    };
    let analyzer = QualityAnalyzer::new(QualityParams::default());
    analyzer.process(image, Some(&Mask::filled(32, 32)));
}

#[test]
#[should_panic(expected = "smaller than one")]
fn undersized_image_fails_fast() {
    let buffer = vec![0u8; 16 * 16];
    let image = ridge_quality::image::ImageU8 {
        w: 16,
        h: 16,
        stride: 16,
        data: &buffer,
    };
    let analyzer = QualityAnalyzer::new(QualityParams::default());
    analyzer.process(image, None);
}
