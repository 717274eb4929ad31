mod common;

use common::synthetic::{flat_image, sinusoidal_stripes};
use ridge_quality::angle::angular_difference;
use ridge_quality::frequency::{estimate_frequencies, FrequencyParams};
use ridge_quality::orientation::{estimate_orientation, OrientationParams};
use ridge_quality::ridgefilter::{apply_ridge_filter, FilterParams};

#[test]
fn stripe_orientation_is_recovered_within_tolerance() {
    for &target in &[0.3f32, 1.2, 2.6] {
        let img = sinusoidal_stripes(256, 256, 8.0, target);
        let field = estimate_orientation(&img, &OrientationParams::default());

        for j in 2..field.blocks_y - 2 {
            for i in 2..field.blocks_x - 2 {
                let theta = field.theta(i, j);
                assert!(
                    (0.0..std::f32::consts::PI).contains(&theta),
                    "theta out of range: {theta}"
                );
                let diff = angular_difference(theta, target);
                assert!(
                    diff < 0.05,
                    "target={target} block=({i},{j}) theta={theta} diff={diff}"
                );
            }
        }
    }
}

#[test]
fn stripe_frequency_is_recovered_within_ten_percent() {
    let period = 8.0f32;
    let img = sinusoidal_stripes(256, 256, period, 0.3);
    let params = FrequencyParams::default();
    let orientation = estimate_orientation(&img, &OrientationParams::default());
    let field = estimate_frequencies(&img, &orientation, &params);

    let expected = 1.0 / period;
    let mut checked = 0usize;
    for j in 1..field.blocks_y - 1 {
        for i in 1..field.blocks_x - 1 {
            let freq = field
                .get(i, j)
                .unwrap_or_else(|| panic!("interior block ({i},{j}) lost its estimate"));
            assert!(
                freq >= 1.0 / params.max_wavelength - 1e-6
                    && freq <= 1.0 / params.min_wavelength + 1e-6,
                "frequency {freq} outside plausible ridge range"
            );
            let rel = (freq - expected).abs() / expected;
            assert!(rel < 0.1, "block ({i},{j}) freq={freq} rel err={rel}");
            checked += 1;
        }
    }
    assert!(checked > 0);
}

#[test]
fn flat_image_yields_no_structure_anywhere() {
    let img = flat_image(128, 128, 0.0);

    let orientation = estimate_orientation(&img, &OrientationParams::default());
    for j in 0..orientation.blocks_y {
        for i in 0..orientation.blocks_x {
            assert_eq!(orientation.coherence(i, j), 0.0);
        }
    }

    let frequency = estimate_frequencies(&img, &orientation, &FrequencyParams::default());
    for j in 0..frequency.blocks_y {
        for i in 0..frequency.blocks_x {
            assert_eq!(frequency.get(i, j), None);
        }
    }

    // With no valid frequency anywhere the filter must pass the image
    // through untouched.
    let (theta, _) = orientation.to_pixel_maps(128, 128, false);
    let filtered = apply_ridge_filter(&img, &theta, &frequency, &FilterParams::default());
    assert_eq!(filtered.w, img.w);
    assert_eq!(filtered.h, img.h);
    for (a, b) in filtered.data.iter().zip(&img.data) {
        assert_eq!(a, b);
    }
}

#[test]
fn filter_enhances_ridges_relative_to_flat_regions() {
    let img = sinusoidal_stripes(160, 160, 8.0, 0.9);
    let orientation = estimate_orientation(&img, &OrientationParams::default());
    let frequency = estimate_frequencies(&img, &orientation, &FrequencyParams::default());
    assert!(frequency.valid_fraction() > 0.5);

    let (theta, _) = orientation.to_pixel_maps(160, 160, true);
    let filtered = apply_ridge_filter(&img, &theta, &frequency, &FilterParams::default());
    assert_eq!((filtered.w, filtered.h), (img.w, img.h));
    // Renormalized output stays in [0, 1] and keeps the stripe contrast.
    assert!(filtered.max_value() <= 1.0 + 1e-5);
    let mut min = f32::INFINITY;
    for &v in &filtered.data {
        assert!(v.is_finite());
        min = min.min(v);
    }
    assert!(filtered.max_value() - min > 0.5, "contrast collapsed");
}
