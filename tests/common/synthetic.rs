use ridge_quality::image::ImageF32;
use std::f32::consts::{FRAC_PI_2, PI};

/// Parallel sinusoidal stripes: ridges flow along `ridge_angle` and repeat
/// with the given period (pixels) across them. Intensities lie in [0, 1].
pub fn sinusoidal_stripes(width: usize, height: usize, period: f32, ridge_angle: f32) -> ImageF32 {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    assert!(period > 0.0, "stripe period must be positive");

    let wave_angle = ridge_angle + FRAC_PI_2;
    let (sin, cos) = (wave_angle.sin(), wave_angle.cos());
    ImageF32::from_fn(width, height, |x, y| {
        let phase = (x as f32 * cos + y as f32 * sin) * (2.0 * PI / period);
        0.5 + 0.5 * phase.cos()
    })
}

/// Constant-intensity image.
pub fn flat_image(width: usize, height: usize, value: f32) -> ImageF32 {
    ImageF32::from_fn(width, height, |_, _| value)
}
