//! Intensity normalization.
//!
//! Max-normalization rescales a raw grayscale image into [0, 1] by dividing
//! by the maximum sample. It is idempotent: a second pass over an image
//! whose maximum is already 1 changes nothing.
use crate::image::ImageF32;

/// Rescale an image into [0, 1] by dividing by its maximum value.
/// An all-zero image is returned unchanged.
pub fn normalize_max(img: &ImageF32) -> ImageF32 {
    let mut out = img.clone();
    let max = out.max_value();
    if max > 0.0 {
        for v in &mut out.data {
            *v /= max;
        }
    }
    out
}

/// Min-max normalize a 1-D signal into [0, 1] in place.
/// A constant signal collapses to all zeros.
pub fn normalize_signal(signal: &mut [f32]) {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in signal.iter() {
        min = min.min(v);
        max = max.max(v);
    }
    let range = max - min;
    if !(range > 0.0) {
        signal.fill(0.0);
        return;
    }
    for v in signal {
        *v = (*v - min) / range;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageF32;

    #[test]
    fn normalization_is_idempotent() {
        let img = ImageF32::from_fn(8, 8, |x, y| (x + y) as f32);
        let once = normalize_max(&img);
        let twice = normalize_max(&once);
        assert!((once.max_value() - 1.0).abs() < 1e-6);
        for (a, b) in once.data.iter().zip(&twice.data) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn all_zero_image_is_unchanged() {
        let img = ImageF32::new(4, 4);
        let out = normalize_max(&img);
        assert!(out.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn constant_signal_collapses_to_zero() {
        let mut signal = [3.0f32; 5];
        normalize_signal(&mut signal);
        assert!(signal.iter().all(|&v| v == 0.0));

        let mut ramp = [1.0f32, 2.0, 3.0];
        normalize_signal(&mut ramp);
        assert_eq!(ramp[0], 0.0);
        assert_eq!(ramp[2], 1.0);
    }
}
