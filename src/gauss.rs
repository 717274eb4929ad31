//! Separable Gaussian blur with arbitrary σ.
//!
//! Design
//! - The 1-D kernel samples `exp(-x²/2σ²)` at integer offsets out to a
//!   radius of `ceil(3σ)` and is normalized to unit sum.
//! - Horizontal then vertical pass; boundary handling replicates the border
//!   via index clamping.
//! - Values stay in [0, 1] for [0, 1] input since the kernel is a convex
//!   combination.
//!
//! Complexity: O(W·H·r) per pass with two 1-D passes.
use crate::image::ImageF32;

/// Sample a normalized 1-D Gaussian kernel for the given σ.
/// Radius is `ceil(3σ)`, so the returned length is `2·ceil(3σ) + 1`.
pub fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    assert!(sigma > 0.0, "sigma must be positive");
    let radius = (3.0 * sigma).ceil() as isize;
    let denom = 2.0 * sigma * sigma;
    let mut kernel = Vec::with_capacity((2 * radius + 1) as usize);
    let mut sum = 0.0f32;
    for i in -radius..=radius {
        let v = (-(i * i) as f32 / denom).exp();
        kernel.push(v);
        sum += v;
    }
    for v in &mut kernel {
        *v /= sum;
    }
    kernel
}

/// Blur a single-channel image with an isotropic Gaussian of the given σ.
pub fn gaussian_blur(img: &ImageF32, sigma: f32) -> ImageF32 {
    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as isize;
    let w = img.w;
    let h = img.h;
    if w == 0 || h == 0 {
        return img.clone();
    }

    // horizontal
    let mut tmp = ImageF32::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0f32;
            for (k, &kv) in kernel.iter().enumerate() {
                let sx = (x as isize + k as isize - radius).clamp(0, w as isize - 1) as usize;
                acc += img.get(sx, y) * kv;
            }
            tmp.set(x, y, acc);
        }
    }

    // vertical
    let mut out = ImageF32::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0f32;
            for (k, &kv) in kernel.iter().enumerate() {
                let sy = (y as isize + k as isize - radius).clamp(0, h as isize - 1) as usize;
                acc += tmp.get(x, sy) * kv;
            }
            out.set(x, y, acc);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageF32;

    #[test]
    fn kernel_is_normalized_and_symmetric() {
        let kernel = gaussian_kernel(2.0);
        assert_eq!(kernel.len(), 13);
        let sum: f32 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        for i in 0..kernel.len() / 2 {
            assert!((kernel[i] - kernel[kernel.len() - 1 - i]).abs() < 1e-6);
        }
    }

    #[test]
    fn constant_image_is_preserved() {
        let img = ImageF32::from_fn(16, 12, |_, _| 0.7);
        let blurred = gaussian_blur(&img, 2.0);
        for &v in &blurred.data {
            assert!((v - 0.7).abs() < 1e-5);
        }
    }

    #[test]
    fn blur_reduces_step_contrast() {
        let img = ImageF32::from_fn(32, 8, |x, _| if x < 16 { 0.0 } else { 1.0 });
        let blurred = gaussian_blur(&img, 2.0);
        let at_edge = blurred.get(16, 4);
        assert!(at_edge > 0.2 && at_edge < 0.8, "edge value {at_edge}");
    }
}
