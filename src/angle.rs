//! Angle utilities shared by the orientation, frequency and filter stages.
//!
//! Ridge orientation is undirected: an angle and the same angle plus π name
//! the same ridge flow, so every average or distance here works modulo π.

use std::f32::consts::{FRAC_PI_2, PI};

/// Normalizes an angle into the range [0, π).
#[inline]
pub fn normalize_half_pi(angle: f32) -> f32 {
    let mut norm = angle.rem_euclid(PI);
    if norm >= PI {
        norm -= PI;
    }
    if norm >= PI - 1e-6 {
        0.0
    } else {
        norm
    }
}

/// Computes the smallest unsigned angular difference between two orientations,
/// treating antipodal directions as equivalent (i.e. π apart → 0).
#[inline]
pub fn angular_difference(a: f32, b: f32) -> f32 {
    let mut diff = (a - b).abs();
    if diff > PI {
        diff = diff.rem_euclid(PI);
    }
    if diff > FRAC_PI_2 {
        PI - diff
    } else {
        diff
    }
}

/// Averages a set of π-periodic orientations and reports their dispersion.
///
/// Naive arithmetic averaging breaks at the wrap boundary (0.01 and π−0.01
/// would average to π/2 instead of ≈0). The first angle serves as the
/// reference: every other angle is shifted by ∓π until it lies within π/2 of
/// it, then the ordinary (optionally weighted) mean and standard deviation
/// of the shifted set are taken and the mean is reduced mod π.
///
/// Returns `(mean, std)`; `(0.0, 0.0)` for an empty slice. When `weights`
/// is given it must match `angles` in length; non-positive total weight
/// falls back to the unweighted mean.
pub fn average_orientation(angles: &[f32], weights: Option<&[f32]>) -> (f32, f32) {
    if angles.is_empty() {
        return (0.0, 0.0);
    }
    if let Some(w) = weights {
        assert_eq!(w.len(), angles.len(), "weights length mismatch");
    }

    let reference = angles[0];
    let unwrap = |a: f32| {
        if (a - reference).abs() > FRAC_PI_2 {
            if a > reference {
                a - PI
            } else {
                a + PI
            }
        } else {
            a
        }
    };

    let mut sum = 0.0f32;
    let mut sum_w = 0.0f32;
    for (i, &a) in angles.iter().enumerate() {
        let w = weights.map_or(1.0, |ws| ws[i]);
        sum += unwrap(a) * w;
        sum_w += w;
    }
    if sum_w <= 0.0 {
        sum = angles.iter().map(|&a| unwrap(a)).sum();
        sum_w = angles.len() as f32;
    }
    let mean = sum / sum_w;

    let mut var = 0.0f32;
    for &a in angles {
        let d = unwrap(a) - mean;
        var += d * d;
    }
    let std = (var / angles.len() as f32).sqrt();

    (mean.rem_euclid(PI), std)
}

/// Mean of π-periodic orientations computed in the doubled-angle complex
/// domain: average `exp(2iθ)` and halve the resulting argument.
///
/// Mathematically equivalent to [`average_orientation`]; used where weighted
/// bilinear blending must stay continuous across the π wraparound. Returns
/// `fallback` when the resultant vector is degenerate (balanced opposing
/// orientations).
pub fn doubled_angle_mean(angles: &[f32], weights: &[f32], fallback: f32) -> f32 {
    debug_assert_eq!(angles.len(), weights.len());
    let mut sx = 0.0f32;
    let mut sy = 0.0f32;
    for (&a, &w) in angles.iter().zip(weights) {
        let doubled = a * 2.0;
        sx += w * doubled.cos();
        sy += w * doubled.sin();
    }
    if sx * sx + sy * sy <= 1e-12 {
        return normalize_half_pi(fallback);
    }
    normalize_half_pi(0.5 * sy.atan2(sx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn normalize_half_pi_basic() {
        assert!(approx_eq(normalize_half_pi(0.5), 0.5));
        assert!(approx_eq(normalize_half_pi(-FRAC_PI_4), 3.0 * FRAC_PI_4));
        assert!(approx_eq(normalize_half_pi(PI), 0.0));
        assert!(approx_eq(normalize_half_pi(3.0 * PI), 0.0));
    }

    #[test]
    fn angular_difference_handles_wrap() {
        assert!(approx_eq(angular_difference(0.0, PI), 0.0));
        assert!(approx_eq(angular_difference(0.0, FRAC_PI_2), FRAC_PI_2));
        assert!(approx_eq(
            angular_difference(FRAC_PI_4, -FRAC_PI_4),
            FRAC_PI_2
        ));
    }

    #[test]
    fn average_handles_wrap_boundary() {
        // Naive averaging of these gives π/2; the unwrapped mean is ≈0.
        let (mean, std) = average_orientation(&[0.01, PI - 0.01], None);
        assert!(angular_difference(mean, 0.0) < 1e-3, "mean={mean}");
        assert!(std < 0.02);
    }

    #[test]
    fn average_is_invariant_under_pi_shifts() {
        let a = 0.4f32;
        let b = 2.9f32;
        let (mean_ab, _) = average_orientation(&[a, b], None);
        let (mean_shifted, _) = average_orientation(&[a, b + PI], None);
        assert!(
            angular_difference(mean_ab, mean_shifted) < 1e-4,
            "{mean_ab} vs {mean_shifted}"
        );
    }

    #[test]
    fn weighted_average_prefers_heavier_angle() {
        let (mean, _) = average_orientation(&[0.2, 1.0], Some(&[1.0, 3.0]));
        assert!(approx_eq(mean, 0.8));
    }

    #[test]
    fn doubled_angle_mean_matches_reference_unwrap() {
        let angles = [0.05f32, PI - 0.03];
        let weights = [1.0f32, 1.0];
        let complex = doubled_angle_mean(&angles, &weights, 0.0);
        let (unwrapped, _) = average_orientation(&angles, None);
        assert!(angular_difference(complex, unwrapped) < 1e-3);
    }

    #[test]
    fn empty_input_yields_zero() {
        assert_eq!(average_orientation(&[], None), (0.0, 0.0));
    }
}
