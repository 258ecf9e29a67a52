//! Interpolation kernels and the automatic choice between them.
//!
//! Densely and evenly sampled colour matching data is interpolated with the
//! fifth order Sprague (1880) scheme recommended by the CIE. Anything else
//! (uneven steps, short tables) goes through a natural cubic spline, which
//! degrades to a straight line when only two samples exist.

use serde::{Deserialize, Serialize};

use crate::config::InterpolationConfig;
use crate::error::{Result, SpectralError};

// ---------------------------------------------------------------------------
// Strategy selection
// ---------------------------------------------------------------------------

/// The interpolation scheme applied to a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterpolationMethod {
    /// Fifth order Sprague polynomial; needs uniform sampling.
    Sprague,
    /// Natural cubic spline; works on uneven sampling.
    CubicSpline,
    /// Piecewise linear.
    Linear,
}

/// Whether all consecutive steps of `wavelengths` agree within `tolerance`
/// (relative to the first step).
pub fn is_uniform(wavelengths: &[f64], tolerance: f64) -> bool {
    let mut steps = wavelengths.windows(2).map(|w| w[1] - w[0]);
    let Some(first) = steps.next() else {
        return true;
    };
    steps.all(|step| (step - first).abs() <= tolerance * first.abs().max(1.0))
}

/// Pick the scheme used when the caller does not force one.
pub fn select_method(wavelengths: &[f64], config: &InterpolationConfig) -> InterpolationMethod {
    let uniform = is_uniform(wavelengths, config.uniformity_tolerance);
    let method = if uniform && wavelengths.len() >= config.sprague_min_samples {
        InterpolationMethod::Sprague
    } else if wavelengths.len() > 2 {
        InterpolationMethod::CubicSpline
    } else {
        InterpolationMethod::Linear
    };
    log::debug!(
        "selected {method:?} interpolation for {} samples (uniform: {uniform})",
        wavelengths.len()
    );
    method
}

// ---------------------------------------------------------------------------
// Interpolator trait and construction
// ---------------------------------------------------------------------------

/// A curve through tabulated samples, evaluated inside the sampled range.
pub trait Interpolator {
    /// Value of the curve at `x`; callers keep `x` within the knots.
    fn evaluate(&self, x: f64) -> f64;
}

/// Build the interpolator for `method` over strictly increasing `xs`.
pub fn build(
    method: InterpolationMethod,
    xs: &[f64],
    ys: &[f64],
    config: &InterpolationConfig,
) -> Result<Box<dyn Interpolator>> {
    if xs.len() != ys.len() {
        return Err(SpectralError::LengthMismatch {
            expected: xs.len(),
            actual: ys.len(),
        });
    }
    let interpolator: Box<dyn Interpolator> = match method {
        InterpolationMethod::Sprague => Box::new(SpragueInterpolator::new(
            xs,
            ys,
            config.uniformity_tolerance,
        )?),
        InterpolationMethod::CubicSpline => Box::new(CubicSpline::new(xs, ys)?),
        InterpolationMethod::Linear => Box::new(LinearInterpolator::new(xs, ys)?),
    };
    Ok(interpolator)
}

/// Index `lo` of the knot interval `[xs[lo], xs[lo + 1]]` holding `x`.
fn bracket(xs: &[f64], x: f64) -> usize {
    let hi = xs.partition_point(|&v| v < x).clamp(1, xs.len() - 1);
    hi - 1
}

fn check_knots(xs: &[f64], required: usize, method: &str) -> Result<()> {
    if xs.len() < required {
        return Err(SpectralError::Interpolation(format!(
            "{method} needs at least {required} samples, got {}",
            xs.len()
        )));
    }
    if xs.windows(2).any(|w| w[1] <= w[0]) {
        return Err(SpectralError::Interpolation(format!(
            "{method} needs strictly increasing wavelengths"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Sprague
// ---------------------------------------------------------------------------

/// Coefficients extending the table by two samples at each end (divided by 209).
const SPRAGUE_BOUNDARY: [[f64; 6]; 4] = [
    [884.0, -1960.0, 3033.0, -2648.0, 1080.0, -180.0],
    [508.0, -540.0, 488.0, -367.0, 144.0, -24.0],
    [-24.0, 144.0, -367.0, 488.0, -540.0, 508.0],
    [-180.0, 1080.0, -2648.0, 3033.0, -1960.0, 884.0],
];

/// Sprague (1880) fifth order interpolation over uniformly spaced samples.
#[derive(Debug, Clone)]
pub struct SpragueInterpolator {
    start: f64,
    interval: f64,
    /// Samples with two boundary estimates padded on each side.
    padded: Vec<f64>,
}

impl SpragueInterpolator {
    pub fn new(xs: &[f64], ys: &[f64], tolerance: f64) -> Result<Self> {
        check_knots(xs, 6, "Sprague interpolation")?;
        if !is_uniform(xs, tolerance) {
            return Err(SpectralError::Interpolation(
                "Sprague interpolation needs uniformly spaced wavelengths".into(),
            ));
        }

        let n = ys.len();
        let boundary = |row: usize, window: &[f64]| -> f64 {
            SPRAGUE_BOUNDARY[row]
                .iter()
                .zip(window)
                .map(|(c, y)| c * y)
                .sum::<f64>()
                / 209.0
        };
        let head = &ys[..6];
        let tail = &ys[n - 6..];

        let mut padded = Vec::with_capacity(n + 4);
        padded.push(boundary(0, head));
        padded.push(boundary(1, head));
        padded.extend_from_slice(ys);
        padded.push(boundary(2, tail));
        padded.push(boundary(3, tail));

        Ok(Self {
            start: xs[0],
            interval: (xs[n - 1] - xs[0]) / (n - 1) as f64,
            padded,
        })
    }
}

impl Interpolator for SpragueInterpolator {
    fn evaluate(&self, x: f64) -> f64 {
        let samples = self.padded.len() - 4;
        let r = (x - self.start) / self.interval;
        let i = (r.floor().max(0.0) as usize).min(samples - 2);
        let t = r - i as f64;

        // `p[k]` is sample i - 2 + k.
        let p = &self.padded[i..i + 6];
        let a0 = p[2];
        let a1 = (2.0 * p[0] - 16.0 * p[1] + 16.0 * p[3] - 2.0 * p[4]) / 24.0;
        let a2 = (-p[0] + 16.0 * p[1] - 30.0 * p[2] + 16.0 * p[3] - p[4]) / 24.0;
        let a3 = (-9.0 * p[0] + 39.0 * p[1] - 70.0 * p[2] + 66.0 * p[3] - 33.0 * p[4]
            + 7.0 * p[5])
            / 24.0;
        let a4 = (13.0 * p[0] - 64.0 * p[1] + 126.0 * p[2] - 124.0 * p[3] + 61.0 * p[4]
            - 12.0 * p[5])
            / 24.0;
        let a5 = (-5.0 * p[0] + 25.0 * p[1] - 50.0 * p[2] + 50.0 * p[3] - 25.0 * p[4]
            + 5.0 * p[5])
            / 24.0;

        a0 + t * (a1 + t * (a2 + t * (a3 + t * (a4 + t * a5))))
    }
}

// ---------------------------------------------------------------------------
// Natural cubic spline
// ---------------------------------------------------------------------------

/// Natural cubic spline (zero curvature at both ends) over arbitrary knots.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivatives at each knot.
    y2s: Vec<f64>,
}

impl CubicSpline {
    pub fn new(xs: &[f64], ys: &[f64]) -> Result<Self> {
        check_knots(xs, 2, "cubic spline interpolation")?;

        let n = xs.len();
        let mut y2s = vec![0.0; n];
        let mut u = vec![0.0; n];

        // Tridiagonal forward sweep; natural ends keep y2s[0] = y2s[n-1] = 0.
        for i in 1..n - 1 {
            let sig = (xs[i] - xs[i - 1]) / (xs[i + 1] - xs[i - 1]);
            let p = sig * y2s[i - 1] + 2.0;
            y2s[i] = (sig - 1.0) / p;
            let slope_change = (ys[i + 1] - ys[i]) / (xs[i + 1] - xs[i])
                - (ys[i] - ys[i - 1]) / (xs[i] - xs[i - 1]);
            u[i] = (6.0 * slope_change / (xs[i + 1] - xs[i - 1]) - sig * u[i - 1]) / p;
        }
        y2s[n - 1] = 0.0;
        for k in (1..n - 1).rev() {
            y2s[k] = y2s[k] * y2s[k + 1] + u[k];
        }

        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            y2s,
        })
    }
}

impl Interpolator for CubicSpline {
    fn evaluate(&self, x: f64) -> f64 {
        let lo = bracket(&self.xs, x);
        let hi = lo + 1;
        let h = self.xs[hi] - self.xs[lo];
        let a = (self.xs[hi] - x) / h;
        let b = (x - self.xs[lo]) / h;

        a * self.ys[lo]
            + b * self.ys[hi]
            + ((a * a * a - a) * self.y2s[lo] + (b * b * b - b) * self.y2s[hi]) * h * h / 6.0
    }
}

// ---------------------------------------------------------------------------
// Linear
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LinearInterpolator {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl LinearInterpolator {
    pub fn new(xs: &[f64], ys: &[f64]) -> Result<Self> {
        check_knots(xs, 2, "linear interpolation")?;
        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
        })
    }
}

impl Interpolator for LinearInterpolator {
    fn evaluate(&self, x: f64) -> f64 {
        let lo = bracket(&self.xs, x);
        let t = (x - self.xs[lo]) / (self.xs[lo + 1] - self.xs[lo]);
        self.ys[lo] + t * (self.ys[lo + 1] - self.ys[lo])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(start: f64, step: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| start + i as f64 * step).collect()
    }

    #[test]
    fn selects_sprague_for_dense_uniform_data() {
        let config = InterpolationConfig::default();
        assert_eq!(
            select_method(&grid(380.0, 5.0, 81), &config),
            InterpolationMethod::Sprague
        );
    }

    #[test]
    fn selects_spline_for_uneven_or_short_data() {
        let config = InterpolationConfig::default();
        let uneven = [400.0, 410.0, 425.0, 430.0, 450.0, 470.0, 480.0];
        assert_eq!(select_method(&uneven, &config), InterpolationMethod::CubicSpline);
        assert_eq!(
            select_method(&[400.0, 500.0, 600.0], &config),
            InterpolationMethod::CubicSpline
        );
        assert_eq!(select_method(&[400.0, 500.0], &config), InterpolationMethod::Linear);
    }

    #[test]
    fn threshold_is_configurable() {
        let xs = grid(400.0, 10.0, 7);
        let strict = InterpolationConfig {
            sprague_min_samples: 8,
            ..InterpolationConfig::default()
        };
        assert_eq!(select_method(&xs, &strict), InterpolationMethod::CubicSpline);
        assert_eq!(
            select_method(&xs, &InterpolationConfig::default()),
            InterpolationMethod::Sprague
        );
    }

    #[test]
    fn sprague_passes_through_samples() {
        let xs = grid(400.0, 10.0, 8);
        let ys: Vec<f64> = xs.iter().map(|x| (x / 50.0).sin()).collect();
        let sprague = SpragueInterpolator::new(&xs, &ys, 1e-7).unwrap();
        for (&x, &y) in xs.iter().zip(&ys) {
            assert!((sprague.evaluate(x) - y).abs() < 1e-10, "at {x}");
        }
    }

    #[test]
    fn sprague_reproduces_polynomials() {
        // Fifth order scheme is exact for low order polynomials away from the padding.
        let xs = grid(0.0, 1.0, 10);
        let ys: Vec<f64> = xs.iter().map(|x| 0.5 * x * x - x + 3.0).collect();
        let sprague = SpragueInterpolator::new(&xs, &ys, 1e-7).unwrap();
        let x = 4.5;
        assert!((sprague.evaluate(x) - (0.5 * x * x - x + 3.0)).abs() < 1e-9);
    }

    #[test]
    fn sprague_rejects_uneven_sampling() {
        let xs = [0.0, 1.0, 2.0, 3.5, 4.0, 5.0];
        let ys = [0.0; 6];
        assert!(SpragueInterpolator::new(&xs, &ys, 1e-7).is_err());
    }

    #[test]
    fn spline_is_exact_on_lines_and_knots() {
        let xs = [400.0, 420.0, 450.0, 500.0];
        let ys: Vec<f64> = xs.iter().map(|x| 2.0 * x - 1.0).collect();
        let spline = CubicSpline::new(&xs, &ys).unwrap();
        for (&x, &y) in xs.iter().zip(&ys) {
            assert!((spline.evaluate(x) - y).abs() < 1e-9);
        }
        assert!((spline.evaluate(435.0) - 869.0).abs() < 1e-9);
    }

    #[test]
    fn linear_interpolates_midpoint() {
        let linear = LinearInterpolator::new(&[400.0, 500.0], &[0.0, 1.0]).unwrap();
        assert!((linear.evaluate(450.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn build_rejects_mismatched_lengths() {
        let err = build(
            InterpolationMethod::Linear,
            &[1.0, 2.0],
            &[1.0],
            &InterpolationConfig::default(),
        );
        assert!(matches!(err, Err(SpectralError::LengthMismatch { .. })));
    }
}
