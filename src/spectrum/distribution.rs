use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::interpolation::{self, is_uniform, select_method, InterpolationMethod};
use super::shape::SpectralShape;
use super::wavelength::{Wavelength, WAVELENGTH_TOLERANCE};
use crate::config::InterpolationConfig;
use crate::error::{Result, SpectralError};

// ---------------------------------------------------------------------------
// Operation outcomes
// ---------------------------------------------------------------------------

/// How values beyond the sampled range are filled by `extrapolate`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtrapolationMethod {
    /// Hold the boundary value.
    #[default]
    Constant,
}

/// Result of [`SpectralDistribution::normalise`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Normalisation {
    /// Values were divided by `peak` and multiplied by the factor.
    Scaled { peak: f64 },
    /// The peak was zero (or there was nothing to scale); data left as is.
    Degenerate,
}

// ---------------------------------------------------------------------------
// SpectralDistribution – wavelength → value samples
// ---------------------------------------------------------------------------

/// A single channel of spectral data: values sampled at unique, finite
/// wavelengths (nm), always iterated in ascending wavelength order.
///
/// Reshaping operations mutate in place and return `&mut Self` so they can
/// be chained:
///
/// ```
/// use rusty_spectra::{SpectralDistribution, SpectralShape};
///
/// let mut sd = SpectralDistribution::new("sample", [(400.0, 0.1), (500.0, 0.8), (600.0, 0.2)])?;
/// sd.align(SpectralShape::new(400.0, 600.0, 10.0)?, None)?;
/// assert_eq!(sd.len(), 21);
/// # Ok::<(), rusty_spectra::SpectralError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDistribution", into = "RawDistribution")]
pub struct SpectralDistribution {
    name: String,
    data: BTreeMap<Wavelength, f64>,
}

/// Serialised form: `{ "name": ..., "data": [[wavelength, value], ...] }`.
#[derive(Serialize, Deserialize)]
struct RawDistribution {
    name: String,
    data: Vec<(f64, f64)>,
}

impl TryFrom<RawDistribution> for SpectralDistribution {
    type Error = SpectralError;

    fn try_from(raw: RawDistribution) -> Result<Self> {
        SpectralDistribution::new(raw.name, raw.data)
    }
}

impl From<SpectralDistribution> for RawDistribution {
    fn from(sd: SpectralDistribution) -> Self {
        let data = sd.iter().collect();
        RawDistribution {
            name: sd.name,
            data,
        }
    }
}

impl SpectralDistribution {
    /// Build a distribution from `(wavelength, value)` pairs in any order.
    ///
    /// Non-finite or repeated wavelengths are rejected.
    pub fn new(
        name: impl Into<String>,
        samples: impl IntoIterator<Item = (f64, f64)>,
    ) -> Result<Self> {
        let mut data = BTreeMap::new();
        for (nm, value) in samples {
            if !nm.is_finite() {
                return Err(SpectralError::NonFiniteWavelength(nm));
            }
            if data.insert(Wavelength::from(nm), value).is_some() {
                return Err(SpectralError::DuplicateWavelength(nm));
            }
        }
        let sd = Self {
            name: name.into(),
            data,
        };
        sd.debug_check();
        Ok(sd)
    }

    /// Build a distribution holding `values` on the wavelengths of `shape`.
    pub fn from_shape_values(
        name: impl Into<String>,
        shape: SpectralShape,
        values: &[f64],
    ) -> Result<Self> {
        if values.len() != shape.len() {
            return Err(SpectralError::LengthMismatch {
                expected: shape.len(),
                actual: values.len(),
            });
        }
        Self::new(name, shape.range().zip(values.iter().copied()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether a sample is stored at exactly `wavelength`.
    pub fn contains(&self, wavelength: f64) -> bool {
        self.data.contains_key(&Wavelength::from(wavelength))
    }

    /// Exact-key lookup; never interpolates.
    pub fn get(&self, wavelength: f64) -> Option<f64> {
        self.data.get(&Wavelength::from(wavelength)).copied()
    }

    /// Exact-key lookup falling back to `default`.
    pub fn get_or(&self, wavelength: f64, default: f64) -> f64 {
        self.get(wavelength).unwrap_or(default)
    }

    /// `(wavelength, value)` pairs in ascending wavelength order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (f64, f64)> + '_ {
        self.data.iter().map(|(nm, value)| (nm.0, *value))
    }

    pub fn wavelengths(&self) -> Vec<f64> {
        self.data.keys().map(|nm| nm.0).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.data.values().copied().collect()
    }

    /// Insert or replace one sample, returning the previous value.
    pub fn set(&mut self, wavelength: f64, value: f64) -> Result<Option<f64>> {
        if !wavelength.is_finite() {
            return Err(SpectralError::NonFiniteWavelength(wavelength));
        }
        Ok(self.data.insert(Wavelength::from(wavelength), value))
    }

    pub fn remove(&mut self, wavelength: f64) -> Option<f64> {
        self.data.remove(&Wavelength::from(wavelength))
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut f64> {
        self.data.values_mut()
    }

    /// Smallest and largest stored wavelength.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        let first = self.data.keys().next()?;
        let last = self.data.keys().next_back()?;
        Some((first.0, last.0))
    }

    /// Whether the stored wavelengths are evenly spaced.
    pub fn is_uniform(&self) -> bool {
        is_uniform(
            &self.wavelengths(),
            InterpolationConfig::default().uniformity_tolerance,
        )
    }

    /// The sampling grid currently covered.
    ///
    /// The interval is the common step when sampling is uniform, otherwise
    /// the smallest step between two consecutive wavelengths.
    pub fn shape(&self) -> Result<SpectralShape> {
        let (start, end) = self.bounds().ok_or_else(|| self.too_short(2))?;
        let step = self.sampling_step()?;
        SpectralShape::new(start, end, step)
    }

    fn sampling_step(&self) -> Result<f64> {
        if self.len() < 2 {
            return Err(self.too_short(2));
        }
        let wavelengths = self.wavelengths();
        let tolerance = InterpolationConfig::default().uniformity_tolerance;
        if is_uniform(&wavelengths, tolerance) {
            let span = wavelengths[wavelengths.len() - 1] - wavelengths[0];
            return Ok(span / (wavelengths.len() - 1) as f64);
        }
        let smallest = wavelengths
            .windows(2)
            .map(|w| w[1] - w[0])
            .fold(f64::INFINITY, f64::min);
        log::debug!(
            "'{}' is not uniformly sampled, using smallest step {smallest} nm",
            self.name
        );
        Ok(smallest)
    }

    fn too_short(&self, required: usize) -> SpectralError {
        SpectralError::Empty {
            name: self.name.clone(),
            len: self.len(),
            required,
        }
    }

    /// The stored key within [`WAVELENGTH_TOLERANCE`] of `nm`, if any.
    fn key_near(&self, nm: f64) -> Option<Wavelength> {
        let slack = WAVELENGTH_TOLERANCE * nm.abs().max(1.0);
        self.data
            .range(Wavelength(nm - slack)..=Wavelength(nm + slack))
            .next()
            .map(|(key, _)| *key)
    }

    fn debug_check(&self) {
        debug_assert!(self.data.keys().all(|nm| nm.0.is_finite()));
        debug_assert!(self
            .data
            .keys()
            .zip(self.data.keys().skip(1))
            .all(|(a, b)| a.0 < b.0));
    }

    // -----------------------------------------------------------------------
    // Reshaping
    // -----------------------------------------------------------------------

    /// Extend the sampled range to cover `shape.start ..= shape.end`,
    /// holding the boundary values.
    pub fn extrapolate(&mut self, shape: SpectralShape) -> Result<&mut Self> {
        self.extrapolate_with(shape, ExtrapolationMethod::Constant)
    }

    /// New samples are placed outward from the current boundaries in whole
    /// multiples of the distribution's own sampling step; existing samples
    /// and interior gaps are left alone.
    pub fn extrapolate_with(
        &mut self,
        shape: SpectralShape,
        method: ExtrapolationMethod,
    ) -> Result<&mut Self> {
        let (min, max) = self.bounds().ok_or_else(|| self.too_short(1))?;
        let below = shape.start() < min - WAVELENGTH_TOLERANCE * min.abs().max(1.0);
        let above = shape.end() > max + WAVELENGTH_TOLERANCE * max.abs().max(1.0);
        if !below && !above {
            return Ok(self);
        }

        let step = self.sampling_step()?;
        let (coarse, fine) = if step >= shape.interval() {
            (step, shape.interval())
        } else {
            (shape.interval(), step)
        };
        let ratio = coarse / fine;
        if (ratio - ratio.round()).abs() > 1e-6 * ratio {
            return Err(SpectralError::IncompatibleInterval {
                name: self.name.clone(),
                step,
                interval: shape.interval(),
            });
        }

        let (low_value, high_value) = match method {
            ExtrapolationMethod::Constant => (
                self.data.values().next().copied().unwrap_or_default(),
                self.data.values().next_back().copied().unwrap_or_default(),
            ),
        };
        if below {
            let count = ((min - shape.start()) / step - 1e-9).ceil() as usize;
            for k in 1..=count {
                self.data.insert(Wavelength::from(min - k as f64 * step), low_value);
            }
        }
        if above {
            let count = ((shape.end() - max) / step - 1e-9).ceil() as usize;
            for k in 1..=count {
                self.data.insert(Wavelength::from(max + k as f64 * step), high_value);
            }
        }
        log::debug!("extrapolated '{}' to {} samples", self.name, self.len());
        self.debug_check();
        Ok(self)
    }

    /// Interpolate onto the wavelengths of `shape` that fall inside the
    /// current range, choosing the scheme automatically unless `method` is
    /// given.
    pub fn interpolate(
        &mut self,
        shape: SpectralShape,
        method: Option<InterpolationMethod>,
    ) -> Result<&mut Self> {
        self.interpolate_with(shape, method, &InterpolationConfig::default())
    }

    /// Existing samples are kept verbatim and wavelengths outside the
    /// current range are not created.
    pub fn interpolate_with(
        &mut self,
        shape: SpectralShape,
        method: Option<InterpolationMethod>,
        config: &InterpolationConfig,
    ) -> Result<&mut Self> {
        config.validate()?;
        let Some((min, max)) = self.bounds() else {
            return Ok(self);
        };
        if self.len() < 2 {
            return Ok(self);
        }

        let targets: Vec<f64> = shape
            .range()
            .filter(|&nm| nm > min && nm < max)
            .filter(|&nm| self.key_near(nm).is_none())
            .collect();
        if targets.is_empty() {
            return Ok(self);
        }

        let xs = self.wavelengths();
        let ys = self.values();
        let method = method.unwrap_or_else(|| select_method(&xs, config));
        let interpolator = interpolation::build(method, &xs, &ys, config)?;

        for nm in targets {
            self.data.insert(Wavelength::from(nm), interpolator.evaluate(nm));
        }
        log::debug!(
            "interpolated '{}' with {method:?} to {} samples",
            self.name,
            self.len()
        );
        self.debug_check();
        Ok(self)
    }

    /// Force the distribution onto exactly `shape.range()`: extrapolate,
    /// interpolate, then drop every wavelength off the grid.
    pub fn align(
        &mut self,
        shape: SpectralShape,
        method: Option<InterpolationMethod>,
    ) -> Result<&mut Self> {
        self.align_with(shape, method, &InterpolationConfig::default())
    }

    pub fn align_with(
        &mut self,
        shape: SpectralShape,
        method: Option<InterpolationMethod>,
        config: &InterpolationConfig,
    ) -> Result<&mut Self> {
        let mut staged = self.clone();
        staged.extrapolate(shape)?;
        self.settle(staged, shape, method, config)
    }

    /// Like [`SpectralDistribution::align_with`], but grid points outside
    /// the sampled range take the nearer boundary value directly, so the
    /// distribution's own step need not divide `shape.interval`.
    pub(crate) fn synchronise_onto(
        &mut self,
        shape: SpectralShape,
        config: &InterpolationConfig,
    ) -> Result<&mut Self> {
        let (min, max) = self.bounds().ok_or_else(|| self.too_short(1))?;
        let low_value = self.data.values().next().copied().unwrap_or_default();
        let high_value = self.data.values().next_back().copied().unwrap_or_default();

        let mut staged = self.clone();
        for nm in shape.range() {
            if Wavelength(min).approx_eq(nm) || Wavelength(max).approx_eq(nm) {
                continue;
            }
            if nm < min {
                staged.data.insert(Wavelength::from(nm), low_value);
            } else if nm > max {
                staged.data.insert(Wavelength::from(nm), high_value);
            }
        }
        self.settle(staged, shape, None, config)
    }

    /// Interpolate `staged` onto `shape` and commit exactly the keys of
    /// `shape.range()`.
    fn settle(
        &mut self,
        mut staged: SpectralDistribution,
        shape: SpectralShape,
        method: Option<InterpolationMethod>,
        config: &InterpolationConfig,
    ) -> Result<&mut Self> {
        staged.interpolate_with(shape, method, config)?;

        let mut data = BTreeMap::new();
        for nm in shape.range() {
            let value = staged
                .key_near(nm)
                .and_then(|key| staged.data.get(&key).copied())
                .ok_or_else(|| {
                    SpectralError::Interpolation(format!(
                        "no value for {nm} nm while aligning '{}' to {shape}",
                        self.name
                    ))
                })?;
            data.insert(Wavelength::from(nm), value);
        }

        self.data = data;
        self.debug_check();
        Ok(self)
    }

    /// Replace all samples with zeros on `shape` (the current shape when
    /// `None`).
    pub fn zeros(&mut self, shape: Option<SpectralShape>) -> Result<&mut Self> {
        let shape = match shape {
            Some(shape) => shape,
            None => self.shape()?,
        };
        self.data = shape.range().map(|nm| (Wavelength::from(nm), 0.0)).collect();
        self.debug_check();
        Ok(self)
    }

    /// Rescale so the peak value equals `factor`.
    ///
    /// A zero peak leaves the data untouched and logs a warning.
    pub fn normalise(&mut self, factor: f64) -> Normalisation {
        let peak = self
            .data
            .values()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        if self.is_empty() || peak == 0.0 || !peak.is_finite() {
            log::warn!(
                "cannot normalise '{}': peak value is {peak}, leaving data unchanged",
                self.name
            );
            return Normalisation::Degenerate;
        }

        let scale = factor / peak;
        for value in self.data.values_mut() {
            *value *= scale;
        }
        Normalisation::Scaled { peak }
    }
}

impl fmt::Display for SpectralDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bounds() {
            Some((min, max)) => write!(
                f,
                "{} ({} samples, {min}..{max} nm)",
                self.name,
                self.len()
            ),
            None => write!(f, "{} (empty)", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SpectralDistribution {
        SpectralDistribution::new("sample", [(500.0, 0.8), (400.0, 0.1), (600.0, 0.2)]).unwrap()
    }

    fn shape(start: f64, end: f64, interval: f64) -> SpectralShape {
        SpectralShape::new(start, end, interval).unwrap()
    }

    #[test]
    fn construction_sorts_and_validates() {
        let sd = sample();
        assert_eq!(sd.wavelengths(), vec![400.0, 500.0, 600.0]);
        assert_eq!(sd.values(), vec![0.1, 0.8, 0.2]);

        let dup = SpectralDistribution::new("dup", [(400.0, 1.0), (400.0, 2.0)]);
        assert!(matches!(dup, Err(SpectralError::DuplicateWavelength(_))));
        let nan = SpectralDistribution::new("nan", [(f64::NAN, 1.0)]);
        assert!(matches!(nan, Err(SpectralError::NonFiniteWavelength(_))));
    }

    #[test]
    fn get_is_exact() {
        let sd = sample();
        assert_eq!(sd.get(500.0), Some(0.8));
        assert_eq!(sd.get(450.0), None);
        assert_eq!(sd.get_or(450.0, -1.0), -1.0);
    }

    #[test]
    fn signed_zero_wavelengths_share_a_key() {
        let mut sd = SpectralDistribution::new("origin", [(0.0, 1.0), (10.0, 2.0)]).unwrap();
        assert_eq!(sd.get(-0.0), Some(1.0));
        assert!(sd.contains(-0.0));
        assert_eq!(sd.set(-0.0, 3.0).unwrap(), Some(1.0));
        assert_eq!(sd.len(), 2);
        assert_eq!(sd.remove(-0.0), Some(3.0));
        assert!(!sd.contains(0.0));
    }

    #[test]
    fn shape_uses_smallest_step_when_irregular() {
        let sd = SpectralDistribution::new("irregular", [(400.0, 1.0), (420.0, 1.0), (425.0, 1.0)])
            .unwrap();
        assert_eq!(sd.shape().unwrap(), shape(400.0, 425.0, 5.0));
        assert_eq!(sample().shape().unwrap(), shape(400.0, 600.0, 100.0));
    }

    #[test]
    fn shape_needs_two_samples() {
        let single = SpectralDistribution::new("single", [(555.0, 1.0)]).unwrap();
        assert!(matches!(single.shape(), Err(SpectralError::Empty { .. })));
    }

    #[test]
    fn extrapolate_holds_boundary_values() {
        let mut sd = sample();
        sd.extrapolate(shape(380.0, 700.0, 10.0)).unwrap();
        assert_eq!(sd.get(300.0), Some(0.1));
        assert_eq!(sd.get(700.0), Some(0.2));
        assert_eq!(sd.get(500.0), Some(0.8));
        assert_eq!(sd.len(), 5);
    }

    #[test]
    fn extrapolate_is_noop_when_covered() {
        let mut sd = sample();
        sd.extrapolate(shape(450.0, 550.0, 10.0)).unwrap();
        assert_eq!(sd, sample());
    }

    #[test]
    fn extrapolate_rejects_incompatible_interval() {
        let mut sd = sample();
        let err = sd.extrapolate(shape(380.0, 700.0, 30.0)).unwrap_err();
        assert!(matches!(err, SpectralError::IncompatibleInterval { .. }));
        assert_eq!(sd, sample());
    }

    #[test]
    fn interpolate_preserves_existing_and_stays_in_range() {
        let mut sd = sample();
        sd.interpolate(shape(350.0, 650.0, 10.0), None).unwrap();
        assert_eq!(sd.get(400.0), Some(0.1));
        assert_eq!(sd.get(500.0), Some(0.8));
        assert_eq!(sd.get(600.0), Some(0.2));
        assert_eq!(sd.get(390.0), None);
        assert_eq!(sd.get(610.0), None);
        assert_eq!(sd.len(), 21);
    }

    #[test]
    fn interpolate_keeps_off_grid_samples() {
        let mut sd =
            SpectralDistribution::new("odd", [(400.0, 0.0), (433.0, 0.5), (500.0, 1.0)]).unwrap();
        sd.interpolate(shape(400.0, 500.0, 20.0), None).unwrap();
        assert_eq!(sd.get(433.0), Some(0.5));
        assert!(sd.contains(420.0));
        assert!(sd.contains(480.0));
    }

    #[test]
    fn forced_sprague_on_short_data_fails_cleanly() {
        let mut sd = sample();
        let err = sd
            .interpolate(shape(400.0, 600.0, 10.0), Some(InterpolationMethod::Sprague))
            .unwrap_err();
        assert!(matches!(err, SpectralError::Interpolation(_)));
        assert_eq!(sd, sample());
    }

    #[test]
    fn align_lands_exactly_on_grid() {
        let mut sd = sample();
        let target = shape(380.0, 700.0, 10.0);
        sd.align(target, None).unwrap();
        let expected: Vec<f64> = target.range().collect();
        assert_eq!(sd.wavelengths(), expected);
        assert_eq!(sd.shape().unwrap(), target);
        assert_eq!(sd.get(400.0), Some(0.1));
        assert_eq!(sd.get(700.0), Some(0.2));
    }

    #[test]
    fn zeros_defaults_to_current_shape() {
        let mut sd = sample();
        sd.zeros(None).unwrap();
        assert_eq!(sd.wavelengths(), vec![400.0, 500.0, 600.0]);
        assert!(sd.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn normalise_scales_peak() {
        let mut sd = sample();
        assert_eq!(sd.normalise(100.0), Normalisation::Scaled { peak: 0.8 });
        assert!((sd.get(500.0).unwrap() - 100.0).abs() < 1e-12);
        assert!((sd.get(400.0).unwrap() - 12.5).abs() < 1e-12);
    }

    #[test]
    fn normalise_all_zero_is_degenerate() {
        let mut sd = SpectralDistribution::new("dark", [(400.0, 0.0), (500.0, 0.0)]).unwrap();
        assert_eq!(sd.normalise(1.0), Normalisation::Degenerate);
        assert_eq!(sd.values(), vec![0.0, 0.0]);
    }

    #[test]
    fn serde_round_trip_revalidates() {
        let json = serde_json::to_string(&sample()).unwrap();
        let back: SpectralDistribution = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample());

        let dup = r#"{ "name": "dup", "data": [[400, 1], [400, 2]] }"#;
        assert!(serde_json::from_str::<SpectralDistribution>(dup).is_err());
    }
}
