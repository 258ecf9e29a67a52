use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FusedIterator;

use serde::{Deserialize, Serialize};

use super::wavelength::Wavelength;
use crate::error::{Result, SpectralError};

// ---------------------------------------------------------------------------
// SpectralShape – a wavelength sampling grid
// ---------------------------------------------------------------------------

/// Describes a sampling grid `start, start + interval, ...` up to `end` (nm).
///
/// `end` does not have to lie on the grid; the last sample is the largest
/// grid point that does not exceed it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawShape")]
pub struct SpectralShape {
    start: f64,
    end: f64,
    interval: f64,
}

#[derive(Deserialize)]
struct RawShape {
    start: f64,
    end: f64,
    interval: f64,
}

impl TryFrom<RawShape> for SpectralShape {
    type Error = SpectralError;

    fn try_from(raw: RawShape) -> Result<Self> {
        SpectralShape::new(raw.start, raw.end, raw.interval)
    }
}

impl SpectralShape {
    /// Validate and build a shape. Never clamps: bad bounds are an error.
    pub fn new(start: f64, end: f64, interval: f64) -> Result<Self> {
        let invalid = |reason| SpectralError::InvalidShape {
            start,
            end,
            interval,
            reason,
        };
        if !(start.is_finite() && end.is_finite() && interval.is_finite()) {
            return Err(invalid("bounds and interval must be finite"));
        }
        if interval <= 0.0 {
            return Err(invalid("interval must be positive"));
        }
        if start >= end {
            return Err(invalid("start must be less than end"));
        }
        if sample_count(start, end, interval).is_none() {
            return Err(invalid("sample count does not fit in usize"));
        }
        // `+ 0.0` folds -0.0 into 0.0 so equal shapes hash equally.
        Ok(Self {
            start: start + 0.0,
            end: end + 0.0,
            interval: interval + 0.0,
        })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Number of grid points produced by [`SpectralShape::range`].
    pub fn len(&self) -> usize {
        // `new` rejects shapes whose count overflows.
        sample_count(self.start, self.end, self.interval).unwrap_or(usize::MAX)
    }

    /// A shape always holds at least its start sample.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The sample wavelengths of this grid, ascending.
    ///
    /// Each call returns a fresh iterator; the shape itself holds no cursor.
    pub fn range(&self) -> ShapeRange {
        ShapeRange {
            shape: *self,
            front: 0,
            back: self.len(),
        }
    }

    /// Wavelength of grid point `index` (not bounds checked against `len`).
    fn at(&self, index: usize) -> f64 {
        let nm = self.start + index as f64 * self.interval;
        // Floating point noise must not push the last sample past `end`.
        nm.min(self.end)
    }

    /// Whether `wavelength` is one of this grid's samples.
    pub fn contains(&self, wavelength: f64) -> bool {
        let index = ((wavelength - self.start) / self.interval).round();
        if index < 0.0 || index as usize >= self.len() {
            return false;
        }
        Wavelength(self.at(index as usize)).approx_eq(wavelength)
    }
}

/// Grid points in `[start, end]`, or `None` when the count overflows `usize`.
fn sample_count(start: f64, end: f64, interval: f64) -> Option<usize> {
    let steps = ((end - start) / interval + 1e-9).floor();
    if !steps.is_finite() || steps >= usize::MAX as f64 {
        return None;
    }
    (steps as usize).checked_add(1)
}

impl Eq for SpectralShape {}

impl Hash for SpectralShape {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.start.to_bits().hash(state);
        self.end.to_bits().hash(state);
        self.interval.to_bits().hash(state);
    }
}

impl fmt::Display for SpectralShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.start, self.end, self.interval)
    }
}

// ---------------------------------------------------------------------------
// ShapeRange – lazy iterator over grid wavelengths
// ---------------------------------------------------------------------------

/// Iterator returned by [`SpectralShape::range`].
#[derive(Debug, Clone)]
pub struct ShapeRange {
    shape: SpectralShape,
    front: usize,
    back: usize,
}

impl Iterator for ShapeRange {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.front >= self.back {
            return None;
        }
        let nm = self.shape.at(self.front);
        self.front += 1;
        Some(nm)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl DoubleEndedIterator for ShapeRange {
    fn next_back(&mut self) -> Option<f64> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.shape.at(self.back))
    }
}

impl ExactSizeIterator for ShapeRange {}

impl FusedIterator for ShapeRange {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn range_includes_end_on_grid() {
        let shape = SpectralShape::new(400.0, 600.0, 10.0).unwrap();
        let range: Vec<f64> = shape.range().collect();
        assert_eq!(range.len(), 21);
        assert_eq!(shape.len(), 21);
        assert_eq!(range[0], 400.0);
        assert_eq!(range[20], 600.0);
    }

    #[test]
    fn range_stops_before_off_grid_end() {
        let shape = SpectralShape::new(380.0, 785.0, 10.0).unwrap();
        let last = shape.range().last().unwrap();
        assert_eq!(last, 780.0);
    }

    #[test]
    fn fractional_interval_reaches_end() {
        let shape = SpectralShape::new(0.0, 1.0, 0.1).unwrap();
        let range: Vec<f64> = shape.range().collect();
        assert_eq!(range.len(), 11);
        assert!((range[3] - 0.3).abs() < 1e-12);
        assert_eq!(*range.last().unwrap(), 1.0);
    }

    #[test]
    fn range_is_restartable() {
        let shape = SpectralShape::new(360.0, 830.0, 5.0).unwrap();
        let first: Vec<f64> = shape.range().collect();
        let second: Vec<f64> = shape.range().collect();
        assert_eq!(first, second);
        assert_eq!(shape.range().rev().next(), Some(830.0));
    }

    #[test]
    fn rejects_invalid_bounds() {
        assert!(SpectralShape::new(400.0, 400.0, 1.0).is_err());
        assert!(SpectralShape::new(700.0, 400.0, 1.0).is_err());
        assert!(SpectralShape::new(400.0, 700.0, 0.0).is_err());
        assert!(SpectralShape::new(400.0, 700.0, -5.0).is_err());
        assert!(SpectralShape::new(f64::NAN, 700.0, 5.0).is_err());
    }

    #[test]
    fn rejects_sample_count_beyond_usize() {
        let huge = SpectralShape::new(0.0, 1e300, 1.0);
        assert!(matches!(huge, Err(SpectralError::InvalidShape { .. })));
        let span_overflows = SpectralShape::new(-f64::MAX, f64::MAX, 1.0);
        assert!(span_overflows.is_err());
    }

    #[test]
    fn wide_but_countable_shape_starts_at_start() {
        let shape = SpectralShape::new(0.0, 1e12, 1.0).unwrap();
        assert_eq!(shape.len(), 1_000_000_000_001);
        assert_eq!(shape.range().next(), Some(0.0));
        assert_eq!(shape.range().next_back(), Some(1e12));
        assert!(shape.contains(5e11));
    }

    #[test]
    fn equality_and_hash_follow_fields() {
        let a = SpectralShape::new(380.0, 780.0, 5.0).unwrap();
        let b = SpectralShape::new(380.0, 780.0, 5.0).unwrap();
        let c = SpectralShape::new(380.0, 780.0, 10.0).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        let set: HashSet<SpectralShape> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn contains_grid_points_only() {
        let shape = SpectralShape::new(380.0, 780.0, 10.0).unwrap();
        assert!(shape.contains(380.0));
        assert!(shape.contains(550.0));
        assert!(!shape.contains(555.0));
        assert!(!shape.contains(790.0));
    }

    #[test]
    fn deserialisation_revalidates() {
        let ok: SpectralShape =
            serde_json::from_str(r#"{ "start": 380, "end": 780, "interval": 5 }"#).unwrap();
        assert_eq!(ok, SpectralShape::new(380.0, 780.0, 5.0).unwrap());
        let bad = serde_json::from_str::<SpectralShape>(r#"{ "start": 780, "end": 380, "interval": 5 }"#);
        assert!(bad.is_err());
    }
}
