use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Relative tolerance under which two wavelengths name the same sample.
///
/// Scaled by the wavelength magnitude, floored at 1 nm, so below 1 nm it acts
/// as an absolute tolerance in nm.
pub const WAVELENGTH_TOLERANCE: f64 = 1e-9;

/// A wavelength in nanometres usable as an ordered map key.
///
/// `f64` is only `PartialOrd`, so `Eq`/`Ord`/`Hash` are implemented by hand
/// with `total_cmp` and the bit pattern. Distributions only ever store
/// finite wavelengths, where this order agrees with the numeric one.
#[derive(Debug, Clone, Copy)]
pub struct Wavelength(pub f64);

impl Wavelength {
    pub fn nm(self) -> f64 {
        self.0
    }

    /// Whether `other` lies within [`WAVELENGTH_TOLERANCE`] of this wavelength.
    pub fn approx_eq(self, other: f64) -> bool {
        (self.0 - other).abs() <= WAVELENGTH_TOLERANCE * self.0.abs().max(1.0)
    }
}

impl PartialEq for Wavelength {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Wavelength {}

impl PartialOrd for Wavelength {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Wavelength {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for Wavelength {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

/// Folds `-0.0` into `0.0` so both spell the same map key.
impl From<f64> for Wavelength {
    fn from(nm: f64) -> Self {
        Wavelength(nm + 0.0)
    }
}

impl fmt::Display for Wavelength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} nm", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn orders_numerically() {
        let set: BTreeSet<Wavelength> = [600.0, 400.0, 500.5]
            .into_iter()
            .map(Wavelength)
            .collect();
        let ordered: Vec<f64> = set.into_iter().map(Wavelength::nm).collect();
        assert_eq!(ordered, vec![400.0, 500.5, 600.0]);
    }

    #[test]
    fn approx_eq_absorbs_grid_noise() {
        assert!(Wavelength(380.3).approx_eq(380.0 + 3.0 * 0.1));
        assert!(!Wavelength(380.3).approx_eq(380.31));
    }

    #[test]
    fn tolerance_scales_with_magnitude() {
        assert!(Wavelength(1e6).approx_eq(1e6 + 1e-4));
        assert!(Wavelength(0.5).approx_eq(0.5 + 5e-10));
        assert!(!Wavelength(0.5).approx_eq(0.5 + 2e-9));
    }

    #[test]
    fn negative_zero_is_the_same_key() {
        assert_eq!(Wavelength::from(-0.0), Wavelength::from(0.0));
        assert_ne!(Wavelength(-0.0), Wavelength(0.0));
    }
}
