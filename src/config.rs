use serde::{Deserialize, Serialize};

use crate::error::{Result, SpectralError};

// ---------------------------------------------------------------------------
// Interpolation configuration
// ---------------------------------------------------------------------------

/// Tunables for the automatic interpolation strategy.
///
/// Every field has a default, so a partial JSON document such as
/// `{ "sprague_min_samples": 8 }` is enough to override one knob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpolationConfig {
    /// Minimum number of uniformly spaced samples before the Sprague
    /// scheme is chosen over the cubic spline.
    pub sprague_min_samples: usize,

    /// Relative tolerance used when deciding whether consecutive
    /// wavelength steps are equal.
    pub uniformity_tolerance: f64,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            // The Sprague boundary coefficients read six samples at each end.
            sprague_min_samples: 6,
            uniformity_tolerance: 1e-7,
        }
    }
}

impl InterpolationConfig {
    /// Parse and validate a configuration from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: InterpolationConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the interpolation kernels cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.sprague_min_samples < 6 {
            return Err(SpectralError::Config(format!(
                "sprague_min_samples must be at least 6, got {}",
                self.sprague_min_samples
            )));
        }
        if !self.uniformity_tolerance.is_finite() || self.uniformity_tolerance < 0.0 {
            return Err(SpectralError::Config(format!(
                "uniformity_tolerance must be a non-negative finite number, got {}",
                self.uniformity_tolerance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = InterpolationConfig::from_json_str(r#"{ "sprague_min_samples": 9 }"#).unwrap();
        assert_eq!(config.sprague_min_samples, 9);
        assert_eq!(
            config.uniformity_tolerance,
            InterpolationConfig::default().uniformity_tolerance
        );
    }

    #[test]
    fn rejects_thresholds_below_kernel_minimum() {
        let err = InterpolationConfig::from_json_str(r#"{ "sprague_min_samples": 3 }"#).unwrap_err();
        assert!(matches!(err, SpectralError::Config(_)));
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = InterpolationConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, SpectralError::ConfigJson(_)));
    }
}
