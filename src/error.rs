use thiserror::Error;

use crate::spectrum::composite::Channel;

/// Everything that can go wrong while building or reshaping spectral data.
#[derive(Debug, Error)]
pub enum SpectralError {
    #[error("invalid spectral shape (start {start}, end {end}, interval {interval}): {reason}")]
    InvalidShape {
        start: f64,
        end: f64,
        interval: f64,
        reason: &'static str,
    },

    #[error("wavelength {0} is not a finite number")]
    NonFiniteWavelength(f64),

    #[error("wavelength {0} appears more than once")]
    DuplicateWavelength(f64),

    #[error("spectral distribution '{name}' has {len} sample(s), at least {required} required")]
    Empty {
        name: String,
        len: usize,
        required: usize,
    },

    #[error(
        "cannot extend '{name}' sampled every {step} nm onto a grid with interval {interval} nm"
    )]
    IncompatibleInterval {
        name: String,
        step: f64,
        interval: f64,
    },

    #[error("interpolation failed: {0}")]
    Interpolation(String),

    #[error("expected {expected} values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("'{left}' and '{right}' are not sampled on the same wavelengths")]
    DomainMismatch { left: String, right: String },

    #[error("channels of '{0}' are not sampled on the same wavelengths")]
    Unsynchronised(String),

    #[error("unknown channel '{0}'")]
    UnknownChannel(String),

    #[error("channel {channel} failed: {source}")]
    Channel {
        channel: Channel,
        #[source]
        source: Box<SpectralError>,
    },

    #[error("invalid interpolation config: {0}")]
    Config(String),

    #[error("parsing interpolation config")]
    ConfigJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SpectralError>;
