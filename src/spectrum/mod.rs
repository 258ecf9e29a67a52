//! Spectral layer: sampling grids, distributions and their resampling.
//!
//! Architecture:
//! ```text
//!   raw (wavelength, value) tables
//!        │
//!        ▼
//!   ┌──────────────────────┐
//!   │ SpectralDistribution │  BTreeMap<Wavelength, f64>
//!   └──────────────────────┘
//!        │  extrapolate / interpolate / align / zeros / normalise
//!        │  (grid described by SpectralShape, curve by interpolation)
//!        ▼
//!   ┌───────────────────────────────┐
//!   │ CompositeSpectralDistribution │  x / y / z channels on one shape
//!   └───────────────────────────────┘
//! ```

pub mod composite;
pub mod distribution;
pub mod interpolation;
pub mod ops;
pub mod shape;
pub mod wavelength;
