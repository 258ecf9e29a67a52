//! Spectral power distributions and colour matching functions sampled over
//! wavelength, with the resampling engine needed to combine datasets taken
//! at different intervals and over different ranges.
//!
//! ```
//! use rusty_spectra::{CompositeSpectralDistribution, SpectralShape};
//!
//! let mut cmfs = CompositeSpectralDistribution::xyz_colour_matching_functions(
//!     "observer",
//!     [
//!         vec![(400.0, 0.01), (500.0, 0.005), (600.0, 1.06)],
//!         vec![(400.0, 0.0004), (500.0, 0.32), (600.0, 0.63)],
//!         vec![(400.0, 0.07), (500.0, 0.27), (600.0, 0.0008)],
//!     ],
//! )?;
//! cmfs.align(SpectralShape::new(400.0, 600.0, 5.0)?, None)?;
//! assert_eq!(cmfs.wavelengths()?.len(), 41);
//! # Ok::<(), rusty_spectra::SpectralError>(())
//! ```

pub mod config;
pub mod error;
pub mod spectrum;

pub use config::InterpolationConfig;
pub use error::{Result, SpectralError};
pub use spectrum::composite::{Channel, CmfFamily, CompositeSpectralDistribution};
pub use spectrum::distribution::{ExtrapolationMethod, Normalisation, SpectralDistribution};
pub use spectrum::interpolation::{select_method, InterpolationMethod};
pub use spectrum::shape::{ShapeRange, SpectralShape};
pub use spectrum::wavelength::Wavelength;
