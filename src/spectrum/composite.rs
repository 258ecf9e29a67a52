use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use super::distribution::{Normalisation, SpectralDistribution};
use super::interpolation::InterpolationMethod;
use super::shape::SpectralShape;
use crate::config::InterpolationConfig;
use crate::error::{Result, SpectralError};

// ---------------------------------------------------------------------------
// Channel – the generic x / y / z slot
// ---------------------------------------------------------------------------

/// Generic channel slot of a composite distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Channel {
    X,
    Y,
    Z,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::X, Channel::Y, Channel::Z];

    pub fn index(self) -> usize {
        match self {
            Channel::X => 0,
            Channel::Y => 1,
            Channel::Z => 2,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Channel::X => "x",
            Channel::Y => "y",
            Channel::Z => "z",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// CmfFamily – domain specific naming of the three channels
// ---------------------------------------------------------------------------

/// Which kind of colour matching data a composite holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmfFamily {
    /// LMS cone fundamentals.
    Lms,
    /// RGB colour matching functions.
    Rgb,
    /// CIE XYZ colour matching functions.
    Xyz,
}

impl CmfFamily {
    /// Attribute names of the x, y, z channels.
    pub fn aliases(self) -> [&'static str; 3] {
        match self {
            CmfFamily::Lms => ["l_bar", "m_bar", "s_bar"],
            CmfFamily::Rgb => ["r_bar", "g_bar", "b_bar"],
            CmfFamily::Xyz => ["x_bar", "y_bar", "z_bar"],
        }
    }

    /// Human readable channel labels.
    pub fn labels(self) -> [&'static str; 3] {
        match self {
            CmfFamily::Lms => ["l\u{304}", "m\u{304}", "s\u{304}"],
            CmfFamily::Rgb => ["r\u{304}", "g\u{304}", "b\u{304}"],
            CmfFamily::Xyz => ["x\u{304}", "y\u{304}", "z\u{304}"],
        }
    }

    pub fn channel_for_alias(self, alias: &str) -> Option<Channel> {
        Channel::ALL
            .into_iter()
            .find(|channel| self.aliases()[channel.index()] == alias)
    }
}

// ---------------------------------------------------------------------------
// CompositeSpectralDistribution
// ---------------------------------------------------------------------------

/// Three spectral distributions kept on one sampling grid, addressed either
/// generically (`x`, `y`, `z`) or by their family alias (`l_bar`, ...).
///
/// Structural operations are applied to all three channels on a staged copy
/// and committed only when every channel succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeSpectralDistribution {
    name: String,
    family: CmfFamily,
    channels: [SpectralDistribution; 3],
}

impl CompositeSpectralDistribution {
    /// Build from three raw `(wavelength, value)` tables in x, y, z order.
    ///
    /// The tables may cover different wavelengths; the first structural
    /// operation then brings them onto a common shape.
    pub fn new<I>(name: impl Into<String>, family: CmfFamily, tables: [I; 3]) -> Result<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let aliases = family.aliases();
        let build = |channel: Channel, table: I| {
            SpectralDistribution::new(aliases[channel.index()], table).map_err(|source| {
                SpectralError::Channel {
                    channel,
                    source: Box::new(source),
                }
            })
        };
        let [x, y, z] = tables;
        let channels = [
            build(Channel::X, x)?,
            build(Channel::Y, y)?,
            build(Channel::Z, z)?,
        ];
        Ok(Self::from_distributions(name, family, channels))
    }

    /// Wrap three existing distributions (x, y, z order).
    pub fn from_distributions(
        name: impl Into<String>,
        family: CmfFamily,
        channels: [SpectralDistribution; 3],
    ) -> Self {
        let composite = Self {
            name: name.into(),
            family,
            channels,
        };
        if !composite.is_synchronised() {
            log::debug!(
                "'{}' built from channels on different wavelengths",
                composite.name
            );
        }
        composite
    }

    pub fn lms_cone_fundamentals<I>(name: impl Into<String>, tables: [I; 3]) -> Result<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        Self::new(name, CmfFamily::Lms, tables)
    }

    pub fn rgb_colour_matching_functions<I>(name: impl Into<String>, tables: [I; 3]) -> Result<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        Self::new(name, CmfFamily::Rgb, tables)
    }

    pub fn xyz_colour_matching_functions<I>(name: impl Into<String>, tables: [I; 3]) -> Result<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        Self::new(name, CmfFamily::Xyz, tables)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn family(&self) -> CmfFamily {
        self.family
    }

    /// Generic channel → family alias, e.g. `(X, "l_bar")`.
    pub fn mapping(&self) -> [(Channel, &'static str); 3] {
        let aliases = self.family.aliases();
        Channel::ALL.map(|channel| (channel, aliases[channel.index()]))
    }

    pub fn labels(&self) -> [(Channel, &'static str); 3] {
        let labels = self.family.labels();
        Channel::ALL.map(|channel| (channel, labels[channel.index()]))
    }

    // -----------------------------------------------------------------------
    // Channel views
    // -----------------------------------------------------------------------

    pub fn channel(&self, channel: Channel) -> &SpectralDistribution {
        &self.channels[channel.index()]
    }

    pub fn x(&self) -> &SpectralDistribution {
        self.channel(Channel::X)
    }

    pub fn y(&self) -> &SpectralDistribution {
        self.channel(Channel::Y)
    }

    pub fn z(&self) -> &SpectralDistribution {
        self.channel(Channel::Z)
    }

    /// The channel stored under a family alias such as `"m_bar"`.
    pub fn by_alias(&self, alias: &str) -> Option<&SpectralDistribution> {
        self.family
            .channel_for_alias(alias)
            .map(|channel| self.channel(channel))
    }

    pub fn l_bar(&self) -> Option<&SpectralDistribution> {
        self.by_alias("l_bar")
    }

    pub fn m_bar(&self) -> Option<&SpectralDistribution> {
        self.by_alias("m_bar")
    }

    pub fn s_bar(&self) -> Option<&SpectralDistribution> {
        self.by_alias("s_bar")
    }

    pub fn r_bar(&self) -> Option<&SpectralDistribution> {
        self.by_alias("r_bar")
    }

    pub fn g_bar(&self) -> Option<&SpectralDistribution> {
        self.by_alias("g_bar")
    }

    pub fn b_bar(&self) -> Option<&SpectralDistribution> {
        self.by_alias("b_bar")
    }

    pub fn x_bar(&self) -> Option<&SpectralDistribution> {
        self.by_alias("x_bar")
    }

    pub fn y_bar(&self) -> Option<&SpectralDistribution> {
        self.by_alias("y_bar")
    }

    pub fn z_bar(&self) -> Option<&SpectralDistribution> {
        self.by_alias("z_bar")
    }

    /// Exact lookup on one channel.
    pub fn get(&self, channel: Channel, wavelength: f64) -> Option<f64> {
        self.channel(channel).get(wavelength)
    }

    pub fn get_by_alias(&self, alias: &str, wavelength: f64) -> Result<Option<f64>> {
        self.by_alias(alias)
            .map(|sd| sd.get(wavelength))
            .ok_or_else(|| SpectralError::UnknownChannel(alias.to_string()))
    }

    // -----------------------------------------------------------------------
    // Derived data
    // -----------------------------------------------------------------------

    /// Whether all three channels hold exactly the same wavelengths.
    pub fn is_synchronised(&self) -> bool {
        let reference = self.x().wavelengths();
        self.channels[1..]
            .iter()
            .all(|sd| sd.wavelengths() == reference)
    }

    pub fn wavelengths(&self) -> Result<Vec<f64>> {
        self.ensure_synchronised()?;
        Ok(self.x().wavelengths())
    }

    pub fn shape(&self) -> Result<SpectralShape> {
        self.ensure_synchronised()?;
        self.x().shape()
    }

    /// `[x, y, z]` per wavelength.
    pub fn values(&self) -> Result<Vec<[f64; 3]>> {
        Ok(self.data()?.into_iter().map(|(_, xyz)| xyz).collect())
    }

    /// `(wavelength, [x, y, z])` per wavelength.
    pub fn data(&self) -> Result<Vec<(f64, [f64; 3])>> {
        self.ensure_synchronised()?;
        let [x, y, z] = &self.channels;
        Ok(x.iter()
            .zip(y.iter())
            .zip(z.iter())
            .map(|(((nm, x), (_, y)), (_, z))| (nm, [x, y, z]))
            .collect())
    }

    fn ensure_synchronised(&self) -> Result<()> {
        if self.is_synchronised() {
            Ok(())
        } else {
            Err(SpectralError::Unsynchronised(self.name.clone()))
        }
    }

    /// Shape spanning every channel: widest bounds, finest interval.
    pub fn common_shape(&self) -> Result<SpectralShape> {
        let mut shapes = Vec::with_capacity(3);
        for channel in Channel::ALL {
            let shape = self
                .channel(channel)
                .shape()
                .map_err(|source| SpectralError::Channel {
                    channel,
                    source: Box::new(source),
                })?;
            shapes.push(shape);
        }
        let start = shapes.iter().map(|s| s.start()).fold(f64::INFINITY, f64::min);
        let end = shapes.iter().map(|s| s.end()).fold(f64::NEG_INFINITY, f64::max);
        let interval = shapes
            .iter()
            .map(|s| s.interval())
            .fold(f64::INFINITY, f64::min);
        SpectralShape::new(start, end, interval)
    }

    // -----------------------------------------------------------------------
    // Structural operations
    // -----------------------------------------------------------------------

    /// Run `op` on a staged copy of every channel and commit only if all
    /// channels succeed. Unless `op` puts every channel on one grid by
    /// itself (`reshapes`), out of sync channels are first resampled onto
    /// their common shape.
    fn apply<F>(&mut self, reshapes: bool, mut op: F) -> Result<&mut Self>
    where
        F: FnMut(Channel, &mut SpectralDistribution) -> Result<()>,
    {
        let mut staged = self.channels.clone();
        if !reshapes && !self.is_synchronised() {
            let common = self.common_shape()?;
            log::debug!("synchronising channels of '{}' on {common}", self.name);
            let config = InterpolationConfig::default();
            for channel in Channel::ALL {
                staged[channel.index()]
                    .synchronise_onto(common, &config)
                    .map_err(|source| SpectralError::Channel {
                        channel,
                        source: Box::new(source),
                    })?;
            }
        }
        for channel in Channel::ALL {
            op(channel, &mut staged[channel.index()]).map_err(|source| SpectralError::Channel {
                channel,
                source: Box::new(source),
            })?;
        }
        self.channels = staged;
        Ok(self)
    }

    pub fn extrapolate(&mut self, shape: SpectralShape) -> Result<&mut Self> {
        self.apply(false, |_, sd| sd.extrapolate(shape).map(drop))
    }

    pub fn interpolate(
        &mut self,
        shape: SpectralShape,
        method: Option<InterpolationMethod>,
    ) -> Result<&mut Self> {
        self.interpolate_with(shape, method, &InterpolationConfig::default())
    }

    pub fn interpolate_with(
        &mut self,
        shape: SpectralShape,
        method: Option<InterpolationMethod>,
        config: &InterpolationConfig,
    ) -> Result<&mut Self> {
        self.apply(false, |_, sd| {
            sd.interpolate_with(shape, method, config).map(drop)
        })
    }

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
        self.apply(true, |_, sd| sd.align_with(shape, method, config).map(drop))
    }

    pub fn zeros(&mut self, shape: Option<SpectralShape>) -> Result<&mut Self> {
        self.apply(shape.is_some(), |_, sd| sd.zeros(shape).map(drop))
    }

    /// Normalise each channel to its own peak.
    pub fn normalise(&mut self, factor: f64) -> Result<[Normalisation; 3]> {
        let mut outcomes = [Normalisation::Degenerate; 3];
        self.apply(false, |channel, sd| {
            outcomes[channel.index()] = sd.normalise(factor);
            Ok(())
        })?;
        Ok(outcomes)
    }
}

impl Index<Channel> for CompositeSpectralDistribution {
    type Output = SpectralDistribution;

    fn index(&self, channel: Channel) -> &SpectralDistribution {
        self.channel(channel)
    }
}

impl fmt::Display for CompositeSpectralDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [", self.name)?;
        for (i, (channel, _)) in self.mapping().into_iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", self.channel(channel))?;
        }
        write!(f, "]")
    }
}
