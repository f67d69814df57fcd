use serde::Deserialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum UnitError {
    #[error("Unknown unit '{0}'")]
    Unknown(String),
}

/// A scalar unit expressed as a multiplicative factor to SI base units.
///
/// Study tables carry quantities in engineering units (`km`, `kg`, `m^2`, ...).
/// Configuration-tree leaves and everything the pipeline computes are SI, so
/// the nexus converts on the way in and out of the trees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unit {
    symbol: &'static str,
    factor: f64,
}

const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;

const UNIT_TABLE: &[(&str, f64)] = &[
    ("-", 1.0),
    ("m", 1.0),
    ("m^2", 1.0),
    ("m/s", 1.0),
    ("km", 1_000.0),
    ("km/h", 1.0 / 3.6),
    ("ft", 0.3048),
    ("kt", 0.514_444),
    ("kg", 1.0),
    ("t", 1_000.0),
    ("N", 1.0),
    ("kN", 1_000.0),
    ("Pa", 1.0),
    ("kPa", 1_000.0),
    ("s", 1.0),
    ("min", 60.0),
    ("h", 3_600.0),
    ("rad", 1.0),
    ("deg", DEG_TO_RAD),
];

impl Unit {
    pub const DIMENSIONLESS: Unit = Unit {
        symbol: "-",
        factor: 1.0,
    };

    pub fn parse(symbol: &str) -> Result<Self, UnitError> {
        UNIT_TABLE
            .iter()
            .find(|(name, _)| *name == symbol)
            .map(|&(symbol, factor)| Unit { symbol, factor })
            .ok_or_else(|| UnitError::Unknown(symbol.to_string()))
    }

    pub fn symbol(&self) -> &'static str {
        self.symbol
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Converts a value in this unit to SI.
    pub fn to_si(&self, value: f64) -> f64 {
        value * self.factor
    }

    /// Converts an SI value into this unit.
    pub fn from_si(&self, value: f64) -> f64 {
        value / self.factor
    }
}

impl Default for Unit {
    fn default() -> Self {
        Self::DIMENSIONLESS
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol)
    }
}

// Hand-written so the `&'static str` symbol field never participates in
// deserialization; the incoming string is only used to look up the table
// entry.
impl<'de> Deserialize<'de> for Unit {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let symbol = String::deserialize(deserializer)?;
        Unit::parse(&symbol).map_err(serde::de::Error::custom)
    }
}

impl std::str::FromStr for Unit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Unit::parse(s)
    }
}
