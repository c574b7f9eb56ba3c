// Two-stop linear RGB gradient
use crate::domain::error::ChartError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ChartError;

    /// Parses `#rrggbb`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ChartError::InvalidColor(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).map_err(|_| invalid());
        Ok(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gradient {
    pub low: Rgb,
    pub high: Rgb,
}

impl Gradient {
    pub fn new(low: Rgb, high: Rgb) -> Self {
        Self { low, high }
    }

    pub fn parse(low: &str, high: &str) -> Result<Self, ChartError> {
        Ok(Self::new(low.parse()?, high.parse()?))
    }

    /// Colour for `value` within `[min, max]`. The ratio is clamped to `[0, 1]`
    /// and a degenerate range returns the low stop.
    pub fn interpolate(&self, value: f64, min: f64, max: f64) -> Rgb {
        if min == max {
            return self.low;
        }
        let ratio = ((value - min) / (max - min)).clamp(0.0, 1.0);
        let ratio = if ratio.is_nan() { 0.0 } else { ratio };
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * ratio).round() as u8;
        Rgb::new(
            lerp(self.low.r, self.high.r),
            lerp(self.low.g, self.high.g),
            lerp(self.low.b, self.high.b),
        )
    }
}
