//! Colors and the wet-bulb threshold scale.
//!
//! The scale maps a continuous value to one of a fixed, ordered set of colors
//! based on which interval between the configured breakpoints it falls in.
//! A value equal to a breakpoint belongs to the bin *above* it, so with the
//! default breakpoints `22.0` is already "22–24" while `21.999` is "20–22".

use anyhow::{Result, anyhow, bail};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);

    /// Create a new RGBA color.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque RGB color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Alpha as a fraction in `0..=1`.
    pub fn alpha(&self) -> f64 {
        self.a as f64 / 255.0
    }

    /// Same color with alpha replaced by `alpha` (clamped to `0..=1`).
    pub fn with_alpha(self, alpha: f64) -> Self {
        Self {
            a: (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }

    /// Component-wise linear interpolation (`t` clamped to `0..=1`).
    pub fn lerp(self, other: Rgba, t: f64) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgba::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }

    /// Parse a CSS-style color: `#rgb`, `#rrggbb`, `#rrggbbaa` or
    /// `rgba(r, g, b, a)` / `rgb(r, g, b)` with `a` in `0..=1`.
    pub fn parse(s: &str) -> Result<Rgba> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| anyhow!("invalid hex color: {s}"));
        }

        static FUNC: OnceLock<Regex> = OnceLock::new();
        let re = FUNC.get_or_init(|| {
            Regex::new(r"^rgba?\(\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*(?:,\s*([0-9]*\.?[0-9]+)\s*)?\)$")
                .expect("color regex")
        });
        let caps = re
            .captures(s)
            .ok_or_else(|| anyhow!("unsupported color syntax: {s}"))?;
        let channel = |i: usize| -> Result<u8> {
            caps[i]
                .parse::<u8>()
                .map_err(|_| anyhow!("color channel out of range in {s}"))
        };
        let alpha = match caps.get(4) {
            Some(m) => m.as_str().parse::<f64>()?,
            None => 1.0,
        };
        if !(0.0..=1.0).contains(&alpha) {
            bail!("alpha out of range in {s}");
        }
        Ok(Rgba::rgb(channel(1)?, channel(2)?, channel(3)?).with_alpha(alpha))
    }

    /// Lower-case `#rrggbb` (alpha dropped).
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        3 => {
            let nib = |i: usize| {
                let v = u8::from_str_radix(hex.get(i..i + 1)?, 16).ok()?;
                Some(v * 17)
            };
            Some(Rgba::rgb(nib(0)?, nib(1)?, nib(2)?))
        }
        6 => Some(Rgba::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Rgba::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

/// Default breakpoints in °C; the last bin catches everything at or above 31.
pub const DEFAULT_THRESHOLDS: [f64; 7] = [20.0, 22.0, 24.0, 26.0, 28.0, 30.0, 31.0];

/// Near-white through deep red to black, one entry per bin.
pub const DEFAULT_PALETTE: [Rgba; 8] = [
    Rgba::rgb(0xFD, 0xFD, 0xFD), // <20
    Rgba::rgb(0xFC, 0xF0, 0xDA), // 20–22
    Rgba::rgb(0xF5, 0xCA, 0x98), // 22–24
    Rgba::rgb(0xE8, 0x88, 0x5A), // 24–26
    Rgba::rgb(0xBF, 0x3B, 0x23), // 26–28
    Rgba::rgb(0x80, 0x1B, 0x0A), // 28–30
    Rgba::rgb(0x4A, 0x07, 0x07), // 30–31
    Rgba::rgb(0x00, 0x00, 0x00), // >=31
];

/// Ordered threshold-to-color mapping.
#[derive(Clone, Debug, PartialEq)]
pub struct ThresholdScale {
    domain: Vec<f64>,
    range: Vec<Rgba>,
}

impl Default for ThresholdScale {
    fn default() -> Self {
        Self {
            domain: DEFAULT_THRESHOLDS.to_vec(),
            range: DEFAULT_PALETTE.to_vec(),
        }
    }
}

impl ThresholdScale {
    /// Build a scale. `range` must hold exactly one more color than `domain`,
    /// and `domain` must be strictly ascending and finite.
    pub fn new(domain: Vec<f64>, range: Vec<Rgba>) -> Result<Self> {
        if domain.is_empty() {
            bail!("threshold scale needs at least one breakpoint");
        }
        if range.len() != domain.len() + 1 {
            bail!(
                "threshold scale needs {} colors for {} breakpoints, got {}",
                domain.len() + 1,
                domain.len(),
                range.len()
            );
        }
        if domain.iter().any(|v| !v.is_finite()) || domain.windows(2).any(|w| w[0] >= w[1]) {
            bail!("threshold breakpoints must be finite and strictly ascending");
        }
        Ok(Self { domain, range })
    }

    pub fn domain(&self) -> &[f64] {
        &self.domain
    }

    pub fn range(&self) -> &[Rgba] {
        &self.range
    }

    /// Largest breakpoint; used as the top of the intensity ramp.
    pub fn domain_max(&self) -> f64 {
        // `new` rejects an empty domain
        self.domain[self.domain.len() - 1]
    }

    /// Bin index: the number of breakpoints `<= value`.
    pub fn bin(&self, value: f64) -> usize {
        self.domain.partition_point(|&t| t <= value)
    }

    pub fn color(&self, value: f64) -> Rgba {
        self.range[self.bin(value)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_css_colors() {
        assert_eq!(Rgba::parse("#eeeeeeff").unwrap(), Rgba::new(0xee, 0xee, 0xee, 0xff));
        assert_eq!(Rgba::parse("#FDFDFD").unwrap(), Rgba::rgb(0xfd, 0xfd, 0xfd));
        assert_eq!(Rgba::parse("#000").unwrap(), Rgba::BLACK);
        assert_eq!(
            Rgba::parse("rgba(103, 103, 103, 0)").unwrap(),
            Rgba::new(103, 103, 103, 0)
        );
        let glow = Rgba::parse("rgba(125, 154, 199, 0.03)").unwrap();
        assert_eq!((glow.r, glow.g, glow.b, glow.a), (125, 154, 199, 8));
        assert!(Rgba::parse("rgba(300, 0, 0, 1)").is_err());
        assert!(Rgba::parse("teal").is_err());
    }

    #[test]
    fn rejects_mismatched_palette() {
        assert!(ThresholdScale::new(vec![1.0, 2.0], vec![Rgba::BLACK; 2]).is_err());
        assert!(ThresholdScale::new(vec![2.0, 1.0], vec![Rgba::BLACK; 3]).is_err());
        assert!(ThresholdScale::new(vec![1.0, 2.0], vec![Rgba::BLACK; 3]).is_ok());
    }
}
