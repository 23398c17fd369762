//! Globe configuration.
//!
//! Defaults reproduce the published wet-bulb globe: decadal grids from 2030
//! to 2100, the 20–31 °C threshold palette and the drag/rotation constants.
//! A JSON file can override any subset of fields:
//!
//! ```json
//! { "years": [2030, 2050], "grid_files": { "2030": "a.csv", "2050": "b.csv" } }
//! ```

use crate::scale::{DEFAULT_PALETTE, DEFAULT_THRESHOLDS, Rgba, ThresholdScale};
use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeConfig {
    /// Years offered by the slider, ascending.
    pub years: Vec<i32>,
    /// Grid CSV per year, relative to the data source.
    pub grid_files: BTreeMap<i32, String>,
    /// GeoJSON FeatureCollection of country outlines.
    pub world_json: String,
    /// Year-keyed country → value table.
    pub countries_json: String,
    /// Year shown first; falls back to 2025 when configured, else the first year.
    pub default_year: Option<i32>,
    /// `[lambda, phi, gamma]` at start-up, degrees.
    pub initial_rotation: [f64; 3],

    pub thresholds: Vec<f64>,
    pub palette: Vec<String>,
    /// Values below this are not drawn.
    pub min_value: f64,

    pub sea_color: String,
    pub atmosphere_inner: String,
    pub atmosphere_outer: String,

    /// Degrees of rotation per pixel of drag.
    pub drag_sensitivity: f64,
    /// Degrees of lambda removed per animation tick.
    pub auto_rotate_step: f64,
    /// Sphere radius = min(width, height) / scale_divisor.
    pub scale_divisor: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Tag for tooltip number formatting (`en`, `de`, ...).
    pub locale: String,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        let years: Vec<i32> = (2030..=2100).step_by(10).collect();
        let grid_files = years
            .iter()
            .map(|y| (*y, format!("data/wetbulb_{y}.csv")))
            .collect();
        Self {
            years,
            grid_files,
            world_json: "data/world.json".into(),
            countries_json: "data/wetbulb_max_countries.json".into(),
            default_year: None,
            initial_rotation: [-30.0, -20.0, 0.0],
            thresholds: DEFAULT_THRESHOLDS.to_vec(),
            palette: DEFAULT_PALETTE.iter().map(Rgba::to_hex).collect(),
            min_value: 20.0,
            sea_color: "#eeeeeeff".into(),
            atmosphere_inner: "rgba(103, 103, 103, 0)".into(),
            atmosphere_outer: "rgba(125, 154, 199, 0.03)".into(),
            drag_sensitivity: 0.3,
            auto_rotate_step: 0.03,
            scale_divisor: 2.3,
            min_scale: 50.0,
            max_scale: 5000.0,
            locale: "en".into(),
        }
    }
}

/// Colors resolved from their CSS text.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobeColors {
    pub sea: Rgba,
    pub atmosphere_inner: Rgba,
    pub atmosphere_outer: Rgba,
}

impl GlobeConfig {
    /// Load a JSON config file; missing fields take their defaults.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let cfg: GlobeConfig = serde_json::from_str(&text)
            .with_context(|| format!("parse config {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Scan `dir` (and its `data/` subdirectory) for `wetbulb_YYYY.csv` files
    /// and use them as the year list and grid sources. Other fields keep
    /// their defaults. Locations stay relative to `dir`.
    pub fn discover<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let re = Regex::new(r"^wetbulb_(\d{4})\.csv$")?;
        let mut grid_files = BTreeMap::new();
        for sub in ["", "data"] {
            let scan = dir.join(sub);
            let Ok(entries) = std::fs::read_dir(&scan) else {
                continue;
            };
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().into_owned();
                if let Some(caps) = re.captures(&name)
                    && let Ok(year) = caps[1].parse::<i32>()
                {
                    let rel = if sub.is_empty() {
                        name.clone()
                    } else {
                        format!("{sub}/{name}")
                    };
                    grid_files.entry(year).or_insert(rel);
                }
            }
        }
        if grid_files.is_empty() {
            bail!("no wetbulb_YYYY.csv files found in {}", dir.display());
        }
        let mut cfg = GlobeConfig {
            years: grid_files.keys().copied().collect(),
            grid_files,
            ..Default::default()
        };
        for (field, file) in [
            (&mut cfg.world_json, "world.json"),
            (&mut cfg.countries_json, "wetbulb_max_countries.json"),
        ] {
            if !dir.join(&*field).exists() && dir.join(file).exists() {
                *field = file.to_string();
            }
        }
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.years.is_empty() {
            bail!("config lists no years");
        }
        if self.years.windows(2).any(|w| w[0] >= w[1]) {
            bail!("years must be strictly ascending");
        }
        if let Some(y) = self.default_year
            && !self.years.contains(&y)
        {
            bail!("default_year {y} is not one of the configured years");
        }
        self.threshold_scale()?;
        self.colors()?;
        for (name, v) in [
            ("scale_divisor", self.scale_divisor),
            ("min_scale", self.min_scale),
            ("max_scale", self.max_scale),
        ] {
            if !(v.is_finite() && v > 0.0) {
                bail!("{name} must be positive, got {v}");
            }
        }
        if self.min_scale > self.max_scale {
            bail!("min_scale must not exceed max_scale");
        }
        if !self.drag_sensitivity.is_finite() || !self.auto_rotate_step.is_finite() {
            bail!("rotation constants must be finite");
        }
        Ok(())
    }

    pub fn threshold_scale(&self) -> Result<ThresholdScale> {
        let range = self
            .palette
            .iter()
            .map(|c| Rgba::parse(c))
            .collect::<Result<Vec<_>>>()
            .context("parse palette")?;
        ThresholdScale::new(self.thresholds.clone(), range)
    }

    pub fn colors(&self) -> Result<GlobeColors> {
        Ok(GlobeColors {
            sea: Rgba::parse(&self.sea_color).context("sea_color")?,
            atmosphere_inner: Rgba::parse(&self.atmosphere_inner).context("atmosphere_inner")?,
            atmosphere_outer: Rgba::parse(&self.atmosphere_outer).context("atmosphere_outer")?,
        })
    }

    /// Year shown on start-up.
    pub fn start_year(&self) -> i32 {
        self.default_year
            .or_else(|| self.years.contains(&2025).then_some(2025))
            .or_else(|| self.years.first().copied())
            .unwrap_or(2030)
    }
}
