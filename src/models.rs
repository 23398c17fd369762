use ahash::AHashMap;
use crate::projection::wrap_lon;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// One measurement sample of the heat layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GridPoint {
    pub lat: f64,
    pub lon: f64,
    pub value: f64,
}

impl GridPoint {
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite() && self.value.is_finite()
    }
}

/// Raw CSV row. Fields are kept as text so a malformed cell drops the row
/// instead of failing the whole file. The published data files call the
/// value column `twb`.
#[derive(Debug, Clone, Deserialize)]
pub struct GridRow {
    pub lat: String,
    pub lon: String,
    #[serde(alias = "twb")]
    pub value: String,
}

impl GridRow {
    /// Parsed point, or `None` if any field is not a finite number.
    pub fn to_point(&self) -> Option<GridPoint> {
        let num = |s: &str| s.trim().parse::<f64>().ok();
        let p = GridPoint {
            lat: num(&self.lat)?,
            lon: num(&self.lon)?,
            value: num(&self.value)?,
        };
        p.is_finite().then_some(p)
    }
}

/// All grid points for one year. Cheap to clone, never mutated once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YearlyGrid {
    points: Arc<[GridPoint]>,
}

impl YearlyGrid {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a grid, dropping rows with a non-finite coordinate or value.
    pub fn from_points(points: impl IntoIterator<Item = GridPoint>) -> Self {
        Self {
            points: points.into_iter().filter(GridPoint::is_finite).collect(),
        }
    }

    pub fn points(&self) -> &[GridPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Parse CSV text with a `lat,lon,value` (or `lat,lon,twb`) header.
    ///
    /// Returns the grid and the number of dropped rows.
    pub fn parse_csv(text: &str) -> Result<(Self, usize)> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(text.as_bytes());
        let headers = rdr.headers().context("read grid header")?;
        let has = |name: &str| headers.iter().any(|h| h == name);
        if !(has("lat") && has("lon") && (has("value") || has("twb"))) {
            bail!("grid header needs lat, lon and value (or twb) columns");
        }
        let mut points = Vec::new();
        let mut dropped = 0usize;
        for row in rdr.deserialize::<GridRow>() {
            // short, long or undecodable rows only cost themselves
            match row.ok().and_then(|r| r.to_point()) {
                Some(p) => points.push(p),
                None => dropped += 1,
            }
        }
        Ok((Self::from_points(points), dropped))
    }
}

/// Ring of `(lon, lat)` positions in degrees.
pub type Ring = Vec<(f64, f64)>;
/// Outer ring followed by holes.
pub type Polygon = Vec<Ring>;

/// A named country outline.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryFeature {
    pub name: String,
    pub polygons: Vec<Polygon>,
}

impl CountryFeature {
    /// Even-odd point-in-polygon test in lon/lat space. Rings that cross the
    /// antimeridian are unwrapped before testing; rings that circle a pole
    /// are tested as given.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.polygons.iter().any(|poly| {
            poly.iter()
                .filter(|ring| ring_contains(ring, lon, lat))
                .count()
                % 2
                == 1
        })
    }
}

/// Ring with longitudes made continuous across the antimeridian, or `None`
/// when it never crosses it (or winds around a pole).
fn unwrap_ring(ring: &[(f64, f64)]) -> Option<Vec<(f64, f64)>> {
    let crosses = ring.windows(2).any(|w| {
        let dx = w[1].0 - w[0].0;
        dx.abs() > 180.0 && wrap_lon(dx).abs() > 1e-9
    });
    if !crosses {
        return None;
    }
    let mut out = Vec::with_capacity(ring.len());
    let mut prev = ring[0].0;
    for &(x, y) in ring {
        let x = prev + wrap_lon(x - prev);
        out.push((x, y));
        prev = x;
    }
    let (first, last) = (out[0].0, out[out.len() - 1].0);
    ((last - first).abs() <= 180.0).then_some(out)
}

fn ring_contains(ring: &[(f64, f64)], lon: f64, lat: f64) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let unwrapped = unwrap_ring(ring);
    let (ring, lon) = match &unwrapped {
        Some(r) => {
            let (lo, hi) = r
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.0), hi.max(p.0)));
            let mid = (lo + hi) / 2.0;
            (r.as_slice(), mid + wrap_lon(lon - mid))
        }
        None => (ring, lon),
    };
    let mut inside = false;
    let n = ring.len();
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if (yi > lat) != (yj > lat) && lon < (xj - xi) * (lat - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[derive(Debug, Deserialize)]
struct RawCollection {
    features: Vec<RawFeature>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    #[serde(default)]
    properties: Option<RawProperties>,
    geometry: Option<RawGeometry>,
}

#[derive(Debug, Default, Deserialize)]
struct RawProperties {
    name: Option<String>,
    #[serde(rename = "NAME")]
    upper_name: Option<String>,
    #[serde(rename = "ADMIN")]
    admin: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum RawGeometry {
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
    #[serde(other)]
    Unsupported,
}

fn to_polygon(rings: Vec<Vec<Vec<f64>>>) -> Polygon {
    rings
        .into_iter()
        .map(|ring| {
            ring.into_iter()
                .filter_map(|pos| match pos.as_slice() {
                    [lon, lat, ..] => Some((*lon, *lat)),
                    _ => None,
                })
                .collect()
        })
        .collect()
}

/// Parse a GeoJSON FeatureCollection of country outlines.
///
/// Features without a usable name or without Polygon/MultiPolygon geometry
/// are skipped.
pub fn parse_world(json: &str) -> Result<Vec<CountryFeature>> {
    let raw: RawCollection = serde_json::from_str(json).context("parse world geojson")?;
    let mut out = Vec::with_capacity(raw.features.len());
    for f in raw.features {
        let props = f.properties.unwrap_or_default();
        let Some(name) = props.name.or(props.upper_name).or(props.admin) else {
            continue;
        };
        let polygons = match f.geometry {
            Some(RawGeometry::Polygon { coordinates }) => vec![to_polygon(coordinates)],
            Some(RawGeometry::MultiPolygon { coordinates }) => {
                coordinates.into_iter().map(to_polygon).collect()
            }
            Some(RawGeometry::Unsupported) | None => continue,
        };
        out.push(CountryFeature { name, polygons });
    }
    Ok(out)
}

/// Country-level values by year, e.g. `{"2030": {"India": 31.2}}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountryValueTable {
    by_year: BTreeMap<String, AHashMap<String, f64>>,
}

impl CountryValueTable {
    /// Parse the year-keyed JSON object. `null` and non-finite values are
    /// dropped and read back as "no data".
    pub fn parse(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, BTreeMap<String, Option<f64>>> =
            serde_json::from_str(json).context("parse country value table")?;
        let by_year = raw
            .into_iter()
            .map(|(year, row)| {
                let row = row
                    .into_iter()
                    .filter_map(|(name, v)| v.filter(|v| v.is_finite()).map(|v| (name, v)))
                    .collect();
                (year, row)
            })
            .collect();
        Ok(Self { by_year })
    }

    pub fn insert(&mut self, year: i32, country: impl Into<String>, value: f64) {
        if value.is_finite() {
            self.by_year
                .entry(year.to_string())
                .or_default()
                .insert(country.into(), value);
        }
    }

    pub fn get(&self, year: i32, country: &str) -> Option<f64> {
        self.by_year.get(&year.to_string())?.get(country).copied()
    }

    pub fn years(&self) -> impl Iterator<Item = &str> {
        self.by_year.keys().map(String::as_str)
    }
}

/// Orientation of the globe, degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RotationState {
    pub lambda: f64,
    pub phi: f64,
    pub gamma: f64,
}

impl RotationState {
    pub fn new(lambda: f64, phi: f64, gamma: f64) -> Self {
        Self { lambda, phi, gamma }
    }
}

impl From<[f64; 3]> for RotationState {
    fn from(r: [f64; 3]) -> Self {
        Self::new(r[0], r[1], r[2])
    }
}

/// Container box in CSS pixels plus device pixel density.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub pixel_ratio: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 500.0,
            pixel_ratio: 1.0,
        }
    }
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            pixel_ratio: 1.0,
        }
    }

    /// Same box, non-positive or non-finite sizes replaced by the defaults.
    pub fn sanitized(self) -> Self {
        let d = Viewport::default();
        let pick = |v: f64, fallback: f64| if v.is_finite() && v > 0.0 { v } else { fallback };
        Self {
            width: pick(self.width, d.width),
            height: pick(self.height, d.height),
            pixel_ratio: pick(self.pixel_ratio, 1.0),
        }
    }

    /// Backing-store size in device pixels.
    pub fn device_size(&self) -> (u32, u32) {
        (
            (self.width * self.pixel_ratio).round().max(1.0) as u32,
            (self.height * self.pixel_ratio).round().max(1.0) as u32,
        )
    }
}
