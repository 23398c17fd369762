//! Orthographic projection of the globe.
//!
//! Rotation follows the usual `[lambda, phi, gamma]` convention: `lambda`
//! spins the sphere about its polar axis, then `phi` tilts it towards the
//! viewer and `gamma` rolls it about the view axis. The visible point in the
//! middle of the disc is therefore `(-lambda, -phi)`.
//!
//! The clip angle is fixed at 90°: everything on the far hemisphere is
//! hidden. A point exactly on the horizon counts as visible.

use crate::models::{Polygon, RotationState};
use std::f64::consts::FRAC_PI_2;

/// Slack for the inclusive horizon test, in radians.
pub const HORIZON_EPSILON: f64 = 1e-9;

/// Screen-space position in CSS pixels (y grows downwards).
pub type ScreenPoint = (f64, f64);

#[derive(Debug, Clone, PartialEq)]
pub struct GeoProjection {
    scale: f64,
    translate: ScreenPoint,
    rotation: RotationState,
}

impl Default for GeoProjection {
    fn default() -> Self {
        Self {
            scale: 250.0,
            translate: (480.0, 250.0),
            rotation: RotationState::default(),
        }
    }
}

impl GeoProjection {
    pub fn new(scale: f64, translate: ScreenPoint, rotation: RotationState) -> Self {
        Self {
            scale,
            translate,
            rotation,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Set the zoom scale (sphere radius in pixels). Callers clamp.
    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    pub fn translate(&self) -> ScreenPoint {
        self.translate
    }

    pub fn set_translate(&mut self, x: f64, y: f64) {
        self.translate = (x, y);
    }

    pub fn rotation(&self) -> RotationState {
        self.rotation
    }

    pub fn set_rotation(&mut self, lambda: f64, phi: f64, gamma: f64) {
        self.rotation = RotationState { lambda, phi, gamma };
    }

    pub fn set_rotation_state(&mut self, rotation: RotationState) {
        self.rotation = rotation;
    }

    /// Geographic coordinate currently in the middle of the disc.
    pub fn view_center(&self) -> (f64, f64) {
        (-self.rotation.lambda, -self.rotation.phi)
    }

    fn is_degenerate(&self) -> bool {
        !self.scale.is_finite()
            || self.scale <= 0.0
            || !self.translate.0.is_finite()
            || !self.translate.1.is_finite()
    }

    /// Rotate a geographic coordinate into view space: `x` points at the
    /// viewer, `y` to the right, `z` up.
    fn to_view(&self, lon: f64, lat: f64) -> [f64; 3] {
        let r = &self.rotation;
        let lambda = (lon + r.lambda).to_radians();
        let phi = lat.to_radians();
        let (sin_dp, cos_dp) = r.phi.to_radians().sin_cos();
        let (sin_dg, cos_dg) = r.gamma.to_radians().sin_cos();

        let x = lambda.cos() * phi.cos();
        let y = lambda.sin() * phi.cos();
        let z = phi.sin();
        let k = z * cos_dp + x * sin_dp;
        [
            x * cos_dp - z * sin_dp,
            y * cos_dg - k * sin_dg,
            k * cos_dg + y * sin_dg,
        ]
    }

    /// Inverse of [`Self::to_view`].
    fn from_view(&self, v: [f64; 3]) -> (f64, f64) {
        let r = &self.rotation;
        let (sin_dp, cos_dp) = r.phi.to_radians().sin_cos();
        let (sin_dg, cos_dg) = r.gamma.to_radians().sin_cos();

        let [x1, y1, z1] = v;
        let y = y1 * cos_dg + z1 * sin_dg;
        let k = z1 * cos_dg - y1 * sin_dg;
        let x = x1 * cos_dp + k * sin_dp;
        let z = k * cos_dp - x1 * sin_dp;

        let lon = y.atan2(x).to_degrees() - r.lambda;
        let lat = z.clamp(-1.0, 1.0).asin().to_degrees();
        (wrap_lon(lon), lat)
    }

    fn view_to_screen(&self, v: [f64; 3]) -> ScreenPoint {
        (
            self.translate.0 + self.scale * v[1],
            self.translate.1 - self.scale * v[2],
        )
    }

    /// Project `(lon, lat)` in degrees to screen pixels, or `None` when the
    /// point is on the hidden hemisphere or the projection is degenerate.
    pub fn project(&self, lon: f64, lat: f64) -> Option<ScreenPoint> {
        if self.is_degenerate() || !lon.is_finite() || !lat.is_finite() {
            return None;
        }
        let v = self.to_view(lon, lat);
        if v[0] < -HORIZON_EPSILON {
            return None;
        }
        Some(self.view_to_screen(v))
    }

    /// Screen pixels back to `(lon, lat)`, or `None` outside the disc.
    pub fn invert(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if self.is_degenerate() {
            return None;
        }
        let px = (x - self.translate.0) / self.scale;
        let py = (self.translate.1 - y) / self.scale;
        let rho2 = px * px + py * py;
        if !rho2.is_finite() || rho2 > 1.0 {
            return None;
        }
        Some(self.from_view([(1.0 - rho2).sqrt(), px, py]))
    }

    /// Screen polylines for every ring of `polygon`.
    ///
    /// Rings that dip behind the horizon are split into separate runs; the
    /// run ends are moved onto the horizon circle so outlines meet the rim.
    pub fn path_for(&self, polygon: &Polygon) -> Vec<Vec<ScreenPoint>> {
        let mut out = Vec::new();
        if self.is_degenerate() {
            return out;
        }
        for ring in polygon {
            self.split_ring(ring, &mut out);
        }
        out
    }

    fn split_ring(&self, ring: &[(f64, f64)], out: &mut Vec<Vec<ScreenPoint>>) {
        let views: Vec<[f64; 3]> = ring
            .iter()
            .filter(|(lon, lat)| lon.is_finite() && lat.is_finite())
            .map(|&(lon, lat)| self.to_view(lon, lat))
            .collect();
        if views.len() < 2 {
            return;
        }
        let visible = |v: &[f64; 3]| v[0] >= -HORIZON_EPSILON;

        let mut runs: Vec<Vec<ScreenPoint>> = Vec::new();
        let mut current: Vec<ScreenPoint> = Vec::new();
        for pair in views.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            match (visible(&a), visible(&b)) {
                (true, true) => {
                    if current.is_empty() {
                        current.push(self.view_to_screen(a));
                    }
                    current.push(self.view_to_screen(b));
                }
                (true, false) => {
                    if current.is_empty() {
                        current.push(self.view_to_screen(a));
                    }
                    current.push(self.view_to_screen(horizon_crossing(a, b)));
                    runs.push(std::mem::take(&mut current));
                }
                (false, true) => {
                    current.push(self.view_to_screen(horizon_crossing(a, b)));
                    current.push(self.view_to_screen(b));
                }
                (false, false) => {}
            }
        }
        if !current.is_empty() {
            // A closed ring that started visible continues into the first run.
            let closed = views.first() == views.last();
            if closed && visible(&views[0]) && !runs.is_empty() {
                let mut first = runs.remove(0);
                current.extend(first.drain(1..));
            }
            runs.push(current);
        }
        out.extend(runs.into_iter().filter(|r| r.len() >= 2));
    }
}

/// Point where the great-circle arc `a -> b` crosses the horizon plane
/// (`x == 0`), renormalized onto the unit sphere.
fn horizon_crossing(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    let denom = a[0] - b[0];
    let t = if denom.abs() < f64::EPSILON {
        0.5
    } else {
        a[0] / denom
    };
    let p = [0.0, a[1] + (b[1] - a[1]) * t, a[2] + (b[2] - a[2]) * t];
    let n = (p[1] * p[1] + p[2] * p[2]).sqrt();
    if n < f64::EPSILON {
        p
    } else {
        [0.0, p[1] / n, p[2] / n]
    }
}

/// Great-circle distance between two `(lon, lat)` coordinates, in radians.
pub fn angular_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lon1, lat1) = (a.0.to_radians(), a.1.to_radians());
    let (lon2, lat2) = (b.0.to_radians(), b.1.to_radians());
    let s_lat = ((lat2 - lat1) / 2.0).sin();
    let s_lon = ((lon2 - lon1) / 2.0).sin();
    let h = s_lat * s_lat + lat1.cos() * lat2.cos() * s_lon * s_lon;
    2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt())
}

/// Whether `point` lies on the hemisphere facing `center` (horizon inclusive).
pub fn on_near_side(center: (f64, f64), point: (f64, f64)) -> bool {
    angular_distance(center, point) <= FRAC_PI_2 + HORIZON_EPSILON
}

/// Wrap a longitude into `[-180, 180)`.
pub fn wrap_lon(lon: f64) -> f64 {
    let w = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if w.is_finite() { w } else { lon }
}
