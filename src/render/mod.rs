//! Frame building: turns the projection, the current year's grid and the
//! country outlines into two display lists.
//!
//! - **raster** layer: ocean disc, atmosphere glow, heat dots
//! - **vector** layer: globe outline, country borders
//!
//! Painters ([`plotters_painter`] for files, the GUI for the screen) replay
//! the lists in order. Every call rebuilds both lists from scratch.

pub mod plotters_painter;

use crate::config::{GlobeColors, GlobeConfig};
use crate::models::{CountryFeature, YearlyGrid};
use crate::projection::{GeoProjection, ScreenPoint, on_near_side};
use crate::scale::{Rgba, ThresholdScale};
use anyhow::Result;
use serde::Serialize;

pub const BORDER_WIDTH: f64 = 0.3;
pub const HOVER_BORDER_WIDTH: f64 = 2.0;
pub const SELECTED_BORDER_WIDTH: f64 = 2.5;
pub const SHADOW_BLUR: f64 = 3.0;
pub const SHADOW_COLOR: Rgba = Rgba::new(0, 0, 0, 102);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stroke {
    pub color: Rgba,
    pub width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Shadow {
    pub blur: f64,
    pub color: Rgba,
}

/// One drawing instruction in CSS pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    /// Filled disc, no stroke.
    Disc {
        center: ScreenPoint,
        radius: f64,
        color: Rgba,
        opacity: f64,
    },
    /// Radial gradient from `inner_radius` (color `inner`) to `outer_radius`
    /// (color `outer`), filled out to `outer_radius`.
    Glow {
        center: ScreenPoint,
        inner_radius: f64,
        outer_radius: f64,
        inner: Rgba,
        outer: Rgba,
    },
    /// Unfilled circle.
    Ring {
        center: ScreenPoint,
        radius: f64,
        stroke: Stroke,
    },
    /// Unfilled polyline.
    Path {
        points: Vec<ScreenPoint>,
        stroke: Stroke,
        shadow: Option<Shadow>,
    },
}

/// Both layers of one redraw.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Frame {
    pub width: f64,
    pub height: f64,
    pub raster: Vec<DrawOp>,
    pub vector: Vec<DrawOp>,
    /// Heat dots that made it into the raster layer.
    pub heat_points: usize,
}

/// How a country border is highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderState {
    Normal,
    Hovered,
    Selected,
}

impl BorderState {
    fn style(self) -> (Stroke, Option<Shadow>) {
        let width = match self {
            BorderState::Normal => BORDER_WIDTH,
            BorderState::Hovered => HOVER_BORDER_WIDTH,
            BorderState::Selected => SELECTED_BORDER_WIDTH,
        };
        let shadow = (self != BorderState::Normal).then_some(Shadow {
            blur: SHADOW_BLUR,
            color: SHADOW_COLOR,
        });
        (
            Stroke {
                color: Rgba::BLACK,
                width,
            },
            shadow,
        )
    }
}

/// Styling for one heat dot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatStyle {
    pub color: Rgba,
    pub radius: f64,
    pub opacity: f64,
}

#[derive(Debug, Clone)]
pub struct RenderPipeline {
    scale: ThresholdScale,
    colors: GlobeColors,
    min_value: f64,
}

impl RenderPipeline {
    pub fn new(scale: ThresholdScale, colors: GlobeColors, min_value: f64) -> Self {
        Self {
            scale,
            colors,
            min_value,
        }
    }

    pub fn from_config(cfg: &GlobeConfig) -> Result<Self> {
        Ok(Self::new(cfg.threshold_scale()?, cfg.colors()?, cfg.min_value))
    }

    pub fn threshold_scale(&self) -> &ThresholdScale {
        &self.scale
    }

    /// Color, radius and opacity of a dot for `value`.
    pub fn heat_style(&self, value: f64) -> HeatStyle {
        let span = self.scale.domain_max() - self.min_value;
        let span = if span.abs() < f64::EPSILON { 1.0 } else { span };
        let i = ((value - self.min_value) / span).clamp(0.0, 1.0);
        HeatStyle {
            color: self.scale.color(value),
            radius: 1.6 + 1.8 * i,
            opacity: 0.15 + 0.6 * i,
        }
    }

    /// Ocean, glow and heat dots.
    pub fn raster_layer(&self, projection: &GeoProjection, grid: &YearlyGrid) -> (Vec<DrawOp>, usize) {
        let mut ops = Vec::new();
        let k = projection.scale();
        if !k.is_finite() || k <= 0.0 {
            return (ops, 0);
        }
        let center = projection.translate();
        let r = (k - 4.0).max(1.0);

        ops.push(DrawOp::Disc {
            center,
            radius: r,
            color: self.colors.sea,
            opacity: 1.0,
        });
        ops.push(DrawOp::Glow {
            center,
            inner_radius: r * 0.95,
            outer_radius: r * 1.1,
            inner: self.colors.atmosphere_inner,
            outer: self.colors.atmosphere_outer,
        });

        let view_center = projection.view_center();
        let mut drawn = 0usize;
        for p in grid.points() {
            if p.value < self.min_value {
                continue;
            }
            if !on_near_side(view_center, (p.lon, p.lat)) {
                continue;
            }
            let Some(xy) = projection.project(p.lon, p.lat) else {
                continue;
            };
            let style = self.heat_style(p.value);
            ops.push(DrawOp::Disc {
                center: xy,
                radius: style.radius,
                color: style.color,
                opacity: style.opacity,
            });
            drawn += 1;
        }
        (ops, drawn)
    }

    /// Globe outline plus country borders. `border` picks the highlight of
    /// each country; highlighted borders are emitted last so they sit on top.
    pub fn vector_layer<F>(
        &self,
        projection: &GeoProjection,
        features: &[CountryFeature],
        border: F,
    ) -> Vec<DrawOp>
    where
        F: Fn(&str) -> BorderState,
    {
        let mut ops = vec![DrawOp::Ring {
            center: projection.translate(),
            radius: projection.scale(),
            stroke: Stroke {
                color: Rgba::BLACK,
                width: BORDER_WIDTH,
            },
        }];
        let mut highlighted = Vec::new();
        for f in features {
            let state = border(&f.name);
            let (stroke, shadow) = state.style();
            let target = if state == BorderState::Normal {
                &mut ops
            } else {
                &mut highlighted
            };
            for poly in &f.polygons {
                for points in projection.path_for(poly) {
                    target.push(DrawOp::Path {
                        points,
                        stroke,
                        shadow,
                    });
                }
            }
        }
        ops.extend(highlighted);
        ops
    }

    /// Full redraw of both layers.
    pub fn render<F>(
        &self,
        projection: &GeoProjection,
        grid: &YearlyGrid,
        features: &[CountryFeature],
        size: (f64, f64),
        border: F,
    ) -> Frame
    where
        F: Fn(&str) -> BorderState,
    {
        let (raster, heat_points) = self.raster_layer(projection, grid);
        let vector = self.vector_layer(projection, features, border);
        log::debug!(
            "frame: {} heat points, {} vector ops",
            heat_points,
            vector.len()
        );
        Frame {
            width: size.0,
            height: size.1,
            raster,
            vector,
            heat_points,
        }
    }
}
