//! Paint a [`Frame`] to **SVG** or **PNG** with Plotters.
//!
//! Plotters has no radial gradients or blur filters, so the atmosphere glow
//! is drawn as concentric rings with interpolated color and drop shadows as
//! a wider translucent stroke underneath the border.

use super::{DrawOp, Frame, Shadow, Stroke};
use crate::scale::Rgba;
use anyhow::{Result, anyhow};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;
use std::path::Path;

/// Cap on the number of rings used to fake one gradient.
const MAX_GLOW_STEPS: usize = 64;

fn rgba_color(c: Rgba, opacity: f64) -> RGBAColor {
    RGBAColor(c.r, c.g, c.b, (c.alpha() * opacity).clamp(0.0, 1.0))
}

fn px(v: f64, ratio: f64) -> i32 {
    (v * ratio).round() as i32
}

fn stroke_px(width: f64, ratio: f64) -> u32 {
    (width * ratio).round().max(1.0) as u32
}

/// Write `frame` to `out_path`; `.svg` selects the SVG backend, anything
/// else is rendered as a bitmap (format from the extension, PNG usually).
pub fn save_frame<P: AsRef<Path>>(frame: &Frame, out_path: P, pixel_ratio: f64) -> Result<()> {
    let out_path = out_path.as_ref();
    let ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
        pixel_ratio
    } else {
        1.0
    };
    let size = (
        px(frame.width, ratio).max(1) as u32,
        px(frame.height, ratio).max(1) as u32,
    );

    if out_path.extension().and_then(|s| s.to_str()) == Some("svg") {
        let root = SVGBackend::new(out_path, size).into_drawing_area();
        paint(root, frame, ratio)
    } else {
        let root = BitMapBackend::new(out_path, size).into_drawing_area();
        paint(root, frame, ratio)
    }
}

/// Replay both layers onto any Plotters drawing area, raster first.
pub fn paint<DB>(root: DrawingArea<DB, Shift>, frame: &Frame, ratio: f64) -> Result<()>
where
    DB: DrawingBackend,
{
    root.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;
    for op in frame.raster.iter().chain(frame.vector.iter()) {
        draw_op(&root, op, ratio)?;
    }
    root.present().map_err(|e| anyhow!("{:?}", e))?;
    Ok(())
}

fn draw_op<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, op: &DrawOp, ratio: f64) -> Result<()> {
    match op {
        DrawOp::Disc {
            center,
            radius,
            color,
            opacity,
        } => {
            let r = px(*radius, ratio).max(1);
            root.draw(&Circle::new(
                (px(center.0, ratio), px(center.1, ratio)),
                r,
                rgba_color(*color, *opacity).filled(),
            ))
            .map_err(|e| anyhow!("{:?}", e))?;
        }
        DrawOp::Glow {
            center,
            inner_radius,
            outer_radius,
            inner,
            outer,
        } => {
            let band = ((outer_radius - inner_radius) * ratio).max(1.0);
            let steps = (band.ceil() as usize).clamp(1, MAX_GLOW_STEPS);
            let c = (px(center.0, ratio), px(center.1, ratio));
            for s in 0..steps {
                let t = (s as f64 + 0.5) / steps as f64;
                let r = inner_radius + (outer_radius - inner_radius) * t;
                let color = inner.lerp(*outer, t);
                if color.a == 0 {
                    continue;
                }
                root.draw(&Circle::new(
                    c,
                    px(r, ratio),
                    rgba_color(color, 1.0).stroke_width((band / steps as f64).ceil() as u32),
                ))
                .map_err(|e| anyhow!("{:?}", e))?;
            }
        }
        DrawOp::Ring {
            center,
            radius,
            stroke,
        } => {
            root.draw(&Circle::new(
                (px(center.0, ratio), px(center.1, ratio)),
                px(*radius, ratio),
                stroke_style(stroke, ratio),
            ))
            .map_err(|e| anyhow!("{:?}", e))?;
        }
        DrawOp::Path {
            points,
            stroke,
            shadow,
        } => {
            let pts: Vec<(i32, i32)> = points
                .iter()
                .map(|(x, y)| (px(*x, ratio), px(*y, ratio)))
                .collect();
            if let Some(Shadow { blur, color }) = shadow {
                let halo = Stroke {
                    color: color.with_alpha(color.alpha() * 0.5),
                    width: stroke.width + blur,
                };
                root.draw(&PathElement::new(pts.clone(), stroke_style(&halo, ratio)))
                    .map_err(|e| anyhow!("{:?}", e))?;
            }
            root.draw(&PathElement::new(pts, stroke_style(stroke, ratio)))
                .map_err(|e| anyhow!("{:?}", e))?;
        }
    }
    Ok(())
}

fn stroke_style(stroke: &Stroke, ratio: f64) -> ShapeStyle {
    rgba_color(stroke.color, 1.0).stroke_width(stroke_px(stroke.width, ratio))
}
