//! wetbulb_globe
//!
//! An interactive orthographic globe of projected wet-bulb temperatures.
//! Pairs with the `wetbulb` CLI (frame rendering, statistics) and the
//! `wetbulb-gui` desktop viewer.
//!
//! ### Features
//! - Orthographic projection with drag-to-rotate and slow auto-rotation
//! - Per-year heat grids fetched lazily over HTTP or from disk, memoized
//! - Threshold color scale with intensity-scaled dot size and opacity
//! - Hover tooltips and click-to-select countries
//! - Frames as display lists, paintable to SVG/PNG or an egui canvas
//!
//! ### Example
//! ```no_run
//! use std::sync::Arc;
//! use wetbulb_globe::{GlobeConfig, GlobeController, Viewport};
//! use wetbulb_globe::source::HttpSource;
//!
//! let source = Arc::new(HttpSource::new("https://example.org/wetbulb"));
//! let mut globe = GlobeController::load(GlobeConfig::default(), source, Viewport::new(960.0, 600.0))?;
//! globe.set_year(2070);
//! globe.wait_for_pending(std::time::Duration::from_secs(30));
//! wetbulb_globe::render::plotters_painter::save_frame(globe.frame(), "globe_2070.png", 1.0)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cache;
pub mod config;
pub mod controller;
pub mod interaction;
pub mod models;
pub mod projection;
pub mod render;
pub mod scale;
pub mod source;
pub mod stats;
pub mod storage;

pub use config::GlobeConfig;
pub use controller::{GlobeController, Tooltip};
pub use models::{CountryFeature, GridPoint, RotationState, Viewport, YearlyGrid};
