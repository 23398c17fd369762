//! The globe: projection, data, interaction and rendering behind one owner.
//!
//! All state lives on the thread that owns the [`GlobeController`]. Blocking
//! fetches run on worker threads and report back over a channel; call
//! [`GlobeController::poll`] once per frame to apply them.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use wetbulb_globe::{GlobeConfig, GlobeController, Viewport};
//! # use wetbulb_globe::source::FileSource;
//! let mut globe = GlobeController::load(
//!     GlobeConfig::default(),
//!     Arc::new(FileSource::new("site")),
//!     Viewport::new(960.0, 600.0),
//! )?;
//! globe.set_year(2050);
//! globe.wait_for_pending(std::time::Duration::from_secs(10));
//! println!("{} heat points", globe.frame().heat_points);
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::cache::{DataCache, GridRequest};
use crate::config::GlobeConfig;
use crate::interaction::{InteractionController, InteractionMode, SelectionChange};
use crate::models::{CountryFeature, CountryValueTable, RotationState, Viewport, YearlyGrid, parse_world};
use crate::projection::GeoProjection;
use crate::render::{BorderState, Frame, RenderPipeline};
use crate::source::{DataSource, SourceError};
use anyhow::{Context, Result, anyhow};
use num_format::Locale;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

/// Tooltip offset from the pointer, pixels.
pub const TOOLTIP_OFFSET: f64 = 12.0;

type FetchResult = (i32, Result<String, SourceError>);

/// Country tooltip content, anchored next to the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub name: String,
    pub year: i32,
    pub value: Option<f64>,
    pub position: (f64, f64),
}

impl Tooltip {
    pub fn title(&self) -> String {
        format!("{}, {}", self.name, self.year)
    }

    /// Second line, with the decimal separator of `locale_tag`.
    pub fn detail(&self, locale_tag: &str) -> String {
        match self.value {
            Some(v) if v.is_finite() => {
                let s = format!("{v:.1}").replace('.', num_locale(locale_tag).decimal());
                format!("Max wet-bulb: {s} °C")
            }
            _ => "No data".to_string(),
        }
    }
}

/// Map a user-provided locale tag to a number-formatting locale.
/// Supported tags (case-insensitive): "en", "de", "fr", "es", "it", "pt", "nl".
pub fn num_locale(tag: &str) -> Locale {
    match tag.to_lowercase().as_str() {
        "de" | "de_de" | "german" => Locale::de,
        "fr" | "fr_fr" => Locale::fr,
        "es" | "es_es" => Locale::es,
        "it" | "it_it" => Locale::it,
        "pt" | "pt_pt" | "pt_br" => Locale::pt,
        "nl" | "nl_nl" => Locale::nl,
        _ => Locale::en,
    }
}

pub struct GlobeController {
    config: GlobeConfig,
    source: Arc<dyn DataSource>,
    projection: GeoProjection,
    viewport: Viewport,
    features: Vec<CountryFeature>,
    values: CountryValueTable,
    cache: DataCache,
    pipeline: RenderPipeline,
    interaction: InteractionController,
    current_year: i32,
    pointer: Option<(f64, f64)>,
    frame: Frame,
    frames_rendered: u64,
    tx: Sender<FetchResult>,
    rx: Receiver<FetchResult>,
}

impl GlobeController {
    /// Fetch country outlines and the country table in parallel, then build
    /// the globe and show the start year. Fails without rendering anything if
    /// either file cannot be loaded.
    pub fn load(config: GlobeConfig, source: Arc<dyn DataSource>, viewport: Viewport) -> Result<Self> {
        config.validate()?;
        log::info!("loading globe data from {}", source.describe());

        let (world, table) = std::thread::scope(|s| {
            let world = s.spawn(|| source.fetch_text(&config.world_json));
            let table = s.spawn(|| source.fetch_text(&config.countries_json));
            (world.join(), table.join())
        });
        let world = world
            .map_err(|_| anyhow!("world loader panicked"))?
            .with_context(|| format!("load {}", config.world_json))?;
        let table = table
            .map_err(|_| anyhow!("country table loader panicked"))?
            .with_context(|| format!("load {}", config.countries_json))?;

        let features = parse_world(&world)?;
        let values = CountryValueTable::parse(&table)?;
        log::info!("loaded {} country outlines", features.len());
        Self::from_parts(config, source, features, values, viewport)
    }

    /// Build from already-loaded outlines and values.
    pub fn from_parts(
        config: GlobeConfig,
        source: Arc<dyn DataSource>,
        features: Vec<CountryFeature>,
        values: CountryValueTable,
        viewport: Viewport,
    ) -> Result<Self> {
        config.validate()?;
        let pipeline = RenderPipeline::from_config(&config)?;
        let interaction = InteractionController::new(config.drag_sensitivity, config.auto_rotate_step);
        let (tx, rx) = mpsc::channel();
        let start_year = config.start_year();
        let mut globe = Self {
            cache: DataCache::new(config.grid_files.clone()),
            projection: GeoProjection::new(1.0, (0.0, 0.0), RotationState::from(config.initial_rotation)),
            viewport,
            features,
            values,
            pipeline,
            interaction,
            current_year: start_year,
            pointer: None,
            frame: Frame::default(),
            frames_rendered: 0,
            tx,
            rx,
            config,
            source,
        };
        globe.resize(viewport);
        globe.set_year(start_year);
        Ok(globe)
    }

    // ---- accessors ----

    pub fn config(&self) -> &GlobeConfig {
        &self.config
    }

    pub fn projection(&self) -> &GeoProjection {
        &self.projection
    }

    pub fn rotation(&self) -> RotationState {
        self.projection.rotation()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn features(&self) -> &[CountryFeature] {
        &self.features
    }

    pub fn values(&self) -> &CountryValueTable {
        &self.values
    }

    pub fn cache(&self) -> &DataCache {
        &self.cache
    }

    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    pub fn mode(&self) -> InteractionMode {
        self.interaction.mode()
    }

    pub fn selected(&self) -> Option<&str> {
        self.interaction.selected()
    }

    pub fn current_year(&self) -> i32 {
        self.current_year
    }

    pub fn years(&self) -> &[i32] {
        &self.config.years
    }

    /// Grid for the current year; empty while it is still loading.
    pub fn current_grid(&self) -> YearlyGrid {
        self.cache.get(self.current_year).cloned().unwrap_or_default()
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Number of full redraws so far.
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    // ---- rendering ----

    /// Redraw both layers from the current state.
    pub fn render(&mut self) {
        let grid = self.current_grid();
        let hovered = self.interaction.hovered().map(str::to_owned);
        let selected = self.interaction.selected().map(str::to_owned);
        let border = |name: &str| {
            if selected.as_deref() == Some(name) {
                BorderState::Selected
            } else if hovered.as_deref() == Some(name) {
                BorderState::Hovered
            } else {
                BorderState::Normal
            }
        };
        self.frame = self.pipeline.render(
            &self.projection,
            &grid,
            &self.features,
            (self.viewport.width, self.viewport.height),
            border,
        );
        self.frames_rendered += 1;
    }

    /// Fit the globe to a new container box and redraw once.
    pub fn resize(&mut self, viewport: Viewport) {
        let vp = viewport.sanitized();
        self.viewport = vp;
        self.projection
            .set_scale(vp.width.min(vp.height) / self.config.scale_divisor);
        self.projection.set_translate(vp.width / 2.0, vp.height / 2.0);
        self.render();
    }

    // ---- data ----

    /// Switch years. Renders right away when the grid is cached, otherwise
    /// when its fetch lands (see [`Self::poll`]).
    pub fn set_year(&mut self, year: i32) {
        self.current_year = year;
        match self.cache.request(year) {
            GridRequest::Ready(_) => self.render(),
            GridRequest::Fetch(location) => {
                let source = Arc::clone(&self.source);
                let tx = self.tx.clone();
                std::thread::spawn(move || {
                    let body = source.fetch_text(&location);
                    // receiver gone means the globe was dropped
                    let _ = tx.send((year, body));
                });
            }
            GridRequest::Pending => {}
        }
    }

    fn apply_fetch(&mut self, (year, body): FetchResult) -> bool {
        self.cache.complete(year, body);
        year == self.current_year
    }

    /// Apply finished fetches. Returns `true` if the frame was redrawn.
    pub fn poll(&mut self) -> bool {
        let mut redraw = false;
        while let Ok(done) = self.rx.try_recv() {
            redraw |= self.apply_fetch(done);
        }
        if redraw {
            self.render();
        }
        redraw
    }

    /// Block until every in-flight fetch has landed or `timeout` passes.
    /// Returns `true` when nothing is pending any more.
    pub fn wait_for_pending(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut redraw = false;
        while self.cache.has_pending() {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(left) {
                Ok(done) => redraw |= self.apply_fetch(done),
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        if redraw {
            self.render();
        }
        !self.cache.has_pending()
    }

    // ---- interaction ----

    /// Jump to an explicit orientation and redraw.
    pub fn set_rotation(&mut self, rotation: RotationState) {
        self.projection.set_rotation_state(rotation);
        self.render();
    }

    /// One animation tick. Returns `true` if the globe moved.
    pub fn tick(&mut self) -> bool {
        match self.interaction.tick(self.projection.rotation()) {
            Some(r) => {
                self.projection.set_rotation_state(r);
                self.render();
                true
            }
            None => false,
        }
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.pointer = Some((x, y));
        self.interaction
            .pointer_down(x, y, self.projection.rotation());
    }

    /// Pointer moved: rotates while dragging, otherwise updates the hover.
    /// Returns `true` if the frame was redrawn.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        self.pointer = Some((x, y));
        if let Some(r) = self.interaction.pointer_move(x, y) {
            self.projection.set_rotation_state(r);
            self.render();
            return true;
        }
        self.pointer_hover(x, y)
    }

    pub fn pointer_up(&mut self) {
        self.interaction.pointer_up();
    }

    /// Pointer left the drawing surface.
    pub fn pointer_exit(&mut self) {
        self.pointer = None;
        if self.interaction.hovered().is_some() {
            self.leave_country();
        }
    }

    /// Hit-test `(x, y)` and emit hover enter/leave as needed.
    pub fn pointer_hover(&mut self, x: f64, y: f64) -> bool {
        self.pointer = Some((x, y));
        let hit = self.country_at(x, y).map(str::to_owned);
        let current = self.interaction.hovered().map(str::to_owned);
        match (hit, current) {
            (Some(name), Some(current)) if name == current => false,
            (Some(name), _) => {
                self.hover_country(&name, x, y);
                true
            }
            (None, Some(_)) => {
                self.leave_country();
                true
            }
            (None, None) => false,
        }
    }

    /// Pointer entered `name` at `(x, y)`.
    pub fn hover_country(&mut self, name: &str, x: f64, y: f64) {
        self.pointer = Some((x, y));
        self.interaction.hover_enter(name);
        self.render();
    }

    pub fn leave_country(&mut self) {
        if self.interaction.hover_leave() {
            self.render();
        }
    }

    /// Click at `(x, y)`; toggles selection of the country under it.
    pub fn click_at(&mut self, x: f64, y: f64) -> Option<SelectionChange> {
        let name = self.country_at(x, y)?.to_owned();
        Some(self.click_country(&name))
    }

    pub fn click_country(&mut self, name: &str) -> SelectionChange {
        let change = self.interaction.click(name);
        match &change {
            SelectionChange::Selected(n) => log::debug!("selected {n}"),
            SelectionChange::Cleared(n) => log::debug!("cleared selection of {n}"),
        }
        self.render();
        change
    }

    /// Multiply the scale by `factor`, clamped to the configured range.
    pub fn zoom(&mut self, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let k = (self.projection.scale() * factor).clamp(self.config.min_scale, self.config.max_scale);
        self.projection.set_scale(k);
        self.render();
    }

    /// Country under a screen position, if any.
    pub fn country_at(&self, x: f64, y: f64) -> Option<&str> {
        let (lon, lat) = self.projection.invert(x, y)?;
        self.features
            .iter()
            .find(|f| f.contains(lon, lat))
            .map(|f| f.name.as_str())
    }

    /// Tooltip for the hovered country.
    pub fn tooltip(&self) -> Option<Tooltip> {
        let name = self.interaction.hovered()?;
        let (x, y) = self.pointer?;
        Some(Tooltip {
            name: name.to_string(),
            year: self.current_year,
            value: self.values.get(self.current_year, name),
            position: (x + TOOLTIP_OFFSET, y + TOOLTIP_OFFSET),
        })
    }
}
