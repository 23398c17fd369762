/*!
 * Desktop viewer for the wet-bulb globe
 *
 * - Drag to rotate, scroll to zoom, hover a country for its value
 * - Click a country to select it and stop the rotation; click again to release
 * - Year slider and PNG snapshots
 *
 * Platform support: Windows, macOS, Linux
 */

use clap::Parser;
use eframe::egui;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use wetbulb_globe::render::{DrawOp, Frame, plotters_painter};
use wetbulb_globe::scale::Rgba;
use wetbulb_globe::source::{DataSource, FileSource, HttpSource};
use wetbulb_globe::{GlobeConfig, GlobeController, Viewport};

#[derive(Parser, Debug, Clone)]
#[command(name = "wetbulb-gui", version, about = "Interactive wet-bulb temperature globe")]
struct GuiArgs {
    /// Directory holding the data files.
    #[arg(long, conflicts_with = "base_url")]
    data: Option<PathBuf>,
    /// Base URL the data files are served from.
    #[arg(long)]
    base_url: Option<String>,
    /// JSON config overriding years, file locations and styling.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), eframe::Error> {
    // Enable logging for better debugging
    env_logger::init();
    let args = GuiArgs::parse();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 720.0])
            .with_min_inner_size([480.0, 400.0])
            .with_title("Wet-bulb Globe"),
        ..Default::default()
    };

    eframe::run_native(
        "Wet-bulb Globe",
        options,
        Box::new(|_cc| Ok(Box::new(GlobeApp::new(args)))),
    )
}

/// Main application state
struct GlobeApp {
    globe: Option<GlobeController>,
    year_index: usize,
    locale: String,

    // UI state
    is_loading: bool,
    status_message: String,
    error_message: String,

    // Background load
    load_receiver: Option<mpsc::Receiver<Result<GlobeController, String>>>,
}

impl GlobeApp {
    fn new(args: GuiArgs) -> Self {
        let (sender, receiver) = mpsc::channel();
        let config = match load_config(&args) {
            Ok(cfg) => cfg,
            Err(err) => {
                log::error!("{err:#}");
                return Self::failed(format!("Invalid configuration: {err:#}"));
            }
        };
        let locale = config.locale.clone();
        let source = make_source(&args);

        // Initial load runs off the UI thread; nothing is drawn until it lands.
        thread::spawn(move || {
            let result = GlobeController::load(config, source, Viewport::default())
                .map_err(|e| {
                    log::error!("failed to load globe data: {e:#}");
                    format!("Failed to load globe data: {e:#}")
                });
            let _ = sender.send(result);
        });

        Self {
            globe: None,
            year_index: 0,
            locale,
            is_loading: true,
            status_message: "Loading country outlines...".to_string(),
            error_message: String::new(),
            load_receiver: Some(receiver),
        }
    }

    fn failed(message: String) -> Self {
        Self {
            globe: None,
            year_index: 0,
            locale: "en".into(),
            is_loading: false,
            status_message: String::new(),
            error_message: message,
            load_receiver: None,
        }
    }

    fn check_load_result(&mut self) {
        if let Some(receiver) = &self.load_receiver
            && let Ok(result) = receiver.try_recv()
        {
            self.is_loading = false;
            self.load_receiver = None;

            match result {
                Ok(globe) => {
                    self.year_index = globe
                        .years()
                        .iter()
                        .position(|y| *y == globe.current_year())
                        .unwrap_or(0);
                    self.status_message.clear();
                    self.globe = Some(globe);
                }
                Err(error) => {
                    self.error_message = error;
                    self.status_message.clear();
                }
            }
        }
    }

    fn save_snapshot(&mut self) {
        let Some(globe) = &self.globe else {
            return;
        };
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let dir = dirs::picture_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        let Some(path) = rfd::FileDialog::new()
            .set_directory(dir)
            .set_file_name(format!("wetbulb_{}_{}.png", globe.current_year(), stamp))
            .add_filter("PNG image", &["png"])
            .add_filter("SVG image", &["svg"])
            .save_file()
        else {
            return;
        };
        match plotters_painter::save_frame(globe.frame(), &path, globe.viewport().pixel_ratio) {
            Ok(()) => {
                self.status_message = format!("Saved {}", path.display());
                self.error_message.clear();
            }
            Err(err) => {
                log::error!("snapshot failed: {err:#}");
                self.error_message = format!("Failed to save snapshot: {err:#}");
            }
        }
    }
}

impl eframe::App for GlobeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_result();

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Max wet-bulb temperature");
                if let Some(globe) = self.globe.as_mut() {
                    let years = globe.years().to_vec();
                    let last = years.len().saturating_sub(1);
                    ui.add_space(20.0);
                    let slider = ui.add(
                        egui::Slider::new(&mut self.year_index, 0..=last).show_value(false),
                    );
                    if slider.changed()
                        && let Some(year) = years.get(self.year_index)
                    {
                        globe.set_year(*year);
                    }
                    ui.strong(globe.current_year().to_string());
                    if let Some(name) = globe.selected() {
                        ui.label(format!("Selected: {name}"));
                    }
                }
                if ui
                    .add_enabled(self.globe.is_some(), egui::Button::new("Snapshot"))
                    .clicked()
                {
                    self.save_snapshot();
                }
            });

            if self.is_loading {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(&self.status_message);
                });
            } else if !self.status_message.is_empty() {
                ui.colored_label(egui::Color32::DARK_GREEN, &self.status_message);
            }
            if !self.error_message.is_empty() {
                ui.colored_label(egui::Color32::RED, &self.error_message);
            }
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::WHITE))
            .show(ctx, |ui| {
                let Some(globe) = self.globe.as_mut() else {
                    if self.is_loading {
                        ctx.request_repaint();
                    }
                    return;
                };
                let (response, painter) =
                    ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
                let rect = response.rect;
                let origin = rect.min;
                let local = |p: egui::Pos2| ((p.x - origin.x) as f64, (p.y - origin.y) as f64);

                let wanted = Viewport {
                    width: rect.width() as f64,
                    height: rect.height() as f64,
                    pixel_ratio: ctx.pixels_per_point() as f64,
                };
                if wanted != globe.viewport() {
                    globe.resize(wanted);
                }

                globe.poll();
                handle_pointer(globe, &response, ui, local);
                globe.tick();

                paint_frame(&painter, origin, globe.frame());
                if let Some(tip) = globe.tooltip() {
                    let pos = origin + egui::vec2(tip.position.0 as f32, tip.position.1 as f32);
                    egui::Area::new(egui::Id::new("globe-tooltip"))
                        .order(egui::Order::Tooltip)
                        .fixed_pos(pos)
                        .interactable(false)
                        .show(ctx, |ui| {
                            egui::Frame::popup(ui.style()).show(ui, |ui| {
                                ui.strong(tip.title());
                                ui.label(tip.detail(&self.locale));
                            });
                        });
                }

                // The auto-rotation is a per-frame animation.
                ctx.request_repaint();
            });
    }
}

fn handle_pointer(
    globe: &mut GlobeController,
    response: &egui::Response,
    ui: &egui::Ui,
    local: impl Fn(egui::Pos2) -> (f64, f64),
) {
    if response.drag_started()
        && let Some(pos) = drag_anchor(
            ui.input(|i| i.pointer.press_origin()),
            response.interact_pointer_pos(),
        )
    {
        let (x, y) = local(pos);
        globe.pointer_down(x, y);
    }
    if response.dragged()
        && let Some(pos) = response.interact_pointer_pos()
    {
        let (x, y) = local(pos);
        globe.pointer_move(x, y);
    }
    if response.drag_stopped() {
        globe.pointer_up();
    }

    if response.clicked()
        && let Some(pos) = response.interact_pointer_pos()
    {
        let (x, y) = local(pos);
        globe.click_at(x, y);
    }

    if !response.dragged() {
        match response.hover_pos() {
            Some(pos) => {
                let (x, y) = local(pos);
                globe.pointer_hover(x, y);
            }
            None => globe.pointer_exit(),
        }
    }

    if response.hovered() {
        let scroll = ui.input(|i| i.smooth_scroll_delta.y) as f64;
        if scroll != 0.0 {
            globe.zoom((scroll / 200.0).exp());
        }
    }
}

/// Drags anchor where the button went down, not where egui's drag threshold
/// was crossed.
fn drag_anchor(press_origin: Option<egui::Pos2>, current: Option<egui::Pos2>) -> Option<egui::Pos2> {
    press_origin.or(current)
}

fn color32(c: Rgba, opacity: f64) -> egui::Color32 {
    let a = (c.alpha() * opacity).clamp(0.0, 1.0);
    egui::Color32::from_rgba_unmultiplied(c.r, c.g, c.b, (a * 255.0).round() as u8)
}

fn paint_frame(painter: &egui::Painter, origin: egui::Pos2, frame: &Frame) {
    let at = |p: (f64, f64)| origin + egui::vec2(p.0 as f32, p.1 as f32);
    for op in frame.raster.iter().chain(frame.vector.iter()) {
        match op {
            DrawOp::Disc {
                center,
                radius,
                color,
                opacity,
            } => {
                painter.circle_filled(at(*center), *radius as f32, color32(*color, *opacity));
            }
            DrawOp::Glow {
                center,
                inner_radius,
                outer_radius,
                inner,
                outer,
            } => {
                let steps = ((outer_radius - inner_radius).ceil() as usize).clamp(1, 64);
                let width = ((outer_radius - inner_radius) / steps as f64) as f32;
                for s in 0..steps {
                    let t = (s as f64 + 0.5) / steps as f64;
                    let r = inner_radius + (outer_radius - inner_radius) * t;
                    painter.circle_stroke(
                        at(*center),
                        r as f32,
                        egui::Stroke::new(width, color32(inner.lerp(*outer, t), 1.0)),
                    );
                }
            }
            DrawOp::Ring {
                center,
                radius,
                stroke,
            } => {
                painter.circle_stroke(
                    at(*center),
                    *radius as f32,
                    egui::Stroke::new(stroke.width as f32, color32(stroke.color, 1.0)),
                );
            }
            DrawOp::Path {
                points,
                stroke,
                shadow,
            } => {
                let pts: Vec<egui::Pos2> = points.iter().map(|p| at(*p)).collect();
                if let Some(sh) = shadow {
                    painter.add(egui::Shape::line(
                        pts.clone(),
                        egui::Stroke::new(
                            (stroke.width + sh.blur) as f32,
                            color32(sh.color, 0.5),
                        ),
                    ));
                }
                painter.add(egui::Shape::line(
                    pts,
                    egui::Stroke::new(stroke.width as f32, color32(stroke.color, 1.0)),
                ));
            }
        }
    }
}

fn make_source(args: &GuiArgs) -> Arc<dyn DataSource> {
    match (&args.data, &args.base_url) {
        (_, Some(url)) => Arc::new(HttpSource::new(url.clone())),
        (Some(dir), None) => Arc::new(FileSource::new(dir.clone())),
        (None, None) => Arc::new(FileSource::new(".")),
    }
}

fn load_config(args: &GuiArgs) -> anyhow::Result<GlobeConfig> {
    match (&args.config, &args.data) {
        (Some(path), _) => GlobeConfig::from_path(path),
        (None, Some(dir)) => Ok(GlobeConfig::discover(dir).unwrap_or_default()),
        (None, None) => Ok(GlobeConfig::default()),
    }
}
