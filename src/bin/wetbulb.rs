use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use num_format::ToFormattedString;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use wetbulb_globe::source::{DataSource, FileSource, HttpSource};
use wetbulb_globe::render::plotters_painter;
use wetbulb_globe::controller::num_locale;
use wetbulb_globe::{GlobeConfig, GlobeController, RotationState, Viewport, stats, storage};

#[derive(Parser, Debug)]
#[command(
    name = "wetbulb",
    version,
    about = "Render and summarize the wet-bulb temperature globe"
)]
struct Cli {
    #[command(flatten)]
    data: DataArgs,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug)]
struct DataArgs {
    /// Directory holding the data files (world.json, wetbulb_YYYY.csv, ...).
    #[arg(long, global = true, conflicts_with = "base_url")]
    data: Option<PathBuf>,
    /// Base URL the data files are served from.
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// JSON config overriding years, file locations and styling.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Locale for printed numbers (en, de, fr, ...).
    #[arg(long, global = true)]
    locale: Option<String>,
    /// Seconds to wait for grid downloads.
    #[arg(long, global = true, default_value_t = 60)]
    timeout: u64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one frame to .svg, .png or .json (display list).
    Render(RenderArgs),
    /// Render consecutive auto-rotation frames into a directory.
    Spin(SpinArgs),
    /// Print grid statistics per year.
    Stats(StatsArgs),
}

#[derive(Args, Debug, Clone)]
struct ViewArgs {
    /// Year to show (defaults to the configured start year).
    #[arg(short, long)]
    year: Option<i32>,
    /// Rotation about the polar axis, degrees.
    #[arg(long, allow_hyphen_values = true)]
    lambda: Option<f64>,
    /// Tilt, degrees.
    #[arg(long, allow_hyphen_values = true)]
    phi: Option<f64>,
    /// Roll, degrees.
    #[arg(long, allow_hyphen_values = true)]
    gamma: Option<f64>,
    /// Width in CSS pixels.
    #[arg(long, default_value_t = 800)]
    width: u32,
    /// Height in CSS pixels.
    #[arg(long, default_value_t = 500)]
    height: u32,
    /// Device pixels per CSS pixel.
    #[arg(long, default_value_t = 1.0)]
    pixel_ratio: f64,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    view: ViewArgs,
    /// Output path; the extension picks the format.
    #[arg(long)]
    out: PathBuf,
}

#[derive(ValueEnum, Clone, Debug)]
enum ImageFormat {
    Svg,
    Png,
}

#[derive(Args, Debug)]
struct SpinArgs {
    #[command(flatten)]
    view: ViewArgs,
    /// Number of frames to write.
    #[arg(long, default_value_t = 12)]
    frames: u32,
    /// Animation ticks between written frames.
    #[arg(long, default_value_t = 100)]
    every: u32,
    #[arg(long)]
    out_dir: PathBuf,
    #[arg(long, value_enum, default_value_t = ImageFormat::Png)]
    format: ImageFormat,
}

#[derive(Args, Debug)]
struct StatsArgs {
    /// Only this year (defaults to all configured years).
    #[arg(short, long)]
    year: Option<i32>,
    /// Export the cleaned grid of --year as CSV.
    #[arg(long, requires = "year")]
    export: Option<PathBuf>,
    /// Print JSON instead of text.
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => {
            // Format up to 2 decimals, then trim trailing zeros and trailing dot.
            let s = format!("{:.2}", x);
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        }
        _ => "NA".to_string(),
    }
}

fn make_source(args: &DataArgs) -> Arc<dyn DataSource> {
    match (&args.data, &args.base_url) {
        (_, Some(url)) => Arc::new(HttpSource::new(url.clone())),
        (Some(dir), None) => Arc::new(FileSource::new(dir.clone())),
        (None, None) => Arc::new(FileSource::new(".")),
    }
}

fn make_config(args: &DataArgs) -> Result<GlobeConfig> {
    let mut cfg = match (&args.config, &args.data) {
        (Some(path), _) => GlobeConfig::from_path(path)?,
        (None, Some(dir)) => GlobeConfig::discover(dir).unwrap_or_else(|e| {
            log::warn!("{e:#}; using default file layout");
            GlobeConfig::default()
        }),
        (None, None) => GlobeConfig::default(),
    };
    if let Some(locale) = &args.locale {
        cfg.locale = locale.clone();
    }
    Ok(cfg)
}

fn load_globe(args: &DataArgs, view: &ViewArgs) -> Result<GlobeController> {
    let config = make_config(args)?;
    let viewport = Viewport {
        width: view.width as f64,
        height: view.height as f64,
        pixel_ratio: view.pixel_ratio,
    };
    let mut globe = GlobeController::load(config, make_source(args), viewport)?;
    if let Some(year) = view.year {
        globe.set_year(year);
    }
    if view.lambda.is_some() || view.phi.is_some() || view.gamma.is_some() {
        let r = globe.rotation();
        globe.set_rotation(RotationState::new(
            view.lambda.unwrap_or(r.lambda),
            view.phi.unwrap_or(r.phi),
            view.gamma.unwrap_or(r.gamma),
        ));
    }
    if !globe.wait_for_pending(Duration::from_secs(args.timeout)) {
        log::warn!("grid download still pending after {}s", args.timeout);
    }
    Ok(globe)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(&cli.data, args),
        Command::Spin(args) => cmd_spin(&cli.data, args),
        Command::Stats(args) => cmd_stats(&cli.data, args),
    }
}

fn cmd_render(data: &DataArgs, args: RenderArgs) -> Result<()> {
    let globe = load_globe(data, &args.view)?;
    let ext = args
        .out
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png")
        .to_ascii_lowercase();
    match ext.as_str() {
        "json" => storage::save_frame_json(globe.frame(), &args.out)?,
        "svg" | "png" => plotters_painter::save_frame(globe.frame(), &args.out, args.view.pixel_ratio)?,
        other => bail!("unsupported output format: {}", other),
    }
    eprintln!(
        "Wrote {} ({} heat points, year {})",
        args.out.display(),
        globe.frame().heat_points,
        globe.current_year()
    );
    Ok(())
}

fn cmd_spin(data: &DataArgs, args: SpinArgs) -> Result<()> {
    if args.frames == 0 {
        bail!("--frames must be at least 1");
    }
    let mut globe = load_globe(data, &args.view)?;
    std::fs::create_dir_all(&args.out_dir)?;
    let ext = match args.format {
        ImageFormat::Svg => "svg",
        ImageFormat::Png => "png",
    };
    for i in 0..args.frames {
        if i > 0 {
            for _ in 0..args.every.max(1) {
                globe.tick();
            }
        }
        let path = args
            .out_dir
            .join(format!("globe_{}_{:04}.{}", globe.current_year(), i, ext));
        plotters_painter::save_frame(globe.frame(), &path, args.view.pixel_ratio)?;
    }
    eprintln!("Wrote {} frames to {}", args.frames, args.out_dir.display());
    Ok(())
}

fn cmd_stats(data: &DataArgs, args: StatsArgs) -> Result<()> {
    let config = make_config(data)?;
    config.validate()?;
    let scale = config.threshold_scale()?;
    let locale = num_locale(&config.locale);
    let source = make_source(data);
    let mut cache = wetbulb_globe::cache::DataCache::new(config.grid_files.clone());

    let years: Vec<i32> = match args.year {
        Some(y) => vec![y],
        None => config.years.clone(),
    };

    let mut summaries = Vec::new();
    for year in years {
        let grid = cache.load_grid(year, source.as_ref());
        if let (Some(path), Some(y)) = (&args.export, args.year)
            && y == year
        {
            storage::save_grid_csv(&grid, path)?;
            eprintln!("Saved {} rows to {}", grid.len(), path.display());
        }
        summaries.push(stats::grid_summary(year, &grid, &scale, config.min_value));
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }
    for s in summaries {
        println!(
            "{}  points={} drawn={}  min={} max={} mean={} median={}",
            s.year,
            s.count.to_formatted_string(&locale),
            s.drawn.to_formatted_string(&locale),
            fmt_opt(s.min),
            fmt_opt(s.max),
            fmt_opt(s.mean),
            fmt_opt(s.median)
        );
    }
    Ok(())
}
