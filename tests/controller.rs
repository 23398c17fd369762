use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use wetbulb_globe::interaction::{InteractionMode, SelectionChange};
use wetbulb_globe::source::FileSource;
use wetbulb_globe::{GlobeConfig, GlobeController, RotationState, Viewport};

const WAIT: Duration = Duration::from_secs(10);

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data")
}

fn load(viewport: Viewport) -> GlobeController {
    let cfg = GlobeConfig::from_path(data_dir().join("globe.json")).unwrap();
    let mut globe =
        GlobeController::load(cfg, Arc::new(FileSource::new(data_dir())), viewport).unwrap();
    assert!(globe.wait_for_pending(WAIT));
    globe.set_rotation(RotationState::default());
    globe
}

#[test]
fn loads_start_year_grid() {
    let globe = load(Viewport::new(400.0, 300.0));
    assert_eq!(globe.current_year(), 2030);
    assert_eq!(globe.features().len(), 3);
    assert_eq!(globe.current_grid().len(), 5);
    assert!(globe.cache().get(2030).is_some());
    // (10,-5) is below the threshold, (0,180) is on the far side.
    assert_eq!(globe.frame().heat_points, 3);
}

#[test]
fn resize_refits_and_renders_once() {
    let mut globe = load(Viewport::new(400.0, 300.0));
    let before = globe.frames_rendered();
    globe.resize(Viewport::new(600.0, 400.0));
    assert_eq!(globe.frames_rendered(), before + 1);
    assert!((globe.projection().scale() - 400.0 / 2.3).abs() < 1e-9);
    assert_eq!(globe.projection().translate(), (300.0, 200.0));
    assert_eq!((globe.frame().width, globe.frame().height), (600.0, 400.0));
}

#[test]
fn late_fetch_fills_cache_without_redraw() {
    let mut globe = load(Viewport::new(400.0, 300.0));
    globe.set_year(2040);
    globe.set_year(2030);
    let frames = globe.frames_rendered();
    assert!(globe.wait_for_pending(WAIT));
    assert_eq!(globe.frames_rendered(), frames);
    assert_eq!(globe.current_year(), 2030);
    assert_eq!(globe.cache().get(2040).map(|g| g.len()), Some(2));
}

#[test]
fn switching_to_loaded_year_redraws() {
    let mut globe = load(Viewport::new(400.0, 300.0));
    globe.set_year(2040);
    assert!(globe.wait_for_pending(WAIT));
    assert_eq!(globe.current_year(), 2040);
    assert_eq!(globe.frame().heat_points, 2);
}

#[test]
fn missing_grid_file_renders_empty_year() {
    let mut globe = load(Viewport::new(400.0, 300.0));
    globe.set_year(2050);
    assert!(globe.wait_for_pending(WAIT));
    assert_eq!(globe.cache().get(2050).map(|g| g.is_empty()), Some(true));
    assert_eq!(globe.frame().heat_points, 0);
    assert!(!globe.frame().vector.is_empty(), "borders still drawn");
}

#[test]
fn hover_shows_tooltip_with_value() {
    let mut globe = load(Viewport::new(400.0, 300.0));
    assert!(globe.pointer_hover(200.0, 150.0));
    assert_eq!(globe.mode(), InteractionMode::HoverPaused);

    let tip = globe.tooltip().unwrap();
    assert_eq!(tip.name, "Alpha");
    assert_eq!(tip.value, Some(27.3));
    assert_eq!(tip.position, (212.0, 162.0));
    assert_eq!(tip.title(), "Alpha, 2030");
    assert_eq!(tip.detail("en"), "Max wet-bulb: 27.3 °C");
    assert_eq!(tip.detail("de"), "Max wet-bulb: 27,3 °C");

    assert!(!globe.tick(), "hover pauses rotation");
    globe.pointer_exit();
    assert!(globe.tooltip().is_none());
    assert!(globe.tick());
}

#[test]
fn country_without_value_reads_no_data() {
    let mut globe = load(Viewport::new(400.0, 300.0));
    let (x, y) = globe.projection().project(35.0, 5.0).unwrap();
    globe.pointer_hover(x, y);
    let tip = globe.tooltip().unwrap();
    assert_eq!(tip.name, "Beta");
    assert_eq!(tip.value, None);
    assert_eq!(tip.detail("en"), "No data");
}

#[test]
fn click_toggles_selection_and_rotation() {
    let mut globe = load(Viewport::new(400.0, 300.0));
    assert_eq!(
        globe.click_at(200.0, 150.0),
        Some(SelectionChange::Selected("Alpha".into()))
    );
    assert_eq!(globe.selected(), Some("Alpha"));
    assert!(!globe.tick());

    assert_eq!(
        globe.click_at(200.0, 150.0),
        Some(SelectionChange::Cleared("Alpha".into()))
    );
    assert!(globe.tick());
    assert_eq!(globe.click_at(0.0, 0.0), None);
}

#[test]
fn drag_rotates_globe() {
    let mut globe = load(Viewport::new(400.0, 300.0));
    globe.pointer_down(100.0, 100.0);
    assert!(globe.pointer_move(110.0, 100.0));
    assert!((globe.rotation().lambda - 3.0).abs() < 1e-9);
    assert!(!globe.tick(), "no auto-rotation while dragging");
    globe.pointer_up();
    assert!(globe.tick());
}

#[test]
fn zoom_is_clamped() {
    let mut globe = load(Viewport::new(400.0, 300.0));
    globe.zoom(1000.0);
    assert_eq!(globe.projection().scale(), 5000.0);
    globe.zoom(1e-6);
    assert_eq!(globe.projection().scale(), 50.0);
    globe.zoom(f64::NAN);
    assert_eq!(globe.projection().scale(), 50.0);
}

#[test]
fn load_fails_when_outlines_missing() {
    let dir = tempfile::tempdir().unwrap();
    let res = GlobeController::load(
        GlobeConfig::default(),
        Arc::new(FileSource::new(dir.path())),
        Viewport::default(),
    );
    assert!(res.is_err());
}

#[test]
fn locale_tags_map_case_insensitively() {
    use wetbulb_globe::controller::num_locale;
    assert_eq!(num_locale("DE").decimal(), ",");
    assert_eq!(num_locale("fr_FR").decimal(), ",");
    assert_eq!(num_locale("xx").decimal(), ".");
}
