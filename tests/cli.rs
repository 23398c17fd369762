use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::PathBuf;
use std::process::Command;

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data")
}

fn wetbulb() -> Command {
    let mut cmd = Command::cargo_bin("wetbulb").unwrap();
    cmd.arg("--data")
        .arg(data_dir())
        .arg("--config")
        .arg(data_dir().join("globe.json"));
    cmd
}

#[test]
fn cli_shows_help() {
    let mut cmd = Command::cargo_bin("wetbulb").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("render"))
        .stdout(predicate::str::contains("stats"));
}

#[test]
fn render_writes_display_list() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("frame.json");
    wetbulb()
        .args(["render", "--lambda", "0", "--phi", "0", "--width", "400", "--height", "300"])
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let frame: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(frame["heat_points"], 3);
    assert_eq!(frame["width"], 400.0);
    assert_eq!(frame["raster"][0]["op"], "disc");
    assert_eq!(frame["vector"][0]["op"], "ring");
}

#[test]
fn render_rejects_unknown_extension() {
    let dir = tempfile::tempdir().unwrap();
    wetbulb()
        .arg("render")
        .arg("--out")
        .arg(dir.path().join("frame.bmpx"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported output format"));
}

#[test]
fn stats_prints_json_summary() {
    wetbulb()
        .args(["stats", "--year", "2030", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"count\": 5"))
        .stdout(predicate::str::contains("\"drawn\": 4"));
}

#[test]
fn stats_exports_cleaned_grid() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("grid.csv");
    wetbulb()
        .args(["stats", "--year", "2030", "--export"])
        .arg(&out)
        .assert()
        .success();
    let text = std::fs::read_to_string(&out).unwrap();
    assert_eq!(text.lines().count(), 6);
}

#[test]
fn spin_writes_frames() {
    let dir = tempfile::tempdir().unwrap();
    wetbulb()
        .args(["spin", "--frames", "2", "--every", "10", "--format", "svg"])
        .arg("--out-dir")
        .arg(dir.path())
        .assert()
        .success();
    let count = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(count, 2);
}

// Live test (opt-in): cargo test --features online
#[cfg(feature = "online")]
#[test]
fn render_from_base_url() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("wetbulb").unwrap();
    cmd.args(["--base-url", "https://wetbulb.example.org", "render", "--out"])
        .arg(dir.path().join("globe.png"));
    cmd.assert().success();
}
