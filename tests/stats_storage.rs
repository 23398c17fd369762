use wetbulb_globe::models::{GridPoint, YearlyGrid};
use wetbulb_globe::scale::ThresholdScale;
use wetbulb_globe::stats::grid_summary;
use wetbulb_globe::storage::save_grid_csv;

fn grid() -> YearlyGrid {
    YearlyGrid::from_points([
        GridPoint { lat: 0.0, lon: 0.0, value: 18.0 },
        GridPoint { lat: 1.0, lon: 1.0, value: 22.0 },
        GridPoint { lat: 2.0, lon: 2.0, value: 26.0 },
        GridPoint { lat: 3.0, lon: 3.0, value: 32.0 },
    ])
}

#[test]
fn summary_of_grid() {
    let s = grid_summary(2030, &grid(), &ThresholdScale::default(), 20.0);
    assert_eq!(s.count, 4);
    assert_eq!(s.drawn, 3);
    assert_eq!(s.min, Some(18.0));
    assert_eq!(s.max, Some(32.0));
    assert_eq!(s.mean, Some(24.5));
    assert_eq!(s.median, Some(24.0));
    assert_eq!(s.bins, vec![1, 0, 1, 0, 1, 0, 0, 1]);
}

#[test]
fn summary_of_empty_grid() {
    let s = grid_summary(2100, &YearlyGrid::empty(), &ThresholdScale::default(), 20.0);
    assert_eq!(s.count, 0);
    assert_eq!((s.min, s.mean, s.median), (None, None, None));
    assert_eq!(s.bins.iter().sum::<usize>(), 0);
}

#[test]
fn grid_export_writes_header_and_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    save_grid_csv(&grid(), &path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("lat,lon,value"));
    assert_eq!(lines.count(), 4);
}
