use crate::models::YearlyGrid;
use crate::render::Frame;
use anyhow::Result;
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Save a cleaned grid as CSV with a `lat,lon,value` header.
pub fn save_grid_csv<P: AsRef<Path>>(grid: &YearlyGrid, path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.write_record(["lat", "lon", "value"])?;
    for p in grid.points() {
        wtr.serialize((p.lat, p.lon, p.value))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save a frame's display lists as pretty JSON.
pub fn save_frame_json<P: AsRef<Path>>(frame: &Frame, path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(frame)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}
