use crate::models::YearlyGrid;
use crate::scale::ThresholdScale;
use serde::{Deserialize, Serialize};

/// Summary statistics for one year's grid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GridSummary {
    pub year: i32,
    pub count: usize,
    /// Points at or above the render threshold.
    pub drawn: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    /// Point count per color bin of the threshold scale.
    pub bins: Vec<usize>,
}

/// Compute the summary of `grid`. `min_value` is the render threshold.
pub fn grid_summary(year: i32, grid: &YearlyGrid, scale: &ThresholdScale, min_value: f64) -> GridSummary {
    let mut vals: Vec<f64> = grid.points().iter().map(|p| p.value).collect();
    vals.sort_by(f64::total_cmp);
    let count = vals.len();
    let min = vals.first().cloned();
    let max = vals.last().cloned();
    let mean = if count > 0 {
        Some(vals.iter().copied().sum::<f64>() / count as f64)
    } else {
        None
    };
    let median = if count == 0 {
        None
    } else if count % 2 == 1 {
        Some(vals[count / 2])
    } else {
        Some((vals[count / 2 - 1] + vals[count / 2]) / 2.0)
    };
    let mut bins = vec![0usize; scale.range().len()];
    for v in &vals {
        bins[scale.bin(*v)] += 1;
    }
    let drawn = vals.iter().filter(|v| **v >= min_value).count();
    GridSummary {
        year,
        count,
        drawn,
        min,
        max,
        mean,
        median,
        bins,
    }
}
