//! Per-year grid cache.
//!
//! Each year is fetched at most once per session. Years with no configured
//! file, failed fetches and unparsable files all memoize an empty grid, so
//! callers never see an error and never trigger a second request.

use crate::models::YearlyGrid;
use crate::source::DataSource;
use anyhow::Result;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Outcome of asking the cache for a year.
#[derive(Debug, Clone, PartialEq)]
pub enum GridRequest {
    /// Already cached (possibly empty).
    Ready(YearlyGrid),
    /// Not cached yet: the caller should fetch this location and hand the
    /// result to [`DataCache::complete`].
    Fetch(String),
    /// A fetch for this year is already in flight.
    Pending,
}

#[derive(Debug, Default)]
pub struct DataCache {
    files: BTreeMap<i32, String>,
    grids: HashMap<i32, YearlyGrid>,
    pending: HashSet<i32>,
}

impl DataCache {
    pub fn new(files: BTreeMap<i32, String>) -> Self {
        Self {
            files,
            ..Default::default()
        }
    }

    /// Cached grid for `year`, if any.
    pub fn get(&self, year: i32) -> Option<&YearlyGrid> {
        self.grids.get(&year)
    }

    pub fn is_pending(&self, year: i32) -> bool {
        self.pending.contains(&year)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn location(&self, year: i32) -> Option<&str> {
        self.files.get(&year).map(String::as_str)
    }

    /// First step of a load: answers from the cache, or marks the year in
    /// flight and tells the caller what to fetch.
    pub fn request(&mut self, year: i32) -> GridRequest {
        if let Some(grid) = self.grids.get(&year) {
            return GridRequest::Ready(grid.clone());
        }
        if self.pending.contains(&year) {
            return GridRequest::Pending;
        }
        match self.files.get(&year) {
            Some(location) => {
                self.pending.insert(year);
                GridRequest::Fetch(location.clone())
            }
            None => {
                log::warn!("no grid file configured for year {year}");
                let empty = YearlyGrid::empty();
                self.grids.insert(year, empty.clone());
                GridRequest::Ready(empty)
            }
        }
    }

    /// Second step of a load: parse the fetched body and memoize the result.
    /// Failures are logged and memoized as an empty grid.
    pub fn complete<E: std::fmt::Display>(
        &mut self,
        year: i32,
        body: std::result::Result<String, E>,
    ) -> YearlyGrid {
        self.pending.remove(&year);
        let parsed: Result<YearlyGrid> = match body {
            Ok(text) => YearlyGrid::parse_csv(&text).map(|(grid, dropped)| {
                if dropped > 0 {
                    log::debug!("year {year}: dropped {dropped} non-finite grid rows");
                }
                grid
            }),
            Err(e) => Err(anyhow::anyhow!("{e}")),
        };
        let grid = match parsed {
            Ok(grid) => {
                log::info!("loaded {} grid points for {year}", grid.len());
                grid
            }
            Err(e) => {
                log::error!("failed to load grid for year {year}: {e:#}");
                YearlyGrid::empty()
            }
        };
        // A grid already cached for this year wins; results are immutable.
        self.grids.entry(year).or_insert(grid).clone()
    }

    /// Synchronous load: fetch through `source` on first access, then serve
    /// from the cache.
    pub fn load_grid(&mut self, year: i32, source: &dyn DataSource) -> YearlyGrid {
        match self.request(year) {
            GridRequest::Ready(grid) => grid,
            GridRequest::Fetch(location) => {
                let body = source.fetch_text(&location);
                self.complete(year, body)
            }
            // Only reachable when an asynchronous fetch is in flight; the
            // caller gets the current (empty) view and the fetch lands later.
            GridRequest::Pending => YearlyGrid::empty(),
        }
    }

    /// Years with a memoized grid, ascending.
    pub fn cached_years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.grids.keys().copied().collect();
        years.sort_unstable();
        years
    }
}
