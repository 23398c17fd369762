use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use wetbulb_globe::cache::{DataCache, GridRequest};
use wetbulb_globe::source::{DataSource, SourceError};

/// In-memory source that counts every fetch.
struct CountingSource {
    bodies: HashMap<String, String>,
    calls: AtomicUsize,
}

impl CountingSource {
    fn new(bodies: &[(&str, &str)]) -> Self {
        Self {
            bodies: bodies
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DataSource for CountingSource {
    fn fetch_text(&self, location: &str) -> Result<String, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.bodies
            .get(location)
            .cloned()
            .ok_or_else(|| SourceError::Status {
                url: location.to_string(),
                status: 404,
            })
    }

    fn describe(&self) -> String {
        "memory".into()
    }
}

fn files(entries: &[(i32, &str)]) -> BTreeMap<i32, String> {
    entries.iter().map(|(y, f)| (*y, f.to_string())).collect()
}

#[test]
fn grid_is_fetched_once_per_year() {
    let src = CountingSource::new(&[("a.csv", "lat,lon,value\n0,0,25\n1,1,26\n")]);
    let mut cache = DataCache::new(files(&[(2030, "a.csv")]));

    let first = cache.load_grid(2030, &src);
    let second = cache.load_grid(2030, &src);
    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
    assert_eq!(src.calls(), 1);
    assert_eq!(cache.cached_years(), vec![2030]);
}

#[test]
fn failed_fetch_memoizes_empty_grid() {
    let src = CountingSource::new(&[]);
    let mut cache = DataCache::new(files(&[(2040, "missing.csv")]));

    assert!(cache.load_grid(2040, &src).is_empty());
    assert!(cache.load_grid(2040, &src).is_empty());
    assert_eq!(src.calls(), 1, "a failed year must not be refetched");
    assert!(!cache.has_pending());
}

#[test]
fn unconfigured_year_is_empty_without_fetch() {
    let src = CountingSource::new(&[]);
    let mut cache = DataCache::new(files(&[(2030, "a.csv")]));

    assert!(cache.load_grid(2125, &src).is_empty());
    assert_eq!(src.calls(), 0);
    assert!(cache.get(2125).is_some());
}

#[test]
fn short_row_drops_only_that_row() {
    let src = CountingSource::new(&[("a.csv", "lat,lon,value\n0,0,25\n1,2\n3,3,26\n")]);
    let mut cache = DataCache::new(files(&[(2050, "a.csv")]));
    assert_eq!(cache.load_grid(2050, &src).len(), 2);
}

#[test]
fn headerless_body_memoizes_empty_grid() {
    let src = CountingSource::new(&[("bad.csv", "a,b,c\n1,2,3\n")]);
    let mut cache = DataCache::new(files(&[(2050, "bad.csv")]));
    assert!(cache.load_grid(2050, &src).is_empty());
    assert_eq!(cache.get(2050).map(|g| g.len()), Some(0));
}

#[test]
fn non_finite_rows_are_filtered() {
    let body = "lat,lon,value\n0,0,25\n0,1,NaN\nx,2,27\n3,3,inf\n";
    let src = CountingSource::new(&[("a.csv", body)]);
    let mut cache = DataCache::new(files(&[(2030, "a.csv")]));
    let grid = cache.load_grid(2030, &src);
    assert_eq!(grid.len(), 1);
    assert!(grid.points().iter().all(|p| p.is_finite()));
}

#[test]
fn request_marks_year_pending_until_complete() {
    let mut cache = DataCache::new(files(&[(2030, "a.csv")]));

    assert_eq!(cache.request(2030), GridRequest::Fetch("a.csv".into()));
    assert!(cache.is_pending(2030));
    assert_eq!(cache.request(2030), GridRequest::Pending);

    let grid = cache.complete::<String>(2030, Ok("lat,lon,value\n0,0,25\n".into()));
    assert_eq!(grid.len(), 1);
    assert!(!cache.is_pending(2030));
    assert!(matches!(cache.request(2030), GridRequest::Ready(g) if g.len() == 1));
}

#[test]
fn first_completed_grid_wins() {
    let mut cache = DataCache::new(files(&[(2030, "a.csv")]));
    let _ = cache.request(2030);
    cache.complete::<String>(2030, Ok("lat,lon,value\n0,0,25\n".into()));
    let again = cache.complete::<String>(2030, Err("late failure".into()));
    assert_eq!(again.len(), 1);
}
