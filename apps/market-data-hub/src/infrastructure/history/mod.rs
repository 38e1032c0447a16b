//! Historical Store
//!
//! Append-only per-series logs of numeric observations, queryable by
//! timestamp range.
//!
//! # Backends
//!
//! - In-memory only (default): series live for the process lifetime.
//! - File-backed: one JSON-lines file per series under a data directory,
//!   written through on every append and flushed before the call returns,
//!   so a reopened store observes all prior appends. Pair names use `_`
//!   in place of `/` for the file name, the record itself keeps the
//!   original series id.
//!
//! Appends to *different* series do not serialize against each other:
//! the outer registry lock is held only to resolve the series handle,
//! ordering is enforced per series.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};

use crate::domain::history::HistoryRecord;

/// Extension used for per-series log files.
const SERIES_FILE_EXT: &str = "jsonl";

/// Errors from the historical store.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// Underlying file i/o failure.
    #[error("history i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be serialized.
    #[error("history serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

struct SeriesInner {
    records: Vec<HistoryRecord>,
    file: Option<File>,
}

struct SeriesLog(Mutex<SeriesInner>);

/// Append-only store of per-symbol/per-pair time series.
pub struct HistoryStore {
    series: RwLock<HashMap<String, Arc<SeriesLog>>>,
    data_dir: Option<PathBuf>,
    max_series_len: Option<usize>,
}

impl HistoryStore {
    /// Open a store.
    ///
    /// With a data directory, existing per-series files are reloaded so
    /// earlier appends stay readable across restarts; unparsable lines
    /// (e.g. a partial trailing write) are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Io` if the directory cannot be created or
    /// scanned.
    pub fn open(
        data_dir: Option<PathBuf>,
        max_series_len: Option<usize>,
    ) -> Result<Self, HistoryError> {
        let mut series = HashMap::new();

        if let Some(dir) = &data_dir {
            std::fs::create_dir_all(dir)?;
            for entry in std::fs::read_dir(dir)? {
                let path = entry?.path();
                if path.extension().and_then(|e| e.to_str()) != Some(SERIES_FILE_EXT) {
                    continue;
                }
                if let Some((id, log)) = load_series_file(&path)? {
                    series.insert(id, Arc::new(log));
                }
            }
        }

        Ok(Self {
            series: RwLock::new(series),
            data_dir,
            max_series_len,
        })
    }

    /// In-memory store, no persistence.
    ///
    /// # Errors
    ///
    /// Never fails; kept fallible for signature parity with `open`.
    pub fn in_memory() -> Result<Self, HistoryError> {
        Self::open(None, None)
    }

    /// Append one record to its series.
    ///
    /// With the file backend active the record is on disk (flushed) before
    /// this returns. Appends to different series run concurrently.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError` if the series file cannot be opened or the
    /// write fails; the in-memory log is still updated in that case so
    /// readers in this process observe the record.
    pub fn append(&self, record: HistoryRecord) -> Result<(), HistoryError> {
        let log = self.series_handle(&record.series)?;
        let mut inner = log.0.lock();

        let mut write_result = Ok(());
        if let Some(file) = inner.file.as_mut() {
            write_result = write_record(file, &record);
        }

        inner.records.push(record);
        if let Some(cap) = self.max_series_len
            && inner.records.len() > cap
        {
            let overflow = inner.records.len() - cap;
            inner.records.drain(..overflow);
        }

        write_result
    }

    /// Records of a series with `start <= timestamp <= end`, in append
    /// order. `None` for a series never appended to; bounds are optional
    /// and inclusive.
    #[must_use]
    pub fn read(
        &self,
        series: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Option<Vec<HistoryRecord>> {
        let log = self.series.read().get(series).cloned()?;
        let inner = log.0.lock();
        Some(
            inner
                .records
                .iter()
                .filter(|record| {
                    start.is_none_or(|s| record.timestamp >= s)
                        && end.is_none_or(|e| record.timestamp <= e)
                })
                .cloned()
                .collect(),
        )
    }

    /// Ids of every series with at least one record.
    #[must_use]
    pub fn series_ids(&self) -> Vec<String> {
        self.series.read().keys().cloned().collect()
    }

    fn series_handle(&self, series: &str) -> Result<Arc<SeriesLog>, HistoryError> {
        if let Some(log) = self.series.read().get(series) {
            return Ok(Arc::clone(log));
        }

        let mut registry = self.series.write();
        if let Some(log) = registry.get(series) {
            return Ok(Arc::clone(log));
        }

        let file = match &self.data_dir {
            Some(dir) => Some(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(series_path(dir, series))?,
            ),
            None => None,
        };

        let log = Arc::new(SeriesLog(Mutex::new(SeriesInner {
            records: Vec::new(),
            file,
        })));
        registry.insert(series.to_string(), Arc::clone(&log));
        Ok(log)
    }
}

/// File path for a series; `/` in pair ids becomes `_`.
fn series_path(dir: &Path, series: &str) -> PathBuf {
    dir.join(format!(
        "{}.{SERIES_FILE_EXT}",
        series.replace('/', "_")
    ))
}

fn write_record(file: &mut File, record: &HistoryRecord) -> Result<(), HistoryError> {
    let line = serde_json::to_string(record)?;
    file.write_all(line.as_bytes())?;
    file.write_all(b"\n")?;
    file.flush()?;
    Ok(())
}

fn load_series_file(path: &Path) -> Result<Option<(String, SeriesLog)>, HistoryError> {
    let reader = BufReader::new(File::open(path)?);
    let mut records: Vec<HistoryRecord> = Vec::new();
    let mut skipped = 0usize;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<HistoryRecord>(&line) {
            Ok(record) => records.push(record),
            Err(_) => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::warn!(path = %path.display(), skipped, "skipped unparsable history lines");
    }

    let Some(id) = records.first().map(|r| r.series.clone()) else {
        return Ok(None);
    };

    let file = OpenOptions::new().append(true).open(path)?;
    Ok(Some((
        id,
        SeriesLog(Mutex::new(SeriesInner {
            records,
            file: Some(file),
        })),
    )))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn record(series: &str, value: f64, at: DateTime<Utc>) -> HistoryRecord {
        HistoryRecord::new(series, value, None, at)
    }

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn read_unknown_series_returns_none() {
        let store = HistoryStore::in_memory().unwrap();
        assert!(store.read("BHP.AX", None, None).is_none());
    }

    #[test]
    fn append_preserves_order() {
        let store = HistoryStore::in_memory().unwrap();
        let t0 = base_time();
        for i in 0..5 {
            store
                .append(record("BHP.AX", 44.0 + f64::from(i), t0 + Duration::seconds(i.into())))
                .unwrap();
        }

        let records = store.read("BHP.AX", None, None).unwrap();
        assert_eq!(records.len(), 5);
        let values: Vec<f64> = records.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![44.0, 45.0, 46.0, 47.0, 48.0]);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let store = HistoryStore::in_memory().unwrap();
        let t0 = base_time();
        for i in 0..5 {
            store
                .append(record("AUD/USD", 0.67, t0 + Duration::seconds(i.into())))
                .unwrap();
        }

        let from = t0 + Duration::seconds(1);
        let to = t0 + Duration::seconds(3);
        let records = store.read("AUD/USD", Some(from), Some(to)).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records.first().unwrap().timestamp, from);
        assert_eq!(records.last().unwrap().timestamp, to);
    }

    #[test]
    fn open_ended_ranges() {
        let store = HistoryStore::in_memory().unwrap();
        let t0 = base_time();
        for i in 0..4 {
            store
                .append(record("^AXJO", 7450.0, t0 + Duration::seconds(i.into())))
                .unwrap();
        }

        assert_eq!(
            store
                .read("^AXJO", Some(t0 + Duration::seconds(2)), None)
                .unwrap()
                .len(),
            2
        );
        assert_eq!(
            store
                .read("^AXJO", None, Some(t0 + Duration::seconds(1)))
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn series_are_independent() {
        let store = HistoryStore::in_memory().unwrap();
        store.append(record("BHP.AX", 44.0, base_time())).unwrap();
        store.append(record("RIO.AX", 118.0, base_time())).unwrap();

        assert_eq!(store.read("BHP.AX", None, None).unwrap().len(), 1);
        assert_eq!(store.read("RIO.AX", None, None).unwrap().len(), 1);
        let mut ids = store.series_ids();
        ids.sort();
        assert_eq!(ids, vec!["BHP.AX", "RIO.AX"]);
    }

    #[test]
    fn retention_cap_trims_oldest() {
        let store = HistoryStore::open(None, Some(3)).unwrap();
        let t0 = base_time();
        for i in 0..5 {
            store
                .append(record("BHP.AX", f64::from(i), t0 + Duration::seconds(i.into())))
                .unwrap();
        }

        let values: Vec<f64> = store
            .read("BHP.AX", None, None)
            .unwrap()
            .iter()
            .map(|r| r.value)
            .collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn file_backend_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let t0 = base_time();

        {
            let store = HistoryStore::open(Some(dir.path().to_path_buf()), None).unwrap();
            store.append(record("AUD/USD", 0.671, t0)).unwrap();
            store
                .append(record("AUD/USD", 0.672, t0 + Duration::seconds(10)))
                .unwrap();
            store.append(record("BHP.AX", 44.5, t0)).unwrap();
        }

        // Pair files use '_' in place of '/'.
        assert!(dir.path().join("AUD_USD.jsonl").exists());

        let reopened = HistoryStore::open(Some(dir.path().to_path_buf()), None).unwrap();
        let records = reopened.read("AUD/USD", None, None).unwrap();
        assert_eq!(records.len(), 2);
        assert!((records[1].value - 0.672).abs() < f64::EPSILON);

        // Appends after reopen extend the same file.
        reopened
            .append(record("AUD/USD", 0.673, t0 + Duration::seconds(20)))
            .unwrap();
        let again = HistoryStore::open(Some(dir.path().to_path_buf()), None).unwrap();
        assert_eq!(again.read("AUD/USD", None, None).unwrap().len(), 3);
    }

    #[test]
    fn reload_skips_corrupt_trailing_line() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = HistoryStore::open(Some(dir.path().to_path_buf()), None).unwrap();
            store.append(record("BHP.AX", 44.0, base_time())).unwrap();
        }

        let path = dir.path().join("BHP.AX.jsonl");
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"{\"series\":\"BHP.AX\",\"val").unwrap();

        let reopened = HistoryStore::open(Some(dir.path().to_path_buf()), None).unwrap();
        assert_eq!(reopened.read("BHP.AX", None, None).unwrap().len(), 1);
    }
}
