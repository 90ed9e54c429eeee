/////////////////////////////////////////////////////////////////////////////////////////////
//
// Append-only log of calculation results with latest, history, and clear queries.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Calculation result log.
//!
//! Records are kept in append order; the most recent append is the latest
//! result. [`JsonLinesResultStore`] persists one JSON object per line so the log
//! survives restarts and can be inspected with ordinary text tools.

use crate::{
    error::{StoreError, StoreResult},
    estimator::Estimate,
};

use chrono::{Local, NaiveDateTime};
use log::debug;
use serde::{Deserialize, Serialize};
use std::{
    fs::{File, OpenOptions},
    io::{self, BufRead, BufReader, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

/// Number of records returned by a history query when no limit is given.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// One stored calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRecord {
    /// Local wall-clock time of the calculation, ISO-8601 without offset.
    pub timestamp: NaiveDateTime,
    pub fuel_price: f64,
    pub commodity_cost: f64,
    pub energy_price: f64,
    pub weather_index: f64,
    pub calculated_output: f64,
}

impl CalculationRecord {
    /// Record for `estimate`, stamped with the current local time.
    pub fn new(estimate: &Estimate) -> Self {
        Self::with_timestamp(estimate, Local::now().naive_local())
    }

    pub fn with_timestamp(estimate: &Estimate, timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            fuel_price: estimate.query.fuel_price,
            commodity_cost: estimate.query.commodity_cost,
            energy_price: estimate.query.energy_price,
            weather_index: estimate.query.weather_index,
            calculated_output: estimate.calculated_output,
        }
    }

    /// Rejects records with a NaN or infinite field. JSON has no encoding for
    /// them, so such a record would make the rest of the log unreadable.
    pub fn validate(&self) -> StoreResult<()> {
        let fields = [
            ("fuel_price", self.fuel_price),
            ("commodity_cost", self.commodity_cost),
            ("energy_price", self.energy_price),
            ("weather_index", self.weather_index),
            ("calculated_output", self.calculated_output),
        ];

        match fields.into_iter().find(|(_, value)| !value.is_finite()) {
            Some((field, value)) => Err(StoreError::InvalidRecord { field, value }),
            None => Ok(()),
        }
    }
}

/// Storage for calculation records.
///
/// Implementations are shared between request handlers, so every method takes
/// `&self` and serialises access internally.
pub trait ResultStore: Send + Sync {
    fn append(&self, record: &CalculationRecord) -> StoreResult<()>;

    /// The most recently appended record, if any.
    fn latest(&self) -> StoreResult<Option<CalculationRecord>>;

    /// Up to `limit` records, newest first.
    fn history(&self, limit: usize) -> StoreResult<Vec<CalculationRecord>>;

    /// Removes every record.
    fn clear(&self) -> StoreResult<()>;
}

/// Result log backed by a JSON Lines file.
#[derive(Debug)]
pub struct JsonLinesResultStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonLinesResultStore {
    /// Opens the log at `path`. The file is created on first append.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read_all(&self) -> StoreResult<Vec<CalculationRecord>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(self.io_error(err)),
        };

        let mut records = Vec::new();

        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|err| self.io_error(err))?;

            if line.trim().is_empty() {
                continue;
            }

            let record = serde_json::from_str(&line).map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                line: idx + 1,
                source,
            })?;

            records.push(record);
        }

        Ok(records)
    }
}

impl ResultStore for JsonLinesResultStore {
    fn append(&self, record: &CalculationRecord) -> StoreResult<()> {
        record.validate()?;

        let mut line = serde_json::to_string(record).map_err(StoreError::Serialize)?;
        line.push('\n');

        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| self.io_error(err))?;

        file.write_all(line.as_bytes()).map_err(|err| self.io_error(err))?;

        debug!("Appended result to {}", self.path.display());
        Ok(())
    }

    fn latest(&self) -> StoreResult<Option<CalculationRecord>> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(self.read_all()?.pop())
    }

    fn history(&self, limit: usize) -> StoreResult<Vec<CalculationRecord>> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(self.read_all()?.into_iter().rev().take(limit).collect())
    }

    fn clear(&self) -> StoreResult<()> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;

        match File::create(&self.path) {
            Ok(_) => Ok(()),
            Err(err) => Err(self.io_error(err)),
        }
    }
}

/// In-process result log, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryResultStore {
    records: Mutex<Vec<CalculationRecord>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultStore for MemoryResultStore {
    fn append(&self, record: &CalculationRecord) -> StoreResult<()> {
        record.validate()?;

        let mut records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        records.push(record.clone());
        Ok(())
    }

    fn latest(&self) -> StoreResult<Option<CalculationRecord>> {
        let records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(records.last().cloned())
    }

    fn history(&self, limit: usize) -> StoreResult<Vec<CalculationRecord>> {
        let records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(records.iter().rev().take(limit).cloned().collect())
    }

    fn clear(&self) -> StoreResult<()> {
        self.records.lock().map_err(|_| StoreError::Poisoned)?.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::QueryPoint;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn record(i: u32) -> CalculationRecord {
        let estimate = Estimate {
            query: QueryPoint::new(i as f64, 2.0, 3.0, 40.0),
            calculated_output: 10.0 + i as f64 / 4.0,
        };
        let timestamp = NaiveDate::from_ymd_opt(2025, 11, 15)
            .and_then(|d| d.and_hms_opt(9, 0, i))
            .unwrap();

        CalculationRecord::with_timestamp(&estimate, timestamp)
    }

    fn exercise_store(store: &dyn ResultStore) {
        assert_eq!(store.latest().unwrap(), None);
        assert!(store.history(DEFAULT_HISTORY_LIMIT).unwrap().is_empty());

        for i in 0..5 {
            store.append(&record(i)).unwrap();
        }

        assert_eq!(store.latest().unwrap(), Some(record(4)));

        let history = store.history(3).unwrap();
        assert_eq!(history, vec![record(4), record(3), record(2)]);
        assert_eq!(store.history(DEFAULT_HISTORY_LIMIT).unwrap().len(), 5);

        store.clear().unwrap();
        assert_eq!(store.latest().unwrap(), None);

        store.append(&record(9)).unwrap();
        assert_eq!(store.history(10).unwrap(), vec![record(9)]);
    }

    fn non_finite_records_are_refused(store: &dyn ResultStore) {
        store.append(&record(1)).unwrap();

        let mut bad = record(2);
        bad.calculated_output = f64::NAN;
        assert!(matches!(
            store.append(&bad),
            Err(StoreError::InvalidRecord { field: "calculated_output", .. })
        ));

        let mut bad = record(3);
        bad.fuel_price = f64::INFINITY;
        assert!(matches!(
            store.append(&bad),
            Err(StoreError::InvalidRecord { field: "fuel_price", .. })
        ));

        assert_eq!(store.latest().unwrap(), Some(record(1)));
        assert_eq!(store.history(10).unwrap(), vec![record(1)]);
    }

    #[test]
    fn memory_store_refuses_non_finite_records() {
        non_finite_records_are_refused(&MemoryResultStore::new());
    }

    #[test]
    fn json_lines_store_refuses_non_finite_records() {
        let dir = tempfile::tempdir().unwrap();
        non_finite_records_are_refused(&JsonLinesResultStore::new(dir.path().join("results.jsonl")));
    }

    #[test]
    fn memory_store_semantics() {
        exercise_store(&MemoryResultStore::new());
    }

    #[test]
    fn json_lines_store_semantics() {
        let dir = tempfile::tempdir().unwrap();
        exercise_store(&JsonLinesResultStore::new(dir.path().join("results.jsonl")));
    }

    #[test]
    fn json_lines_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.jsonl");

        JsonLinesResultStore::new(&path).append(&record(1)).unwrap();
        JsonLinesResultStore::new(&path).append(&record(2)).unwrap();

        let reopened = JsonLinesResultStore::new(&path);
        assert_eq!(reopened.history(10).unwrap(), vec![record(2), record(1)]);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.lines().next().unwrap().contains("\"timestamp\":\"2025-11-15T09:00:01\""));
    }

    #[test]
    fn corrupt_line_reports_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.jsonl");
        let store = JsonLinesResultStore::new(&path);

        store.append(&record(1)).unwrap();
        std::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap()
            .write_all(b"{not json}\n")
            .unwrap();

        assert!(matches!(store.latest(), Err(StoreError::Parse { line: 2, .. })));
    }

    #[test]
    fn concurrent_appends_are_all_kept() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonLinesResultStore::new(dir.path().join("results.jsonl")));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        store.append(&record(i)).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.history(1000).unwrap().len(), 80);
    }
}
