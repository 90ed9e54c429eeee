/////////////////////////////////////////////////////////////////////////////////////////////
//
// Loads the historical facility observations used to fit the output estimator.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Training set loading.
//!
//! The training resource is a CSV file with a header row. Columns are located by
//! name, so their order in the file is irrelevant and extra columns are ignored:
//!
//! ```text
//! fuel_price,commodity_cost,energy_price,weather_index,output_metric
//! 2.5,8.0,1.2,40,118.3
//! ```

use crate::error::{LoadError, LoadResult};
use csv::{ReaderBuilder, StringRecord, Trim};
use faer::{Mat, MatRef};
use log::info;
use std::{fs::File, path::Path, time::Instant};

/// Input columns in the fixed order used for every point and query.
pub const FEATURE_COLUMNS: [&str; 4] = ["fuel_price", "commodity_cost", "energy_price", "weather_index"];

/// Column holding the observed output metric.
pub const OUTPUT_COLUMN: &str = "output_metric";

/// Number of input features.
pub const NUM_FEATURES: usize = FEATURE_COLUMNS.len();

/// One historical observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingPoint {
    pub input: [f64; NUM_FEATURES],
    pub output: f64,
}

/// Observed range of one input feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRange {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
}

/// Training inputs (`N x 4`, columns in [`FEATURE_COLUMNS`] order) and outputs
/// (`N x 1`), rows in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSet {
    pub inputs: Mat<f64>,
    pub outputs: Mat<f64>,
}

impl TrainingSet {
    pub fn from_points(points: &[TrainingPoint]) -> Self {
        let n = points.len();

        Self {
            inputs: Mat::from_fn(n, NUM_FEATURES, |i, j| points[i].input[j]),
            outputs: Mat::from_fn(n, 1, |i, _| points[i].output),
        }
    }

    pub fn len(&self) -> usize {
        self.inputs.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn point(&self, row: usize) -> TrainingPoint {
        TrainingPoint {
            input: std::array::from_fn(|j| self.inputs[(row, j)]),
            output: self.outputs[(row, 0)],
        }
    }

    pub fn points(&self) -> impl Iterator<Item = TrainingPoint> + '_ {
        (0..self.len()).map(|row| self.point(row))
    }

    /// Per-feature minimum and maximum. Empty for an empty set.
    pub fn extents(&self) -> Vec<FeatureRange> {
        let extents = biomass_rbf_utils::get_pointarray_extents(&self.inputs);

        if extents.is_empty() {
            return Vec::new();
        }

        FEATURE_COLUMNS
            .iter()
            .enumerate()
            .map(|(j, name)| FeatureRange {
                name: *name,
                min: extents[j],
                max: extents[j + NUM_FEATURES],
            })
            .collect()
    }
}

/// Load the training set from a headed CSV file.
///
/// # Errors
/// - [`LoadError::DataUnavailable`] if the file cannot be opened or read.
/// - [`LoadError::DataMalformed`] if a required column is missing, a row has a
///   different number of fields from the header, a field is empty, non-numeric or
///   non-finite, or there are no data rows.
pub fn load_training_set<P: AsRef<Path>>(path: P) -> LoadResult<TrainingSet> {
    let path = path.as_ref();
    let load_start = Instant::now();

    let file = File::open(path).map_err(|source| LoadError::DataUnavailable {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|err| csv_error(path, err))?
        .clone();

    let feature_idx = FEATURE_COLUMNS
        .iter()
        .map(|name| column_index(path, &headers, name))
        .collect::<LoadResult<Vec<usize>>>()?;
    let output_idx = column_index(path, &headers, OUTPUT_COLUMN)?;

    let mut inputs = Vec::new();
    let mut outputs = Vec::new();
    let mut num_rows = 0;

    for result in reader.records() {
        let record = result.map_err(|err| csv_error(path, err))?;
        // Header occupies line 1.
        let line = num_rows + 2;

        for (idx, name) in feature_idx.iter().zip(FEATURE_COLUMNS.iter()) {
            inputs.push(parse_field(path, &record, *idx, name, line)?);
        }
        outputs.push(parse_field(path, &record, output_idx, OUTPUT_COLUMN, line)?);

        num_rows += 1;
    }

    if num_rows == 0 {
        return Err(LoadError::malformed(path, "no data rows"));
    }

    let training_set = TrainingSet {
        inputs: MatRef::from_row_major_slice(inputs.as_slice(), num_rows, NUM_FEATURES).to_owned(),
        outputs: MatRef::from_row_major_slice(outputs.as_slice(), num_rows, 1).to_owned(),
    };

    info!(
        "Loaded {} training points from {} in {:?}",
        num_rows,
        path.display(),
        load_start.elapsed()
    );

    for range in training_set.extents() {
        info!("  {}: [{}, {}]", range.name, range.min, range.max);
    }

    Ok(training_set)
}

fn column_index(path: &Path, headers: &StringRecord, name: &str) -> LoadResult<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| LoadError::malformed(path, format!("missing required column '{}'", name)))
}

fn parse_field(path: &Path, record: &StringRecord, idx: usize, name: &str, line: usize) -> LoadResult<f64> {
    let field = record.get(idx).unwrap_or_default();

    if field.is_empty() {
        return Err(LoadError::malformed(
            path,
            format!("line {}: empty value for '{}'", line, name),
        ));
    }

    let value: f64 = field.parse().map_err(|_| {
        LoadError::malformed(
            path,
            format!("line {}: '{}' is not a number for '{}'", line, field, name),
        )
    })?;

    if !value.is_finite() {
        return Err(LoadError::malformed(
            path,
            format!("line {}: non-finite value {} for '{}'", line, value, name),
        ));
    }

    Ok(value)
}

fn csv_error(path: &Path, err: csv::Error) -> LoadError {
    match err.into_kind() {
        csv::ErrorKind::Io(source) => LoadError::DataUnavailable {
            path: path.to_path_buf(),
            source,
        },
        kind => LoadError::malformed(path, format!("{:?}", kind)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn assert_malformed(contents: &str, needle: &str) {
        let file = write_csv(contents);
        match load_training_set(file.path()) {
            Err(LoadError::DataMalformed { reason, .. }) => {
                assert!(reason.contains(needle), "'{}' does not mention '{}'", reason, needle)
            }
            other => panic!("expected DataMalformed, got {:?}", other),
        }
    }

    #[test]
    fn loads_rows_in_order() {
        let file = write_csv(
            "fuel_price,commodity_cost,energy_price,weather_index,output_metric\n\
             1,1,1,1,10\n\
             2,1,1,1,12\n\
             1.5, 2.5 ,0.5,80,11.25\n",
        );

        let set = load_training_set(file.path()).unwrap();

        assert_eq!(set.len(), 3);
        assert_eq!(
            set.point(2),
            TrainingPoint {
                input: [1.5, 2.5, 0.5, 80.0],
                output: 11.25
            }
        );
        assert_eq!(set.outputs[(1, 0)], 12.0);
    }

    #[test]
    fn columns_are_mapped_by_name() {
        let file = write_csv(
            "id,output_metric,weather_index,energy_price,fuel_price,commodity_cost,notes\n\
             7,10,4,3,1,2,first\n",
        );

        let set = load_training_set(file.path()).unwrap();
        let point = set.points().next().unwrap();

        assert_eq!(point.input, [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(point.output, 10.0);
    }

    #[test]
    fn extents_follow_feature_order() {
        let set = TrainingSet::from_points(&[
            TrainingPoint { input: [1.0, 5.0, 0.5, 10.0], output: 1.0 },
            TrainingPoint { input: [3.0, 2.0, 4.5, 90.0], output: 2.0 },
        ]);

        let extents = set.extents();
        assert_eq!(extents.len(), 4);
        assert_eq!(extents[1], FeatureRange { name: "commodity_cost", min: 2.0, max: 5.0 });
        assert_eq!(extents[3].max, 90.0);
        assert!(TrainingSet::from_points(&[]).extents().is_empty());
    }

    #[test]
    fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_training_set(dir.path().join("absent.csv"));

        assert!(matches!(result, Err(LoadError::DataUnavailable { .. })));
    }

    #[test]
    fn malformed_inputs_are_rejected() {
        assert_malformed(
            "fuel_price,commodity_cost,energy_price,output_metric\n1,1,1,10\n",
            "weather_index",
        );
        assert_malformed(
            "fuel_price,commodity_cost,energy_price,weather_index,output_metric\n",
            "no data rows",
        );
        assert_malformed(
            "fuel_price,commodity_cost,energy_price,weather_index,output_metric\n1,1,abc,1,10\n",
            "not a number",
        );
        assert_malformed(
            "fuel_price,commodity_cost,energy_price,weather_index,output_metric\n1,1,1,,10\n",
            "empty value",
        );
        assert_malformed(
            "fuel_price,commodity_cost,energy_price,weather_index,output_metric\n1,1,1,1,NaN\n",
            "non-finite",
        );
        assert_malformed(
            "fuel_price,commodity_cost,energy_price,weather_index,output_metric\n1,1,1,1\n",
            "UnequalLengths",
        );
    }
}
