/////////////////////////////////////////////////////////////////////////////////////////////
//
// Facade that fits the facility output model once and answers rounded queries against it.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! The estimator wraps a fitted [`RBFInterpolator`] over the four facility inputs.
//!
//! It is built once by [`Estimator::initialize`] and is read-only afterwards, so a
//! single instance can be shared by every request handler behind an `Arc`.

use crate::{
    common::{round_to_precision, OUTPUT_DECIMALS},
    error::{EvalError, FitResult, InitError},
    interpolant_config::InterpolantSettings,
    rbf::RBFInterpolator,
    training::{load_training_set, TrainingSet, FEATURE_COLUMNS, NUM_FEATURES},
};

use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, path::Path};

/// Documented operating range of each input, in [`FEATURE_COLUMNS`] order.
///
/// Queries outside these ranges are still evaluated; the ranges only drive
/// [`QueryPoint::advisory_warnings`].
pub const ADVISORY_RANGES: [(f64, f64); NUM_FEATURES] = [(0.0, 10.0), (0.0, 20.0), (0.0, 5.0), (0.0, 100.0)];

/// One query against the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueryPoint {
    pub fuel_price: f64,
    pub commodity_cost: f64,
    pub energy_price: f64,
    pub weather_index: f64,
}

impl QueryPoint {
    pub fn new(fuel_price: f64, commodity_cost: f64, energy_price: f64, weather_index: f64) -> Self {
        Self {
            fuel_price,
            commodity_cost,
            energy_price,
            weather_index,
        }
    }

    /// Coordinates in [`FEATURE_COLUMNS`] order.
    pub fn as_array(&self) -> [f64; NUM_FEATURES] {
        [
            self.fuel_price,
            self.commodity_cost,
            self.energy_price,
            self.weather_index,
        ]
    }

    /// Rejects NaN and infinite coordinates, naming the first offending field.
    pub fn validate(&self) -> Result<(), EvalError> {
        match FEATURE_COLUMNS
            .iter()
            .zip(self.as_array())
            .find(|(_, value)| !value.is_finite())
        {
            Some((field, value)) => Err(EvalError::InvalidInput {
                field: field.to_string(),
                value,
            }),
            None => Ok(()),
        }
    }

    /// Fields lying outside their [`ADVISORY_RANGES`] entry.
    pub fn advisory_warnings(&self) -> Vec<RangeWarning> {
        FEATURE_COLUMNS
            .iter()
            .zip(self.as_array())
            .zip(ADVISORY_RANGES)
            .filter(|((_, value), (min, max))| value < min || value > max)
            .map(|((field, value), (min, max))| RangeWarning {
                field: *field,
                value,
                min,
                max,
            })
            .collect()
    }
}

/// A query coordinate outside its documented operating range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeWarning {
    pub field: &'static str,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

impl fmt::Display for RangeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} = {} is outside the expected range [{}, {}]; the estimate is an extrapolation",
            self.field, self.value, self.min, self.max
        )
    }
}

/// An evaluated query: the inputs echoed back with the output rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    #[serde(flatten)]
    pub query: QueryPoint,
    pub calculated_output: f64,
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.*}", OUTPUT_DECIMALS, self.calculated_output)
    }
}

/// Fitted facility output model.
#[derive(Debug, Clone)]
pub struct Estimator {
    interpolator: RBFInterpolator,
}

impl Estimator {
    /// Loads the training data at `path` and fits the interpolant.
    ///
    /// Either step failing leaves the caller with no estimator; callers that keep
    /// running report themselves as not ready.
    pub fn initialize<P: AsRef<Path>>(path: P, settings: InterpolantSettings) -> Result<Self, InitError> {
        let training_set = load_training_set(path)?;
        Ok(Self::from_training_set(&training_set, settings)?)
    }

    /// Fits the interpolant to an in-memory training set.
    pub fn from_training_set(training_set: &TrainingSet, settings: InterpolantSettings) -> FitResult<Self> {
        let interpolator = RBFInterpolator::builder(
            training_set.inputs.clone(),
            training_set.outputs.clone(),
            settings,
        )
        .build()?;

        info!("Interpolator initialized with {} data points", interpolator.num_points());

        Ok(Self { interpolator })
    }

    /// Estimates the output metric for one set of operating conditions.
    pub fn evaluate(
        &self,
        fuel_price: f64,
        commodity_cost: f64,
        energy_price: f64,
        weather_index: f64,
    ) -> Result<Estimate, EvalError> {
        self.evaluate_query(QueryPoint::new(fuel_price, commodity_cost, energy_price, weather_index))
    }

    /// Estimates the output metric for `query`.
    ///
    /// A query finite in every field but far enough out that the kernel sum
    /// overflows fails with [`EvalError::NonFiniteResult`]; a NaN estimate is
    /// never returned.
    pub fn evaluate_query(&self, query: QueryPoint) -> Result<Estimate, EvalError> {
        query.validate()?;

        let raw = self.interpolator.evaluate_point(&query.as_array())?;

        Ok(Estimate {
            query,
            calculated_output: round_to_precision(raw, OUTPUT_DECIMALS),
        })
    }

    /// Evaluates many queries on the rayon thread pool, preserving input order.
    /// An invalid query fails on its own without affecting the others.
    pub fn evaluate_batch(&self, queries: &[QueryPoint]) -> Vec<Result<Estimate, EvalError>> {
        queries.par_iter().map(|query| self.evaluate_query(*query)).collect()
    }

    pub fn num_training_points(&self) -> usize {
        self.interpolator.num_points()
    }

    pub fn interpolator(&self) -> &RBFInterpolator {
        &self.interpolator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::TrainingPoint;

    fn six_point_estimator() -> Estimator {
        let points = [
            ([1.0, 1.0, 1.0, 1.0], 10.0),
            ([2.0, 1.0, 1.0, 1.0], 12.0),
            ([1.0, 2.0, 1.0, 1.0], 11.0),
            ([1.0, 1.0, 2.0, 1.0], 13.0),
            ([1.0, 1.0, 1.0, 2.0], 9.0),
            ([3.0, 3.0, 3.0, 3.0], 20.0),
        ]
        .map(|(input, output)| TrainingPoint { input, output });

        Estimator::from_training_set(&TrainingSet::from_points(&points), InterpolantSettings::default()).unwrap()
    }

    #[test]
    fn training_inputs_return_training_outputs() {
        let estimator = six_point_estimator();

        let estimate = estimator.evaluate(1.0, 1.0, 1.0, 1.0).unwrap();
        assert_eq!(estimate.calculated_output, 10.0);
        assert_eq!(estimate.to_string(), "10.00");

        let estimate = estimator.evaluate(1.0, 1.0, 1.0, 2.0).unwrap();
        assert_eq!(estimate.to_string(), "9.00");
        assert_eq!(estimator.num_training_points(), 6);
    }

    #[test]
    fn output_is_rounded_to_two_decimals() {
        let estimator = six_point_estimator();
        let estimate = estimator.evaluate(1.3, 1.7, 1.1, 1.9).unwrap();

        let scaled = estimate.calculated_output * 100.0;
        assert!((scaled - scaled.round()).abs() < 1e-6);
        assert_eq!(estimate.to_string().split('.').nth(1).map(str::len), Some(2));
    }

    #[test]
    fn far_extrapolation_is_finite() {
        let estimator = six_point_estimator();
        let estimate = estimator.evaluate(100.0, 100.0, 100.0, 100.0).unwrap();

        assert!(estimate.calculated_output.is_finite());
    }

    #[test]
    fn overflowing_finite_query_is_rejected() {
        let estimator = six_point_estimator();
        let query = QueryPoint::new(1E154, 5.0, 1.0, 50.0);

        assert!(query.validate().is_ok());
        assert!(matches!(
            estimator.evaluate_query(query),
            Err(EvalError::NonFiniteResult { .. })
        ));

        let batch = estimator.evaluate_batch(&[QueryPoint::new(1.0, 1.0, 1.0, 1.0), query]);
        assert!(batch[0].is_ok());
        assert!(matches!(batch[1], Err(EvalError::NonFiniteResult { .. })));
    }

    #[test]
    fn non_finite_inputs_name_the_field() {
        let estimator = six_point_estimator();

        assert_eq!(
            estimator.evaluate(1.0, 1.0, f64::INFINITY, 1.0),
            Err(EvalError::InvalidInput {
                field: "energy_price".to_string(),
                value: f64::INFINITY
            })
        );
        assert!(matches!(
            estimator.evaluate(f64::NAN, 1.0, 1.0, 1.0),
            Err(EvalError::InvalidInput { ref field, .. }) if field == "fuel_price"
        ));
    }

    #[test]
    fn batch_matches_single_queries() {
        let estimator = six_point_estimator();
        let queries: Vec<QueryPoint> = (0..64)
            .map(|i| {
                let t = i as f64 / 8.0;
                QueryPoint::new(t, 2.0 * t, 0.5 * t, 10.0 * t)
            })
            .chain(std::iter::once(QueryPoint::new(1.0, f64::NAN, 1.0, 1.0)))
            .collect();

        let batch = estimator.evaluate_batch(&queries);

        assert_eq!(batch.len(), queries.len());
        for (query, result) in queries.iter().zip(&batch) {
            match (estimator.evaluate_query(*query), result) {
                (Ok(single), Ok(batched)) => {
                    assert_eq!(single.calculated_output.to_bits(), batched.calculated_output.to_bits())
                }
                (Err(_), Err(_)) => {}
                (single, batched) => panic!("{:?} vs {:?}", single, batched),
            }
        }
        assert!(batch.last().is_some_and(|r| r.is_err()));
    }

    #[test]
    fn advisory_ranges_only_warn() {
        let inside = QueryPoint::new(2.0, 5.0, 1.0, 50.0);
        assert!(inside.advisory_warnings().is_empty());

        let outside = QueryPoint::new(-1.0, 5.0, 6.0, 100.0);
        let warnings = outside.advisory_warnings();

        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].field, "fuel_price");
        assert_eq!(warnings[1].field, "energy_price");
        assert!(warnings[1].to_string().contains("[0, 5]"));

        let estimator = six_point_estimator();
        assert!(estimator.evaluate_query(outside).is_ok());
    }

    #[test]
    fn estimate_serializes_flat() {
        let estimate = Estimate {
            query: QueryPoint::new(2.0, 5.0, 1.0, 50.0),
            calculated_output: 12.5,
        };

        let json = serde_json::to_value(estimate).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "fuel_price": 2.0,
                "commodity_cost": 5.0,
                "energy_price": 1.0,
                "weather_index": 50.0,
                "calculated_output": 12.5
            })
        );
    }
}
