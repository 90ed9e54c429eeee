/////////////////////////////////////////////////////////////////////////////////////////////
//
// Exposes the public API and high-level documentation for the biomass output estimator.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Biomass facility output estimation by Radial Basis Function (RBF) interpolation.
//!
//! A biomass processing facility's output metric depends on four operating
//! variables, always taken in this order:
//!
//! `[fuel_price, commodity_cost, energy_price, weather_index]`
//!
//! This crate fits a thin plate spline RBF interpolant, `phi(r) = r^2 log r`, with a
//! linear polynomial drift to a fixed set of historical observations, and evaluates
//! it at arbitrary operating conditions. The fit is exact: every training
//! observation is reproduced to solver precision. Outside the training data the
//! linear drift carries affine trends forward, so extrapolated queries still get a
//! finite, well-defined answer.
//!
//! The interpolant is solved once with a dense direct factorisation of the
//! augmented system (see [`RBFInterpolator`]). Degenerate training sets (too few
//! points, coincident inputs, or inputs on a common hyperplane) are rejected with
//! a [`FitError`] instead of producing meaningless weights.
//!
//! # Features
//! - CSV training data with columns located by name ([`load_training_set`])
//! - Thin plate spline, linear, and cubic kernels with configurable drift
//! - Lock-free shared evaluation; batch queries run on the rayon thread pool
//! - Results rounded to two decimals and recorded in an append-only log
//! - Built on [`faer`](https://docs.rs/faer/latest/faer/) for linear algebra
//!
//! # Examples
//!
//! ```
//! use biomass_rbf::{Estimator, InterpolantSettings, TrainingPoint, TrainingSet};
//!
//! let observations = [
//!     ([1.0, 1.0, 1.0, 1.0], 10.0),
//!     ([2.0, 1.0, 1.0, 1.0], 12.0),
//!     ([1.0, 2.0, 1.0, 1.0], 11.0),
//!     ([1.0, 1.0, 2.0, 1.0], 13.0),
//!     ([1.0, 1.0, 1.0, 2.0], 9.0),
//!     ([3.0, 3.0, 3.0, 3.0], 20.0),
//! ]
//! .map(|(input, output)| TrainingPoint { input, output });
//!
//! let training_set = TrainingSet::from_points(&observations);
//! let estimator = Estimator::from_training_set(&training_set, InterpolantSettings::default()).unwrap();
//!
//! let estimate = estimator.evaluate(1.0, 1.0, 1.0, 1.0).unwrap();
//! assert_eq!(estimate.to_string(), "10.00");
//!
//! // Far outside the training data the answer is finite, if unreliable.
//! let estimate = estimator.evaluate(100.0, 100.0, 100.0, 100.0).unwrap();
//! assert!(estimate.calculated_output.is_finite());
//! ```
//!
//! # References
//! 1.  Fasshauer, G., 2007. Meshfree Approximation Methods with Matlab. World Scientific Publishing Co.
//! 2.  Wendland, H., 2005. Scattered Data Approximation. Cambridge University Press.
pub mod interpolant_config;

mod common;

mod rbf;

mod polynomials;

mod kdtree;

mod linalg;

pub mod error;

pub mod training;

pub mod estimator;

pub mod results;

pub mod config;

pub use {
    common::{generate_random_points, round_to_precision, OUTPUT_DECIMALS},
    config::ServiceConfig,
    error::{ConfigError, EvalError, FitError, InitError, LoadError, StoreError},
    estimator::{Estimate, Estimator, QueryPoint, RangeWarning, ADVISORY_RANGES},
    interpolant_config::{Drift, InterpolantSettings, RBFKernelType},
    rbf::{duplicate_cutoff_distance, find_duplicates, Coefficients, RBFInterpolator, RBFInterpolatorBuilder},
    results::{CalculationRecord, JsonLinesResultStore, MemoryResultStore, ResultStore, DEFAULT_HISTORY_LIMIT},
    training::{load_training_set, FeatureRange, TrainingPoint, TrainingSet, FEATURE_COLUMNS, OUTPUT_COLUMN},
};
