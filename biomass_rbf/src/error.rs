/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares the structured error conditions raised while loading, fitting, and evaluating.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Error types for every stage of the estimator's lifecycle.
//!
//! Load and fit failures are startup-fatal in the sense that no [`crate::Estimator`]
//! is produced; they are still returned as values so a caller can stay up and report
//! "not ready" instead of terminating.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading the training data.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The training resource is missing or unreadable.
    #[error("training data unavailable at {}: {source}", .path.display())]
    DataUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The training resource was read but violates the expected schema.
    #[error("training data malformed in {}: {reason}", .path.display())]
    DataMalformed { path: PathBuf, reason: String },
}

impl LoadError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        LoadError::DataMalformed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Failures while building the fitted interpolant.
#[derive(Debug, Error)]
pub enum FitError {
    /// Fewer points than the polynomial drift plus one kernel centre.
    #[error("insufficient data: {num_points} points supplied, at least {required} required")]
    InsufficientData { num_points: usize, required: usize },

    /// The augmented interpolation system is numerically singular.
    #[error("singular interpolation system: {reason}")]
    SingularSystem { reason: String },

    /// Point and value arrays disagree in shape.
    #[error("dimension mismatch: {reason}")]
    DimensionMismatch { reason: String },

    /// A training coordinate or value is not finite.
    #[error("invalid training input at row {row}: values must be finite")]
    InvalidInput { row: usize },

    /// The kernel and drift combination cannot produce a well-posed system.
    #[error("invalid interpolant settings: {reason}")]
    InvalidSettings { reason: String },
}

impl FitError {
    pub(crate) fn singular(reason: impl Into<String>) -> Self {
        FitError::SingularSystem {
            reason: reason.into(),
        }
    }
}

/// Failures during [`crate::Estimator::initialize`].
#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Fit(#[from] FitError),
}

/// Failures while evaluating the fitted interpolant.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    /// A query value is NaN or infinite.
    #[error("invalid input: {field} must be a finite number, got {value}")]
    InvalidInput { field: String, value: f64 },

    /// The query has the wrong number of coordinates.
    #[error("dimension mismatch: expected {expected} coordinates, got {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// The query is finite but so far from the training data that the kernel sum
    /// overflows.
    #[error("estimate is not a finite number (got {value}); the query is too far outside the training data")]
    NonFiniteResult { value: f64 },
}

/// Failures in the calculation result log.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("result log I/O on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("serializing result record: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("parsing result log {} at line {line}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A record with a non-finite field, which could not be read back from the log.
    #[error("refusing to store record with non-finite {field} ({value})")]
    InvalidRecord { field: &'static str, value: f64 },

    #[error("result log lock poisoned")]
    Poisoned,
}

/// Failures while reading the service configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("parsing config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type LoadResult<T> = std::result::Result<T, LoadError>;
pub type FitResult<T> = std::result::Result<T, FitError>;
pub type StoreResult<T> = std::result::Result<T, StoreError>;
