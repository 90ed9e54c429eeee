/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares the service configuration: data locations, history size, and interpolant settings.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Declares the service configuration: data locations, history size, and interpolant settings.
use crate::{error::ConfigError, interpolant_config::InterpolantSettings, results::DEFAULT_HISTORY_LIMIT};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Settings for running the estimator as a service.
///
/// Every field has a default, so a configuration file only needs to name the
/// values it changes:
///
/// ```json
/// {
///     "training_data_path": "/srv/biomass/sample_data.csv",
///     "interpolant": { "kernel_type": "ThinPlateSpline", "drift": "Linear" }
/// }
/// ```
///
/// ### Default Values
/// - `training_data_path`: `sample_data.csv`
/// - `results_path`: `biomass_results.jsonl`
/// - `history_limit`: `100`
/// - `interpolant`: thin plate spline, linear drift, zero nugget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// CSV file holding the training observations.
    pub training_data_path: PathBuf,

    /// JSON Lines file the calculation results are appended to.
    pub results_path: PathBuf,

    /// Maximum number of records returned by a history query.
    pub history_limit: usize,

    /// Kernel, drift and smoothing for the fitted interpolant.
    pub interpolant: InterpolantSettings,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            training_data_path: PathBuf::from("sample_data.csv"),
            results_path: PathBuf::from("biomass_results.jsonl"),
            history_limit: DEFAULT_HISTORY_LIMIT,
            interpolant: InterpolantSettings::default(),
        }
    }
}

impl ServiceConfig {
    /// Reads a configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn training_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.training_data_path = path.into();
        self
    }

    pub fn results_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.results_path = path.into();
        self
    }

    pub fn history_limit(mut self, history_limit: usize) -> Self {
        self.history_limit = history_limit;
        self
    }
}
