/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines the command-line interface and dispatches each subcommand to the estimator or result log.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use biomass_rbf::{
    CalculationRecord, ConfigError, Estimator, JsonLinesResultStore, QueryPoint, ResultStore,
    ServiceConfig, StoreError,
};
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use serde_json::json;
use std::{io::Write, path::PathBuf, process::ExitCode};
use thiserror::Error;

pub const SERVICE_NAME: &str = "Biomass Optimizer";

const EXAMPLE_INVOCATION: &str =
    "biomass calculate --fuel-price 2.0 --commodity-cost 5.0 --energy-price 1.0 --weather-index 50";

#[derive(Debug, Parser)]
#[command(version, name = "biomass", about = "Estimate biomass facility output from operating conditions")]
pub struct Cli {
    /// JSON configuration file. Flags below override its values.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Training data CSV.
    #[arg(long, global = true)]
    pub training_data: Option<PathBuf>,

    /// Result log (JSON Lines).
    #[arg(long, global = true)]
    pub results: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Estimate the output metric and record the result.
    Calculate {
        #[arg(long, allow_negative_numbers = true)]
        fuel_price: f64,
        #[arg(long, allow_negative_numbers = true)]
        commodity_cost: f64,
        #[arg(long, allow_negative_numbers = true)]
        energy_price: f64,
        #[arg(long, allow_negative_numbers = true)]
        weather_index: f64,
    },
    /// Show the most recent result.
    Latest,
    /// Show recorded results, newest first.
    History {
        /// Maximum number of results (defaults to the configured history limit).
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Remove all recorded results.
    Clear,
    /// Check that the training data loads and the interpolant fits.
    Health,
    /// Describe the service.
    Info,
}

/// Whether a command's response reports success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::Failure => ExitCode::FAILURE,
        }
    }
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("writing output: {0}")]
    Output(#[from] std::io::Error),

    #[error("encoding output: {0}")]
    Encode(#[from] serde_json::Error),
}

impl Cli {
    /// Resolves the effective configuration: file (or defaults) then flag overrides.
    pub fn service_config(&self) -> Result<ServiceConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ServiceConfig::load(path)?,
            None => ServiceConfig::default(),
        };

        if let Some(path) = &self.training_data {
            config = config.training_data_path(path);
        }
        if let Some(path) = &self.results {
            config = config.results_path(path);
        }

        Ok(config)
    }
}

/// Runs one command, writing its JSON response to `out`.
///
/// Returns [`Outcome::Failure`] when the command's own response is an error
/// payload; `Err` is reserved for failures that prevent producing a response.
pub fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<Outcome, CliError> {
    let config = cli.service_config()?;
    let store = JsonLinesResultStore::new(&config.results_path);

    match &cli.command {
        Command::Calculate {
            fuel_price,
            commodity_cost,
            energy_price,
            weather_index,
        } => {
            let query = QueryPoint::new(*fuel_price, *commodity_cost, *energy_price, *weather_index);
            calculate(&config, &store, query, out)
        }
        Command::Latest => {
            match store.latest()? {
                Some(record) => write_json(out, &record)?,
                None => write_json(out, &json!({ "message": "No results yet" }))?,
            }
            Ok(Outcome::Success)
        }
        Command::History { limit } => {
            let records = store.history(limit.unwrap_or(config.history_limit))?;
            write_json(out, &records)?;
            Ok(Outcome::Success)
        }
        Command::Clear => {
            store.clear()?;
            info!("Cleared result log {}", store.path().display());
            write_json(out, &json!({ "status": "Results cleared" }))?;
            Ok(Outcome::Success)
        }
        Command::Health => match Estimator::initialize(&config.training_data_path, config.interpolant) {
            Ok(estimator) => {
                write_json(
                    out,
                    &json!({
                        "status": "healthy",
                        "training_points": estimator.num_training_points(),
                    }),
                )?;
                Ok(Outcome::Success)
            }
            Err(err) => {
                error!("Interpolator not initialized: {}", err);
                write_json(out, &json!({ "status": "not ready", "error": err.to_string() }))?;
                Ok(Outcome::Failure)
            }
        },
        Command::Info => {
            write_json(
                out,
                &json!({
                    "status": "ok",
                    "service": SERVICE_NAME,
                    "example": EXAMPLE_INVOCATION,
                }),
            )?;
            Ok(Outcome::Success)
        }
    }
}

fn calculate<W: Write>(
    config: &ServiceConfig,
    store: &dyn ResultStore,
    query: QueryPoint,
    out: &mut W,
) -> Result<Outcome, CliError> {
    let estimator = match Estimator::initialize(&config.training_data_path, config.interpolant) {
        Ok(estimator) => estimator,
        Err(err) => {
            error!("Interpolator not initialized: {}", err);
            write_error(out, "Interpolator not initialized", &query)?;
            return Ok(Outcome::Failure);
        }
    };

    for warning in query.advisory_warnings() {
        warn!("{}", warning);
    }

    let estimate = match estimator.evaluate_query(query) {
        Ok(estimate) => estimate,
        Err(err) => {
            write_error(out, &err.to_string(), &query)?;
            return Ok(Outcome::Failure);
        }
    };

    store.append(&CalculationRecord::new(&estimate))?;
    write_json(out, &estimate)?;

    Ok(Outcome::Success)
}

fn write_error<W: Write>(out: &mut W, message: &str, query: &QueryPoint) -> Result<(), CliError> {
    write_json(
        out,
        &json!({
            "error": message,
            "fuel_price": query.fuel_price,
            "commodity_cost": query.commodity_cost,
            "energy_price": query.energy_price,
            "weather_index": query.weather_index,
        }),
    )
}

fn write_json<W: Write, T: serde::Serialize + ?Sized>(out: &mut W, value: &T) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
