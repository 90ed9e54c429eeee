/////////////////////////////////////////////////////////////////////////////////////////////
//
// Entry point for the biomass command-line tool: logging setup and command dispatch.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

mod commands;

use clap::Parser;
use commands::Cli;
use std::{
    io::{self, Write},
    process::ExitCode,
};

/// Logs go to stderr so stdout carries only the JSON response.
fn init_logs() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let level = record.level();
            let target = record.target();
            let style = buf.default_level_style(level);
            let timestamp = buf.timestamp();
            let args = record.args();
            writeln!(buf, "[{timestamp} {style}{level}{style:#} {target}] {args}")
        })
        .init();
}

fn main() -> ExitCode {
    init_logs();

    let cli = Cli::parse();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match commands::run(&cli, &mut out) {
        Ok(outcome) => outcome.into(),
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
