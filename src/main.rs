use std::process::ExitCode;
use anyhow::{Context, Result};
use log::error;
use crate::initialization::init;
use crate::worker::run;

mod config;
mod errors;
mod initialization;
mod logging;
mod macros;
mod manager_dashboard;
mod manager_forecast;
mod models;
mod shaping;
mod worker;

fn main() -> Result<ExitCode> {
    // Without configuration and logging there is nothing more to do than report the error
    let (config, params) = init().context("Initialization failed")?;

    match run(&config, &params) {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            error!("Run failed: {}", e);
            Ok(ExitCode::from(e.exit_code()))
        }
    }
}
