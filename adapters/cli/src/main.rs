#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless driver that runs a burrowing creature against a wandering target
//! and prints the resulting event stream.

mod driver;
mod logging;
mod report;
mod scenario;
mod wanderer;

use std::{io, path::PathBuf};

use anyhow::Result;
use clap::Parser;
use log::info;

use crate::{driver::Format, scenario::Scenario};

/// Command-line arguments accepted by the driver.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML scenario file; built-in defaults are used when omitted
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Overrides the scenario seed
    #[arg(long)]
    seed: Option<u64>,

    /// Overrides the simulated duration in seconds
    #[arg(long)]
    seconds: Option<f32>,

    /// Emit one JSON object per event instead of text lines
    #[arg(long)]
    json: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

/// Entry point for the Sandworm command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let mut scenario = match &args.scenario {
        Some(path) => scenario::load(path)?,
        None => Scenario::default(),
    };
    if let Some(seed) = args.seed {
        scenario.seed = seed;
    }
    if let Some(seconds) = args.seconds {
        scenario.seconds = seconds;
    }
    scenario.validate()?;

    let format = if args.json { Format::Json } else { Format::Text };
    info!(
        "running {:.1}s at {} Hz with seed {:#x}",
        scenario.seconds, scenario.tick_hz, scenario.seed
    );

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let summary = driver::run(&scenario, format, &mut out)?;
    info!("{summary}");
    Ok(())
}
