//! # stallscope - Main Entry Point
//!
//! - **`list`**: print the registered adapters
//! - **`detect <ADAPTER>`**: run the detector on a current-thread runtime,
//!   print the verdict and exit with its PASS/FAIL code
//!
//! Exit codes: 0 PASS, 1 FAIL, 2 usage or configuration error, 70 internal
//! error, 74 report could not be written.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use stallscope::adapters::AdapterRegistry;
use stallscope::cli::{Args, Command, DetectArgs};
use stallscope::domain::{DetectorError, ExportError};
use stallscope::engine::{self, detect};
use stallscope::export::write_report;
use stallscope::report::{display_adapters, display_verdict};

// Exit codes
const EXIT_PASS: i32 = 0;
const EXIT_FAIL: i32 = 1;
const EXIT_USAGE: i32 = 2;
const EXIT_SOFTWARE: i32 = 70;
const EXIT_IOERR: i32 = 74;

fn main() {
    // clap exits with EXIT_USAGE on its own for malformed arguments
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    std::process::exit(match run(args) {
        Ok(code) => code,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<DetectorError>().is_some() {
        EXIT_USAGE
    } else if err.downcast_ref::<ExportError>().is_some() {
        EXIT_IOERR
    } else {
        EXIT_SOFTWARE
    }
}

fn run(args: Args) -> Result<i32> {
    let runtime = engine::runtime().context("Failed to start the Tokio runtime")?;
    runtime.block_on(execute(args))
}

async fn execute(args: Args) -> Result<i32> {
    let registry = AdapterRegistry::builtin().context("Failed to prepare adapter scratch space")?;
    info!("{} adapters registered", registry.len());

    match args.command {
        Command::List => {
            display_adapters(&registry);
            Ok(EXIT_PASS)
        }
        Command::Detect(detect_args) => run_detect(&registry, &detect_args, args.verbose).await,
    }
}

async fn run_detect(registry: &AdapterRegistry, args: &DetectArgs, verbose: bool) -> Result<i32> {
    let detection = detect(
        registry,
        &args.adapter,
        &args.run_config(),
        &args.policy(),
        args.calibration(),
    )
    .await?;

    display_verdict(&detection, verbose);

    if let Some(ref path) = args.output {
        write_report(path, &detection)?;
        println!("saved: {}", path.display());
    }

    Ok(if detection.verdict.passed { EXIT_PASS } else { EXIT_FAIL })
}
