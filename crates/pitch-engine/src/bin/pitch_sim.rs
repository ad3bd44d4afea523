//! Match simulation CLI: runs or verifies a match described by a JSON
//! request file and prints the JSON outcome.
//!
//! Usage:
//!   pitch-sim run <request.json>
//!   pitch-sim verify <request.json>
//!   RUST_LOG=pitch_engine=debug pitch-sim run <request.json>

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pitch_engine::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "pitch-sim")]
#[command(about = "Run and verify deterministic soccer matches")]
struct Args {
    /// Pretty-print the JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Simulate a match and print its MatchResult
    Run {
        /// Path to a run request JSON file
        request: PathBuf,
    },
    /// Re-execute a stored match and print its VerificationResult
    Verify {
        /// Path to a verify request JSON file
        request: PathBuf,
    },
}

fn default_engine_version() -> String {
    ENGINE_VERSION.to_owned()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunRequest {
    #[serde(flatten)]
    setup: MatchSetup,
    seed: String,
    #[serde(default = "default_engine_version")]
    engine_version: String,
    #[serde(default)]
    match_id: Option<String>,
    #[serde(default)]
    home_inputs: Vec<InputRecord>,
    #[serde(default)]
    away_inputs: Vec<InputRecord>,
    #[serde(default)]
    stoppage: Option<Stoppage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest {
    #[serde(flatten)]
    setup: MatchSetup,
    match_id: String,
    seed: String,
    engine_version: String,
    inputs: StoredInputs,
    on_chain_hash: String,
    #[serde(default)]
    min_inputs: u64,
}

fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read request: {}", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse request: {}", path.display()))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("failed to serialize output json")?;
    println!("{json}");
    Ok(())
}

fn run_match(request: RunRequest) -> Result<MatchResult> {
    let RunRequest {
        setup,
        seed,
        engine_version,
        match_id,
        home_inputs,
        away_inputs,
        stoppage,
    } = request;

    if engine_version != ENGINE_VERSION {
        return Err(MatchError::UnsupportedEngineVersion {
            requested: engine_version,
            supported: ENGINE_VERSION,
        }
        .into());
    }

    let mut driver = MatchDriver::new(setup, &seed)?;
    if let Some(id) = match_id {
        driver = driver.with_match_id(&id);
    }
    if let Some(stoppage) = stoppage {
        driver.schedule_stoppage(stoppage);
    }
    driver.submit_all(Side::Home, &home_inputs);
    driver.submit_all(Side::Away, &away_inputs);
    Ok(driver.finish()?)
}

fn verify_match(request: VerifyRequest) -> Result<VerificationResult> {
    let verdict = Verifier::new(request.setup)
        .with_min_inputs(request.min_inputs)
        .verify(
            &request.match_id,
            &request.seed,
            &request.engine_version,
            &request.inputs,
            &request.on_chain_hash,
        )?;
    Ok(verdict)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match args.command {
        Command::Run { request } => {
            let result = run_match(load(&request)?)?;
            print_json(&result, args.pretty)
        }
        Command::Verify { request } => {
            let verdict = verify_match(load(&request)?)?;
            print_json(&verdict, args.pretty)
        }
    }
}
