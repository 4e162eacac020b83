#![forbid(unsafe_code)]

//! Replay a reorder gesture script and print a JSON report.
//!
//! # Running
//!
//! ```sh
//! cargo run -p reorder-harness -- crates/reorder-harness/scripts/rejected_commit.json
//! cat script.json | cargo run -p reorder-harness
//! ```
//!
//! # Logging
//!
//! - `REORDER_LOG`: filter directives (default `warn`), e.g. `reorder_runtime=debug`
//! - `REORDER_LOG_JSON=1`: emit log lines as JSON on stderr

use std::path::PathBuf;
use std::process::ExitCode;

use reorder_harness::{HarnessError, init_logging, read_script, replay};

fn main() -> ExitCode {
    init_logging();
    let path = std::env::args_os().nth(1).map(PathBuf::from);
    match run(path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("reorder-replay: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(path: Option<PathBuf>) -> Result<(), HarnessError> {
    let script = read_script(path.as_deref())?;
    let report = replay(&script)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
