//! Minimal CLI for starting a ceremony
//!
//! Writes a fresh all-generator transcript that the first contributor can
//! extend:
//!
//! ```text
//! initialize --output ceremony.ptau --power 12 [--verbose]
//! ```

#![forbid(unsafe_code)]

use std::env;

use anyhow::Context;
use ptau::{initialize_transcript, MAX_POWER};
use tracing_subscriber::EnvFilter;

fn parse_flag(args: &[String], key: &str) -> Option<String> {
    let mut it = args.iter();
    while let Some(a) = it.next() {
        if a == key {
            return it.next().cloned();
        }
    }
    None
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() || has_flag(&args, "--help") {
        eprintln!("usage: initialize --output <ceremony.ptau> --power <1..={MAX_POWER}> [--verbose]");
        return Ok(());
    }

    let default_level = if has_flag(&args, "--verbose") { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let output = parse_flag(&args, "--output").context("missing --output <ceremony.ptau>")?;
    let power: u32 = parse_flag(&args, "--power")
        .context("missing --power <n>")?
        .parse()
        .context("--power must be an integer")?;

    initialize_transcript(&output, power)?;
    println!("Fresh power-{power} transcript written to {output}");
    Ok(())
}
