//! Minimal CLI contributor
//!
//! Extends an existing transcript with one fresh contribution:
//!
//! ```text
//! contribute --input old.ptau --output new.ptau --name "alice" \
//!     [--entropy "typed randomness"] [--verbose]
//! ```
//!
//! Without `--entropy` the tool blocks on an interactive prompt. The
//! resulting challenge and response hashes are printed for the contributor
//! to publish alongside the new transcript.

#![forbid(unsafe_code)]

use std::env;
use std::path::Path;

use anyhow::Context;
use ptau::{contribute, ContributeOptions};
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

/// Render a 64-byte digest as four 16-byte lines, grouped per word.
fn format_hash(bytes: &[u8]) -> String {
    let mut out = String::new();
    for line in bytes.chunks(16) {
        out.push_str("\t\t");
        for word in line.chunks(4) {
            out.push_str(&hex::encode(word));
            out.push(' ');
        }
        out.push('\n');
    }
    out
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() || has_flag(&args, "--help") {
        eprintln!(
            "usage: contribute --input <old.ptau> --output <new.ptau> --name <who> \
             [--entropy <text>] [--verbose]"
        );
        return Ok(());
    }

    let default_level = if has_flag(&args, "--verbose") { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let input = parse_flag(&args, "--input").context("missing --input <old.ptau>")?;
    let output = parse_flag(&args, "--output").context("missing --output <new.ptau>")?;
    let name = parse_flag(&args, "--name").context("missing --name <who>")?;
    let entropy = parse_flag(&args, "--entropy");

    let record = contribute(
        Path::new(&input),
        Path::new(&output),
        &ContributeOptions { name, entropy },
    )?;

    println!("Contribution recorded in {output}");
    println!("Next challenge hash:");
    print!("{}", format_hash(&record.next_challenge));
    println!("Response hash:");
    print!("{}", format_hash(&record.response));
    Ok(())
}
