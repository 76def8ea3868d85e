//! Entropy sources for seeding a contribution
//!
//! The secret scalars are derived from 64 bytes of secure randomness mixed
//! with contributor-supplied text. Collecting that text is the only
//! interactive step of a contribution, so it sits behind a small blocking
//! trait that the orchestration takes by injection — the CLI wires in the
//! stdin prompt, tests wire in a fixed string.

#![forbid(unsafe_code)]
#![allow(missing_docs)]

use std::io::{self, BufRead, Write};

/// A blocking source of contributor-supplied entropy text.
pub trait EntropySource {
    /// Obtain a non-empty entropy string, blocking on external input if
    /// necessary.
    fn obtain(&mut self) -> io::Result<String>;
}

/// Interactive stdin prompt; re-asks until the contributor types something.
pub struct StdinEntropy;

impl EntropySource for StdinEntropy {
    fn obtain(&mut self) -> io::Result<String> {
        let stdin = io::stdin();
        let mut line = String::new();
        loop {
            print!("Enter a random text. (Entropy): ");
            io::stdout().flush()?;
            line.clear();
            stdin.lock().read_line(&mut line)?;
            let text = line.trim_end_matches(['\r', '\n']);
            if !text.is_empty() {
                return Ok(text.to_owned());
            }
        }
    }
}

/// Pre-supplied entropy text: the `--entropy` flag and the test double.
pub struct FixedEntropy(pub String);

impl EntropySource for FixedEntropy {
    fn obtain(&mut self) -> io::Result<String> {
        Ok(self.0.clone())
    }
}
