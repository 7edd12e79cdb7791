//! Common functionality.

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

pub mod io;

/// Commonly used command line arguments.
#[derive(Parser, Debug)]
pub struct Args {
    /// Verbosity of the program
    #[clap(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            verbose: Verbosity::new(0, 0),
        }
    }
}

/// Normalize a chromosome label from a variant-call file.
///
/// Strips a case-insensitive `chr` prefix and anything after a colon, so
/// `chr17`, `CHR17`, and `17:region` all normalize to `17`.
pub fn normalize_chrom(raw: &str) -> String {
    let stripped = if raw.len() >= 3 && raw[..3].eq_ignore_ascii_case("chr") {
        &raw[3..]
    } else {
        raw
    };
    match stripped.split_once(':') {
        Some((chrom, _)) => chrom.to_string(),
        None => stripped.to_string(),
    }
}

/// The version of the `onco-risk-worker` package.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
