//! boundtag - replay allocate/deallocate scripts and print block layouts.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use boundtag::ArenaConfig;
use boundtag_driver::{format_layout, run_case, Script};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Replay allocator scripts and print the final block layout of each case.
#[derive(Parser)]
#[command(name = "boundtag")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Script file to read; standard input if omitted
    input: Option<PathBuf>,

    /// Arena size in bytes, sentinels included
    #[arg(short, long, default_value_t = ArenaConfig::DEFAULT_CAPACITY)]
    capacity: usize,

    /// Size of one element in bytes
    #[arg(short, long, default_value_t = ArenaConfig::DEFAULT_ELEMENT_SIZE)]
    element_size: usize,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let text = match &cli.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?,
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("failed to read script from stdin")?;
            text
        }
    };

    let config = ArenaConfig::new(cli.capacity, cli.element_size);
    config.validate().context("invalid arena configuration")?;
    let script = Script::parse(&text).context("failed to parse script")?;
    tracing::info!(
        cases = script.declared(),
        capacity = config.capacity,
        element_size = config.element_size,
        "replaying script"
    );

    let mut out = io::stdout().lock();
    for (i, requests) in script.cases().enumerate() {
        let layout = run_case(&config, requests).with_context(|| format!("case {}", i + 1))?;
        writeln!(out, "{}", format_layout(&layout)).context("failed to write output")?;
    }
    out.flush().context("failed to write output")?;
    Ok(())
}

/// Log to stderr. `RUST_LOG` wins over the `-v` count.
fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        EnvFilter::new(level)
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
