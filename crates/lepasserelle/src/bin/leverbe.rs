//! leverbe binary entry point

use clap::Parser;
use lepasserelle::cli::Cli;

fn main() -> anyhow::Result<()> {
    Cli::parse().run()
}
