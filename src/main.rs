use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;

use spritefe::{cli, logger};

fn main() -> ExitCode {
    let args = cli::CliArgs::parse();

    // Session log (overwrites the previous session's log)
    logger::init(if args.verbose { LevelFilter::Debug } else { LevelFilter::Info });

    cli::run(args)
}
