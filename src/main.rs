use clap::Parser;
use clockroot::{cli, cli::Cli};
use color_eyre::eyre::{Report, Result};

fn main() -> Result<(), Report> {
    // ------------------------------------------------------------------------
    // CLI Setup

    // Parse CLI parameters
    let args = Cli::parse();

    // initialize color_eyre crate for colorized logs
    color_eyre::install()?;

    // Set logging/verbosity level via RUST_LOG
    std::env::set_var("RUST_LOG", args.verbosity.to_string());

    // initialize env_logger crate for logging/verbosity level
    env_logger::init();

    // check which CLI command we're running (run, transfer)
    match args.command {
        // a halted run is still a success
        cli::Command::Run(args) => _ = clockroot::run::run(&args)?,
        cli::Command::Transfer(args) => _ = clockroot::annotation::transfer_file(&args)?,
    }

    Ok(())
}
