//! [Command-line interface](Cli) (CLI) of the main binary.

use crate::{annotation, run, Verbosity};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// CLI Entry Point
// ----------------------------------------------------------------------------

/// The command-line interface (CLI).
/// ---
/// The CLI is intended for parsing user input from the command-line in the main function. This is achieved with the `parse` function, which parses the command line arguments from [`std::env::args`](https://doc.rust-lang.org/std/env/fn.args.html).
/// ```no_run
/// use clap::Parser;
/// let args = clockroot::Cli::parse();
/// ```
/// The command-line arguments from `std::env::args` are simply a vector of space separated strings. Here is a manual example of setting the command-line input:
/// ```rust
/// # use clap::Parser;
/// let input = ["clockroot", "run", "--tree-dir", "trees/hiv", "--min-real-dates", "0.5"];
/// let args = clockroot::Cli::parse_from(input);
/// let json = serde_json::to_string_pretty(&args)?;
/// # assert!(json.contains("\"min_real_dates\": 0.5"));
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
/// With the following pretty JSON representation:
/// ```json
/// {
///   "command": {
///     "Run": {
///       "tree_dir": "trees/hiv",
///       "min_real_dates": 0.5,
///       "ref_length_column": "RefLength",
///       "tolerate_clock_failure": false,
///       "treetime": "treetime",
///       "matutils": "matUtils",
///       "usher_to_taxonium": "usher_to_taxonium"
///     }
///   },
///   "verbosity": "Info"
/// }
/// ```
#[derive(Debug, Deserialize, Parser, Serialize)]
#[clap(name = "clockroot", author, version)]
#[clap(about = "clockroot reroots a viral phylogeny to its oldest ancestor with a molecular clock.")]
pub struct Cli {
    #[clap(subcommand)]
    /// Pass CLI arguments to a particular [Command].
    #[clap(help = "Set the command.")]
    pub command: Command,

    /// Set the output [Verbosity] level.
    #[clap(short = 'v', long)]
    #[clap(value_enum, default_value_t = Verbosity::default())]
    #[clap(hide_possible_values = false)]
    #[clap(global = true)]
    #[clap(help = "Set the output verbosity level.")]
    pub verbosity: Verbosity,
}

/// CLI [commands](#variants). Used to decide which runtime [Command](#variants) the CLI arguments should be passed to.
#[derive(Debug, Deserialize, Serialize, Subcommand)]
pub enum Command {
    /// Pass CLI arguments to the [run](crate::run::run()) method.
    ///
    /// ```rust
    /// use clockroot::{cli::Command, Cli};
    /// use clap::Parser;
    /// let args = Cli::parse_from(["clockroot", "run", "--tree-dir", "trees/hiv", "--tolerate-clock-failure"]);
    /// match args.command {
    ///     Command::Run(args) => assert!(args.tolerate_clock_failure),
    ///     Command::Transfer(_) => unreachable!(),
    /// }
    /// ```
    #[clap(about = "Reroot a tree directory to the oldest node found by treetime.")]
    Run(run::Args),

    /// Pass CLI arguments to the [transfer](crate::annotation::transfer_file()) method.
    #[clap(about = "Replace the sequence of a GenBank record and recompute its translations.")]
    Transfer(annotation::Args),
}
