//! Reroot a tree directory: date gate, clock, reroot, annotation transfer and export.

use crate::dates::DEFAULT_MIN_REAL_DATES;
use crate::pipeline::{RunContext, StageOutcome, Summary};
use crate::stages;
use crate::stats::RefLengthColumn;
use clap::Parser;
use color_eyre::eyre::{eyre, Report, Result};
use color_eyre::Help;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Run arguments.
#[derive(Clone, Debug, Deserialize, Parser, Serialize)]
#[clap(verbatim_doc_comment)]
pub struct Args {
    /// Tree directory.
    ///
    /// Must contain metadata.tsv.gz, output_stats.tsv, viz.nwk.gz, viz.pb.gz,
    /// config.toml and the reference <refseq_acc>.fa and <refseq_acc>.gbff.
    #[clap(short = 't', long, required = true)]
    pub tree_dir: PathBuf,

    /// Minimum proportion of samples with a real date (0 to 1).
    ///
    /// Below this, the run stops cleanly before treetime.
    #[clap(short = 'm', long, default_value_t = DEFAULT_MIN_REAL_DATES)]
    #[clap(value_parser = parse_proportion)]
    pub min_real_dates: f64,

    /// Column of output_stats.tsv with the reference length.
    #[clap(long, value_enum, default_value_t = RefLengthColumn::default())]
    pub ref_length_column: RefLengthColumn,

    /// Stop cleanly, instead of failing, if treetime fails.
    #[clap(long)]
    pub tolerate_clock_failure: bool,

    /// treetime program.
    #[clap(long, default_value = "treetime")]
    pub treetime: String,

    /// matUtils program.
    #[clap(long, default_value = "matUtils")]
    pub matutils: String,

    /// usher_to_taxonium program.
    #[clap(long, default_value = "usher_to_taxonium")]
    pub usher_to_taxonium: String,
}

impl Default for Args {
    fn default() -> Self {
        Args {
            tree_dir: PathBuf::new(),
            min_real_dates: DEFAULT_MIN_REAL_DATES,
            ref_length_column: RefLengthColumn::default(),
            tolerate_clock_failure: false,
            treetime: "treetime".to_string(),
            matutils: "matUtils".to_string(),
            usher_to_taxonium: "usher_to_taxonium".to_string(),
        }
    }
}

/// Parse a proportion between 0 and 1.
///
/// ```rust
/// use clockroot::run::parse_proportion;
/// assert_eq!(parse_proportion("0.8")?, 0.8);
/// assert!(parse_proportion("80").is_err());
/// assert!(parse_proportion("-0.1").is_err());
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn parse_proportion(value: &str) -> Result<f64, Report> {
    let proportion: f64 = value.parse().map_err(|e| eyre!("Invalid proportion {value:?}: {e}"))?;
    check_proportion(proportion)
}

fn check_proportion(proportion: f64) -> Result<f64, Report> {
    if !(0.0..=1.0).contains(&proportion) {
        return Err(eyre!("Proportion must be between 0 and 1: {proportion}"));
    }
    Ok(proportion)
}

/// Run the rerooting pipeline on a tree directory.
///
/// A halt (too few dates, or a tolerated clock failure) is a successful run,
/// reported in the returned [`Summary`].
pub fn run(args: &Args) -> Result<Summary, Report> {
    check_proportion(args.min_real_dates)
        .suggestion("Set --min-real-dates to a proportion, ex. 0.8")?;

    let mut context = RunContext::new(args);
    context.layout.check()?;
    info!("Rerooting tree: {}", context.layout.name());

    let outcome = stages::pipeline().run(&mut context)?;
    match &outcome {
        StageOutcome::Continue => info!("Rerooting complete: {:?}", context.layout.taxonium()),
        StageOutcome::Halt(reason) => info!("Rerooting stopped: {reason}"),
    }

    let summary = Summary::new(&context, outcome);
    let path = context.layout.summary();
    info!("Writing summary: {path:?}");
    summary.write(&path)?;

    Ok(summary)
}
